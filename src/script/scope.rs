//! Script variable scopes.

use serde_json::{Map, Value};

use crate::resource::Request;

/// Variable environment visible to a filter's scripts for one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    vars: Map<String, Value>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.vars.get_mut(name)
    }

    pub fn put(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.vars.insert(name.into(), value)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.vars.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn vars(&self) -> &Map<String, Value> {
        &self.vars
    }
}

/// Builds the scope for a filtered request.
pub trait ScopeFactory: Send + Sync {
    fn new_instance(&self, request: &Request) -> Scope;
}

/// Scope factory seeding every scope with a fixed set of globals.
#[derive(Debug, Clone, Default)]
pub struct DefaultScopeFactory {
    globals: Map<String, Value>,
}

impl DefaultScopeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_global(mut self, name: impl Into<String>, value: Value) -> Self {
        self.globals.insert(name.into(), value);
        self
    }
}

impl ScopeFactory for DefaultScopeFactory {
    fn new_instance(&self, _request: &Request) -> Scope {
        Scope {
            vars: self.globals.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Method;
    use serde_json::json;

    #[test]
    fn test_scopes_are_independent() {
        let factory = DefaultScopeFactory::new().with_global("env", json!("test"));
        let request = Request::new(Method::Read, Some("/a"));

        let mut first = factory.new_instance(&request);
        first.put("env", json!("changed"));
        let second = factory.new_instance(&request);

        assert_eq!(second.get("env"), Some(&json!("test")));
        assert!(!second.contains("request"));
    }
}
