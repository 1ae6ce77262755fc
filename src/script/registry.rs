//! Script resolution from configuration.
//!
//! # Responsibilities
//! - Turn a configured script definition into a runnable `Script`
//! - Hold native scripts registered by the hosting application
//!
//! # Supported types
//! - `native`: looks up `name` among registered scripts
//! - `literal`: yields the configured `value` without inspecting the scope

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;

use crate::config::schema::ScriptConfig;
use crate::script::scope::Scope;
use crate::script::{Script, ScriptError};

/// Script type resolved from the registry by name.
pub const NATIVE_TYPE: &str = "native";

/// Script type that always yields its configured value.
pub const LITERAL_TYPE: &str = "literal";

/// Resolves script definitions found in filter configuration.
pub trait ScriptFactory: Send + Sync {
    /// Build the script for `config`. `pointer` locates the definition for diagnostics.
    fn new_instance(&self, pointer: &str, config: &ScriptConfig) -> Result<Arc<dyn Script>, ScriptError>;
}

/// Script yielding a fixed value.
#[derive(Debug, Clone, PartialEq)]
pub struct LiteralScript {
    value: Value,
}

impl LiteralScript {
    pub fn new(value: Value) -> Self {
        Self { value }
    }
}

impl Script for LiteralScript {
    fn execute(&self, _scope: &mut Scope) -> Result<Value, ScriptError> {
        Ok(self.value.clone())
    }
}

/// Script backed by a closure.
pub struct FnScript<F> {
    f: F,
}

impl<F> Script for FnScript<F>
where
    F: Fn(&mut Scope) -> Result<Value, ScriptError> + Send + Sync,
{
    fn execute(&self, scope: &mut Scope) -> Result<Value, ScriptError> {
        (self.f)(scope)
    }
}

/// Wrap a closure as a [`Script`].
pub fn script_fn<F>(f: F) -> FnScript<F>
where
    F: Fn(&mut Scope) -> Result<Value, ScriptError> + Send + Sync,
{
    FnScript { f }
}

/// Registry of named native scripts, safe to update while filters are built.
#[derive(Clone, Default)]
pub struct ScriptRegistry {
    scripts: Arc<DashMap<String, Arc<dyn Script>>>,
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or overwrite) a named script.
    pub fn register(&self, name: impl Into<String>, script: Arc<dyn Script>) {
        let name = name.into();
        tracing::debug!(script = %name, "Registered native script");
        self.scripts.insert(name, script);
    }

    pub fn unregister(&self, name: &str) -> bool {
        self.scripts.remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Script>> {
        self.scripts.get(name).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

impl fmt::Debug for ScriptRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.scripts.iter().map(|r| r.key().clone()).collect();
        f.debug_struct("ScriptRegistry").field("scripts", &names).finish()
    }
}

impl ScriptFactory for ScriptRegistry {
    fn new_instance(&self, pointer: &str, config: &ScriptConfig) -> Result<Arc<dyn Script>, ScriptError> {
        match config.script_type.as_str() {
            NATIVE_TYPE => {
                let name = config.name.as_deref().ok_or_else(|| {
                    ScriptError::Compilation(format!("{}: native script requires a name", pointer))
                })?;
                self.get(name).ok_or_else(|| {
                    ScriptError::Compilation(format!("{}: no native script registered as '{}'", pointer, name))
                })
            }
            LITERAL_TYPE => {
                let value = config.value.clone().unwrap_or(Value::Null);
                Ok(Arc::new(LiteralScript::new(value)))
            }
            other => Err(ScriptError::Compilation(format!(
                "{}: unsupported script type '{}'",
                pointer, other
            ))),
        }
    }
}
