//! Request and method types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::resource::error::ResourceError;

/// Separator between segments of a resource id.
pub const ID_SEPARATOR: char = '/';

/// A response is whatever JSON the handler produced; `null` is valid.
pub type Response = Value;

/// Operation requested against a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Create,
    Read,
    Update,
    Delete,
    Patch,
    Query,
    Action,
}

impl Method {
    /// All methods, in declaration order.
    pub const ALL: [Method; 7] = [
        Method::Create,
        Method::Read,
        Method::Update,
        Method::Delete,
        Method::Patch,
        Method::Query,
        Method::Action,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Create => "create",
            Method::Read => "read",
            Method::Update => "update",
            Method::Delete => "delete",
            Method::Patch => "patch",
            Method::Query => "query",
            Method::Action => "action",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = ResourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ResourceError::bad_request(format!("Unsupported method: {}", s)))
    }
}

/// A resource request: an ordered JSON object carrying at least `method`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Request {
    inner: Map<String, Value>,
}

impl Request {
    /// Build a request with the given method and optional id.
    pub fn new(method: Method, id: Option<&str>) -> Self {
        let mut inner = Map::new();
        inner.insert("method".to_string(), Value::String(method.as_str().to_string()));
        inner.insert(
            "id".to_string(),
            id.map(|s| Value::String(s.to_string())).unwrap_or(Value::Null),
        );
        Self { inner }
    }

    /// Wrap an arbitrary JSON value. Non-object values are a bad request.
    pub fn from_value(value: Value) -> Result<Self, ResourceError> {
        match value {
            Value::Object(inner) => Ok(Self { inner }),
            other => Err(ResourceError::bad_request(format!(
                "Request must be a JSON object, got {}",
                type_name(&other)
            ))),
        }
    }

    /// Add a field, builder style.
    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.inner.insert(key.to_string(), value);
        self
    }

    /// The raw method string, if present.
    pub fn method_str(&self) -> Option<&str> {
        self.inner.get("method").and_then(Value::as_str)
    }

    /// The typed method. Missing or unknown methods are a bad request.
    pub fn method(&self) -> Result<Method, ResourceError> {
        match self.method_str() {
            Some(m) => m.parse(),
            None => Err(ResourceError::bad_request("Request is missing required method")),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.inner.get("id").and_then(Value::as_str)
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.inner.insert("id".to_string(), Value::String(id.into()));
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.inner.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.inner.insert(key.into(), value)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.inner
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.inner.clone())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.inner)
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Value::Object(self.inner.clone()))
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
