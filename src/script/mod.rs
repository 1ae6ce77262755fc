//! Scripting interface used by filters.
//!
//! # Data Flow
//! ```text
//! Filter configuration (condition / onRequest / onResponse / onFailure)
//!     → registry.rs (ScriptFactory resolves each definition to a Script)
//!
//! Filtered request:
//!     → scope.rs (ScopeFactory builds a fresh Scope, filter seeds `request`)
//!     → Script::execute(&mut Scope)
//!     → value, or ScriptError (thrown resource error / execution failure)
//! ```
//!
//! # Design Decisions
//! - The router knows only the `Script` trait, never a scripting runtime
//! - Scripts run synchronously on the request's thread
//! - Scripts see and may replace entries of the scope

pub mod registry;
pub mod scope;

use serde_json::Value;
use thiserror::Error;

use crate::resource::ResourceError;

pub use registry::{script_fn, LiteralScript, ScriptFactory, ScriptRegistry};
pub use scope::{DefaultScopeFactory, Scope, ScopeFactory};

/// Errors raised by scripts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    /// The script deliberately raised a resource error.
    #[error("script threw {0}")]
    Thrown(ResourceError),

    /// The script failed while executing.
    #[error("script execution failed: {0}")]
    Execution(String),

    /// The script definition could not be turned into a runnable script.
    #[error("script compilation failed: {0}")]
    Compilation(String),
}

/// An executable predicate or hook.
pub trait Script: Send + Sync {
    /// Run with the given scope and yield a value.
    fn execute(&self, scope: &mut Scope) -> Result<Value, ScriptError>;
}
