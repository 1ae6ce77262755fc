//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML or JSON)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RouterConfig (validated, immutable)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs reads new config (unchanged content is dropped)
//!     → RouterService validates the filter section
//!     → RouterService builds a new filter chain
//!     → atomic swap of the chain; old chain kept on any failure
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Route membership is never configured here; it comes from the registry

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_or_default, parse_config, read_config, ConfigError};
pub use schema::{FilterConfig, ObservabilityConfig, RouterConfig, ScriptConfig};
pub use watcher::ConfigWatcher;
