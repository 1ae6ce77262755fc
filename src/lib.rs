//! Internal resource router library.
//!
//! Requests name a method and a resource id. The router passes each one
//! through a configurable filter chain and hands it to the handler whose
//! route prefix is the longest match for the id.

pub mod config;
pub mod filter;
pub mod lifecycle;
pub mod observability;
pub mod resource;
pub mod routing;
pub mod script;
pub mod service;

pub use config::schema::RouterConfig;
pub use lifecycle::Shutdown;
pub use resource::{Handler, Method, Request, ResourceError, Response};
pub use routing::{RouteEvent, RouteTable};
pub use service::RouterService;
