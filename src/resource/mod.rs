//! Resource request model.
//!
//! # Data Flow
//! ```text
//! Caller builds JSON request {method, id, ...}
//!     → request.rs (typed view: Method, id accessors)
//!     → [filters may rewrite the request]
//!     → handler.rs (terminal capability serving a route)
//!     → Response (JSON value) or error.rs (ResourceError taxonomy)
//! ```
//!
//! # Design Decisions
//! - Requests stay an ordered JSON tree; only `method` and `id` are interpreted
//! - Everything else in the request is opaque to the router
//! - Failures are a closed taxonomy with numeric codes

pub mod error;
pub mod handler;
pub mod request;

pub use error::ResourceError;
pub use handler::{handler_fn, Handler};
pub use request::{Method, Request, Response, ID_SEPARATOR};
