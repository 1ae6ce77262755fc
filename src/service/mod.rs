//! Router service subsystem.
//!
//! # Data Flow
//! ```text
//! handle(request)
//!     → ids.rs (create into a collection: append a fresh id)
//!     → monitoring measurement started
//!     → current FilterChain (loaded once per request)
//!     → outcome normalized: typed errors pass, faults become Internal
//!     → measurement ended
//!
//! Registry events → RouteTable add / remove / replace
//! Config changes  → new FilterChain → atomic swap (old kept on failure)
//! ```
//!
//! # Design Decisions
//! - Requests run entirely on the caller's thread
//! - Chain reference and route table change independently of each other
//! - Internal fault detail never reaches the caller

pub mod ids;
pub mod router;

pub use ids::assign_id;
pub use router::{ReloadStats, RouterService};
