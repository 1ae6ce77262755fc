//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registry events (handler added / removed / replaced)
//!     → registry.rs (RouteEvent channel, single consumer)
//!     → table.rs (copy current generation, apply change, swap)
//!
//! Request dispatch (terminal link of the filter chain):
//!     request id
//!     → table.rs (load current generation, lock-free)
//!     → matcher.rs (segment-aware prefix match, longest wins)
//!     → Handler::handle or NotFound
//! ```
//!
//! # Design Decisions
//! - Each generation is immutable; writers build a full copy before swapping
//! - Writers are serialized by a mutex, readers never take it
//! - Insertion order is kept for diagnostics
//! - Routes are never persisted; deactivation forgets them

pub mod matcher;
pub mod registry;
pub mod table;

pub use matcher::PrefixMatcher;
pub use registry::RouteEvent;
pub use table::{RouteEntry, RouteGeneration, RouteTable};
