//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Every routed request:
//!     → monitoring.rs (EventEntry started on entry, ended exactly once)
//!     → EventPublisher (metrics by default, pluggable)
//! ```
//!
//! # Design Decisions
//! - Structured logging through `tracing`
//! - Metrics are cheap (atomic increments); no recorder installed means no-ops
//! - Monitoring keys group CRUD by collection, query/action by full id

pub mod logging;
pub mod metrics;
pub mod monitoring;

pub use monitoring::{EventEntry, EventPublisher, MetricsPublisher, Outcome};
