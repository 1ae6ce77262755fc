//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config (defaults on failure) → Init logging/metrics → Activate router
//!     → Register echo route → Start config watcher → Serve requests
//!
//! Shutdown (shutdown.rs):
//!     Input closed or Ctrl+C → trigger → background tasks exit → deactivate router
//! ```
//!
//! # Design Decisions
//! - One broadcast signal shared by every background task
//! - Deactivation forgets routes; nothing is persisted

pub mod shutdown;

pub use shutdown::Shutdown;
