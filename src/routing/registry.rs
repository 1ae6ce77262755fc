//! Service registry events driving route table membership.
//!
//! # Responsibilities
//! - Describe handler availability changes announced by the registry
//! - Apply each change to the route table
//! - Consume events from a channel on a single task
//!
//! # Design Decisions
//! - A notification without a handler is logged and ignored, never fatal
//! - Events are applied in arrival order by one consumer

use std::fmt;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::resource::Handler;
use crate::routing::table::RouteTable;

/// A change in handler availability for a prefix.
#[derive(Clone)]
pub enum RouteEvent {
    /// A handler became available.
    Added {
        prefix: String,
        handler: Option<Arc<dyn Handler>>,
    },
    /// The handler for a prefix went away.
    Removed { prefix: String },
    /// The handler for a prefix was swapped for another.
    Replaced {
        prefix: String,
        handler: Option<Arc<dyn Handler>>,
    },
}

impl RouteEvent {
    pub fn added(prefix: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
        RouteEvent::Added {
            prefix: prefix.into(),
            handler: Some(handler),
        }
    }

    pub fn removed(prefix: impl Into<String>) -> Self {
        RouteEvent::Removed {
            prefix: prefix.into(),
        }
    }

    pub fn replaced(prefix: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
        RouteEvent::Replaced {
            prefix: prefix.into(),
            handler: Some(handler),
        }
    }

    pub fn prefix(&self) -> &str {
        match self {
            RouteEvent::Added { prefix, .. }
            | RouteEvent::Removed { prefix }
            | RouteEvent::Replaced { prefix, .. } => prefix,
        }
    }

    /// Apply this event to the table.
    pub fn apply(self, table: &RouteTable) {
        match self {
            RouteEvent::Added { prefix, handler } => match handler {
                Some(handler) => {
                    table.add(&prefix, handler);
                    tracing::debug!(prefix = %prefix, "Added route");
                }
                None => {
                    tracing::warn!(prefix = %prefix, "Registry announced added route without a handler, ignoring");
                }
            },
            RouteEvent::Removed { prefix } => {
                table.remove(&prefix);
                tracing::debug!(prefix = %prefix, "Removed route");
            }
            RouteEvent::Replaced { prefix, handler } => match handler {
                Some(handler) => {
                    table.replace(&prefix, handler);
                    tracing::debug!(prefix = %prefix, "Replaced route");
                }
                None => {
                    tracing::warn!(prefix = %prefix, "Registry announced replaced route without a handler, ignoring");
                }
            },
        }
    }
}

impl fmt::Debug for RouteEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (kind, has_handler) = match self {
            RouteEvent::Added { handler, .. } => ("Added", handler.is_some()),
            RouteEvent::Removed { .. } => ("Removed", false),
            RouteEvent::Replaced { handler, .. } => ("Replaced", handler.is_some()),
        };
        f.debug_struct(kind)
            .field("prefix", &self.prefix())
            .field("handler", &has_handler)
            .finish()
    }
}

/// Spawn the task applying registry events to `table`.
///
/// Runs until the sender side is dropped or shutdown is signalled.
pub fn spawn_listener(
    table: Arc<RouteTable>,
    mut events: mpsc::UnboundedReceiver<RouteEvent>,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!("Registry listener started");
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => event.apply(&table),
                    None => {
                        tracing::info!("Registry channel closed, listener exiting");
                        break;
                    }
                },
                _ = shutdown.recv() => {
                    tracing::info!("Registry listener received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    })
}
