//! Configuration file watcher for hot reload.
//!
//! Forwards every decodable change of the watched file. Filter validation
//! happens in the router when it rebuilds its chain, so a rejected reload is
//! reported once, by whoever owns the chain.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::read_config;
use crate::config::schema::RouterConfig;
use crate::observability::metrics;

/// Watches one configuration file and streams its new contents.
pub struct ConfigWatcher {
    path: PathBuf,
    updates: mpsc::UnboundedSender<RouterConfig>,
    last: Arc<Mutex<Option<RouterConfig>>>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiving end of its updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<RouterConfig>) {
        let (updates, rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            updates,
            last: Arc::new(Mutex::new(None)),
        };
        (watcher, rx)
    }

    /// Seed the watcher with the configuration already in effect, so an
    /// event that leaves the content unchanged is not forwarded.
    pub fn with_current(self, config: RouterConfig) -> Self {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(config);
        self
    }

    /// Start watching. Keep the returned watcher alive for updates to flow.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let ConfigWatcher { path, updates, last } = self;
        let watched = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    if touches(&event, &watched) {
                        reload(&watched, &updates, &last);
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&path, RecursiveMode::NonRecursive)?;
        tracing::info!(path = ?path, "Config watcher started");
        Ok(watcher)
    }
}

/// Events without paths come from backends that cannot tell; treat them as ours.
fn touches(event: &Event, path: &Path) -> bool {
    event.paths.is_empty() || event.paths.iter().any(|p| p.ends_with(path) || path.ends_with(p))
}

fn reload(
    path: &Path,
    updates: &mpsc::UnboundedSender<RouterConfig>,
    last: &Mutex<Option<RouterConfig>>,
) {
    let config = match read_config(path) {
        Ok(config) => config,
        Err(e) => {
            metrics::record_reload(false);
            tracing::warn!(path = ?path, error = %e, "Config file unreadable, keeping current configuration");
            return;
        }
    };

    let mut last = last.lock().unwrap_or_else(PoisonError::into_inner);
    if last.as_ref() == Some(&config) {
        tracing::debug!(path = ?path, "Config file event without content change");
        return;
    }
    tracing::info!(path = ?path, filters = config.filters.len(), "Config file changed");
    *last = Some(config.clone());
    if updates.send(config).is_err() {
        tracing::debug!("Config update receiver dropped");
    }
}
