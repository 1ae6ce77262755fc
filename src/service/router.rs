//! Router service façade.
//!
//! # Responsibilities
//! - Own the route table and the current filter chain
//! - Drive each request through id assignment, monitoring and dispatch
//! - Normalize every failure into the resource error taxonomy
//! - Apply registry events and configuration changes at runtime

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::config::loader::ConfigError;
use crate::config::schema::RouterConfig;
use crate::config::validation::validate_filters;
use crate::filter::FilterChain;
use crate::observability::metrics;
use crate::observability::monitoring::{
    event_name, EventEntry, EventPublisher, MetricsPublisher, Outcome, INVALID_REQUEST_EVENT,
};
use crate::resource::{Handler, Request, ResourceError, Response};
use crate::routing::{registry, RouteEvent, RouteTable};
use crate::script::{DefaultScopeFactory, ScopeFactory, ScriptFactory, ScriptRegistry};
use crate::service::ids::assign_id;

/// Outcome counts of a config update loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReloadStats {
    pub applied: usize,
    pub rejected: usize,
}

/// Internal request router.
///
/// Shared via `Arc`; every method takes `&self`.
pub struct RouterService {
    routes: Arc<RouteTable>,
    chain: ArcSwap<FilterChain>,
    scopes: Arc<dyn ScopeFactory>,
    scripts: Arc<dyn ScriptFactory>,
    publisher: Arc<dyn EventPublisher>,
    /// Serializes reconfigurations so the last one applied wins.
    reconfigure_lock: Mutex<()>,
}

impl RouterService {
    /// Create a router with no routes and no filters.
    pub fn new(scopes: Arc<dyn ScopeFactory>, scripts: Arc<dyn ScriptFactory>) -> Self {
        let routes = Arc::new(RouteTable::new());
        let chain = FilterChain::new(routes.clone(), scopes.clone());
        Self {
            routes,
            chain: ArcSwap::from_pointee(chain),
            scopes,
            scripts,
            publisher: Arc::new(MetricsPublisher::default()),
            reconfigure_lock: Mutex::new(()),
        }
    }

    /// Replace the monitoring publisher.
    pub fn with_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publisher = publisher;
        self
    }

    /// Install the initial configuration. Bad configuration leaves the
    /// router up with no filters.
    pub fn activate(&self, config: Option<&RouterConfig>) {
        tracing::info!(filters = config.map(|c| c.filters.len()).unwrap_or(0), "Activate router configuration");
        if let Some(config) = config {
            self.reconfigure(config);
        }
    }

    /// Forget every route and filter.
    pub fn deactivate(&self) {
        let _guard = self.reconfigure_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.chain.store(Arc::new(FilterChain::new(self.routes.clone(), self.scopes.clone())));
        self.routes.clear();
        tracing::info!("Router deactivated");
    }

    /// Build a new filter chain from `config` and swap it in.
    ///
    /// Returns false, keeping the current chain, if any filter is invalid.
    pub fn reconfigure(&self, config: &RouterConfig) -> bool {
        let _guard = self.reconfigure_lock.lock().unwrap_or_else(PoisonError::into_inner);
        match self.build_chain(config) {
            Ok(chain) => {
                let filters = chain.len();
                self.chain.store(Arc::new(chain));
                metrics::record_reload(true);
                tracing::info!(filters, "Router filter chain installed");
                true
            }
            Err(e) => {
                metrics::record_reload(false);
                tracing::warn!(error = %e, "Router configuration error, keeping current filter chain");
                false
            }
        }
    }

    /// Reconfigure from a raw configuration structure.
    pub fn reconfigure_value(&self, config: &Value) -> bool {
        match serde_json::from_value::<RouterConfig>(config.clone()) {
            Ok(config) => self.reconfigure(&config),
            Err(e) => {
                metrics::record_reload(false);
                tracing::warn!(error = %e, "Router configuration error, keeping current filter chain");
                false
            }
        }
    }

    fn build_chain(&self, config: &RouterConfig) -> Result<FilterChain, ConfigError> {
        validate_filters(&config.filters).map_err(ConfigError::Validation)?;
        FilterChain::from_config(config, self.routes.clone(), self.scopes.clone(), self.scripts.as_ref())
    }

    /// Apply one registry notification to the route table.
    pub fn on_route_event(&self, event: RouteEvent) {
        event.apply(&self.routes);
    }

    /// Consume registry notifications on a background task.
    pub fn spawn_registry_listener(
        &self,
        events: mpsc::UnboundedReceiver<RouteEvent>,
        shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        registry::spawn_listener(self.routes.clone(), events, shutdown)
    }

    /// Apply configuration updates until the channel closes or shutdown fires.
    /// Returns how many updates were installed and how many were rejected.
    pub async fn run_config_updates(
        &self,
        mut updates: mpsc::UnboundedReceiver<RouterConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> ReloadStats {
        let mut stats = ReloadStats::default();
        loop {
            tokio::select! {
                update = updates.recv() => match update {
                    Some(config) => {
                        if self.reconfigure(&config) {
                            stats.applied += 1;
                        } else {
                            stats.rejected += 1;
                        }
                    }
                    None => break,
                },
                _ = shutdown.recv() => {
                    tracing::info!("Config update loop received shutdown signal, exiting loop");
                    break;
                }
            }
        }
        tracing::info!(applied = stats.applied, rejected = stats.rejected, "Config update loop stopped");
        stats
    }

    pub fn route_table(&self) -> &Arc<RouteTable> {
        &self.routes
    }

    /// Route prefixes in table order.
    pub fn routes(&self) -> Vec<String> {
        self.routes.prefixes()
    }

    /// Filters in the current chain.
    pub fn filter_count(&self) -> usize {
        self.chain.load().len()
    }

    /// Handle one request end to end.
    pub fn handle(&self, mut request: Request) -> Result<Response, ResourceError> {
        let method = match request.method() {
            Ok(method) => method,
            Err(err) => {
                let mut measure = EventEntry::start(self.publisher.as_ref(), INVALID_REQUEST_EVENT.to_string());
                measure.set_result(Outcome::ResourceError(err.code()));
                tracing::trace!(method = ?request.method_str(), error = %err, "Rejected request without a valid method");
                return Err(err);
            }
        };
        assign_id(method, &mut request);
        let id = request.id().map(str::to_string);

        let mut measure = EventEntry::start(self.publisher.as_ref(), event_name(method, id.as_deref()));
        // The chain is pinned for the whole request.
        let chain = self.chain.load_full();

        let result = panic::catch_unwind(AssertUnwindSafe(|| chain.dispatch(request)));
        let outcome = match result {
            Ok(Ok(response)) => {
                measure.set_result(Outcome::Success);
                tracing::trace!(method = %method, id = ?id, response = %response, "Request handled");
                Ok(response)
            }
            Ok(Err(err)) => {
                measure.set_result(Outcome::ResourceError(err.code()));
                if err.is_server_error() {
                    tracing::warn!(method = %method, id = ?id, error = %err, "JSON resource exception");
                } else {
                    tracing::trace!(method = %method, id = ?id, error = %err, "Resource exception processing request");
                }
                Err(err)
            }
            Err(fault) => {
                measure.set_result(Outcome::InternalFailure);
                tracing::warn!(
                    method = %method,
                    id = ?id,
                    fault = %fault_message(&*fault),
                    "Uncaught fault processing request"
                );
                Err(ResourceError::internal())
            }
        };
        measure.end();
        outcome
    }
}

impl Default for RouterService {
    fn default() -> Self {
        Self::new(Arc::new(DefaultScopeFactory::new()), Arc::new(ScriptRegistry::new()))
    }
}

impl Handler for RouterService {
    fn handle(&self, request: Request) -> Result<Response, ResourceError> {
        RouterService::handle(self, request)
    }
}

impl fmt::Debug for RouterService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterService")
            .field("routes", &self.routes)
            .field("filters", &self.filter_count())
            .finish_non_exhaustive()
    }
}

fn fault_message(fault: &(dyn Any + Send)) -> &str {
    if let Some(s) = fault.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = fault.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{handler_fn, Method};
    use serde_json::json;

    fn echo() -> Arc<dyn Handler> {
        Arc::new(handler_fn(|req: Request| Ok(req.into_value())))
    }

    #[test]
    fn test_dispatch_to_route() {
        let router = RouterService::default();
        router.on_route_event(RouteEvent::added("/users", echo()));

        let response = router.handle(Request::new(Method::Read, Some("/users/1"))).unwrap();
        assert_eq!(response["id"], "/users/1");
    }

    #[test]
    fn test_not_found_without_route() {
        let router = RouterService::default();
        let err = router.handle(Request::new(Method::Read, Some("/users/1"))).unwrap_err();
        assert_eq!(err.code(), 404);
    }

    #[test]
    fn test_missing_method() {
        let router = RouterService::default();
        let request = Request::from_value(json!({"id": "/users/1"})).unwrap();
        assert_eq!(router.handle(request).unwrap_err().code(), 400);
    }

    #[test]
    fn test_create_assigns_id() {
        let router = RouterService::default();
        router.on_route_event(RouteEvent::added("/users", echo()));

        let response = router.handle(Request::new(Method::Create, Some("/users/"))).unwrap();
        let id = response["id"].as_str().unwrap();
        assert!(id.starts_with("/users/"));
        assert!(id.len() > "/users/".len());
    }

    #[test]
    fn test_panic_becomes_internal_error() {
        let router = RouterService::default();
        router.on_route_event(RouteEvent::added(
            "/",
            Arc::new(handler_fn(|_| panic!("secret detail"))),
        ));

        let err = router.handle(Request::new(Method::Read, Some("/x"))).unwrap_err();
        assert_eq!(err, ResourceError::internal());
        assert!(!err.to_string().contains("secret"));
    }

    #[test]
    fn test_bad_reconfigure_keeps_chain() {
        let router = RouterService::default();
        let good: RouterConfig = serde_json::from_value(json!({"filters": [{"methods": ["read"]}]})).unwrap();
        assert!(router.reconfigure(&good));
        assert_eq!(router.filter_count(), 1);

        assert!(!router.reconfigure_value(&json!({"filters": [{"pattern": "("}]})));
        assert!(!router.reconfigure_value(&json!({"filters": "not a list"})));
        assert_eq!(router.filter_count(), 1);
    }

    #[test]
    fn test_reconfigure_ignores_observability_settings() {
        let router = RouterService::default();
        let config: RouterConfig = serde_json::from_value(json!({
            "filters": [{"methods": ["read"]}],
            "observability": {"metrics_enabled": true, "metrics_address": "not-an-address"}
        }))
        .unwrap();

        assert!(router.reconfigure(&config));
        assert_eq!(router.filter_count(), 1);
    }

    #[test]
    fn test_deactivate_forgets_everything() {
        let router = RouterService::default();
        router.on_route_event(RouteEvent::added("/users", echo()));
        router.activate(Some(&serde_json::from_value(json!({"filters": [{}]})).unwrap()));
        assert_eq!(router.filter_count(), 1);

        router.deactivate();

        assert!(router.routes().is_empty());
        assert_eq!(router.filter_count(), 0);
    }

    #[test]
    fn test_activate_without_config() {
        let router = RouterService::default();
        router.activate(None);
        assert_eq!(router.filter_count(), 0);
    }
}
