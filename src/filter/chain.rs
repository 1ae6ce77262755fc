//! Ordered filter chain wrapping a terminal handler.

use std::fmt;
use std::sync::Arc;

use crate::config::loader::ConfigError;
use crate::config::schema::RouterConfig;
use crate::filter::filter::Filter;
use crate::resource::{Handler, Request, ResourceError, Response};
use crate::script::{ScopeFactory, ScriptFactory};

/// An immutable sequence of filters in front of a terminal handler.
///
/// Each filter wraps the rest of the chain, so hooks nest. Dispatch is
/// synchronous on the caller's thread.
pub struct FilterChain {
    filters: Vec<Filter>,
    terminal: Arc<dyn Handler>,
    scopes: Arc<dyn ScopeFactory>,
}

impl FilterChain {
    /// A chain with no filters: requests go straight to `terminal`.
    pub fn new(terminal: Arc<dyn Handler>, scopes: Arc<dyn ScopeFactory>) -> Self {
        Self::with_filters(Vec::new(), terminal, scopes)
    }

    pub fn with_filters(
        filters: Vec<Filter>,
        terminal: Arc<dyn Handler>,
        scopes: Arc<dyn ScopeFactory>,
    ) -> Self {
        Self {
            filters,
            terminal,
            scopes,
        }
    }

    /// Build a chain from configuration, filters in declared order.
    /// Fails on the first filter that cannot be built.
    pub fn from_config(
        config: &RouterConfig,
        terminal: Arc<dyn Handler>,
        scopes: Arc<dyn ScopeFactory>,
        scripts: &dyn ScriptFactory,
    ) -> Result<Self, ConfigError> {
        let filters = config
            .filters
            .iter()
            .enumerate()
            .map(|(i, fc)| Filter::from_config(&format!("/filters/{}", i), fc, scripts))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::with_filters(filters, terminal, scopes))
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Run the request through every filter and the terminal handler.
    pub fn dispatch(&self, request: Request) -> Result<Response, ResourceError> {
        self.dispatch_from(0, request)
    }

    fn dispatch_from(&self, index: usize, request: Request) -> Result<Response, ResourceError> {
        match self.filters.get(index) {
            Some(filter) => filter.filter(request, self.scopes.as_ref(), |next| {
                self.dispatch_from(index + 1, next)
            }),
            None => self.terminal.handle(request),
        }
    }
}

impl Handler for FilterChain {
    fn handle(&self, request: Request) -> Result<Response, ResourceError> {
        self.dispatch(request)
    }
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterChain")
            .field("filters", &self.filters)
            .finish_non_exhaustive()
    }
}
