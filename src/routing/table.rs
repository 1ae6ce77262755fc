//! Copy-on-write route table.
//!
//! # Responsibilities
//! - Map route prefixes to handlers
//! - Resolve a request id to the handler with the longest matching prefix
//! - Apply add / remove / replace as whole-generation swaps
//!
//! # Design Decisions
//! - Readers load an `Arc` snapshot through `ArcSwap` (lock-free)
//! - Writers hold `writer` while copying and swapping, so mutations form a total order
//! - `replace` swaps old handler for new in one generation: the prefix never resolves to nothing

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;

use crate::observability::metrics;
use crate::resource::{Handler, Request, ResourceError, Response};
use crate::routing::matcher::PrefixMatcher;

/// A single prefix route.
#[derive(Clone)]
pub struct RouteEntry {
    /// Prefix as registered.
    pub prefix: String,
    /// Handler serving requests under the prefix.
    pub handler: Arc<dyn Handler>,
    matcher: PrefixMatcher,
}

impl RouteEntry {
    pub fn new(prefix: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
        let prefix = prefix.into();
        Self {
            matcher: PrefixMatcher::new(prefix.as_str()),
            prefix,
            handler,
        }
    }

    pub fn matcher(&self) -> &PrefixMatcher {
        &self.matcher
    }
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

/// One immutable snapshot of the route table.
#[derive(Debug, Clone, Default)]
pub struct RouteGeneration {
    entries: Vec<RouteEntry>,
}

impl RouteGeneration {
    /// Find the entry with the longest prefix matching `id`.
    /// On equal length the entry later in table order wins.
    pub fn resolve(&self, id: Option<&str>) -> Option<&RouteEntry> {
        let mut best: Option<&RouteEntry> = None;
        for entry in &self.entries {
            if !entry.matcher.matches(id) {
                continue;
            }
            match best {
                Some(b) if b.matcher.specificity() > entry.matcher.specificity() => {}
                _ => best = Some(entry),
            }
        }
        best
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn prefixes(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.prefix.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, prefix: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.prefix == prefix)
    }
}

/// Route table shared between the dispatch path and the registry listener.
pub struct RouteTable {
    current: ArcSwap<RouteGeneration>,
    writer: Mutex<()>,
}

impl RouteTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(RouteGeneration::default()),
            writer: Mutex::new(()),
        }
    }

    /// Current generation. The snapshot stays valid while held.
    pub fn snapshot(&self) -> Arc<RouteGeneration> {
        self.current.load_full()
    }

    /// Resolve an id to its handler.
    pub fn resolve(&self, id: Option<&str>) -> Result<Arc<dyn Handler>, ResourceError> {
        let generation = self.current.load();
        generation
            .resolve(id)
            .map(|entry| entry.handler.clone())
            .ok_or_else(|| ResourceError::not_found(id.unwrap_or_default().to_string()))
    }

    /// Add a route. An existing prefix keeps its position and gets the new handler.
    pub fn add(&self, prefix: &str, handler: Arc<dyn Handler>) {
        self.mutate("add", |generation| match generation.position(prefix) {
            Some(i) => generation.entries[i] = RouteEntry::new(prefix, handler),
            None => generation.entries.push(RouteEntry::new(prefix, handler)),
        });
    }

    /// Remove a route. Removing an absent prefix is a no-op.
    pub fn remove(&self, prefix: &str) {
        self.mutate("remove", |generation| {
            generation.entries.retain(|e| e.prefix != prefix);
        });
    }

    /// Replace a route's handler in a single swap; the prefix moves to the end.
    pub fn replace(&self, prefix: &str, handler: Arc<dyn Handler>) {
        self.mutate("replace", |generation| {
            generation.entries.retain(|e| e.prefix != prefix);
            generation.entries.push(RouteEntry::new(prefix, handler));
        });
    }

    /// Forget every route.
    pub fn clear(&self) {
        self.mutate("clear", |generation| generation.entries.clear());
    }

    pub fn prefixes(&self) -> Vec<String> {
        self.current.load().prefixes()
    }

    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }

    fn mutate<F>(&self, kind: &'static str, apply: F)
    where
        F: FnOnce(&mut RouteGeneration),
    {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = RouteGeneration::clone(&self.current.load());
        apply(&mut next);
        let prefixes = next.prefixes();
        self.current.store(Arc::new(next));

        tracing::debug!(change = kind, routes = ?prefixes, "Routes state after change");
        metrics::record_route_change(kind);
        metrics::record_route_count(prefixes.len());
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTable")
            .field("routes", &self.prefixes())
            .finish()
    }
}

/// The table is the terminal link of the filter chain.
impl Handler for RouteTable {
    fn handle(&self, request: Request) -> Result<Response, ResourceError> {
        let handler = self.resolve(request.id())?;
        handler.handle(request)
    }
}
