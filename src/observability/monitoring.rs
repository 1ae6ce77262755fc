//! Per-request monitoring measurements.
//!
//! # Responsibilities
//! - Derive the event key for a request
//! - Time each request from entry to outcome
//! - Publish exactly one end per started measurement
//!
//! # Design Decisions
//! - Measurements are owned by the request's call path, never shared
//! - `EventEntry` ends itself on drop, so an unwinding dispatch still closes it
//! - Publishing goes through a trait so hosts can route it elsewhere

use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::observability::metrics;
use crate::resource::{Method, ID_SEPARATOR};

/// Namespace prefix of router event keys.
pub const EVENT_ROUTER_PREFIX: &str = "router/internal/";

/// Result attached to a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// Typed failure with its numeric code.
    ResourceError(u16),
    /// Untyped fault converted to an internal error.
    InternalFailure,
}

impl Outcome {
    pub fn as_label(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::ResourceError(code) if (500..=599).contains(code) => "server_error",
            Outcome::ResourceError(_) => "client_error",
            Outcome::InternalFailure => "internal_failure",
        }
    }
}

/// Receives measurement start and end notifications.
pub trait EventPublisher: Send + Sync {
    fn start(&self, name: &str);
    fn end(&self, name: &str, outcome: Option<Outcome>, elapsed: Duration);
}

/// Event key for requests rejected before a method is known.
pub const INVALID_REQUEST_EVENT: &str = "router/internal/invalid";

/// Label used once the distinct event key limit is reached.
pub const OVERFLOW_EVENT: &str = "router/internal/overflow";

/// Distinct event keys exported before new keys collapse into [`OVERFLOW_EVENT`].
pub const DEFAULT_MAX_EVENT_LABELS: usize = 1000;

/// Publisher forwarding measurements to the `metrics` facade.
///
/// Query and action keys carry full ids, so the set of exported event
/// labels is bounded. The bound is approximate under concurrent first use.
#[derive(Debug)]
pub struct MetricsPublisher {
    labels: DashMap<String, ()>,
    max_labels: usize,
}

impl MetricsPublisher {
    pub fn with_max_labels(max_labels: usize) -> Self {
        Self {
            labels: DashMap::new(),
            max_labels,
        }
    }

    /// Label exported for `name`: the key itself while under the limit.
    pub fn label_for<'a>(&self, name: &'a str) -> &'a str {
        if self.labels.contains_key(name) {
            return name;
        }
        if self.labels.len() >= self.max_labels {
            return OVERFLOW_EVENT;
        }
        self.labels.insert(name.to_string(), ());
        name
    }
}

impl Default for MetricsPublisher {
    fn default() -> Self {
        Self::with_max_labels(DEFAULT_MAX_EVENT_LABELS)
    }
}

impl EventPublisher for MetricsPublisher {
    fn start(&self, _name: &str) {
        metrics::record_request_started();
    }

    fn end(&self, name: &str, outcome: Option<Outcome>, elapsed: Duration) {
        let label = outcome.map(|o| o.as_label()).unwrap_or("unknown");
        metrics::record_request(self.label_for(name), label, elapsed);
    }
}

/// Derive the event key for a request.
///
/// Query and action keep the full id; other methods drop the last id
/// segment so statistics group by collection.
pub fn event_name(method: Method, id: Option<&str>) -> String {
    let id = id.unwrap_or_default();
    let context = match method {
        Method::Query | Method::Action => id,
        _ => strip_last_id(id),
    };
    format!(
        "{}{}{}{}",
        EVENT_ROUTER_PREFIX,
        context.trim_start_matches(ID_SEPARATOR),
        ID_SEPARATOR,
        method
    )
}

/// Strip the local resource id from a qualified id.
fn strip_last_id(id: &str) -> &str {
    match id.rfind(ID_SEPARATOR) {
        Some(i) => &id[..i],
        None => id,
    }
}

/// One running measurement.
pub struct EventEntry<'a> {
    name: String,
    publisher: &'a dyn EventPublisher,
    started: Instant,
    outcome: Option<Outcome>,
    ended: bool,
}

impl<'a> EventEntry<'a> {
    /// Start a measurement under `name`.
    pub fn start(publisher: &'a dyn EventPublisher, name: String) -> Self {
        publisher.start(&name);
        Self {
            name,
            publisher,
            started: Instant::now(),
            outcome: None,
            ended: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_result(&mut self, outcome: Outcome) {
        self.outcome = Some(outcome);
    }

    /// End the measurement. Later calls, and the drop, do nothing.
    pub fn end(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;
        self.publisher.end(&self.name, self.outcome, self.started.elapsed());
    }
}

impl Drop for EventEntry<'_> {
    fn drop(&mut self) {
        self.end();
    }
}
