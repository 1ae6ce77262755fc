//! Shared utilities for router integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};

use resource_router::observability::{EventPublisher, Outcome};
use resource_router::resource::handler_fn;
use resource_router::script::{script_fn, Script};
use resource_router::{Handler, Request, RouterService};

pub type Log = Arc<Mutex<Vec<String>>>;

/// Handler answering with its own name and the id it saw.
pub fn named(name: &'static str) -> Arc<dyn Handler> {
    Arc::new(handler_fn(move |request: Request| {
        Ok(json!({ "handler": name, "id": request.id() }))
    }))
}

/// Handler answering with the full request it received.
pub fn echo() -> Arc<dyn Handler> {
    Arc::new(handler_fn(|request: Request| Ok(request.into_value())))
}

/// Script appending `entry` to `log` and yielding null.
pub fn recording(log: &Log, entry: &str) -> Arc<dyn Script> {
    let log = log.clone();
    let entry = entry.to_string();
    Arc::new(script_fn(move |_| {
        log.lock().unwrap().push(entry.clone());
        Ok(Value::Null)
    }))
}

/// A measurement as seen by [`RecordingPublisher`].
#[derive(Debug, Clone, PartialEq)]
pub enum Measured {
    Start(String),
    End(String, Option<Outcome>),
}

/// Publisher keeping every start and end it receives.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<Measured>>,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<Measured> {
        self.events.lock().unwrap().clone()
    }

    pub fn ends(&self) -> Vec<(String, Option<Outcome>)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Measured::End(name, outcome) => Some((name, outcome)),
                Measured::Start(_) => None,
            })
            .collect()
    }

    pub fn starts(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Measured::Start(_)))
            .count()
    }
}

impl EventPublisher for RecordingPublisher {
    fn start(&self, name: &str) {
        self.events.lock().unwrap().push(Measured::Start(name.to_string()));
    }

    fn end(&self, name: &str, outcome: Option<Outcome>, _elapsed: Duration) {
        self.events.lock().unwrap().push(Measured::End(name.to_string(), outcome));
    }
}

/// Router reporting to a fresh recording publisher.
pub fn recorded_router() -> (RouterService, Arc<RecordingPublisher>) {
    let publisher = Arc::new(RecordingPublisher::default());
    let router = RouterService::default().with_publisher(publisher.clone());
    (router, publisher)
}
