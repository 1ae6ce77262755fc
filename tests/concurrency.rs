//! Concurrent dispatch while routes and filters change.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use serde_json::json;

use resource_router::{Method, Request, RouteEvent, RouterConfig, RouterService};

mod common;

#[test]
fn test_concurrent_creates_get_unique_ids() {
    let router = RouterService::default();
    router.on_route_event(RouteEvent::added("/users", common::echo()));
    let ids = Mutex::new(HashSet::new());

    thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                for _ in 0..125 {
                    let response = router.handle(Request::new(Method::Create, Some("/users/"))).unwrap();
                    let id = response["id"].as_str().unwrap().to_string();
                    ids.lock().unwrap().insert(id);
                }
            });
        }
    });

    assert_eq!(ids.lock().unwrap().len(), 1000);
}

#[test]
fn test_replace_is_atomic_for_readers() {
    let router = RouterService::default();
    router.on_route_event(RouteEvent::added("/users", common::named("v0")));
    let done = AtomicBool::new(false);

    thread::scope(|s| {
        s.spawn(|| {
            for i in 1..=200 {
                let name: &'static str = if i % 2 == 0 { "even" } else { "odd" };
                router.on_route_event(RouteEvent::replaced("/users", common::named(name)));
            }
            done.store(true, Ordering::SeqCst);
        });

        for _ in 0..4 {
            s.spawn(|| {
                while !done.load(Ordering::SeqCst) {
                    let response = router
                        .handle(Request::new(Method::Read, Some("/users/1")))
                        .expect("reader saw the route missing during replace");
                    let handler = response["handler"].as_str().unwrap();
                    assert!(matches!(handler, "v0" | "odd" | "even"));
                }
            });
        }
    });

    let response = router.handle(Request::new(Method::Read, Some("/users/1"))).unwrap();
    assert_eq!(response["handler"], "even");
    assert_eq!(router.routes(), vec!["/users".to_string()]);
}

#[test]
fn test_dispatch_during_reconfigure() {
    let router = RouterService::default();
    router.on_route_event(RouteEvent::added("/", common::echo()));
    let one: RouterConfig = serde_json::from_value(json!({ "filters": [{}] })).unwrap();
    let two: RouterConfig = serde_json::from_value(json!({ "filters": [{}, { "methods": ["read"] }] })).unwrap();
    let done = AtomicBool::new(false);

    thread::scope(|s| {
        s.spawn(|| {
            for i in 0..100 {
                assert!(router.reconfigure(if i % 2 == 0 { &one } else { &two }));
            }
            done.store(true, Ordering::SeqCst);
        });

        for _ in 0..4 {
            s.spawn(|| {
                while !done.load(Ordering::SeqCst) {
                    router.handle(Request::new(Method::Read, Some("/a"))).unwrap();
                }
            });
        }
    });

    assert_eq!(router.filter_count(), 2);
}

#[test]
fn test_each_concurrent_request_measured_once() {
    let (router, publisher) = common::recorded_router();
    router.on_route_event(RouteEvent::added("/items", common::echo()));

    thread::scope(|s| {
        for t in 0..4 {
            let router = &router;
            s.spawn(move || {
                for i in 0..50 {
                    let id = format!("/items/{}-{}", t, i);
                    router.handle(Request::new(Method::Read, Some(&id))).unwrap();
                }
            });
        }
    });

    assert_eq!(publisher.starts(), 200);
    assert_eq!(publisher.ends().len(), 200);
    assert!(publisher
        .ends()
        .iter()
        .all(|(name, _)| name == "router/internal/items/read"));
}
