//! Resource router host.
//!
//! Reads newline-delimited JSON requests from stdin, routes each through
//! the filter chain and writes one JSON line per response to stdout.
//!
//! ```text
//!   stdin ──▶ RouterService ──▶ filter chain ──▶ route table ──▶ handler
//!                 ▲                  ▲                ▲
//!                 │                  │                │
//!          monitoring          config watcher     echo route
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use resource_router::config::{load_or_default, ConfigWatcher};
use resource_router::observability::{logging, metrics};
use resource_router::resource::handler_fn;
use resource_router::{Request, ResourceError, RouteEvent, RouterService, Shutdown};

#[derive(Parser)]
#[command(name = "resource-router")]
#[command(about = "Internal resource router reading JSON requests from stdin", long_about = None)]
struct Cli {
    /// Filter configuration file (TOML or JSON). Watched for changes.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let (config, problem) = load_or_default(cli.config.as_deref());

    let level = cli.log_level.as_deref().unwrap_or(&config.observability.log_level);
    logging::init_logging(level);
    tracing::info!("resource-router v{} starting", env!("CARGO_PKG_VERSION"));
    if let Some(e) = &problem {
        tracing::warn!(path = ?cli.config, error = %e, "Router configuration error");
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let router = Arc::new(RouterService::default());
    router.activate(Some(&config));

    // Registered before any input is read so the first request can be routed.
    router.on_route_event(RouteEvent::added(
        "/",
        Arc::new(handler_fn(|request: Request| Ok(json!({ "echo": request.into_value() })))),
    ));

    let _watcher = match &cli.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            let router = router.clone();
            let rx = shutdown.subscribe();
            tokio::spawn(async move { router.run_config_updates(updates, rx).await });
            match watcher.with_current(config.clone()).run() {
                Ok(watcher) => Some(watcher),
                Err(e) => {
                    tracing::warn!(path = ?path, error = %e, "Config watcher not started, hot reload disabled");
                    None
                }
            }
        }
        None => None,
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                let reply = respond(router.clone(), &line).await;
                stdout.write_all(format!("{}\n", reply).as_bytes()).await?;
                stdout.flush().await?;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl+C, initiating shutdown");
                break;
            }
        }
    }

    shutdown.trigger();
    router.deactivate();

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Route one input line and render the reply.
async fn respond(router: Arc<RouterService>, line: &str) -> Value {
    let request = match serde_json::from_str::<Value>(line) {
        Ok(value) => value,
        Err(e) => return ResourceError::bad_request(e.to_string()).to_json(),
    };

    let result = tokio::task::spawn_blocking(move || {
        Request::from_value(request).and_then(|request| router.handle(request))
    })
    .await;

    match result {
        Ok(Ok(response)) => response,
        Ok(Err(err)) => err.to_json(),
        Err(e) => {
            tracing::error!(error = %e, "Dispatch task failed");
            ResourceError::internal().to_json()
        }
    }
}
