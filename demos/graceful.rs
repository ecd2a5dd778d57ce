//! # Example: graceful
//!
//! A small "server" that runs until Ctrl-C / SIGTERM, then releases its resources
//! in reverse order of acquisition.
//!
//! Demonstrates how to:
//! - Construct a [`Service`] listening for termination signals.
//! - Attach the built-in [`LogWriter`] to print lifecycle events.
//! - Register shutdown hooks as resources are opened.
//! - Run named tasks with [`Service::spawn_fn`] and report the shutdown cause.
//!
//! ## Flow
//! ```text
//! Service::builder(cfg).with_subscribers([LogWriter]).build(parent)
//!     ├─► open "database"  ─► register hook "close database"
//!     ├─► open "listener"  ─► register hook "close listener"
//!     ├─► spawn "ticker"   (runs until cancelled)
//!     ├─► spawn "watchdog" (fails after --fail-after seconds, if set)
//!     └─► wait()
//!          ├─► Ctrl-C            ─► "received interrupt"
//!          ├─► watchdog failure  ─► "watchdog tripped"
//!          └─► hooks: close listener, close database
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example graceful --features logging
//! FAIL_AFTER=3 cargo run --example graceful --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use groupvisor::{Config, LogWriter, Service, Signal, Subscribe};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // 1. Configuration: shut down on Ctrl-C and SIGTERM
    let cfg = Config::default().with_signals([Signal::Interrupt, Signal::Terminate]);

    // 2. Print every lifecycle event
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];

    // 3. Build the service
    let (_token, svc) = Service::builder(cfg)
        .with_subscribers(subs)
        .build(&CancellationToken::new())
        .context("failed to set up signal handling")?;

    // 4. Acquire resources; release them in reverse order on shutdown
    for resource in ["database", "listener"] {
        tracing::info!(resource, "opened");
        svc.register_shutdown_hook(move || async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            tracing::info!(resource, "closed");
        })
        .await;
    }

    // 5. Long-running task
    svc.spawn_fn("ticker", |ctx: CancellationToken| async move {
        let mut tick = tokio::time::interval(Duration::from_secs(1));
        loop {
            tokio::select! {
                _ = ctx.cancelled() => return Ok::<_, anyhow::Error>(()),
                _ = tick.tick() => tracing::info!("tick"),
            }
        }
    });

    // 6. Optional failing task
    if let Some(secs) = std::env::var("FAIL_AFTER").ok().and_then(|v| v.parse().ok()) {
        svc.spawn_fn("watchdog", move |ctx: CancellationToken| async move {
            tokio::select! {
                _ = ctx.cancelled() => Ok(()),
                _ = tokio::time::sleep(Duration::from_secs(secs)) => {
                    Err(anyhow::anyhow!("watchdog tripped"))
                }
            }
        });
    }

    // 7. Wait for the cause
    match svc.wait().await {
        Ok(()) => tracing::info!("stopped"),
        Err(err) => tracing::info!(cause = %err, label = err.as_label(), "stopped"),
    }
    Ok(())
}
