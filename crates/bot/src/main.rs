//! Shop assistant entry point.

mod config;
mod driver;

use std::sync::Arc;
use std::time::Duration;

use common::MessageId;
use engine::Router;
use store::{CartStore, CatalogStore, IdentityStore, InMemoryStores, SqliteStores};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use config::Config;
use driver::{TracingChannel, parse_line};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Runs the event loop over the chosen store backend.
async fn run<S>(stores: Arc<S>, config: &Config)
where
    S: CatalogStore + CartStore + IdentityStore + 'static,
{
    let channel = Arc::new(TracingChannel::new());
    let router = Arc::new(Router::new(
        Arc::clone(&stores),
        Arc::clone(&stores),
        Arc::clone(&stores),
        channel,
        config.router_config(),
    ));

    if config.idle_reap_secs > 0 {
        let registry = router.registry().clone();
        let max_idle = Duration::from_secs(config.idle_reap_secs);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(max_idle);
            tick.tick().await; // the first tick completes immediately
            loop {
                tick.tick().await;
                let reaped = registry.reap_idle(max_idle);
                if reaped > 0 {
                    tracing::info!(reaped, "reaped idle conversations");
                }
            }
        });
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut next_message_id = 0i64;
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => break,
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    next_message_id += 1;
                    let message_id = MessageId::new(next_message_id);
                    let Some(event) = parse_line(&line, message_id, &config.operators) else {
                        continue;
                    };
                    // concurrent users proceed independently; the router
                    // serializes events per user internally
                    let router = Arc::clone(&router);
                    tokio::spawn(async move {
                        if let Err(err) = router.handle(event).await {
                            tracing::error!(error = %err, "event dispatch failed");
                        }
                    });
                }
                Ok(None) => {
                    tracing::info!("input closed, shutting down");
                    break;
                }
                Err(err) => {
                    tracing::error!(error = %err, "input read failed");
                    break;
                }
            }
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!(
        operators = config.operators.len(),
        idle_reap_secs = config.idle_reap_secs,
        "starting shop assistant"
    );

    match config.database_url.clone() {
        Some(url) => {
            let stores = SqliteStores::connect(&url)
                .await
                .expect("database connection failed");
            tracing::info!("using SQLite store");
            run(Arc::new(stores), &config).await;
        }
        None => {
            tracing::info!("DATABASE_URL unset, using in-memory stores");
            run(Arc::new(InMemoryStores::new()), &config).await;
        }
    }

    tracing::info!("shut down gracefully");
}
