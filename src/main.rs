//! HTTP server for the travel allowance engine.
//!
//! Reads `TRAVEL_ALLOWANCE_CONFIG` (rate schedule directory) and
//! `TRAVEL_ALLOWANCE_BIND` (listen address) from the environment.

use std::env;
use std::error::Error;
use std::net::SocketAddr;

use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use travel_allowance_engine::api::{AppState, create_router};
use travel_allowance_engine::config::ConfigLoader;

const DEFAULT_CONFIG_DIR: &str = "./config/at-2025";
const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

fn init_telemetry() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_telemetry();

    let config_dir =
        env::var("TRAVEL_ALLOWANCE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_DIR.to_string());
    let config = ConfigLoader::load(&config_dir)?;
    info!(
        config_dir = %config_dir,
        schedule = %config.schedule().code,
        tables = config.tables().len(),
        "rate schedule loaded"
    );

    let router = create_router(AppState::new(config));

    let addr: SocketAddr = env::var("TRAVEL_ALLOWANCE_BIND")
        .unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string())
        .parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "starting travel allowance api");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = ?err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = ?err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
