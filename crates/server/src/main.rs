mod bootstrap;
mod errors;
mod health;
mod images;
mod render;
mod slack_routes;
mod state;

use std::time::Duration;

use anyhow::Result;
use goodday_core::config::{AppConfig, LoadOptions};
use tracing_subscriber::EnvFilter;

fn init_logging(config: &AppConfig) {
    use goodday_core::config::LogFormat::*;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.trim().to_ascii_lowercase()));
    let builder = tracing_subscriber::fmt().with_target(false).with_env_filter(filter);

    match config.logging.format {
        Compact => builder.compact().init(),
        Pretty => builder.pretty().init(),
        Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Logging needs the loaded config, so config errors surface through anyhow only.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;
    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!(
        event_name = "system.server.started",
        bind_address = %address,
        public_base_url = %app.config.server.public_base_url,
        "goodday-server listening"
    );

    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    axum::serve(listener, app.router()).with_graceful_shutdown(wait_for_shutdown(grace)).await?;

    tracing::info!(event_name = "system.server.stopping", "goodday-server stopping");
    app.db_pool.close().await;

    Ok(())
}

async fn wait_for_shutdown(grace: Duration) {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(
            event_name = "system.server.signal_error",
            error = %error,
            "failed to listen for shutdown signal"
        );
        return;
    }
    tracing::info!(
        event_name = "system.server.draining",
        grace_secs = grace.as_secs(),
        "shutdown requested; draining in-flight requests"
    );
    // Hard stop once the grace period elapses.
    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        tracing::warn!(event_name = "system.server.forced_exit", "graceful shutdown timed out");
        std::process::exit(1);
    });
}
