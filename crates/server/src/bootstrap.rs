use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use goodday_core::capability::{CapabilityEngine, KeyError};
use goodday_core::config::{AppConfig, ConfigError};
use goodday_db::{connect_with_settings, migrations, DbPool, SqlReflectionRepository};
use goodday_slack::{SignatureError, SignatureVerifier, SlackApiError, SlackWebClient};
use thiserror::Error;
use tracing::info;

use crate::render::{HttpChartRenderer, RenderError};
use crate::state::{AppState, ImageLinks};
use crate::{health, images, slack_routes};

const SLACK_TIMEOUT_SECS: u64 = 10;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("signer setup failed: {0}")]
    Signer(#[from] KeyError),
    #[error("slack signature verifier setup failed: {0}")]
    SlackSignature(#[from] SignatureError),
    #[error("slack client setup failed: {0}")]
    SlackClient(#[from] SlackApiError),
    #[error("render client setup failed: {0}")]
    Renderer(#[from] RenderError),
}

impl Application {
    /// Every public route on one router: health, chart images and the Slack endpoints.
    pub fn router(&self) -> Router {
        Router::new()
            .merge(health::router(self.db_pool.clone()))
            .merge(images::router(self.state.clone()))
            .merge(slack_routes::router(self.state.clone()))
    }
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let engine = CapabilityEngine::new(&config.signer.signing_key()?)?;
    let slack = SlackWebClient::new(
        config.slack.api_base_url.clone(),
        config.slack.bot_token.clone(),
        Duration::from_secs(SLACK_TIMEOUT_SECS),
    )?;
    let state = AppState {
        engine,
        reflections: Arc::new(SqlReflectionRepository::new(db_pool.clone())),
        renderer: Arc::new(HttpChartRenderer::new(&config.render)?),
        slack: Arc::new(slack),
        verifier: SignatureVerifier::new(&config.slack.signing_secret)?,
        links: ImageLinks::from_config(&config.server, &config.signer),
    };
    info!(
        event_name = "system.bootstrap.collaborators_ready",
        render_url = %config.render.url,
        public_base_url = %config.server.public_base_url,
        "signer, slack client and renderer initialized"
    );

    Ok(Application { config, db_pool, state })
}
