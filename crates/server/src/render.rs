use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use thiserror::Error;

use goodday_core::config::RenderConfig;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("render service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("render service returned an empty image")]
    Empty,
}

/// Turns a declarative ECharts option into encoded image bytes.
#[async_trait]
pub trait ChartRenderer: Send + Sync {
    async fn render(&self, option: &Value) -> Result<Vec<u8>, RenderError>;
}

/// Posts chart options to the external render service.
pub struct HttpChartRenderer {
    http: Client,
    url: String,
    bearer_token: Option<SecretString>,
}

impl std::fmt::Debug for HttpChartRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpChartRenderer").field("url", &self.url).finish_non_exhaustive()
    }
}

impl HttpChartRenderer {
    pub fn new(config: &RenderConfig) -> Result<Self, RenderError> {
        let http = Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
        Ok(Self { http, url: config.url.clone(), bearer_token: config.bearer_token.clone() })
    }
}

#[async_trait]
impl ChartRenderer for HttpChartRenderer {
    async fn render(&self, option: &Value) -> Result<Vec<u8>, RenderError> {
        let mut request = self.http.post(&self.url).json(option);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RenderError::Status { status: status.as_u16(), body });
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(RenderError::Empty);
        }
        Ok(bytes.to_vec())
    }
}
