use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::blocks::View;

const TRACING_TARGET: &str = "goodday_slack::client";

#[derive(Debug, Error)]
pub enum SlackApiError {
    #[error("slack transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("slack api `{method}` failed: {error}")]
    Api { method: &'static str, error: String },
}

/// The Web API methods the app calls.
#[async_trait]
pub trait SlackApi: Send + Sync {
    async fn open_view(&self, trigger_id: &str, view: &View) -> Result<(), SlackApiError>;

    /// Publishes `view` as the user's home tab. `hash` guards against overwriting a newer view.
    async fn publish_view(
        &self,
        user_id: &str,
        view: &View,
        hash: Option<&str>,
    ) -> Result<(), SlackApiError>;

    /// The user's UTC offset in seconds from `users.info`.
    async fn user_tz_offset(&self, user_id: &str) -> Result<i64, SlackApiError>;
}

#[derive(Clone)]
pub struct SlackWebClient {
    http: Client,
    base_url: String,
    bot_token: SecretString,
}

impl std::fmt::Debug for SlackWebClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackWebClient").field("base_url", &self.base_url).finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct OpenViewRequest<'a> {
    trigger_id: &'a str,
    view: &'a View,
}

#[derive(Serialize)]
struct PublishViewRequest<'a> {
    user_id: &'a str,
    view: &'a View,
    #[serde(skip_serializing_if = "Option::is_none")]
    hash: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(flatten)]
    body: T,
}

#[derive(Debug, Default, Deserialize)]
struct Ignored {}

#[derive(Debug, Deserialize)]
struct UsersInfoBody {
    #[serde(default)]
    user: Option<UserInfo>,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    #[serde(default)]
    tz_offset: i64,
}

fn into_result<T>(method: &'static str, envelope: ApiEnvelope<T>) -> Result<T, SlackApiError> {
    if envelope.ok {
        Ok(envelope.body)
    } else {
        let error = envelope.error.unwrap_or_else(|| "unknown_error".to_string());
        Err(SlackApiError::Api { method, error })
    }
}

impl SlackWebClient {
    pub fn new(
        base_url: impl Into<String>,
        bot_token: SecretString,
        timeout: Duration,
    ) -> Result<Self, SlackApiError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url: base_url.into().trim_end_matches('/').to_string(), bot_token })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{method}", self.base_url)
    }

    async fn post_json<B, T>(&self, method: &'static str, body: &B) -> Result<T, SlackApiError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        tracing::debug!(target: TRACING_TARGET, method, "calling slack api");
        let envelope: ApiEnvelope<T> = self
            .http
            .post(self.method_url(method))
            .bearer_auth(self.bot_token.expose_secret())
            .json(body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        into_result(method, envelope)
    }
}

#[async_trait]
impl SlackApi for SlackWebClient {
    async fn open_view(&self, trigger_id: &str, view: &View) -> Result<(), SlackApiError> {
        let _: Ignored = self.post_json("views.open", &OpenViewRequest { trigger_id, view }).await?;
        Ok(())
    }

    async fn publish_view(
        &self,
        user_id: &str,
        view: &View,
        hash: Option<&str>,
    ) -> Result<(), SlackApiError> {
        let request = PublishViewRequest { user_id, view, hash };
        let _: Ignored = self.post_json("views.publish", &request).await?;
        Ok(())
    }

    async fn user_tz_offset(&self, user_id: &str) -> Result<i64, SlackApiError> {
        const METHOD: &str = "users.info";
        tracing::debug!(target: TRACING_TARGET, method = METHOD, "calling slack api");
        let envelope: ApiEnvelope<UsersInfoBody> = self
            .http
            .get(self.method_url(METHOD))
            .bearer_auth(self.bot_token.expose_secret())
            .query(&[("user", user_id)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let body = into_result(METHOD, envelope)?;
        Ok(body.user.map_or(0, |user| user.tz_offset))
    }
}
