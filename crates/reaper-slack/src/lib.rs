//! Slack adapter (Web API over HTTPS).
//!
//! This crate implements the `reaper-core` ChannelGateway with the
//! `conversations.*` and `chat.postMessage` methods.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use reaper_core::{
    config::Config,
    domain::{ChannelId, ChannelMetadata, ChannelPage, MessagePage},
    errors::{Error, GatewayError},
    ports::{ChannelGateway, GatewayResult},
    Result,
};

mod wire;

use wire::{ArchiveResponse, HistoryResponse, InfoResponse, JoinResponse, ListResponse};

const CHANNEL_TYPES: &str = "public_channel,private_channel";
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);
const POST_METHOD: &str = "chat.postMessage";

#[derive(Debug)]
pub struct SlackGateway {
    token: SecretString,
    base_url: String,
    http: reqwest::Client,
}

impl SlackGateway {
    pub fn new(token: SecretString, base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::External(format!("slack http client build failed: {e}")))?;
        Ok(Self {
            token,
            base_url: base_url.into(),
            http,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(
            SecretString::from(cfg.bot_token.expose_secret()),
            cfg.api_base_url.clone(),
        )
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{method}", self.base_url)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, String)],
    ) -> GatewayResult<T> {
        let (body, retry_after) = self.send(method, params).await?;
        decode(method, body, retry_after)
    }

    /// POST one method; returns the raw envelope and any `Retry-After` hint.
    async fn send(
        &self,
        method: &str,
        params: &[(&str, String)],
    ) -> GatewayResult<(serde_json::Value, Option<Duration>)> {
        let resp = self
            .http
            .post(self.url(method))
            .bearer_auth(self.token.expose_secret())
            .form(params)
            .send()
            .await
            .map_err(|e| GatewayError::platform(format!("slack {method} request error: {e}")))?;

        let status = resp.status();
        let retry_after = parse_retry_after(
            resp.headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok()),
        );

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            tracing::debug!(method, ?retry_after, "slack rate limit");
            return Err(GatewayError::RateLimited {
                retry_after: retry_after.unwrap_or(DEFAULT_RETRY_AFTER),
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::platform(format!(
                "slack {method} failed: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| GatewayError::platform(format!("slack {method} json error: {e}")))?;
        Ok((body, retry_after))
    }
}

/// `None` when the envelope says `ok: true`, otherwise the Web API error code.
fn envelope_error(body: &serde_json::Value) -> Option<&str> {
    if body.get("ok").and_then(|v| v.as_bool()).unwrap_or(false) {
        return None;
    }
    Some(
        body.get("error")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown_error"),
    )
}

fn failure(method: &str, error: &str, retry_after: Option<Duration>) -> GatewayError {
    if error == "ratelimited" {
        return GatewayError::RateLimited {
            retry_after: retry_after.unwrap_or(DEFAULT_RETRY_AFTER),
        };
    }
    GatewayError::platform(format!("slack {method}: {error}"))
}

/// Interpret a Web API envelope (`{"ok": bool, "error": "..."}` plus payload).
fn decode<T: DeserializeOwned>(
    method: &str,
    body: serde_json::Value,
    retry_after: Option<Duration>,
) -> GatewayResult<T> {
    if let Some(error) = envelope_error(&body) {
        return Err(failure(method, error, retry_after));
    }

    serde_json::from_value(body)
        .map_err(|e| GatewayError::platform(format!("slack {method} decode error: {e}")))
}

/// `ok: false` on a post becomes `Ok(false)`; rate limits stay errors.
fn post_accepted(body: &serde_json::Value, retry_after: Option<Duration>) -> GatewayResult<bool> {
    match envelope_error(body) {
        None => Ok(true),
        Some("ratelimited") => Err(failure(POST_METHOD, "ratelimited", retry_after)),
        Some(error) => {
            tracing::warn!(method = POST_METHOD, error, "slack post refused");
            Ok(false)
        }
    }
}

fn parse_retry_after(raw: Option<&str>) -> Option<Duration> {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[async_trait]
impl ChannelGateway for SlackGateway {
    async fn list_channels(&self, cursor: &str, limit: usize) -> GatewayResult<ChannelPage> {
        let mut params = vec![
            ("exclude_archived", "true".to_string()),
            ("limit", limit.to_string()),
            ("types", CHANNEL_TYPES.to_string()),
        ];
        if !cursor.is_empty() {
            params.push(("cursor", cursor.to_string()));
        }
        let resp: ListResponse = self.call("conversations.list", &params).await?;
        Ok(resp.into_page())
    }

    async fn get_channel_info(&self, id: &ChannelId) -> GatewayResult<ChannelMetadata> {
        let resp: InfoResponse = self
            .call("conversations.info", &[("channel", id.0.clone())])
            .await?;
        Ok(resp.channel.metadata())
    }

    async fn get_history(&self, id: &ChannelId, limit: usize) -> GatewayResult<MessagePage> {
        let history: HistoryResponse = self
            .call(
                "conversations.history",
                &[("channel", id.0.clone()), ("limit", limit.to_string())],
            )
            .await?;
        Ok(history.into_page())
    }

    async fn join_channel(&self, id: &ChannelId) -> GatewayResult<()> {
        let _: JoinResponse = self
            .call("conversations.join", &[("channel", id.0.clone())])
            .await?;
        Ok(())
    }

    async fn post_message(&self, id: &ChannelId, text: &str) -> GatewayResult<bool> {
        let (body, retry_after) = self
            .send(
                POST_METHOD,
                &[("channel", id.0.clone()), ("text", text.to_string())],
            )
            .await?;
        post_accepted(&body, retry_after)
    }

    async fn archive_channel(&self, id: &ChannelId) -> GatewayResult<()> {
        let _: ArchiveResponse = self
            .call("conversations.archive", &[("channel", id.0.clone())])
            .await?;
        Ok(())
    }
}
