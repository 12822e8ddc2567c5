//! Discord REST calls used by the relay: webhook discovery, creation and
//! execution.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::common::error::DiscordApiError;
use crate::common::types::Snowflake;

/// A webhook as returned by `GET /channels/{id}/webhooks`.
///
/// `token` is absent for webhooks the bot cannot execute (e.g. ones owned by
/// another application), and `name` may be null.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookInfo {
    pub id: Snowflake,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Body for `POST /webhooks/{id}/{token}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookPayload {
    pub content: String,
    pub username: String,
}

#[derive(Serialize)]
struct CreateWebhook<'a> {
    name: &'a str,
}

/// Thin authenticated client for the Discord REST API.
#[derive(Debug, Clone)]
pub struct DiscordApi {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl DiscordApi {
    pub fn new(token: impl Into<String>, base_url: impl Into<String>) -> Result<Self, DiscordApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn authorization(&self) -> String {
        format!("Bot {}", self.token)
    }

    /// List the webhooks of a channel.
    pub async fn list_webhooks(&self, channel_id: Snowflake) -> Result<Vec<WebhookInfo>, DiscordApiError> {
        let url = format!("{}/channels/{}/webhooks", self.base_url, channel_id);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }

    /// Create a named webhook in a channel.
    pub async fn create_webhook(&self, channel_id: Snowflake, name: &str) -> Result<WebhookInfo, DiscordApiError> {
        let url = format!("{}/channels/{}/webhooks", self.base_url, channel_id);
        debug!("POST {} name={}", url, name);

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .json(&CreateWebhook { name })
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }

    /// Post a message through a webhook.
    ///
    /// The webhook token in the URL is the only credential; the bot token is
    /// not sent.
    pub async fn execute_webhook(
        &self,
        webhook_id: Snowflake,
        webhook_token: &str,
        payload: &WebhookPayload,
    ) -> Result<(), DiscordApiError> {
        let url = format!("{}/webhooks/{}/{}", self.base_url, webhook_id, webhook_token);
        debug!("POST {}/webhooks/{}/<token>", self.base_url, webhook_id);

        let response = self.client.post(&url).json(payload).send().await?;
        check_status(response).await?;
        Ok(())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, DiscordApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(DiscordApiError::Status {
        status: status.as_u16(),
        body,
    })
}
