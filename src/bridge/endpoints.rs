//! Per-channel webhook registry.
//!
//! Every mapped Discord channel gets one webhook the bridge posts through.
//! Webhooks are discovered by name or created once, eagerly at startup, and
//! cached for the lifetime of the bridge context. A channel whose webhook
//! could not be provisioned simply has no entry: sends to it are skipped
//! until the next start.

use std::collections::HashMap;

use futures::future::join_all;
use tracing::{error, info, warn};

use crate::common::error::ProvisionError;
use crate::common::types::Snowflake;
use crate::discord::api::DiscordApi;

/// A webhook the bridge can post through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub remote_channel_id: Snowflake,
    pub endpoint_id: Snowflake,
    pub endpoint_token: String,
    pub name: String,
}

/// Read-only map of Discord channel to its webhook.
#[derive(Debug, Clone, Default)]
pub struct EndpointRegistry {
    endpoints: HashMap<Snowflake, Endpoint>,
}

impl EndpointRegistry {
    /// Provision webhooks for every channel, concurrently.
    ///
    /// Failures are logged and leave the channel without an endpoint.
    pub async fn provision(
        api: &DiscordApi,
        name: &str,
        channels: impl IntoIterator<Item = Snowflake>,
    ) -> Self {
        let results = join_all(
            channels
                .into_iter()
                .map(|channel_id| async move { (channel_id, ensure(api, name, channel_id).await) }),
        )
        .await;

        let mut endpoints = HashMap::new();
        for (channel_id, result) in results {
            match result {
                Ok(endpoint) => {
                    info!(
                        "Using webhook {} ('{}') for Discord channel {}",
                        endpoint.endpoint_id, endpoint.name, channel_id
                    );
                    endpoints.insert(channel_id, endpoint);
                }
                Err(e) => {
                    error!("Could not access webhook API for channel {}: {}", channel_id, e);
                    if e.api_error().is_some_and(|api| api.is_permission_denied()) {
                        warn!(
                            "Make sure the bot user has the \"Manage Webhooks\" permission on channel {}",
                            channel_id
                        );
                    }
                }
            }
        }

        info!("Webhooks ready for {} channel(s)", endpoints.len());
        Self { endpoints }
    }

    #[cfg(test)]
    pub fn from_endpoints(endpoints: impl IntoIterator<Item = Endpoint>) -> Self {
        Self {
            endpoints: endpoints
                .into_iter()
                .map(|endpoint| (endpoint.remote_channel_id, endpoint))
                .collect(),
        }
    }

    pub fn get(&self, remote_channel_id: Snowflake) -> Option<&Endpoint> {
        self.endpoints.get(&remote_channel_id)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

/// Find the channel's webhook by name, or create it.
pub async fn ensure(
    api: &DiscordApi,
    name: &str,
    channel_id: Snowflake,
) -> Result<Endpoint, ProvisionError> {
    let existing = api
        .list_webhooks(channel_id)
        .await
        .map_err(|source| ProvisionError::List { channel_id, source })?;

    // A webhook without a token belongs to someone else and cannot be executed.
    if let Some((hook, token)) = existing
        .into_iter()
        .filter(|hook| hook.name.as_deref() == Some(name))
        .find_map(|hook| hook.token.clone().map(|token| (hook, token)))
    {
        return Ok(Endpoint {
            remote_channel_id: channel_id,
            endpoint_id: hook.id,
            endpoint_token: token,
            name: name.to_string(),
        });
    }

    info!("Creating webhook '{}' for Discord channel {}", name, channel_id);
    let created = api
        .create_webhook(channel_id, name)
        .await
        .map_err(|source| ProvisionError::Create { channel_id, source })?;

    let token = created
        .token
        .ok_or(ProvisionError::MissingToken { channel_id })?;

    Ok(Endpoint {
        remote_channel_id: channel_id,
        endpoint_id: created.id,
        endpoint_token: token,
        name: created.name.unwrap_or_else(|| name.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mock_list(server: &MockServer, channel: u64, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(format!("/channels/{}/webhooks", channel)))
            .and(header("authorization", "Bot secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_existing_webhook_is_reused() {
        let server = MockServer::start().await;
        mock_list(
            &server,
            42,
            serde_json::json!([
                { "id": "1", "token": "other", "name": "someone-else" },
                { "id": "2", "token": "mine", "name": "bridge" }
            ]),
        )
        .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let api = DiscordApi::new("secret", server.uri()).unwrap();
        let endpoint = ensure(&api, "bridge", Snowflake(42)).await.unwrap();

        assert_eq!(endpoint.endpoint_id, Snowflake(2));
        assert_eq!(endpoint.endpoint_token, "mine");
        assert_eq!(endpoint.remote_channel_id, Snowflake(42));
    }

    #[tokio::test]
    async fn test_missing_webhook_is_created() {
        let server = MockServer::start().await;
        mock_list(&server, 42, serde_json::json!([])).await;
        Mock::given(method("POST"))
            .and(path("/channels/42/webhooks"))
            .and(header("authorization", "Bot secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "77", "token": "new", "name": "bridge"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let api = DiscordApi::new("secret", server.uri()).unwrap();
        let endpoint = ensure(&api, "bridge", Snowflake(42)).await.unwrap();

        assert_eq!(endpoint.endpoint_id, Snowflake(77));
        assert_eq!(endpoint.endpoint_token, "new");
    }

    #[tokio::test]
    async fn test_tokenless_webhook_is_not_reused() {
        let server = MockServer::start().await;
        mock_list(
            &server,
            42,
            serde_json::json!([{ "id": "5", "name": "bridge" }]),
        )
        .await;
        Mock::given(method("POST"))
            .and(path("/channels/42/webhooks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "6", "token": "usable", "name": "bridge"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let api = DiscordApi::new("secret", server.uri()).unwrap();
        let endpoint = ensure(&api, "bridge", Snowflake(42)).await.unwrap();
        assert_eq!(endpoint.endpoint_id, Snowflake(6));
    }

    #[tokio::test]
    async fn test_failed_channel_left_empty_others_provisioned() {
        let server = MockServer::start().await;
        mock_list(
            &server,
            1,
            serde_json::json!([{ "id": "10", "token": "t", "name": "bridge" }]),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/channels/2/webhooks"))
            .respond_with(ResponseTemplate::new(403).set_body_string("Missing Permissions"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let api = DiscordApi::new("secret", server.uri()).unwrap();
        let registry =
            EndpointRegistry::provision(&api, "bridge", vec![Snowflake(1), Snowflake(2)]).await;

        assert_eq!(registry.len(), 1);
        assert!(registry.get(Snowflake(1)).is_some());
        assert!(registry.get(Snowflake(2)).is_none());
    }

    #[tokio::test]
    async fn test_create_failure_is_provision_error() {
        let server = MockServer::start().await;
        mock_list(&server, 42, serde_json::json!([])).await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("Maximum webhooks reached"))
            .mount(&server)
            .await;

        let api = DiscordApi::new("secret", server.uri()).unwrap();
        let error = ensure(&api, "bridge", Snowflake(42)).await.unwrap_err();
        assert!(matches!(error, ProvisionError::Create { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_api_leaves_registry_empty() {
        // Nothing listens on port 9 (discard) on loopback in test environments.
        let api = DiscordApi::new("secret", "http://127.0.0.1:9").unwrap();
        let registry = EndpointRegistry::provision(&api, "bridge", vec![Snowflake(1)]).await;
        assert!(registry.is_empty());
    }
}
