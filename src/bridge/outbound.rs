//! IRC -> Discord delivery through channel webhooks.
//!
//! Delivery is best effort: one POST per message, failures are logged and
//! dropped. A relay must never stall or crash because Discord rejected a
//! single message.

use tracing::{debug, warn};

use crate::bridge::endpoints::EndpointRegistry;
use crate::bridge::filter::CommandFilter;
use crate::bridge::mapping::ChannelMappingTable;
use crate::common::types::OutboundTrigger;
use crate::config::types::DEFAULT_USERNAME_SUFFIX;
use crate::discord::api::{DiscordApi, WebhookPayload};
use crate::irc::format::strip_formatting;

/// What happened to a local trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    /// Private message or command chatter.
    Ignored,
    /// The channel is not mapped or has no webhook.
    NoEndpoint,
    /// Nothing left to say after stripping formatting.
    Empty,
    Failed,
}

/// Formats IRC messages as webhook payloads and posts them.
#[derive(Debug, Clone)]
pub struct OutboundSender {
    api: DiscordApi,
    commands: CommandFilter,
    username_suffix: String,
}

impl OutboundSender {
    pub fn new(api: DiscordApi) -> Self {
        Self {
            api,
            commands: CommandFilter::new(),
            username_suffix: DEFAULT_USERNAME_SUFFIX.to_string(),
        }
    }

    pub fn with_username_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.username_suffix = suffix.into();
        self
    }

    /// Build the webhook payload for a trigger.
    pub fn format(&self, trigger: &OutboundTrigger) -> Option<WebhookPayload> {
        let text = strip_formatting(&trigger.raw_text);
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let content = if trigger.is_action_hint {
            format!("_{}_", text)
        } else {
            text.to_string()
        };

        Some(WebhookPayload {
            content,
            username: format!("{} {}", trigger.sender_nick, self.username_suffix),
        })
    }

    /// Relay one IRC channel message to its Discord channel.
    pub async fn on_local_trigger(
        &self,
        trigger: &OutboundTrigger,
        mappings: &ChannelMappingTable,
        endpoints: &EndpointRegistry,
    ) -> DeliveryOutcome {
        if trigger.is_private || self.commands.is_command(&trigger.raw_text) {
            return DeliveryOutcome::Ignored;
        }

        let Some(endpoint) = mappings
            .resolve_to_remote(&trigger.channel_id)
            .and_then(|remote| endpoints.get(remote))
        else {
            debug!("No webhook for IRC channel {}, skipping", trigger.channel_id);
            return DeliveryOutcome::NoEndpoint;
        };

        let Some(payload) = self.format(trigger) else {
            return DeliveryOutcome::Empty;
        };

        match self
            .api
            .execute_webhook(endpoint.endpoint_id, &endpoint.endpoint_token, &payload)
            .await
        {
            Ok(()) => {
                debug!(
                    "IRC -> Discord [{} -> {}]: <{}> {}",
                    trigger.channel_id, endpoint.remote_channel_id, payload.username, payload.content
                );
                DeliveryOutcome::Delivered
            }
            Err(e) => {
                warn!(
                    "Dropping message from {} in {}: {}",
                    trigger.sender_nick, trigger.channel_id, e
                );
                DeliveryOutcome::Failed
            }
        }
    }
}
