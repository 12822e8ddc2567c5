//! Discord -> IRC message normalization.
//!
//! Turns a Discord message into at most one IRC send. The steps run in a
//! fixed order: echo check, command filter, emoji re-encoding, attachment
//! flattening, whitespace collapse, action detection.

use fancy_regex::Regex;
use tracing::debug;

use crate::bridge::endpoints::EndpointRegistry;
use crate::bridge::filter::{compile_builtin, is_match, CommandFilter};
use crate::bridge::mapping::ChannelMappingTable;
use crate::common::types::{InboundEvent, NormalizedMessage};
use crate::irc::format;

/// A message to deliver to an IRC channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSend {
    pub channel: String,
    pub message: NormalizedMessage,
}

impl LocalSend {
    /// Text of the IRC line: `name body` for actions, `<name> body` otherwise.
    pub fn render(&self) -> String {
        let name = &self.message.display_name;
        if self.message.is_action {
            format!("{} {}", name, self.message.body)
        } else {
            format!(
                "<{}> {}",
                format::color(&format::bold(name), format::LIGHT_CYAN),
                self.message.body
            )
        }
    }
}

/// Precompiled matchers for Discord -> IRC normalization.
#[derive(Debug, Clone)]
pub struct InboundNormalizer {
    commands: CommandFilter,
    /// `<:name:123>` or `<a:name:123>`; group 1 is `:name:`.
    emoji_pattern: Regex,
    action_pattern: Regex,
}

impl Default for InboundNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl InboundNormalizer {
    pub fn new() -> Self {
        Self {
            commands: CommandFilter::new(),
            emoji_pattern: compile_builtin(r"<a?(:\w+:)\d+>"),
            action_pattern: compile_builtin(r"^_.+_$"),
        }
    }

    /// Normalize one Discord event, or return `None` if it must not be relayed.
    pub fn on_remote_event(
        &self,
        event: &InboundEvent,
        mappings: &ChannelMappingTable,
        endpoints: &EndpointRegistry,
    ) -> Option<LocalSend> {
        let channel = mappings.resolve_to_local(event.channel_id)?;

        // Without a webhook we cannot tell our own echoes apart, so stay quiet.
        let endpoint = endpoints.get(event.channel_id)?;
        if event.author_id == endpoint.endpoint_id || event.webhook_id == Some(endpoint.endpoint_id) {
            debug!("Ignoring echo of our own webhook in channel {}", event.channel_id);
            return None;
        }

        if self.commands.is_command(&event.raw_text) {
            debug!("Not relaying command from {}: {}", event.author_name, event.raw_text);
            return None;
        }

        let text = self.emoji_pattern.replace_all(&event.raw_text, "$1");

        let mut parts: Vec<&str> = Vec::with_capacity(event.attachments.len() + 1);
        if !text.is_empty() {
            parts.push(&text);
        }
        parts.extend(event.attachments.iter().map(String::as_str));

        let body = collapse_whitespace(&parts.join(" "));
        if body.is_empty() {
            return None;
        }

        let is_action = event.attachments.is_empty() && is_match(&self.action_pattern, &body);
        let body = if is_action {
            body[1..body.len() - 1].to_string()
        } else {
            body
        };

        Some(LocalSend {
            channel: channel.to_string(),
            message: NormalizedMessage {
                display_name: event.author_name.clone(),
                body,
                is_action,
            },
        })
    }
}

/// Newlines become single spaces; the ends are trimmed.
fn collapse_whitespace(text: &str) -> String {
    text.replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .trim()
        .to_string()
}
