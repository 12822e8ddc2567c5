//! Discord gateway event intake.
//!
//! serenity calls the handler concurrently; the handler only forwards events
//! into a queue so that one loop processes them in arrival order.

use serenity::async_trait;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use tokio::sync::mpsc;
use tracing::warn;

use crate::common::types::{InboundEvent, Snowflake};

#[derive(Debug, Clone)]
pub enum GatewayEvent {
    /// Bot connected and ready.
    Ready(Ready),
    Message { context: Context, message: Message },
}

pub struct GatewayEvents {
    events_tx: mpsc::UnboundedSender<GatewayEvent>,
}

impl GatewayEvents {
    pub fn new(events_tx: mpsc::UnboundedSender<GatewayEvent>) -> Self {
        Self { events_tx }
    }

    fn forward(&self, event: GatewayEvent) {
        if let Err(error) = self.events_tx.send(event) {
            warn!("Failed to queue Discord event: {}", error);
        }
    }
}

#[async_trait]
impl EventHandler for GatewayEvents {
    async fn ready(&self, _context: Context, ready: Ready) {
        self.forward(GatewayEvent::Ready(ready));
    }

    async fn message(&self, context: Context, message: Message) {
        self.forward(GatewayEvent::Message { context, message });
    }
}

/// Convert a gateway message into the relay's event type.
///
/// Mentions are resolved to readable names from the cache.
pub fn inbound_event(context: &Context, message: &Message) -> InboundEvent {
    InboundEvent {
        author_id: Snowflake(message.author.id.get()),
        author_name: message.author.name.clone(),
        webhook_id: message.webhook_id.map(|id| Snowflake(id.get())),
        channel_id: Snowflake(message.channel_id.get()),
        raw_text: message.content_safe(&context.cache),
        attachments: message
            .attachments
            .iter()
            .map(|attachment| attachment.url.clone())
            .collect(),
    }
}
