//! Discord gateway connection feeding the relay.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use serenity::gateway::ShardManager;
use serenity::prelude::*;
use serenity::Client;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

use crate::bridge::coordinator::{ContextHandle, LocalSink, RemoteConnector};
use crate::common::reconnect::{is_shutdown, reconnect_backoff, wait_before_reconnect};
use crate::discord::handler::{inbound_event, GatewayEvent, GatewayEvents};

/// Long-lived Discord gateway session relaying messages to IRC.
pub struct DiscordGateway {
    token: String,
    sink: Arc<dyn LocalSink>,
    shutdown_rx: watch::Receiver<bool>,
}

impl DiscordGateway {
    pub fn new(
        token: impl Into<String>,
        sink: Arc<dyn LocalSink>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            token: token.into(),
            sink,
            shutdown_rx,
        }
    }

    async fn run_until_shutdown(self, bridge: ContextHandle) {
        let (events_tx, mut events_rx) = mpsc::unbounded_channel::<GatewayEvent>();
        let shard_manager: Mutex<Option<Arc<ShardManager>>> = Mutex::new(None);
        let ready_seen = AtomicBool::new(false);
        let mut shutdown_rx = self.shutdown_rx.clone();

        tokio::select! {
            _ = self.run_connection(&events_tx, &shard_manager, &ready_seen) => {},
            _ = self.process_events(&mut events_rx, &bridge, &ready_seen) => {},
            _ = async {
                loop {
                    if shutdown_rx.changed().await.is_err() || is_shutdown(&shutdown_rx) {
                        break;
                    }
                }
                let manager = shard_manager.lock().ok().and_then(|manager| manager.clone());
                if let Some(manager) = manager {
                    info!("Initiating graceful Discord shutdown...");
                    manager.shutdown_all().await;
                    info!("Discord shutdown complete");
                }
            } => {}
        }
        info!("Discord task ended");
    }

    async fn run_connection(
        &self,
        events_tx: &mpsc::UnboundedSender<GatewayEvent>,
        shard_manager: &Mutex<Option<Arc<ShardManager>>>,
        ready_seen: &AtomicBool,
    ) {
        let mut backoff = reconnect_backoff();
        let mut shutdown_rx = self.shutdown_rx.clone();

        loop {
            info!("Connecting to Discord...");

            match build_client(&self.token, events_tx.clone()).await {
                Ok(mut client) => {
                    if let Ok(mut manager) = shard_manager.lock() {
                        *manager = Some(client.shard_manager.clone());
                    }

                    // serenity resumes dropped sessions itself; start() only
                    // returns once the session is beyond recovery.
                    match client.start().await {
                        Ok(()) => info!("Discord client disconnected"),
                        Err(e) => error!("Discord client error: {}", e),
                    }
                }
                Err(e) => error!("Failed to build Discord client: {}", e),
            }

            if ready_seen.swap(false, Ordering::AcqRel) {
                backoff = reconnect_backoff();
            }
            if !wait_before_reconnect(&mut backoff, &mut shutdown_rx, "Discord").await {
                break;
            }
        }
    }

    async fn process_events(
        &self,
        events_rx: &mut mpsc::UnboundedReceiver<GatewayEvent>,
        bridge: &ContextHandle,
        ready_seen: &AtomicBool,
    ) {
        while let Some(event) = events_rx.recv().await {
            match event {
                GatewayEvent::Ready(ready) => {
                    info!("Discord bot connected as {}", ready.user.name);
                    ready_seen.store(true, Ordering::Release);
                }
                GatewayEvent::Message { context, message } => {
                    let event = inbound_event(&context, &message);
                    debug!(
                        "[discord] <{}> {} ({} attachment(s))",
                        event.author_name,
                        event.raw_text,
                        event.attachments.len()
                    );

                    match bridge.current() {
                        Some(current) => {
                            current.relay_remote_event(&event, self.sink.as_ref());
                        }
                        None => debug!("Bridge context not ready, dropping Discord message"),
                    }
                }
            }
        }
        debug!("Discord events channel closed.");
    }
}

impl RemoteConnector for DiscordGateway {
    fn run(self, context: ContextHandle) -> BoxFuture<'static, ()> {
        Box::pin(self.run_until_shutdown(context))
    }
}

async fn build_client(
    token: &str,
    events_tx: mpsc::UnboundedSender<GatewayEvent>,
) -> Result<Client, serenity::Error> {
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    Client::builder(token, intents)
        .event_handler(GatewayEvents::new(events_tx))
        .await
}
