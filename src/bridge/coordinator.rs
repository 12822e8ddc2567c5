//! Bridge lifecycle: builds the relay context, starts the Discord connection
//! exactly once, and routes IRC messages to per-channel delivery workers.
//!
//! The context (mapping table, webhook registry, normalizer, sender) is
//! immutable once built. Both directions read it through a [`ContextHandle`];
//! a restart publishes a whole new context instead of mutating the old one.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::bridge::endpoints::EndpointRegistry;
use crate::bridge::inbound::{InboundNormalizer, LocalSend};
use crate::bridge::mapping::ChannelMappingTable;
use crate::bridge::outbound::{DeliveryOutcome, OutboundSender};
use crate::common::error::AppError;
use crate::common::types::{InboundEvent, OutboundTrigger};
use crate::config::types::Config;
use crate::discord::api::DiscordApi;

/// Where Discord messages end up: the IRC side.
pub trait LocalSink: Send + Sync + 'static {
    fn say(&self, channel: &str, text: &str);
    fn action(&self, channel: &str, text: &str);
}

/// A long-running Discord event stream feeding the relay.
pub trait RemoteConnector: Send + 'static {
    fn run(self, context: ContextHandle) -> BoxFuture<'static, ()>;
}

/// Everything the relay needs to move one message in either direction.
#[derive(Debug)]
pub struct BridgeContext {
    pub mappings: ChannelMappingTable,
    pub endpoints: EndpointRegistry,
    pub inbound: InboundNormalizer,
    pub outbound: OutboundSender,
}

impl BridgeContext {
    /// Parse the mappings and provision a webhook for every mapped channel.
    pub async fn build(config: &Config) -> Result<Self, AppError> {
        let mappings = ChannelMappingTable::parse(&config.bridge.channel_mappings)?;
        let api = DiscordApi::new(config.discord.token.clone(), config.discord.api_url())?;

        info!(
            "Provisioning webhooks for {} channel mapping(s)...",
            mappings.len()
        );
        let endpoints =
            EndpointRegistry::provision(&api, config.discord.webhook_name(), mappings.remote_ids())
                .await;

        Ok(Self::new(
            mappings,
            endpoints,
            OutboundSender::new(api).with_username_suffix(config.bridge.username_suffix()),
        ))
    }

    pub fn new(
        mappings: ChannelMappingTable,
        endpoints: EndpointRegistry,
        outbound: OutboundSender,
    ) -> Self {
        Self {
            mappings,
            endpoints,
            inbound: InboundNormalizer::new(),
            outbound,
        }
    }

    pub fn on_remote_event(&self, event: &InboundEvent) -> Option<LocalSend> {
        self.inbound
            .on_remote_event(event, &self.mappings, &self.endpoints)
    }

    /// Normalize a Discord event and hand it to IRC. Returns whether anything was sent.
    pub fn relay_remote_event(&self, event: &InboundEvent, sink: &dyn LocalSink) -> bool {
        let Some(send) = self.on_remote_event(event) else {
            return false;
        };

        debug!("Discord -> IRC [{}]: {}", send.channel, send.render());
        if send.message.is_action {
            sink.action(&send.channel, &send.render());
        } else {
            sink.say(&send.channel, &send.render());
        }
        true
    }

    pub async fn on_local_trigger(&self, trigger: &OutboundTrigger) -> DeliveryOutcome {
        self.outbound
            .on_local_trigger(trigger, &self.mappings, &self.endpoints)
            .await
    }
}

/// Read access to the current bridge context.
#[derive(Debug, Clone)]
pub struct ContextHandle(watch::Receiver<Option<Arc<BridgeContext>>>);

impl ContextHandle {
    /// The context in effect right now, if the bridge has started.
    pub fn current(&self) -> Option<Arc<BridgeContext>> {
        self.0.borrow().clone()
    }
}

/// Execution context of the Discord connection.
///
/// The `running` flag is set once, before the connection task is spawned, and
/// never cleared: the connection reconnects on its own for the process
/// lifetime.
#[derive(Debug, Default)]
pub struct RemoteRuntime {
    running: AtomicBool,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl RemoteRuntime {
    /// Spawn the task unless one was already started. Returns whether it spawned.
    pub fn spawn_once<F, Fut>(&self, make_task: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let handle = tokio::spawn(make_task());
        if let Ok(mut task) = self.task.lock() {
            *task = Some(handle);
        }
        true
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Take the connection task handle so the caller can await it.
    pub fn take_task(&self) -> Option<JoinHandle<()>> {
        self.task.lock().ok().and_then(|mut task| task.take())
    }
}

/// Owns the bridge context and the Discord connection's lifecycle.
#[derive(Debug)]
pub struct Coordinator {
    context_tx: watch::Sender<Option<Arc<BridgeContext>>>,
    runtime: Arc<RemoteRuntime>,
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new(Arc::new(RemoteRuntime::default()))
    }
}

impl Coordinator {
    pub fn new(runtime: Arc<RemoteRuntime>) -> Self {
        let (context_tx, _) = watch::channel(None);
        Self {
            context_tx,
            runtime,
        }
    }

    pub fn handle(&self) -> ContextHandle {
        ContextHandle(self.context_tx.subscribe())
    }

    pub fn runtime(&self) -> &Arc<RemoteRuntime> {
        &self.runtime
    }

    /// Build a fresh context from `config`, publish it, and start the Discord
    /// connection if it is not running yet.
    ///
    /// Calling this again (e.g. on reload) swaps the context seen by both
    /// directions but never opens a second connection.
    pub async fn start<C: RemoteConnector>(
        &self,
        config: &Config,
        connector: C,
    ) -> Result<Arc<BridgeContext>, AppError> {
        let context = Arc::new(BridgeContext::build(config).await?);
        self.install(context.clone());

        let handle = self.handle();
        if self.runtime.spawn_once(move || connector.run(handle)) {
            info!("Discord connection started");
        } else {
            info!("Discord connection already running, reusing it");
        }

        Ok(context)
    }

    /// Publish a context to both directions.
    pub fn install(&self, context: Arc<BridgeContext>) {
        if context.endpoints.is_empty() {
            warn!("No webhooks available, IRC messages will not reach Discord");
        }
        info!(
            "Bridge context ready: {} mapping(s), {} webhook(s)",
            context.mappings.len(),
            context.endpoints.len()
        );
        self.context_tx.send_replace(Some(context));
    }

    pub fn local_router(&self) -> LocalRouter {
        LocalRouter::new(self.handle())
    }
}

/// Routes IRC triggers to one delivery worker per channel.
///
/// Messages of one channel are delivered in order; a slow delivery only holds
/// up its own channel.
pub struct LocalRouter {
    context: ContextHandle,
    workers: HashMap<String, mpsc::UnboundedSender<OutboundTrigger>>,
}

impl LocalRouter {
    pub fn new(context: ContextHandle) -> Self {
        Self {
            context,
            workers: HashMap::new(),
        }
    }

    /// Consume triggers until the IRC side closes the channel.
    pub async fn run(mut self, mut triggers: mpsc::UnboundedReceiver<OutboundTrigger>) {
        while let Some(trigger) = triggers.recv().await {
            self.dispatch_local(trigger);
        }
        info!("IRC -> Discord routing ended");
    }

    pub fn dispatch_local(&mut self, trigger: OutboundTrigger) {
        if trigger.is_private {
            return;
        }

        let Some(context) = self.context.current() else {
            debug!("Bridge not started yet, dropping message in {}", trigger.channel_id);
            return;
        };
        if context.mappings.resolve_to_remote(&trigger.channel_id).is_none() {
            debug!("IRC channel {} is not mapped", trigger.channel_id);
            return;
        }

        let key = trigger.channel_id.to_lowercase();
        let worker = self
            .workers
            .entry(key.clone())
            .or_insert_with(|| spawn_worker(key, self.context.clone()));

        if let Err(e) = worker.send(trigger) {
            warn!("Delivery worker for {} stopped: {}", e.0.channel_id, e);
        }
    }
}

fn spawn_worker(channel: String, context: ContextHandle) -> mpsc::UnboundedSender<OutboundTrigger> {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutboundTrigger>();

    tokio::spawn(async move {
        debug!("Delivery worker for {} started", channel);
        while let Some(trigger) = rx.recv().await {
            if let Some(context) = context.current() {
                context.on_local_trigger(&trigger).await;
            }
        }
    });

    tx
}
