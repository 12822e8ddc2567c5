//! Herald - Discord-IRC chat bridge
//!
//! Relays messages between mapped IRC channels and Discord channels. IRC
//! messages are posted through per-channel Discord webhooks so each IRC nick
//! shows up under its own name.

mod bridge;
mod common;
mod config;
mod discord;
mod irc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio::signal;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use bridge::{ChannelMappingTable, Coordinator, LocalSink};
use config::{env::get_config_path, load_and_validate};
use discord::DiscordGateway;
use irc::{IrcClient, IrcHandle};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Herald v{} starting...", env!("CARGO_PKG_VERSION"));

    let config_path = get_config_path();
    info!("Loading configuration from {}...", config_path);

    let config = load_and_validate(&config_path).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        error!("Please ensure {} exists and is properly formatted.", config_path);
        e
    })?;

    let mappings = ChannelMappingTable::parse(&config.bridge.channel_mappings)?;
    info!("Configuration loaded successfully");
    info!("  IRC: {} on {}:{}", config.irc.nick, config.irc.server, config.irc.port());
    info!("  Channel mappings: {}", mappings.len());
    for mapping in mappings.mappings() {
        info!("    {} <-> Discord channel {}", mapping.local_id, mapping.remote_id);
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();

    // ============================================================
    // IRC side
    // ============================================================
    let channels = mappings.local_ids().map(String::from).collect();
    let (irc_client, irc_handle) = IrcClient::new(config.irc.clone(), channels, trigger_tx);
    let sink: Arc<dyn LocalSink> = Arc::new(irc_handle.clone());

    // ============================================================
    // Bridge + Discord side
    // ============================================================
    let coordinator = Arc::new(Coordinator::default());
    let gateway = DiscordGateway::new(config.discord.token.clone(), sink.clone(), shutdown_rx.clone());
    coordinator.start(&config, gateway).await?;

    let mut discord_task = coordinator
        .runtime()
        .take_task()
        .ok_or_else(|| anyhow!("Discord connection was not started"))?;
    let mut irc_task = tokio::spawn(irc_client.run(shutdown_rx.clone()));
    let router_task = tokio::spawn(coordinator.local_router().run(trigger_rx));
    let reload_task = tokio::spawn(reload_on_hangup(
        coordinator.clone(),
        config_path,
        sink,
        irc_handle,
        shutdown_rx,
    ));

    let mut discord_done = false;
    let mut irc_done = false;
    tokio::select! {
        biased;
        _ = shutdown_signal() => {
            info!("Shutdown signal received - leaving IRC and Discord...");
        }
        _ = &mut discord_task => {
            discord_done = true;
            warn!("Discord task ended unexpectedly");
        }
        _ = &mut irc_task => {
            irc_done = true;
            warn!("IRC task ended unexpectedly");
        }
        _ = router_task => warn!("IRC -> Discord routing ended unexpectedly"),
    }
    reload_task.abort();

    if let Err(e) = shutdown_tx.send(true) {
        debug!("Shutdown channel closed (clients already exited): {}", e);
    }
    let disconnect = async {
        if !irc_done {
            if let Err(e) = irc_task.await {
                warn!("IRC task panicked: {}", e);
            }
        }
        if !discord_done {
            if let Err(e) = discord_task.await {
                warn!("Discord task panicked: {}", e);
            }
        }
    };
    match tokio::time::timeout(Duration::from_secs(5), disconnect).await {
        Ok(()) => info!("Disconnected gracefully"),
        Err(_) => warn!("Graceful disconnect timed out"),
    }

    info!("Exiting...");
    Ok(())
}

/// Re-read the config on SIGHUP and swap in a new bridge context.
///
/// The running Discord connection is kept; newly mapped IRC channels are joined.
#[cfg(unix)]
async fn reload_on_hangup(
    coordinator: Arc<Coordinator>,
    config_path: String,
    sink: Arc<dyn LocalSink>,
    irc: IrcHandle,
    shutdown_rx: watch::Receiver<bool>,
) {
    let mut hangup = match signal::unix::signal(signal::unix::SignalKind::hangup()) {
        Ok(hangup) => hangup,
        Err(e) => {
            warn!("Config reload on SIGHUP unavailable: {}", e);
            return;
        }
    };

    while hangup.recv().await.is_some() {
        info!("Received SIGHUP, reloading {}...", config_path);

        let config = match load_and_validate(&config_path) {
            Ok(config) => config,
            Err(e) => {
                error!("Reload failed, keeping current bridge: {}", e);
                continue;
            }
        };

        let gateway = DiscordGateway::new(config.discord.token.clone(), sink.clone(), shutdown_rx.clone());
        match coordinator.start(&config, gateway).await {
            Ok(context) => {
                for channel in context.mappings.local_ids() {
                    irc.join(channel);
                }
                info!("Reload complete");
            }
            Err(e) => error!("Reload failed, keeping current bridge: {}", e),
        }
    }
}

#[cfg(not(unix))]
async fn reload_on_hangup(
    _coordinator: Arc<Coordinator>,
    _config_path: String,
    _sink: Arc<dyn LocalSink>,
    _irc: IrcHandle,
    _shutdown_rx: watch::Receiver<bool>,
) {
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
