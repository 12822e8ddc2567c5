//! IRC connection: registration, channel joins, keepalive and reconnection.
//!
//! The client owns the socket. Everything else talks to it through an
//! [`IrcHandle`] (lines to send) and a trigger channel (messages heard).

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_util::codec::Framed;
use tracing::{debug, error, info, warn};

use crate::bridge::coordinator::LocalSink;
use crate::common::error::IrcError;
use crate::common::reconnect::{is_shutdown, reconnect_backoff, wait_before_reconnect};
use crate::common::types::OutboundTrigger;
use crate::config::types::IrcConfig;
use crate::irc::codec::{ctcp_action, parse_privmsg_body, IrcCodec, IrcMessage, PrivmsgBody};
use crate::irc::format::split_message;

/// Room left for text in a PRIVMSG once the server prepends our prefix.
const MAX_PRIVMSG_PAYLOAD: usize = 400;

const RPL_WELCOME: &str = "001";
const ERR_NICKNAMEINUSE: &str = "433";

/// Work queued for the connection by an [`IrcHandle`].
#[derive(Debug, Clone, PartialEq, Eq)]
enum Outgoing {
    Line(String),
    /// Join a channel now and after every reconnect.
    Join(String),
}

/// How a session ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    Shutdown,
}

/// Sends text into IRC channels. Cheap to clone.
#[derive(Debug, Clone)]
pub struct IrcHandle {
    outgoing_tx: mpsc::UnboundedSender<Outgoing>,
}

impl IrcHandle {
    fn queue(&self, outgoing: Outgoing) {
        if self.outgoing_tx.send(outgoing).is_err() {
            warn!("IRC client has stopped, dropping outgoing line");
        }
    }

    /// Add a channel to the set the client stays in.
    pub fn join(&self, channel: &str) {
        self.queue(Outgoing::Join(channel.to_string()));
    }
}

impl LocalSink for IrcHandle {
    fn say(&self, channel: &str, text: &str) {
        for chunk in split_message(text, MAX_PRIVMSG_PAYLOAD) {
            self.queue(Outgoing::Line(format!("PRIVMSG {} :{}", channel, chunk)));
        }
    }

    fn action(&self, channel: &str, text: &str) {
        for chunk in split_message(text, MAX_PRIVMSG_PAYLOAD) {
            self.queue(Outgoing::Line(format!(
                "PRIVMSG {} :{}",
                channel,
                ctcp_action(&chunk)
            )));
        }
    }
}

pub struct IrcClient {
    config: IrcConfig,
    channels: Vec<String>,
    outgoing_rx: mpsc::UnboundedReceiver<Outgoing>,
    trigger_tx: mpsc::UnboundedSender<OutboundTrigger>,
}

impl IrcClient {
    /// Create a client joining `channels` and the handle used to talk through it.
    pub fn new(
        config: IrcConfig,
        channels: Vec<String>,
        trigger_tx: mpsc::UnboundedSender<OutboundTrigger>,
    ) -> (Self, IrcHandle) {
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let client = Self {
            config,
            channels,
            outgoing_rx,
            trigger_tx,
        };
        (client, IrcHandle { outgoing_tx })
    }

    /// Stay connected until shutdown is signalled.
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        let mut backoff = reconnect_backoff();

        loop {
            if is_shutdown(&shutdown_rx) {
                break;
            }

            let addr = format!("{}:{}", self.config.server, self.config.port());
            info!("Connecting to IRC server {}...", addr);

            match TcpStream::connect(&addr).await {
                Ok(stream) => {
                    backoff = reconnect_backoff();
                    match self.session(stream, &mut shutdown_rx).await {
                        Ok(SessionEnd::Shutdown) => break,
                        Err(e) => error!("IRC connection lost: {}", e),
                    }
                }
                Err(source) => {
                    error!("{}", IrcError::ConnectFailed { addr, source });
                }
            }

            let dropped = self.drain_outgoing();
            if dropped > 0 {
                warn!("Dropped {} message(s) queued while IRC was disconnected", dropped);
            }

            if !wait_before_reconnect(&mut backoff, &mut shutdown_rx, "IRC").await {
                break;
            }
        }

        info!("IRC client stopped");
    }

    /// Discard lines queued while offline, keeping channel joins.
    fn drain_outgoing(&mut self) -> usize {
        let mut dropped = 0;
        while let Ok(outgoing) = self.outgoing_rx.try_recv() {
            match outgoing {
                Outgoing::Line(_) => dropped += 1,
                Outgoing::Join(channel) => {
                    self.remember_channel(channel);
                }
            }
        }
        dropped
    }

    /// Returns whether the channel was new.
    fn remember_channel(&mut self, channel: String) -> bool {
        if self
            .channels
            .iter()
            .any(|known| known.eq_ignore_ascii_case(&channel))
        {
            return false;
        }
        self.channels.push(channel);
        true
    }

    async fn session<S>(
        &mut self,
        stream: S,
        shutdown_rx: &mut watch::Receiver<bool>,
    ) -> Result<SessionEnd, IrcError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut framed = Framed::new(stream, IrcCodec::new());
        let mut nick = self.config.nick.clone();
        let mut registered = false;

        if let Some(password) = self.config.password.as_deref() {
            framed.send(format!("PASS {}", password)).await?;
        }
        framed.send(format!("NICK {}", nick)).await?;
        framed
            .send(format!("USER {} 0 * :{}", nick, self.config.realname()))
            .await?;

        loop {
            tokio::select! {
                incoming = framed.next() => {
                    let message = match incoming {
                        Some(Ok(message)) => message,
                        Some(Err(e)) => return Err(e),
                        None => return Err(IrcError::ConnectionClosed),
                    };

                    match message.command.as_str() {
                        "PING" => {
                            let token = message.param(0).unwrap_or_default();
                            framed.send(format!("PONG :{}", token)).await?;
                        }
                        RPL_WELCOME => {
                            registered = true;
                            info!("Registered on IRC as {}", nick);
                            for channel in &self.channels {
                                framed.send(format!("JOIN {}", channel)).await?;
                            }
                        }
                        ERR_NICKNAMEINUSE if !registered => {
                            nick.push('_');
                            warn!("Nickname in use, retrying as {}", nick);
                            framed.send(format!("NICK {}", nick)).await?;
                        }
                        "JOIN" if message.nick() == Some(nick.as_str()) => {
                            info!("Joined {}", message.param(0).unwrap_or_default());
                        }
                        "KICK" if message.param(1) == Some(nick.as_str()) => {
                            warn!("Kicked from {}", message.param(0).unwrap_or_default());
                        }
                        "PRIVMSG" => {
                            if let Some(trigger) = privmsg_trigger(&message, &nick) {
                                if self.trigger_tx.send(trigger).is_err() {
                                    debug!("Trigger receiver closed, ignoring IRC message");
                                }
                            }
                        }
                        "ERROR" => {
                            warn!("IRC server error: {}", message.param(0).unwrap_or_default());
                        }
                        _ => {}
                    }
                }

                outgoing = self.outgoing_rx.recv(), if registered => {
                    match outgoing {
                        Some(Outgoing::Line(line)) => framed.send(line).await?,
                        Some(Outgoing::Join(channel)) => {
                            if self.remember_channel(channel.clone()) {
                                framed.send(format!("JOIN {}", channel)).await?;
                            }
                        }
                        None => {
                            framed.send("QUIT :Relay stopping".to_string()).await?;
                            return Ok(SessionEnd::Shutdown);
                        }
                    }
                }

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || is_shutdown(shutdown_rx) {
                        info!("Leaving IRC...");
                        if let Err(e) = framed.send("QUIT :Relay stopping".to_string()).await {
                            debug!("QUIT not delivered: {}", e);
                        }
                        return Ok(SessionEnd::Shutdown);
                    }
                }
            }
        }
    }
}

/// Turn a PRIVMSG someone else sent into a relay trigger.
fn privmsg_trigger(message: &IrcMessage, own_nick: &str) -> Option<OutboundTrigger> {
    let sender = message.nick()?;
    if sender.eq_ignore_ascii_case(own_nick) {
        return None;
    }

    let target = message.param(0)?;
    let (text, is_action) = match parse_privmsg_body(message.param(1)?) {
        PrivmsgBody::Text(text) => (text, false),
        PrivmsgBody::Action(text) => (text, true),
        PrivmsgBody::Ctcp(_) => return None,
    };

    let is_private = !target.starts_with(['#', '&', '+', '!']);
    let channel_id = if is_private { sender } else { target };

    Some(OutboundTrigger {
        sender_nick: sender.to_string(),
        channel_id: channel_id.to_string(),
        raw_text: text.to_string(),
        is_action_hint: is_action,
        is_private,
    })
}
