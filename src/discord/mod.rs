//! Discord side of the relay: REST calls for webhooks and the gateway session.

pub mod api;
pub mod client;
pub mod handler;

pub use client::DiscordGateway;
