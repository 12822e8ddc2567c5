//! Error types for the application.

use thiserror::Error;

use crate::common::types::Snowflake;

/// Top-level application error.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Discord error: {0}")]
    Discord(#[from] DiscordApiError),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {message}")]
    IoError { path: String, message: String },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },

    #[error("Invalid channel mapping '{entry}': {message}")]
    InvalidMapping { entry: String, message: String },

    #[error("Duplicate {side} channel '{id}' in channel mappings")]
    DuplicateChannel { side: &'static str, id: String },
}

/// Errors from the Discord REST API.
#[derive(Debug, Error)]
pub enum DiscordApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Discord returned {status}: {body}")]
    Status { status: u16, body: String },
}

impl DiscordApiError {
    /// Whether Discord rejected the bot's credentials or permissions.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::Status { status: 401 | 403, .. })
    }
}

/// Failure to discover or create a channel's webhook.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Could not list webhooks for channel {channel_id}: {source}")]
    List {
        channel_id: Snowflake,
        #[source]
        source: DiscordApiError,
    },

    #[error("Could not create webhook for channel {channel_id}: {source}")]
    Create {
        channel_id: Snowflake,
        #[source]
        source: DiscordApiError,
    },

    #[error("Webhook created for channel {channel_id} has no token")]
    MissingToken { channel_id: Snowflake },
}

impl ProvisionError {
    pub fn api_error(&self) -> Option<&DiscordApiError> {
        match self {
            Self::List { source, .. } | Self::Create { source, .. } => Some(source),
            Self::MissingToken { .. } => None,
        }
    }
}

/// IRC connection errors.
#[derive(Debug, Error)]
pub enum IrcError {
    #[error("Failed to connect to {addr}: {source}")]
    ConnectFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Connection closed by server")]
    ConnectionClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
