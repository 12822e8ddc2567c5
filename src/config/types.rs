//! Configuration type definitions.

use serde::Deserialize;

/// Default Discord REST API base URL.
pub const DEFAULT_DISCORD_API_URL: &str = "https://discord.com/api/v10";

/// Default name of the webhook the bridge posts through.
pub const DEFAULT_WEBHOOK_NAME: &str = "bridge";

/// Default suffix appended to IRC nicks on Discord.
pub const DEFAULT_USERNAME_SUFFIX: &str = "(IRC)";

/// Default IRC port (plaintext).
pub const DEFAULT_IRC_PORT: u16 = 6667;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub discord: DiscordConfig,
    pub irc: IrcConfig,
    pub bridge: BridgeConfig,
}

/// Discord bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    pub token: String,
    pub api_url: Option<String>,
    pub webhook_name: Option<String>,
}

impl DiscordConfig {
    pub fn api_url(&self) -> &str {
        self.api_url
            .as_deref()
            .unwrap_or(DEFAULT_DISCORD_API_URL)
            .trim_end_matches('/')
    }

    pub fn webhook_name(&self) -> &str {
        self.webhook_name.as_deref().unwrap_or(DEFAULT_WEBHOOK_NAME)
    }
}

/// IRC server connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct IrcConfig {
    pub server: String,
    pub port: Option<u16>,
    pub nick: String,
    pub password: Option<String>,
    pub realname: Option<String>,
}

impl IrcConfig {
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_IRC_PORT)
    }

    pub fn realname(&self) -> &str {
        self.realname.as_deref().unwrap_or("Herald relay")
    }
}

/// Relay settings.
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    /// Comma-separated `discord_channel_id: #irc-channel` pairs.
    pub channel_mappings: String,
    pub username_suffix: Option<String>,
}

impl BridgeConfig {
    pub fn username_suffix(&self) -> &str {
        self.username_suffix
            .as_deref()
            .unwrap_or(DEFAULT_USERNAME_SUFFIX)
    }
}
