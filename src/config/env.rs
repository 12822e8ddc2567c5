//! Environment variable overrides for configuration.
//!
//! Supports overriding config values with environment variables:
//! - `HERALD_DISCORD_TOKEN` - Discord bot token
//! - `HERALD_IRC_SERVER` - IRC server host
//! - `HERALD_IRC_PORT` - IRC server port
//! - `HERALD_IRC_NICK` - IRC nickname
//! - `HERALD_IRC_PASSWORD` - IRC server password

use std::env;

use crate::config::types::Config;

/// Environment variable prefix for all config overrides.
const ENV_PREFIX: &str = "HERALD";

/// Apply environment variable overrides to a config.
///
/// This allows secrets like the bot token to stay out of the config file.
pub fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(token) = env::var(format!("{}_DISCORD_TOKEN", ENV_PREFIX)) {
        config.discord.token = token;
    }

    if let Ok(server) = env::var(format!("{}_IRC_SERVER", ENV_PREFIX)) {
        config.irc.server = server;
    }
    if let Ok(port) = env::var(format!("{}_IRC_PORT", ENV_PREFIX)) {
        if let Ok(port) = port.parse() {
            config.irc.port = Some(port);
        }
    }
    if let Ok(nick) = env::var(format!("{}_IRC_NICK", ENV_PREFIX)) {
        config.irc.nick = nick;
    }
    if let Ok(password) = env::var(format!("{}_IRC_PASSWORD", ENV_PREFIX)) {
        config.irc.password = Some(password);
    }

    config
}

/// Get the config file path from environment or use default.
///
/// Checks `HERALD_CONFIG`, otherwise returns "herald.conf".
pub fn get_config_path() -> String {
    env::var(format!("{}_CONFIG", ENV_PREFIX)).unwrap_or_else(|_| "herald.conf".to_string())
}
