//! Configuration validation.
//!
//! Validates configuration values and provides helpful error messages.

use crate::bridge::mapping::ChannelMappingTable;
use crate::common::error::ConfigError;
use crate::config::types::Config;

/// Validate a configuration and return detailed errors.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if config.discord.token.trim().is_empty() {
        errors.push("discord.token is required".to_string());
    }
    if config.discord.token == "YOUR_DISCORD_TOKEN_HERE" {
        errors.push("discord.token has not been configured (still using placeholder)".to_string());
    }
    if config.discord.webhook_name().trim().is_empty() {
        errors.push("discord.webhook_name must not be empty".to_string());
    }

    if config.irc.server.trim().is_empty() {
        errors.push("irc.server is required".to_string());
    }
    if config.irc.port() == 0 {
        errors.push("irc.port must be non-zero".to_string());
    }
    if config.irc.nick.trim().is_empty() {
        errors.push("irc.nick is required".to_string());
    }
    if config.irc.nick.contains(char::is_whitespace) {
        errors.push(format!("irc.nick '{}' must not contain whitespace", config.irc.nick));
    }

    match ChannelMappingTable::parse(&config.bridge.channel_mappings) {
        Ok(table) if table.is_empty() => {
            errors.push("bridge.channel_mappings is empty - no channels to relay".to_string());
        }
        Ok(_) => {}
        Err(e) => errors.push(format!("bridge.channel_mappings: {}", e)),
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            message: errors.join("\n"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::*;

    fn make_valid_config() -> Config {
        Config {
            discord: DiscordConfig {
                token: "valid_token_here".to_string(),
                api_url: None,
                webhook_name: None,
            },
            irc: IrcConfig {
                server: "irc.libera.chat".to_string(),
                port: Some(6667),
                nick: "herald".to_string(),
                password: None,
                realname: None,
            },
            bridge: BridgeConfig {
                channel_mappings: "987654321: #general".to_string(),
                username_suffix: None,
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&make_valid_config()).is_ok());
    }

    #[test]
    fn test_empty_token_fails() {
        let mut config = make_valid_config();
        config.discord.token = String::new();

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("discord.token"));
    }

    #[test]
    fn test_placeholder_token_fails() {
        let mut config = make_valid_config();
        config.discord.token = "YOUR_DISCORD_TOKEN_HERE".to_string();

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("placeholder"));
    }

    #[test]
    fn test_zero_port_fails() {
        let mut config = make_valid_config();
        config.irc.port = Some(0);

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("irc.port"));
    }

    #[test]
    fn test_bad_mapping_fails() {
        let mut config = make_valid_config();
        config.bridge.channel_mappings = "987654321 #general".to_string();

        let result = validate_config(&config);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("bridge.channel_mappings"));
    }

    #[test]
    fn test_all_errors_reported_together() {
        let mut config = make_valid_config();
        config.discord.token = String::new();
        config.irc.nick = String::new();

        let message = validate_config(&config).unwrap_err().to_string();
        assert!(message.contains("discord.token"));
        assert!(message.contains("irc.nick"));
    }
}
