//! Configuration file parsing (HOCON format).

use std::fs;
use std::path::Path;

use hocon::HoconLoader;

use crate::common::error::ConfigError;
use crate::config::types::Config;

/// Load configuration from a HOCON file.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    load_config_str(&content)
}

/// Load configuration from a HOCON string.
pub fn load_config_str(content: &str) -> Result<Config, ConfigError> {
    HoconLoader::new()
        .load_str(content)
        .map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?
        .resolve()
        .map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_full_config() {
        let config = load_config_str(
            r##"
            discord {
                token = "abc.def"
                webhook_name = "relay"
            }
            irc {
                server = "irc.libera.chat"
                port = 6697
                nick = "herald"
            }
            bridge {
                channel_mappings = "1234: #one, 5678: #two"
                username_suffix = "[irc]"
            }
            "##,
        )
        .unwrap();

        assert_eq!(config.discord.token, "abc.def");
        assert_eq!(config.discord.webhook_name(), "relay");
        assert_eq!(config.irc.port(), 6697);
        assert_eq!(config.bridge.channel_mappings, "1234: #one, 5678: #two");
        assert_eq!(config.bridge.username_suffix(), "[irc]");
    }

    #[test]
    fn test_defaults_applied() {
        let config = load_config_str(
            r##"
            discord { token = "abc" }
            irc { server = "localhost", nick = "herald" }
            bridge { channel_mappings = "1: #a" }
            "##,
        )
        .unwrap();

        assert_eq!(config.discord.api_url(), "https://discord.com/api/v10");
        assert_eq!(config.discord.webhook_name(), "bridge");
        assert_eq!(config.irc.port(), 6667);
        assert_eq!(config.bridge.username_suffix(), "(IRC)");
        assert!(config.irc.password.is_none());
    }

    #[test]
    fn test_missing_section_fails() {
        let result = load_config_str(r#"discord { token = "abc" }"#);
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = load_config("/nonexistent/herald.conf");
        assert!(matches!(result, Err(ConfigError::IoError { .. })));
    }
}
