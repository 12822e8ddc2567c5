//! Discord <-> IRC channel mapping table.
//!
//! Built once from the `channel_mappings` setting, which lists
//! `discord_channel_id: #irc-channel` pairs separated by commas:
//!
//! ```text
//! 1234: #irc-channel1, 5678: #irc-channel2
//! ```
//!
//! The table is a bijection: every Discord channel and every IRC channel
//! appears at most once. IRC channel names are case-insensitive and stored
//! lowercased.

use std::collections::HashMap;

use crate::common::error::ConfigError;
use crate::common::types::Snowflake;

/// A single Discord <-> IRC channel pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMapping {
    pub local_id: String,
    pub remote_id: Snowflake,
}

/// Immutable two-way lookup between IRC channels and Discord channels.
#[derive(Debug, Clone, Default)]
pub struct ChannelMappingTable {
    to_remote: HashMap<String, Snowflake>,
    to_local: HashMap<Snowflake, String>,
    /// Pairs in configuration order.
    mappings: Vec<ChannelMapping>,
}

impl ChannelMappingTable {
    /// Build a table from `(remote_id, local_id)` pairs.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (Snowflake, S)>,
        S: AsRef<str>,
    {
        let mut table = Self::default();

        for (remote_id, local_id) in pairs {
            let local_id = normalize_local(local_id.as_ref());
            if local_id.is_empty() {
                return Err(ConfigError::InvalidMapping {
                    entry: remote_id.to_string(),
                    message: "IRC channel name is empty".to_string(),
                });
            }
            if table.to_local.contains_key(&remote_id) {
                return Err(ConfigError::DuplicateChannel {
                    side: "Discord",
                    id: remote_id.to_string(),
                });
            }
            if table.to_remote.contains_key(&local_id) {
                return Err(ConfigError::DuplicateChannel {
                    side: "IRC",
                    id: local_id,
                });
            }

            table.to_remote.insert(local_id.clone(), remote_id);
            table.to_local.insert(remote_id, local_id.clone());
            table.mappings.push(ChannelMapping {
                local_id,
                remote_id,
            });
        }

        Ok(table)
    }

    /// Parse the `channel_mappings` setting.
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        if value.trim().is_empty() {
            return Ok(Self::default());
        }

        let pairs = value
            .split(',')
            .map(parse_entry)
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_pairs(pairs)
    }

    pub fn resolve_to_remote(&self, local_id: &str) -> Option<Snowflake> {
        self.to_remote.get(&normalize_local(local_id)).copied()
    }

    pub fn resolve_to_local(&self, remote_id: Snowflake) -> Option<&str> {
        self.to_local.get(&remote_id).map(String::as_str)
    }

    pub fn remote_ids(&self) -> impl Iterator<Item = Snowflake> + '_ {
        self.mappings.iter().map(|m| m.remote_id)
    }

    pub fn local_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.mappings.iter().map(|m| m.local_id.as_str())
    }

    pub fn mappings(&self) -> &[ChannelMapping] {
        &self.mappings
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

fn normalize_local(local_id: &str) -> String {
    local_id.trim().to_lowercase()
}

/// Parse one `remote: local` entry.
fn parse_entry(entry: &str) -> Result<(Snowflake, String), ConfigError> {
    let entry = entry.trim();
    let invalid = |message: &str| ConfigError::InvalidMapping {
        entry: entry.to_string(),
        message: message.to_string(),
    };

    if entry.is_empty() {
        return Err(invalid("empty entry"));
    }

    let (remote, local) = entry
        .split_once(':')
        .ok_or_else(|| invalid("expected 'discord_channel_id: #irc-channel'"))?;

    if local.contains(':') {
        return Err(invalid("expected exactly one ':'"));
    }

    let remote = remote.trim();
    if remote.is_empty() {
        return Err(invalid("Discord channel id is empty"));
    }
    let remote_id = remote
        .parse::<Snowflake>()
        .map_err(|_| invalid("Discord channel id must be numeric"))?;

    let local = local.trim();
    if local.is_empty() {
        return Err(invalid("IRC channel name is empty"));
    }
    if local.contains(char::is_whitespace) {
        return Err(invalid("IRC channel name must not contain whitespace"));
    }

    Ok((remote_id, local.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pairs() {
        let table = ChannelMappingTable::parse("1234: #one, 5678:#two").unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.resolve_to_remote("#one"), Some(Snowflake(1234)));
        assert_eq!(table.resolve_to_remote("#two"), Some(Snowflake(5678)));
        assert_eq!(table.resolve_to_local(Snowflake(1234)), Some("#one"));
        assert_eq!(table.resolve_to_local(Snowflake(9999)), None);
        assert_eq!(table.resolve_to_remote("#three"), None);
    }

    #[test]
    fn test_round_trip_for_every_pair() {
        let table =
            ChannelMappingTable::parse("1: #a, 2: #b, 3: #c, 444444444444444444: #rust").unwrap();

        for mapping in table.mappings() {
            let local = table.resolve_to_local(mapping.remote_id).unwrap();
            assert_eq!(table.resolve_to_remote(local), Some(mapping.remote_id));

            let remote = table.resolve_to_remote(&mapping.local_id).unwrap();
            assert_eq!(table.resolve_to_local(remote), Some(mapping.local_id.as_str()));
        }
    }

    #[test]
    fn test_local_ids_case_insensitive() {
        let table = ChannelMappingTable::parse("1234: #Rust").unwrap();
        assert_eq!(table.resolve_to_remote("#rust"), Some(Snowflake(1234)));
        assert_eq!(table.resolve_to_remote("#RUST"), Some(Snowflake(1234)));
        assert_eq!(table.resolve_to_local(Snowflake(1234)), Some("#rust"));
    }

    #[test]
    fn test_keeps_configuration_order() {
        let table = ChannelMappingTable::parse("3: #c, 1: #a, 2: #b").unwrap();
        let remotes: Vec<u64> = table.remote_ids().map(|id| id.0).collect();
        let locals: Vec<&str> = table.local_ids().collect();
        assert_eq!(remotes, vec![3, 1, 2]);
        assert_eq!(locals, vec!["#c", "#a", "#b"]);
    }

    #[test]
    fn test_duplicate_remote_id_fails() {
        let result = ChannelMappingTable::parse("1234: #one, 1234: #two");
        assert!(matches!(
            result,
            Err(ConfigError::DuplicateChannel { side: "Discord", .. })
        ));
    }

    #[test]
    fn test_duplicate_local_id_fails() {
        let result = ChannelMappingTable::parse("1234: #one, 5678: #ONE");
        assert!(matches!(
            result,
            Err(ConfigError::DuplicateChannel { side: "IRC", .. })
        ));
    }

    #[test]
    fn test_missing_colon_fails() {
        let result = ChannelMappingTable::parse("1234 #one");
        assert!(matches!(result, Err(ConfigError::InvalidMapping { .. })));
    }

    #[test]
    fn test_extra_colon_fails() {
        let result = ChannelMappingTable::parse("1234: #one: extra");
        assert!(matches!(result, Err(ConfigError::InvalidMapping { .. })));
    }

    #[test]
    fn test_non_numeric_remote_fails() {
        let result = ChannelMappingTable::parse("general: #one");
        let message = result.unwrap_err().to_string();
        assert!(message.contains("numeric"));
    }

    #[test]
    fn test_empty_sides_fail() {
        assert!(ChannelMappingTable::parse(": #one").is_err());
        assert!(ChannelMappingTable::parse("1234:").is_err());
        assert!(ChannelMappingTable::parse("1234: #one,").is_err());
    }

    #[test]
    fn test_blank_value_is_empty_table() {
        let table = ChannelMappingTable::parse("   ").unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_from_pairs() {
        let table = ChannelMappingTable::from_pairs(vec![
            (Snowflake(10), "#ten"),
            (Snowflake(20), "#twenty"),
        ])
        .unwrap();
        assert_eq!(table.resolve_to_remote("#twenty"), Some(Snowflake(20)));

        let duplicate =
            ChannelMappingTable::from_pairs(vec![(Snowflake(10), "#ten"), (Snowflake(10), "#x")]);
        assert!(duplicate.is_err());
    }
}
