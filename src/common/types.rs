//! Shared types used across the application.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;

/// A Discord snowflake id.
///
/// Discord sends webhook ids as JSON strings while the gateway model exposes
/// author ids as integers. Both are normalized into this type so identity
/// checks never depend on implicit conversions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Snowflake(pub u64);

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Snowflake {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl<'de> Deserialize<'de> for Snowflake {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SnowflakeVisitor;

        impl Visitor<'_> for SnowflakeVisitor {
            type Value = Snowflake;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a snowflake id as an integer or numeric string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Snowflake, E> {
                Ok(Snowflake(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Snowflake, E> {
                u64::try_from(v)
                    .map(Snowflake)
                    .map_err(|_| E::custom(format!("negative snowflake {}", v)))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Snowflake, E> {
                v.parse()
                    .map_err(|_| E::custom(format!("invalid snowflake '{}'", v)))
            }
        }

        deserializer.deserialize_any(SnowflakeVisitor)
    }
}

/// A message event observed on the Discord gateway.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub author_id: Snowflake,
    pub author_name: String,
    /// Set when the message was posted through a webhook.
    pub webhook_id: Option<Snowflake>,
    pub channel_id: Snowflake,
    pub raw_text: String,
    pub attachments: Vec<String>,
}

/// A message ready to be spoken on IRC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedMessage {
    pub display_name: String,
    pub body: String,
    pub is_action: bool,
}

/// A channel message seen by the IRC client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundTrigger {
    pub sender_nick: String,
    /// Message target: the channel name, or our own nick for private messages.
    pub channel_id: String,
    pub raw_text: String,
    pub is_action_hint: bool,
    pub is_private: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snowflake_from_string_and_number() {
        let from_str: Snowflake = serde_json::from_str("\"123456789012345678\"").unwrap();
        let from_num: Snowflake = serde_json::from_str("123456789012345678").unwrap();
        assert_eq!(from_str, from_num);
        assert_eq!(from_str.0, 123456789012345678);
    }

    #[test]
    fn test_snowflake_rejects_garbage() {
        assert!(serde_json::from_str::<Snowflake>("\"abc\"").is_err());
        assert!(serde_json::from_str::<Snowflake>("-5").is_err());
    }

    #[test]
    fn test_snowflake_parse_trims() {
        let id: Snowflake = " 42 ".parse().unwrap();
        assert_eq!(id, Snowflake(42));
        assert_eq!(id.to_string(), "42");
    }
}
