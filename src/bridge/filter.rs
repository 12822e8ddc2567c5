//! Command chatter filtering with regex patterns.
//!
//! Messages that look like bot commands on one side (`!help`, `? who`) are
//! meant for a bot on that side and are never relayed to the other.

use fancy_regex::Regex;
use tracing::warn;

/// Text starting with `!` or `?` followed by a word.
pub const COMMAND_PATTERN: &str = r"^[!?]\s*\w+";

/// Compile one of the crate's built-in patterns.
pub(crate) fn compile_builtin(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in pattern must compile")
}

/// Evaluate a pattern, treating match errors (backtrack limits) as no match.
pub(crate) fn is_match(pattern: &Regex, text: &str) -> bool {
    pattern.is_match(text).unwrap_or_else(|e| {
        warn!("Regex match error for pattern '{}': {}", pattern.as_str(), e);
        false
    })
}

/// Matches messages that look like bot commands.
#[derive(Debug, Clone)]
pub struct CommandFilter {
    pattern: Regex,
}

impl Default for CommandFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandFilter {
    pub fn new() -> Self {
        Self {
            pattern: compile_builtin(COMMAND_PATTERN),
        }
    }

    /// Returns `true` if the message is command chatter and must not be relayed.
    pub fn is_command(&self, message: &str) -> bool {
        is_match(&self.pattern, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bang_and_question_commands() {
        let filter = CommandFilter::new();
        assert!(filter.is_command("!help"));
        assert!(filter.is_command("?who"));
        assert!(filter.is_command("! seen alice"));
        assert!(filter.is_command("!_"));
    }

    #[test]
    fn test_regular_text_passes() {
        let filter = CommandFilter::new();
        assert!(!filter.is_command("hello"));
        assert!(!filter.is_command("hello !help"));
        assert!(!filter.is_command("!"));
        assert!(!filter.is_command("?!"));
        assert!(!filter.is_command(" !help"));
        assert!(!filter.is_command(""));
    }
}
