//! IRC text formatting: mIRC control codes and line splitting.

use std::sync::OnceLock;

use fancy_regex::Regex;

use crate::bridge::filter::compile_builtin;

pub const BOLD: char = '\x02';
pub const COLOR: char = '\x03';

/// mIRC color number for light cyan.
pub const LIGHT_CYAN: u8 = 11;

/// Wrap text in bold markers.
pub fn bold(text: &str) -> String {
    format!("{BOLD}{text}{BOLD}")
}

/// Color text with an mIRC foreground color.
pub fn color(text: &str, fg: u8) -> String {
    format!("{COLOR}{fg:02}{text}{COLOR}")
}

/// Remove mIRC formatting (bold, colors, italics, underline, reverse, reset).
pub fn strip_formatting(text: &str) -> String {
    static FORMATTING: OnceLock<Regex> = OnceLock::new();
    let pattern = FORMATTING.get_or_init(|| {
        compile_builtin(
            r"\x03(?:\d{1,2}(?:,\d{1,2})?)?|\x04(?:[0-9a-fA-F]{6}(?:,[0-9a-fA-F]{6})?)?|[\x02\x0F\x11\x16\x1D\x1E\x1F]",
        )
    });
    pattern.replace_all(text, "").to_string()
}

/// Find the last UTF-8 char boundary at or before `byte_index` in `s`.
fn floor_char_boundary(s: &str, byte_index: usize) -> usize {
    if byte_index >= s.len() {
        return s.len();
    }
    let mut i = byte_index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Split a message into chunks that fit within `max_len` bytes.
///
/// Splits on word boundaries when possible and never inside a multi-byte
/// UTF-8 character.
pub fn split_message(message: &str, max_len: usize) -> Vec<String> {
    if message.len() <= max_len {
        return vec![message.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = message;

    while !remaining.is_empty() {
        remaining = remaining.trim_start();
        if remaining.is_empty() {
            break;
        }

        if remaining.len() <= max_len {
            chunks.push(remaining.to_string());
            break;
        }

        let split_at = floor_char_boundary(remaining, max_len);

        // max_len smaller than the first character: take one character anyway.
        if split_at == 0 {
            let first_char_end = remaining
                .char_indices()
                .nth(1)
                .map(|(i, _)| i)
                .unwrap_or(remaining.len());
            chunks.push(remaining[..first_char_end].to_string());
            remaining = &remaining[first_char_end..];
            continue;
        }

        let chunk = &remaining[..split_at];
        if let Some(space_idx) = chunk.rfind(' ') {
            chunks.push(remaining[..space_idx].to_string());
            remaining = &remaining[space_idx + 1..];
        } else {
            chunks.push(chunk.to_string());
            remaining = &remaining[split_at..];
        }
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bold_and_color() {
        assert_eq!(bold("x"), "\x02x\x02");
        assert_eq!(color("x", LIGHT_CYAN), "\x0311x\x03");
        assert_eq!(color("x", 4), "\x0304x\x03");
    }

    #[test]
    fn test_strip_formatting() {
        assert_eq!(strip_formatting("\x02bold\x02"), "bold");
        assert_eq!(strip_formatting("\x0304,12red on blue\x03 plain"), "red on blue plain");
        assert_eq!(strip_formatting("\x1Ditalic\x1D\x0F"), "italic");
        assert_eq!(strip_formatting("\x04FF0000hex\x04"), "hex");
        assert_eq!(strip_formatting("5 apples"), "5 apples");
    }

    #[test]
    fn test_strip_round_trips_own_formatting() {
        let decorated = format!("<{}> hi", color(&bold("bob"), LIGHT_CYAN));
        assert_eq!(strip_formatting(&decorated), "<bob> hi");
    }

    #[test]
    fn test_split_message_short() {
        assert_eq!(split_message("Hello world", 50), vec!["Hello world"]);
    }

    #[test]
    fn test_split_message_on_space() {
        let chunks = split_message("Hello beautiful world", 15);
        assert_eq!(chunks, vec!["Hello", "beautiful world"]);
    }

    #[test]
    fn test_split_message_no_space() {
        let chunks = split_message("HelloBeautifulWorld", 10);
        assert_eq!(chunks, vec!["HelloBeaut", "ifulWorld"]);
    }

    #[test]
    fn test_split_message_multibyte_utf8() {
        // "café" is 5 bytes; max_len=4 lands inside 'é'.
        let chunks = split_message("café rest", 4);
        assert_eq!(chunks, vec!["caf", "é", "rest"]);
    }
}
