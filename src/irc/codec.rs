//! IRC line codec.
//!
//! Frames the byte stream into CRLF-terminated lines and parses each into
//! `[@tags] [:prefix] COMMAND params [:trailing]`.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use crate::common::error::IrcError;

/// Longest line we accept from the server (IRCv3 tags included).
const MAX_LINE_LEN: usize = 8192;

/// CTCP delimiter.
const CTCP: char = '\x01';

/// A parsed IRC protocol line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrcMessage {
    pub prefix: Option<String>,
    pub command: String,
    /// Middle parameters followed by the trailing one, if any.
    pub params: Vec<String>,
}

impl IrcMessage {
    /// Parse a single line without its line terminator.
    pub fn parse(line: &str) -> Option<Self> {
        let mut rest = line.trim_end_matches(['\r', '\n']);

        if let Some(tagged) = rest.strip_prefix('@') {
            rest = tagged.split_once(' ').map(|(_, r)| r)?;
        }
        rest = rest.trim_start();

        let prefix = match rest.strip_prefix(':') {
            Some(prefixed) => {
                let (prefix, r) = prefixed.split_once(' ')?;
                rest = r;
                Some(prefix.to_string())
            }
            None => None,
        };

        let (middle, trailing) = match rest.find(" :") {
            Some(idx) => (&rest[..idx], Some(&rest[idx + 2..])),
            None => match rest.strip_prefix(':') {
                Some(t) => ("", Some(t)),
                None => (rest, None),
            },
        };

        let mut words = middle.split_whitespace();
        let command = words.next()?.to_ascii_uppercase();

        let mut params: Vec<String> = words.map(String::from).collect();
        if let Some(trailing) = trailing {
            params.push(trailing.to_string());
        }

        Some(Self {
            prefix,
            command,
            params,
        })
    }

    /// Nickname part of a `nick!user@host` prefix.
    pub fn nick(&self) -> Option<&str> {
        self.prefix
            .as_deref()
            .map(|prefix| prefix.split('!').next().unwrap_or(prefix))
    }

    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }
}

/// Body of a PRIVMSG, with CTCP framing interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrivmsgBody<'a> {
    Text(&'a str),
    Action(&'a str),
    /// Any other CTCP request (VERSION, PING, ...).
    Ctcp(&'a str),
}

pub fn parse_privmsg_body(text: &str) -> PrivmsgBody<'_> {
    let Some(inner) = text.strip_prefix(CTCP) else {
        return PrivmsgBody::Text(text);
    };
    let inner = inner.strip_suffix(CTCP).unwrap_or(inner);

    match inner.split_once(' ') {
        Some(("ACTION", body)) => PrivmsgBody::Action(body),
        _ if inner == "ACTION" => PrivmsgBody::Action(""),
        _ => PrivmsgBody::Ctcp(inner),
    }
}

/// Build a CTCP ACTION body.
pub fn ctcp_action(text: &str) -> String {
    format!("{CTCP}ACTION {text}{CTCP}")
}

/// Codec framing IRC lines.
#[derive(Debug, Default)]
pub struct IrcCodec {
    /// Bytes already scanned for a newline.
    next_index: usize,
    /// Inside an oversized line; drop input up to the next newline.
    discarding: bool,
}

impl IrcCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for IrcCodec {
    type Item = IrcMessage;
    type Error = IrcError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let newline = src[self.next_index..].iter().position(|b| *b == b'\n');

            if self.discarding {
                match newline {
                    Some(offset) => {
                        src.advance(self.next_index + offset + 1);
                        self.next_index = 0;
                        self.discarding = false;
                        continue;
                    }
                    None => {
                        src.advance(src.len());
                        self.next_index = 0;
                        return Ok(None);
                    }
                }
            }

            let Some(offset) = newline else {
                if src.len() > MAX_LINE_LEN {
                    warn!("Discarding IRC line longer than {} bytes", MAX_LINE_LEN);
                    src.advance(src.len());
                    self.next_index = 0;
                    self.discarding = true;
                    return Ok(None);
                }
                self.next_index = src.len();
                return Ok(None);
            };

            let line_end = self.next_index + offset;
            self.next_index = 0;

            if line_end > MAX_LINE_LEN {
                warn!("Discarding IRC line longer than {} bytes", MAX_LINE_LEN);
                src.advance(line_end + 1);
                continue;
            }

            let line = src.split_to(line_end + 1);
            let text = String::from_utf8_lossy(&line);

            if let Some(message) = IrcMessage::parse(&text) {
                return Ok(Some(message));
            }
            // Blank or garbage line: keep reading.
        }
    }
}

impl Encoder<String> for IrcCodec {
    type Error = IrcError;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> Result<(), Self::Error> {
        // A stray newline would let text smuggle in extra commands.
        let line = line.replace(['\r', '\n'], " ");
        dst.reserve(line.len() + 2);
        dst.put_slice(line.as_bytes());
        dst.put_slice(b"\r\n");
        Ok(())
    }
}
