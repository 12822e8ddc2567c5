//! IRC side of the relay.

pub mod client;
pub mod codec;
pub mod format;

pub use client::{IrcClient, IrcHandle};
