//! Relay core: channel mappings, webhook endpoints and both message directions.
//!
//! ## Module Structure
//!
//! - `mapping`: IRC channel <-> Discord channel table
//! - `endpoints`: per-channel webhook discovery and creation
//! - `filter`: bot command detection shared by both directions
//! - `inbound`: Discord -> IRC normalization
//! - `outbound`: IRC -> Discord webhook delivery
//! - `coordinator`: context lifecycle and the start-once Discord connection

pub mod coordinator;
pub mod endpoints;
pub mod filter;
pub mod inbound;
pub mod mapping;
pub mod outbound;

pub use coordinator::{Coordinator, LocalSink};
pub use mapping::ChannelMappingTable;
