//! Relay between Corrade group chat and one Discord channel.
//!
//! ## Module Structure
//!
//! - `echo`: reply formats and the echo-loop pattern that recognises them
//! - `inbound`: group chat → Discord rules
//! - `outbound`: Discord → group chat rules
//! - `resolver`: server/channel name → channel id
//! - `state`: write-once channel handle
//! - `channels`: event channels between transports and the coordinator
//! - `orchestrator`: the relay coordinator (`RelayCoordinator`)

pub mod channels;
pub mod echo;
pub mod inbound;
pub mod orchestrator;
pub mod outbound;
pub mod resolver;
pub mod state;

pub use channels::ChannelBundle;
pub use orchestrator::{BrokerPublisher, ChatSender, RelayCoordinator};
