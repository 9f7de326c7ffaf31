//! Canonical message types for bridge communication.
//!
//! Transport tasks translate their native events into these types and hand
//! them to the relay coordinator over channels.

use bytes::Bytes;
use serenity::model::channel::ChannelType;
use serenity::model::id::ChannelId;

use crate::common::error::{FilterReason, RelayError, RelayResult};
use crate::corrade::codec::KeyValues;

/// Group chat notification pushed by Corrade over MQTT.
///
/// Only the fields the relay looks at are kept; everything else in the
/// payload is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundNotification {
    pub kind: Option<String>,
    pub group: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub message: Option<String>,
}

impl InboundNotification {
    /// Build a notification from decoded key-value pairs.
    pub fn from_key_values(values: &KeyValues) -> Self {
        let field = |key: &str| values.get(key).map(str::to_string);
        Self {
            kind: field("type"),
            group: field("group"),
            firstname: field("firstname"),
            lastname: field("lastname"),
            message: field("message"),
        }
    }

    /// The message body, required for anything to be relayed.
    pub fn require_message(&self) -> RelayResult<&str> {
        self.message
            .as_deref()
            .ok_or(RelayError::FilteredOut(FilterReason::MissingField("message")))
    }
}

/// A Discord message, flattened to what the relay needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundChatMessage {
    pub author_name: String,
    pub author_discriminator: String,
    pub author_is_bot: bool,
    pub channel_id: ChannelId,
    /// Name of the guild the channel belongs to, if it is cached.
    pub guild_name: Option<String>,
    /// Type of the channel, if it is cached.
    pub channel_type: Option<ChannelType>,
    pub content: String,
    pub attachment_urls: Vec<String>,
}

/// A Discord channel visible to the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: ChannelId,
    pub name: String,
    pub kind: ChannelType,
    pub guild_name: String,
}

/// Events emitted by the MQTT side.
#[derive(Debug, Clone)]
pub enum BrokerEvent {
    /// Connected (or reconnected) to the broker and subscribed.
    Connected,
    /// A message arrived on a subscribed topic.
    Message { topic: String, payload: Bytes },
}

/// Events emitted by the Discord side.
#[derive(Debug, Clone)]
pub enum ChatEvent {
    /// The cache is populated; these are the channels the bot can see.
    Ready { channels: Vec<ChannelInfo> },
    /// A message was posted in some channel.
    Message(OutboundChatMessage),
}
