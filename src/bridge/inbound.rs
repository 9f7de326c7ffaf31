//! Group chat → Discord relay.
//!
//! Turns a raw Corrade notification payload into a message for the relay
//! channel, or explains why it was dropped.

use serenity::model::id::ChannelId;

use crate::bridge::echo::{format_discord_message, is_relayed_from_discord};
use crate::bridge::state::ChannelReader;
use crate::common::error::{FilterReason, RelayError, RelayResult};
use crate::common::InboundNotification;
use crate::corrade::codec;
use crate::corrade::GroupCredential;

/// Notification type Corrade uses for group chat.
const GROUP_NOTIFICATION: &str = "group";

/// A message ready to be posted to Discord.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatDelivery {
    pub channel_id: ChannelId,
    pub content: String,
}

/// Filters and formats group chat notifications for Discord.
#[derive(Debug, Clone)]
pub struct InboundRelay {
    /// Configured group name, uppercased for comparison.
    group_upper: String,
    channel: ChannelReader,
}

impl InboundRelay {
    pub fn new(credential: &GroupCredential, channel: ChannelReader) -> Self {
        Self {
            group_upper: credential.group_name().to_uppercase(),
            channel,
        }
    }

    /// Decode a payload and run it through the relay rules.
    pub fn process(&self, payload: &[u8]) -> RelayResult<ChatDelivery> {
        let values = codec::decode(payload)?;
        self.process_notification(&InboundNotification::from_key_values(&values))
    }

    /// Run a decoded notification through the relay rules.
    pub fn process_notification(&self, notification: &InboundNotification) -> RelayResult<ChatDelivery> {
        if notification.kind.as_deref() != Some(GROUP_NOTIFICATION) {
            return Err(RelayError::FilteredOut(FilterReason::NotGroupNotification));
        }

        let group = notification
            .group
            .as_deref()
            .ok_or(RelayError::FilteredOut(FilterReason::MissingField("group")))?;
        if group.to_uppercase() != self.group_upper {
            return Err(RelayError::FilteredOut(FilterReason::OtherGroup));
        }

        let message = notification.require_message()?;
        if is_relayed_from_discord(message) {
            return Err(RelayError::FilteredOut(FilterReason::EchoLoop));
        }

        let channel_id = self.channel.get().ok_or(RelayError::DestinationUnresolved)?;

        Ok(ChatDelivery {
            channel_id,
            content: format_discord_message(
                notification.firstname.as_deref().unwrap_or_default(),
                notification.lastname.as_deref().unwrap_or_default(),
                message,
            ),
        })
    }
}
