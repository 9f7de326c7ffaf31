//! Discord → group chat relay.
//!
//! Turns a Discord message into a Corrade `tell` command for the group
//! topic, or explains why it was dropped.

use serenity::model::channel::ChannelType;

use crate::bridge::echo::format_group_reply;
use crate::bridge::state::ChannelReader;
use crate::common::error::{FilterReason, RelayError, RelayResult};
use crate::common::OutboundChatMessage;
use crate::config::types::RelayTarget;
use crate::corrade::GroupCredential;

/// An encoded command ready to be published to Corrade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    pub topic: String,
    pub payload: String,
}

/// Filters and formats Discord messages for group chat.
#[derive(Debug, Clone)]
pub struct OutboundRelay {
    credential: GroupCredential,
    guild_name: String,
    channel: ChannelReader,
}

impl OutboundRelay {
    pub fn new(credential: GroupCredential, target: &RelayTarget, channel: ChannelReader) -> Self {
        Self {
            credential,
            guild_name: target.guild_name.clone(),
            channel,
        }
    }

    /// Run a Discord message through the relay rules.
    pub fn process(&self, message: &OutboundChatMessage) -> RelayResult<PublishRequest> {
        if message.author_is_bot {
            return Err(RelayError::FilteredOut(FilterReason::BotAuthor));
        }

        let content = message_content(message);
        if content.is_empty() {
            return Err(RelayError::FilteredOut(FilterReason::EmptyContent));
        }

        if self.channel.get() != Some(message.channel_id) {
            return Err(RelayError::FilteredOut(FilterReason::OtherChannel));
        }
        if message.guild_name.as_deref() != Some(self.guild_name.as_str()) {
            return Err(RelayError::FilteredOut(FilterReason::OtherGuild));
        }
        if message.channel_type != Some(ChannelType::Text) {
            return Err(RelayError::FilteredOut(FilterReason::NotTextChannel));
        }

        let reply = format_group_reply(&message.author_name, &message.author_discriminator, &content);

        Ok(PublishRequest {
            topic: self.credential.topic(),
            payload: self.credential.tell_group(&reply),
        })
    }
}

/// Message text followed by each attachment URL, space separated.
fn message_content(message: &OutboundChatMessage) -> String {
    let mut content = message.content.clone();
    for url in &message.attachment_urls {
        content.push(' ');
        content.push_str(url);
    }
    content
}
