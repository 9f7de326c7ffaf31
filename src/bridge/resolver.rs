//! Discord channel resolution.
//!
//! Maps the configured server/channel names to the channel id the relay
//! uses, once Discord reports which channels the bot can see.

use serenity::model::id::ChannelId;
use tracing::{debug, info};

use crate::bridge::state::ChannelHandle;
use crate::common::error::{RelayError, RelayResult};
use crate::common::ChannelInfo;
use crate::config::types::RelayTarget;

/// Resolves the relay channel by server and channel name.
#[derive(Debug, Clone)]
pub struct ChannelResolver {
    target: RelayTarget,
}

impl ChannelResolver {
    pub fn new(target: RelayTarget) -> Self {
        Self { target }
    }

    /// First channel matching both the channel name and the server name.
    pub fn find<'a>(&self, channels: &'a [ChannelInfo]) -> Option<&'a ChannelInfo> {
        channels.iter().find(|ch| {
            ch.name == self.target.channel_name && ch.guild_name == self.target.guild_name
        })
    }

    /// Resolve `handle` from the visible channels.
    ///
    /// A handle that is already resolved is left alone and its id returned.
    pub fn resolve(&self, channels: &[ChannelInfo], handle: &ChannelHandle) -> RelayResult<ChannelId> {
        if let Some(existing) = handle.get() {
            debug!("Discord channel already resolved (ID {}), ignoring", existing);
            return Ok(existing);
        }

        let channel = self.find(channels).ok_or_else(|| RelayError::ChannelNotFound {
            guild: self.target.guild_name.clone(),
            channel: self.target.channel_name.clone(),
        })?;

        handle.resolve(channel.id);
        info!(
            "Resolved Discord channel '{}' on '{}' -> ID {} ({:?})",
            channel.name, channel.guild_name, channel.id, channel.kind
        );
        Ok(channel.id)
    }
}
