//! Discord event handling.
//!
//! Converts serenity events into bridge events, and posts relayed
//! messages back to Discord.

use std::num::NonZeroU16;
use std::sync::Arc;

use serenity::async_trait;
use serenity::cache::Cache;
use serenity::gateway::{ConnectionStage, ShardStageUpdateEvent};
use serenity::http::Http;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::model::guild::UnavailableGuild;
use serenity::model::id::{ChannelId, GuildId};
use serenity::prelude::*;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::bridge::ChatSender;
use crate::common::error::{RelayError, RelayResult};
use crate::common::{ChannelInfo, ChatEvent, OutboundChatMessage};

/// Forwards serenity events to the relay coordinator.
pub struct DiscordEvents {
    event_tx: mpsc::UnboundedSender<ChatEvent>,
}

impl DiscordEvents {
    pub fn new(event_tx: mpsc::UnboundedSender<ChatEvent>) -> Self {
        Self { event_tx }
    }

    fn forward(&self, event: ChatEvent) {
        if let Err(error) = self.event_tx.send(event) {
            warn!("Failed to process discord event: {}", error);
        }
    }

    /// `cache_ready` only follows a guild create, so a bot in no guilds
    /// resolves against an empty channel list here instead.
    fn ready_without_guilds(&self, guilds: &[UnavailableGuild]) {
        if guilds.is_empty() {
            warn!("Discord bot is not a member of any server");
            self.forward(ChatEvent::Ready { channels: Vec::new() });
        }
    }
}

#[async_trait]
impl EventHandler for DiscordEvents {
    async fn ready(&self, _context: Context, ready: Ready) {
        info!(
            "Discord bot connected as {} ({} guilds)",
            ready.user.name,
            ready.guilds.len()
        );
        self.ready_without_guilds(&ready.guilds);
    }

    async fn cache_ready(&self, context: Context, guilds: Vec<GuildId>) {
        let channels = visible_channels(&context.cache, &guilds);
        self.forward(ChatEvent::Ready { channels });
    }

    async fn message(&self, context: Context, message: Message) {
        let message = outbound_message(&context.cache, &message);
        self.forward(ChatEvent::Message(message));
    }

    async fn shard_stage_update(&self, _context: Context, event: ShardStageUpdateEvent) {
        if is_reconnect(event.old, event.new) {
            info!("Reconnecting to Discord...");
        } else if event.new == ConnectionStage::Disconnected {
            warn!("Discord shard {} disconnected", event.shard_id.0);
        } else {
            debug!("Discord shard {}: {:?} -> {:?}", event.shard_id.0, event.old, event.new);
        }
    }
}

fn is_reconnect(old: ConnectionStage, new: ConnectionStage) -> bool {
    old == ConnectionStage::Connected
        && matches!(new, ConnectionStage::Connecting | ConnectionStage::Resuming)
}

/// Every cached channel of the given guilds, in sidebar order per guild.
fn visible_channels(cache: &Cache, guilds: &[GuildId]) -> Vec<ChannelInfo> {
    let mut channels = Vec::new();
    for guild_id in guilds {
        let Some(guild) = cache.guild(*guild_id) else {
            warn!("Guild {} missing from cache", guild_id);
            continue;
        };

        let mut guild_channels: Vec<_> = guild.channels.values().collect();
        guild_channels.sort_by_key(|ch| (ch.position, ch.id));

        channels.extend(guild_channels.into_iter().map(|ch| ChannelInfo {
            id: ch.id,
            name: ch.name.clone(),
            kind: ch.kind,
            guild_name: guild.name.clone(),
        }));
    }
    channels
}

/// Flatten a serenity message, looking up its guild and channel in the cache.
fn outbound_message(cache: &Cache, message: &Message) -> OutboundChatMessage {
    let (guild_name, channel_type) = message
        .guild_id
        .and_then(|guild_id| cache.guild(guild_id))
        .map(|guild| {
            (
                Some(guild.name.clone()),
                guild.channels.get(&message.channel_id).map(|ch| ch.kind),
            )
        })
        .unwrap_or((None, None));

    OutboundChatMessage {
        author_name: message.author.name.clone(),
        author_discriminator: format_discriminator(message.author.discriminator),
        author_is_bot: message.author.bot,
        channel_id: message.channel_id,
        guild_name,
        channel_type,
        content: message.content.clone(),
        attachment_urls: message.attachments.iter().map(|a| a.url.clone()).collect(),
    }
}

/// Legacy four digit tag, or `0` for accounts on the new username system.
fn format_discriminator(discriminator: Option<NonZeroU16>) -> String {
    discriminator
        .map(|d| format!("{:04}", d.get()))
        .unwrap_or_else(|| "0".to_string())
}

/// Posts relayed group chat to Discord over the REST API.
pub struct DiscordSender {
    http: Arc<Http>,
}

impl DiscordSender {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ChatSender for DiscordSender {
    async fn send(&self, channel_id: ChannelId, content: String) -> RelayResult<()> {
        channel_id
            .say(&self.http, content)
            .await
            .map(|_| ())
            .map_err(|e| RelayError::Transport {
                message: e.to_string(),
            })
    }
}
