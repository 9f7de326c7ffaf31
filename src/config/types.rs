//! Configuration type definitions.

use serde::Deserialize;

use crate::corrade::GroupCredential;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub corrade: CorradeConfig,
    pub discord: DiscordConfig,
}

/// Corrade MQTT and group settings.
#[derive(Clone, Deserialize)]
pub struct CorradeConfig {
    /// Broker URI, e.g. `mqtt://corrade.local:1883`.
    pub mqtt: String,
    /// Second Life group name.
    pub group: String,
    /// Group password configured in Corrade.
    pub password: String,
}

impl std::fmt::Debug for CorradeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorradeConfig")
            .field("mqtt", &self.mqtt)
            .field("group", &self.group)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Discord bot configuration.
#[derive(Clone, Deserialize)]
pub struct DiscordConfig {
    /// Bot token.
    #[serde(rename = "botKey")]
    pub bot_key: String,
    /// Name of the Discord server (guild).
    pub server: String,
    /// Name of the channel to relay.
    pub channel: String,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("bot_key", &"<redacted>")
            .field("server", &self.server)
            .field("channel", &self.channel)
            .finish()
    }
}

/// Discord server and channel the bridge relays to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayTarget {
    pub guild_name: String,
    pub channel_name: String,
}

impl Config {
    /// Group credential used for topics and commands.
    pub fn credential(&self) -> GroupCredential {
        GroupCredential::new(&self.corrade.group, &self.corrade.password)
    }

    /// Discord server/channel pair to resolve.
    pub fn relay_target(&self) -> RelayTarget {
        RelayTarget {
            guild_name: self.discord.server.clone(),
            channel_name: self.discord.channel.clone(),
        }
    }
}
