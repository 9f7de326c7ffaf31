//! Environment variable overrides for configuration.
//!
//! Supports overriding config values with environment variables:
//! - `CORRADE_BRIDGE_MQTT` - Corrade MQTT broker URI
//! - `CORRADE_BRIDGE_GROUP` - Second Life group name
//! - `CORRADE_BRIDGE_PASSWORD` - Corrade group password
//! - `CORRADE_BRIDGE_DISCORD_TOKEN` - Discord bot token
//! - `CORRADE_BRIDGE_DISCORD_SERVER` - Discord server name
//! - `CORRADE_BRIDGE_DISCORD_CHANNEL` - Discord channel name

use std::env;

use crate::config::types::Config;

/// Environment variable prefix for all config overrides.
const ENV_PREFIX: &str = "CORRADE_BRIDGE";

fn var(name: &str) -> Option<String> {
    env::var(format!("{}_{}", ENV_PREFIX, name)).ok()
}

/// Apply environment variable overrides to a config.
///
/// This allows sensitive values like tokens and passwords to be
/// provided via environment variables instead of the config file.
pub fn apply_env_overrides(mut config: Config) -> Config {
    // Corrade
    if let Some(mqtt) = var("MQTT") {
        config.corrade.mqtt = mqtt;
    }
    if let Some(group) = var("GROUP") {
        config.corrade.group = group;
    }
    if let Some(password) = var("PASSWORD") {
        config.corrade.password = password;
    }

    // Discord
    if let Some(token) = var("DISCORD_TOKEN") {
        config.discord.bot_key = token;
    }
    if let Some(server) = var("DISCORD_SERVER") {
        config.discord.server = server;
    }
    if let Some(channel) = var("DISCORD_CHANNEL") {
        config.discord.channel = channel;
    }

    config
}

/// Get the config file path from environment or use default.
///
/// Checks `CORRADE_BRIDGE_CONFIG`, otherwise returns "corrade-discord-bridge.conf".
pub fn get_config_path() -> String {
    var("CONFIG").unwrap_or_else(|| "corrade-discord-bridge.conf".to_string())
}

/// Get the log directory from environment or use default.
pub fn get_log_dir() -> String {
    var("LOG_DIR").unwrap_or_else(|| "log".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::*;

    fn make_test_config() -> Config {
        Config {
            corrade: CorradeConfig {
                mqtt: "mqtt://localhost:1883".to_string(),
                group: "MyGroup".to_string(),
                password: "secret".to_string(),
            },
            discord: DiscordConfig {
                bot_key: "original_token".to_string(),
                server: "Server".to_string(),
                channel: "general".to_string(),
            },
        }
    }

    #[test]
    fn test_env_prefix() {
        assert_eq!(ENV_PREFIX, "CORRADE_BRIDGE");
    }

    #[test]
    fn test_get_config_path_default() {
        env::remove_var("CORRADE_BRIDGE_CONFIG");
        assert_eq!(get_config_path(), "corrade-discord-bridge.conf");
    }

    #[test]
    fn test_apply_env_overrides_no_vars() {
        env::remove_var("CORRADE_BRIDGE_DISCORD_TOKEN");
        env::remove_var("CORRADE_BRIDGE_GROUP");

        let config = make_test_config();
        let result = apply_env_overrides(config);

        assert_eq!(result.discord.bot_key, "original_token");
        assert_eq!(result.corrade.group, "MyGroup");
    }

    #[test]
    fn test_apply_env_override_channel() {
        env::set_var("CORRADE_BRIDGE_DISCORD_CHANNEL", "relay");

        let result = apply_env_overrides(make_test_config());
        env::remove_var("CORRADE_BRIDGE_DISCORD_CHANNEL");

        assert_eq!(result.discord.channel, "relay");
        assert_eq!(result.discord.server, "Server");
    }
}
