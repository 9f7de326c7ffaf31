//! Configuration validation.
//!
//! Validates configuration values and provides helpful error messages.

use crate::common::error::ConfigError;
use crate::config::types::Config;

/// Broker URI schemes understood by the MQTT client.
const MQTT_SCHEMES: [&str; 4] = ["mqtt://", "mqtts://", "tcp://", "ssl://"];

/// Validate a configuration and return detailed errors.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    // Corrade
    if config.corrade.mqtt.is_empty() {
        errors.push("corrade.mqtt is required".to_string());
    } else if !MQTT_SCHEMES
        .iter()
        .any(|scheme| config.corrade.mqtt.starts_with(scheme))
    {
        errors.push(format!(
            "corrade.mqtt '{}' must start with one of: {}",
            config.corrade.mqtt,
            MQTT_SCHEMES.join(", ")
        ));
    }
    if config.corrade.group.is_empty() {
        errors.push("corrade.group is required".to_string());
    }
    if config.corrade.password.is_empty() {
        errors.push("corrade.password is required".to_string());
    }
    // Both end up as topic levels.
    if config.corrade.group.contains('/') {
        errors.push("corrade.group must not contain '/'".to_string());
    }
    if config.corrade.password.contains('/') {
        errors.push("corrade.password must not contain '/'".to_string());
    }

    // Discord
    if config.discord.bot_key.is_empty() {
        errors.push("discord.botKey is required".to_string());
    }
    if config.discord.bot_key == "YOUR_DISCORD_TOKEN_HERE" {
        errors.push("discord.botKey has not been configured (still using placeholder)".to_string());
    }
    if config.discord.server.is_empty() {
        errors.push("discord.server is required".to_string());
    }
    if config.discord.channel.is_empty() {
        errors.push("discord.channel is required".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            message: errors.join("\n"),
        })
    }
}
