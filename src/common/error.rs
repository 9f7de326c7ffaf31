//! Error types for the application.

use thiserror::Error;

/// Top-level application error.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("MQTT options error: {0}")]
    MqttOptions(#[from] rumqttc::OptionError),

    #[error("Discord error: {0}")]
    Discord(#[from] serenity::Error),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {message}")]
    IoError { path: String, message: String },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

/// Why a relay filter dropped an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterReason {
    /// Notification `type` missing or not `group`.
    NotGroupNotification,
    /// Notification for another group.
    OtherGroup,
    /// A required notification field is missing.
    MissingField(&'static str),
    /// Message was put into the group by this bridge.
    EchoLoop,
    /// Discord author is a bot.
    BotAuthor,
    /// Nothing to relay after attachments were appended.
    EmptyContent,
    /// Message came from a channel other than the relay channel.
    OtherChannel,
    /// Message came from another guild.
    OtherGuild,
    /// Message came from a non-text channel.
    NotTextChannel,
}

impl std::fmt::Display for FilterReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterReason::NotGroupNotification => write!(f, "not a group notification"),
            FilterReason::OtherGroup => write!(f, "notification for another group"),
            FilterReason::MissingField(field) => write!(f, "missing field '{}'", field),
            FilterReason::EchoLoop => write!(f, "message already relayed from Discord"),
            FilterReason::BotAuthor => write!(f, "author is a bot"),
            FilterReason::EmptyContent => write!(f, "empty message"),
            FilterReason::OtherChannel => write!(f, "not the relay channel"),
            FilterReason::OtherGuild => write!(f, "not the configured server"),
            FilterReason::NotTextChannel => write!(f, "not a text channel"),
        }
    }
}

/// Errors produced while relaying a single event.
///
/// None of these are fatal; the coordinator logs them and moves on.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Malformed payload: {message}")]
    MalformedPayload { message: String },

    #[error("Filtered out: {0}")]
    FilteredOut(FilterReason),

    #[error("Destination Discord channel unknown")]
    DestinationUnresolved,

    #[error("Channel '{channel}' not found on server '{guild}'")]
    ChannelNotFound { guild: String, channel: String },

    #[error("Transport error: {message}")]
    Transport { message: String },
}

impl RelayError {
    /// Whether this is an ordinary drop that should not be reported as an error.
    pub fn is_silent(&self) -> bool {
        matches!(
            self,
            RelayError::MalformedPayload { .. } | RelayError::FilteredOut(_)
        )
    }
}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for relay operations.
pub type RelayResult<T> = std::result::Result<T, RelayError>;
