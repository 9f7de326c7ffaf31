//! Message shapes the bridge writes into each side.
//!
//! Messages relayed from Discord into group chat come back to us through
//! Corrade's group notifications. They are recognised by the shape produced
//! by `format_group_reply`, so the pattern and the formatter must change
//! together.

use std::sync::LazyLock;

use fancy_regex::Regex;
use tracing::warn;

/// Tag appended to Discord author names in group chat.
pub const DISCORD_TAG: &str = "[Discord]";

/// Tag appended to avatar names in Discord.
pub const GROUP_TAG: &str = "[SL]";

/// Matches any line shaped like a `format_group_reply` result.
pub const ECHO_LOOP_PATTERN: &str = r"(?m)^.+?#[0-9]+? \[Discord\]:.+?$";

static ECHO_LOOP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(ECHO_LOOP_PATTERN).expect("echo loop pattern compiles"));

/// Whether a group chat message was put there by this bridge.
pub fn is_relayed_from_discord(message: &str) -> bool {
    ECHO_LOOP.is_match(message).unwrap_or_else(|e| {
        warn!("Echo loop pattern failed to match: {}", e);
        false
    })
}

/// Group chat text for a Discord message.
///
/// NOTE: anyone can type text of this shape into group chat and have it
/// dropped on the way to Discord.
pub fn format_group_reply(author: &str, discriminator: &str, content: &str) -> String {
    format!("{}#{} {}: {}", author, discriminator, DISCORD_TAG, content)
}

/// Discord text for a group chat message.
pub fn format_discord_message(firstname: &str, lastname: &str, message: &str) -> String {
    format!("{} {} {}: {}", firstname, lastname, GROUP_TAG, message)
}
