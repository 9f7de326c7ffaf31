//! Discord bot client abstraction.
//!
//! Provides a high-level interface for creating and running the Discord bot,
//! hiding serenity implementation details from the rest of the application.

use serenity::prelude::*;
use serenity::Client;
use tokio::sync::watch;
use tracing::{error, info};

use crate::bridge::channels::ChatSideChannels;
use crate::common::error::Result;
use crate::discord::handler::{DiscordEvents, DiscordSender};

/// The Discord gateway connection.
pub struct DiscordBot {
    client: Client,
    shutdown_rx: watch::Receiver<bool>,
}

/// Build the Discord client.
///
/// Returns the sender used to post into Discord alongside the bot itself.
/// Nothing connects until `DiscordBot::run`.
pub async fn build(token: &str, channels: ChatSideChannels) -> Result<(DiscordSender, DiscordBot)> {
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let client = Client::builder(token, intents)
        .event_handler(DiscordEvents::new(channels.event_tx))
        .await?;

    let sender = DiscordSender::new(client.http.clone());

    Ok((
        sender,
        DiscordBot {
            client,
            shutdown_rx: channels.shutdown_rx,
        },
    ))
}

impl DiscordBot {
    /// Log in and run the gateway until shutdown.
    ///
    /// serenity reconnects the gateway by itself. A failed login is not
    /// retried: the bot stays offline until the process is restarted.
    pub async fn run(self) {
        let DiscordBot {
            mut client,
            mut shutdown_rx,
        } = self;
        let shard_manager = client.shard_manager.clone();

        info!("Connecting to Discord...");

        tokio::select! {
            result = client.start() => {
                match result {
                    Ok(()) => info!("Discord client disconnected"),
                    Err(e) => error!("Failed to login to Discord: {}", e),
                }
                // Keep the event handler (and its channel) alive until shutdown.
                wait_for_shutdown(&mut shutdown_rx).await;
            }
            _ = wait_for_shutdown(&mut shutdown_rx) => {
                info!("Initiating graceful Discord shutdown...");
                shard_manager.shutdown_all().await;
                info!("Discord shutdown complete");
            }
        }

        info!("Discord task ended");
    }
}

async fn wait_for_shutdown(shutdown_rx: &mut watch::Receiver<bool>) {
    while !*shutdown_rx.borrow() {
        if shutdown_rx.changed().await.is_err() {
            break;
        }
    }
}
