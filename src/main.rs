//! Corrade Discord bridge
//!
//! Relays Second Life group chat, received from Corrade over MQTT, into a
//! Discord channel and relays that channel back into group chat.

mod bridge;
mod common;
mod config;
mod corrade;
mod discord;
mod mqtt;

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use bridge::{ChannelBundle, RelayCoordinator};
use config::env::{get_config_path, get_log_dir};
use config::load_and_validate;

/// Log file name inside the log directory.
const LOG_FILE: &str = "corrade-discord-bridge.log";

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(&get_log_dir());

    info!("Corrade Discord bridge v{} starting...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_path = get_config_path();
    info!("Loading configuration from {}...", config_path);

    let config = load_and_validate(&config_path).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        error!("Please ensure {} exists and is properly formatted.", config_path);
        e
    })?;

    info!("Configuration loaded successfully");
    info!("  Corrade MQTT: {}", config.corrade.mqtt);
    info!("  Group: {}", config.corrade.group);
    info!("  Discord server: {}", config.discord.server);
    info!("  Discord channel: {}", config.discord.channel);

    // ============================================================
    // Create transports and the relay
    // ============================================================
    let channels = ChannelBundle::new();
    let shutdown_tx = channels.control.shutdown_tx;

    let (publisher, mqtt_connection) =
        mqtt::connect(&config.corrade.mqtt, &config.credential(), channels.broker)?;
    let (sender, discord_bot) = discord::build(&config.discord.bot_key, channels.chat).await?;

    let coordinator = RelayCoordinator::new(&config, sender, publisher);

    // ============================================================
    // Run everything
    // ============================================================
    let mqtt_task = tokio::spawn(mqtt_connection.run());
    let discord_task = tokio::spawn(discord_bot.run());
    let mut relay_task = tokio::spawn(coordinator.run(channels.coordinator));

    let shutdown = tokio::select! {
        biased;
        _ = shutdown_signal() => {
            info!("Shutdown signal received - stopping bridge...");
            true
        }
        _ = &mut relay_task => false,
    };

    if let Err(e) = shutdown_tx.send(true) {
        warn!("Shutdown channel closed: {}", e);
    }

    let timeout = Duration::from_secs(5);
    let tasks = async {
        if shutdown {
            let _ = relay_task.await;
        }
        let _ = mqtt_task.await;
        let _ = discord_task.await;
    };
    if tokio::time::timeout(timeout, tasks).await.is_err() {
        warn!("Timed out waiting for tasks to stop");
    }

    info!("Exiting...");
    Ok(())
}

/// Log to the console and append to a file in `log_dir`.
fn init_logging(log_dir: &str) {
    let log_dir = Path::new(log_dir);
    if let Err(e) = std::fs::create_dir_all(log_dir) {
        eprintln!("Warning: Failed to create log directory {}: {}", log_dir.display(), e);
    }

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);

    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let console_layer = fmt::layer().with_target(false);
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
