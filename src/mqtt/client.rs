//! Corrade MQTT connection.
//!
//! Drives the rumqttc event loop, (re)subscribes to the group topic on every
//! connect and forwards incoming notifications to the relay coordinator.

use std::time::Duration;

use backon::BackoffBuilder;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS, SubscribeReasonCode};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::bridge::channels::BrokerSideChannels;
use crate::bridge::BrokerPublisher;
use crate::common::error::{RelayError, RelayResult, Result};
use crate::common::BrokerEvent;
use crate::corrade::GroupCredential;

/// Capacity of the rumqttc request queue.
const REQUEST_CAPACITY: usize = 64;

const KEEP_ALIVE: Duration = Duration::from_secs(30);

/// Publishes relay commands through the shared MQTT client.
#[derive(Clone)]
pub struct MqttPublisher {
    client: AsyncClient,
}

impl BrokerPublisher for MqttPublisher {
    fn publish(&self, topic: &str, payload: String) -> RelayResult<()> {
        self.client
            .try_publish(topic, QoS::AtMostOnce, false, payload)
            .map_err(|e| RelayError::Transport {
                message: e.to_string(),
            })
    }
}

/// The MQTT event loop and what it needs to keep the subscription alive.
pub struct MqttConnection {
    client: AsyncClient,
    eventloop: EventLoop,
    topic: String,
    channels: BrokerSideChannels,
}

/// Build the MQTT client for `uri`.
///
/// Nothing is sent until `MqttConnection::run` starts polling.
pub fn connect(
    uri: &str,
    credential: &GroupCredential,
    channels: BrokerSideChannels,
) -> Result<(MqttPublisher, MqttConnection)> {
    let mut options = MqttOptions::parse_url(with_client_id(uri))?;
    options.set_keep_alive(KEEP_ALIVE);

    let (client, eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);

    Ok((
        MqttPublisher {
            client: client.clone(),
        },
        MqttConnection {
            client,
            eventloop,
            topic: credential.topic(),
            channels,
        },
    ))
}

/// rumqttc wants the client id in the URI; add one if the config has none.
fn with_client_id(uri: &str) -> String {
    if uri.contains("client_id=") {
        return uri.to_string();
    }
    let separator = if uri.contains('?') { '&' } else { '?' };
    format!(
        "{}{}client_id=corrade-discord-bridge-{}",
        uri,
        separator,
        std::process::id()
    )
}

/// Exponential backoff between reconnection attempts.
/// 1s initial, 60s max, with jitter, unlimited retries.
fn mqtt_backoff() -> impl Iterator<Item = Duration> {
    backon::ExponentialBuilder::default()
        .with_min_delay(Duration::from_secs(1))
        .with_max_delay(Duration::from_secs(60))
        .with_jitter()
        .without_max_times()
        .build()
}

/// Queue the group subscription without going through `try_subscribe`.
///
/// Publishes queued while the broker was down can fill the request queue;
/// the subscribe waits for room while the event loop drains them.
fn subscribe_group(client: &AsyncClient, topic: &str) -> JoinHandle<()> {
    let client = client.clone();
    let topic = topic.to_string();
    tokio::spawn(async move {
        if let Err(e) = client.subscribe(topic, QoS::AtMostOnce).await {
            error!("Error subscribing to Corrade MQTT group messages: {}", e);
        }
    })
}

impl MqttConnection {
    /// Poll the connection until shutdown or until the coordinator goes away.
    pub async fn run(self) {
        let MqttConnection {
            client,
            mut eventloop,
            topic,
            mut channels,
        } = self;
        let mut backoff = mqtt_backoff();

        info!("Connecting to Corrade MQTT server...");

        loop {
            tokio::select! {
                event = eventloop.poll() => {
                    match event {
                        Ok(Event::Incoming(Packet::ConnAck(_))) => {
                            info!("Connected to Corrade MQTT server.");
                            backoff = mqtt_backoff();

                            subscribe_group(&client, &topic);
                            if channels.event_tx.send(BrokerEvent::Connected).is_err() {
                                debug!("Relay coordinator gone, stopping MQTT task");
                                break;
                            }
                        }
                        Ok(Event::Incoming(Packet::SubAck(ack))) => {
                            if ack
                                .return_codes
                                .iter()
                                .any(|code| matches!(code, SubscribeReasonCode::Failure))
                            {
                                error!("Corrade MQTT server refused the group messages subscription.");
                            } else {
                                info!("Subscribed to Corrade MQTT group messages.");
                            }
                        }
                        Ok(Event::Incoming(Packet::Publish(publish))) => {
                            let event = BrokerEvent::Message {
                                topic: publish.topic,
                                payload: publish.payload,
                            };
                            if channels.event_tx.send(event).is_err() {
                                debug!("Relay coordinator gone, stopping MQTT task");
                                break;
                            }
                        }
                        Ok(_) => {}
                        Err(e) => {
                            error!("Error found while connecting to Corrade MQTT: {}", e);
                            let delay = backoff.next().unwrap_or(Duration::from_secs(60));
                            info!(
                                "Reconnecting to Corrade MQTT server in {:.1} seconds...",
                                delay.as_secs_f64()
                            );

                            tokio::select! {
                                _ = sleep(delay) => {}
                                _ = channels.shutdown_rx.changed() => {
                                    if *channels.shutdown_rx.borrow() {
                                        info!("Shutdown signal received during MQTT backoff");
                                        break;
                                    }
                                }
                            }
                        }
                    }
                }

                _ = channels.shutdown_rx.changed() => {
                    if *channels.shutdown_rx.borrow() {
                        info!("Disconnecting from Corrade MQTT server...");
                        if let Err(e) = client.try_disconnect() {
                            warn!("Failed to queue MQTT disconnect: {}", e);
                        }
                        break;
                    }
                }
            }
        }

        info!("MQTT task ended");
    }
}
