//! Relay coordinator that ties group chat and Discord together.
//!
//! Owns the channel handle, runs both relay directions and reports what
//! happened to each event. All events are filtered on one task, so each
//! one runs to drop or dispatch before the next is looked at. Discord
//! sends run on their own tasks and never hold up the event loop.

use std::sync::Arc;

use serenity::async_trait;
use serenity::model::id::ChannelId;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::bridge::channels::CoordinatorChannels;
use crate::bridge::inbound::InboundRelay;
use crate::bridge::outbound::OutboundRelay;
use crate::bridge::resolver::ChannelResolver;
use crate::bridge::state::ChannelHandle;
use crate::common::error::{RelayError, RelayResult};
use crate::common::{BrokerEvent, ChannelInfo, ChatEvent, OutboundChatMessage};
use crate::config::types::Config;

/// Posts messages to a Discord channel.
#[async_trait]
pub trait ChatSender: Send + Sync {
    async fn send(&self, channel_id: ChannelId, content: String) -> RelayResult<()>;
}

/// Publishes payloads to the broker without waiting for delivery.
pub trait BrokerPublisher: Send + Sync {
    fn publish(&self, topic: &str, payload: String) -> RelayResult<()>;
}

/// Relay direction, for log messages.
#[derive(Debug, Clone, Copy)]
enum Direction {
    GroupToDiscord,
    DiscordToGroup,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::GroupToDiscord => write!(f, "Group -> Discord"),
            Direction::DiscordToGroup => write!(f, "Discord -> Group"),
        }
    }
}

/// The relay coordinator.
pub struct RelayCoordinator<C, B> {
    handle: ChannelHandle,
    resolver: ChannelResolver,
    inbound: InboundRelay,
    outbound: OutboundRelay,
    chat: Arc<C>,
    broker: B,
}

impl<C: ChatSender + 'static, B: BrokerPublisher> RelayCoordinator<C, B> {
    /// Create a coordinator with an unresolved channel handle.
    pub fn new(config: &Config, chat: C, broker: B) -> Self {
        let handle = ChannelHandle::new();
        let credential = config.credential();
        let target = config.relay_target();

        Self {
            inbound: InboundRelay::new(&credential, handle.reader()),
            outbound: OutboundRelay::new(credential, &target, handle.reader()),
            resolver: ChannelResolver::new(target),
            handle,
            chat: Arc::new(chat),
            broker,
        }
    }

    /// The resolved Discord channel, if any.
    pub fn channel(&self) -> Option<ChannelId> {
        self.handle.get()
    }

    /// Process events until shutdown or until a transport goes away.
    pub async fn run(self, mut channels: CoordinatorChannels) {
        loop {
            tokio::select! {
                event = channels.broker_rx.recv() => {
                    match event {
                        Some(event) => self.handle_broker_event(event),
                        None => {
                            warn!("Broker event channel closed");
                            break;
                        }
                    }
                }

                event = channels.chat_rx.recv() => {
                    match event {
                        Some(event) => self.handle_chat_event(event),
                        None => {
                            warn!("Discord event channel closed");
                            break;
                        }
                    }
                }

                _ = channels.shutdown_rx.changed() => {
                    if *channels.shutdown_rx.borrow() {
                        info!("Shutdown signal received, stopping relay");
                        break;
                    }
                }
            }
        }
        info!("Relay coordinator ended (channel {:?})", self.channel());
    }

    pub fn handle_broker_event(&self, event: BrokerEvent) {
        match event {
            BrokerEvent::Connected => {
                debug!("Broker connected, relay resumes group chat");
            }
            BrokerEvent::Message { topic, payload } => {
                debug!(topic = topic.as_str(), bytes = payload.len(), "Group notification");
                if let Err(e) = self.relay_from_group(&payload) {
                    report(Direction::GroupToDiscord, &e);
                }
            }
        }
    }

    pub fn handle_chat_event(&self, event: ChatEvent) {
        match event {
            ChatEvent::Ready { channels } => {
                info!("Connected to Discord, {} channels visible", channels.len());
                if let Err(e) = self.resolve_channel(&channels) {
                    error!("{}", e);
                }
            }
            ChatEvent::Message(message) => {
                if let Err(e) = self.relay_from_discord(&message) {
                    report(Direction::DiscordToGroup, &e);
                }
            }
        }
    }

    /// Resolve the relay channel from the channels Discord reported.
    pub fn resolve_channel(&self, channels: &[ChannelInfo]) -> RelayResult<ChannelId> {
        self.resolver.resolve(channels, &self.handle)
    }

    /// Relay one group chat payload to Discord.
    ///
    /// Filtering happens here; the send runs on a spawned task that reports
    /// its own failure.
    pub fn relay_from_group(&self, payload: &[u8]) -> RelayResult<JoinHandle<RelayResult<()>>> {
        let delivery = self.inbound.process(payload)?;
        info!("Group -> Discord: {}", delivery.content);

        let chat = Arc::clone(&self.chat);
        Ok(tokio::spawn(async move {
            let result = chat.send(delivery.channel_id, delivery.content).await;
            if let Err(ref e) = result {
                report(Direction::GroupToDiscord, e);
            }
            result
        }))
    }

    /// Relay one Discord message to group chat.
    pub fn relay_from_discord(&self, message: &OutboundChatMessage) -> RelayResult<()> {
        let request = self.outbound.process(message)?;
        info!(
            "Discord -> Group: {}#{}",
            message.author_name, message.author_discriminator
        );
        self.broker.publish(&request.topic, request.payload)
    }
}

/// Log why relaying one event failed.
fn report(direction: Direction, error: &RelayError) {
    match error {
        e if e.is_silent() => debug!("{}: dropped ({})", direction, e),
        RelayError::DestinationUnresolved => {
            error!("{}: message received but the Discord channel could not be retrieved", direction)
        }
        RelayError::Transport { message } => match direction {
            Direction::GroupToDiscord => error!("{}: failed to send to Discord: {}", direction, message),
            Direction::DiscordToGroup => warn!("{}: failed to publish to Corrade: {}", direction, message),
        },
        e => error!("{}: {}", direction, e),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    use bytes::Bytes;
    use serenity::model::channel::ChannelType;
    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::config::types::{CorradeConfig, DiscordConfig};
    use crate::corrade::codec::decode;

    const CHANNEL: u64 = 1234567890;

    #[derive(Clone, Default)]
    struct RecordingChat {
        sent: Arc<Mutex<Vec<(ChannelId, String)>>>,
        fail: bool,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl ChatSender for RecordingChat {
        async fn send(&self, channel_id: ChannelId, content: String) -> RelayResult<()> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(RelayError::Transport {
                    message: "HTTP 500".to_string(),
                });
            }
            self.sent.lock().unwrap().push((channel_id, content));
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct RecordingBroker {
        published: Arc<Mutex<Vec<(String, String)>>>,
    }

    impl BrokerPublisher for RecordingBroker {
        fn publish(&self, topic: &str, payload: String) -> RelayResult<()> {
            self.published.lock().unwrap().push((topic.to_string(), payload));
            Ok(())
        }
    }

    fn config() -> Config {
        Config {
            corrade: CorradeConfig {
                mqtt: "mqtt://localhost:1883".to_string(),
                group: "MyGroup".to_string(),
                password: "secret".to_string(),
            },
            discord: DiscordConfig {
                bot_key: "token".to_string(),
                server: "My Server".to_string(),
                channel: "general".to_string(),
            },
        }
    }

    fn visible_channels() -> Vec<ChannelInfo> {
        vec![
            ChannelInfo {
                id: ChannelId::new(1),
                name: "general".to_string(),
                kind: ChannelType::Text,
                guild_name: "Elsewhere".to_string(),
            },
            ChannelInfo {
                id: ChannelId::new(CHANNEL),
                name: "general".to_string(),
                kind: ChannelType::Text,
                guild_name: "My Server".to_string(),
            },
        ]
    }

    fn coordinator() -> (RelayCoordinator<RecordingChat, RecordingBroker>, RecordingChat, RecordingBroker) {
        let chat = RecordingChat::default();
        let broker = RecordingBroker::default();
        let coordinator = RelayCoordinator::new(&config(), chat.clone(), broker.clone());
        (coordinator, chat, broker)
    }

    fn discord_message(content: &str) -> OutboundChatMessage {
        OutboundChatMessage {
            author_name: "Bob".to_string(),
            author_discriminator: "0001".to_string(),
            author_is_bot: false,
            channel_id: ChannelId::new(CHANNEL),
            guild_name: Some("My Server".to_string()),
            channel_type: Some(ChannelType::Text),
            content: content.to_string(),
            attachment_urls: Vec::new(),
        }
    }

    const GROUP_HELLO: &[u8] = b"type=group&group=MyGroup&firstname=Jane&lastname=Doe&message=hello";

    #[tokio::test]
    async fn test_group_message_reaches_discord() {
        let (coordinator, chat, _broker) = coordinator();
        coordinator.resolve_channel(&visible_channels()).unwrap();

        let send = assert_ok!(coordinator.relay_from_group(GROUP_HELLO));
        assert_ok!(send.await.unwrap());

        let sent = chat.sent.lock().unwrap();
        assert_eq!(
            *sent,
            vec![(ChannelId::new(CHANNEL), "Jane Doe [SL]: hello".to_string())]
        );
    }

    #[tokio::test]
    async fn test_unresolved_channel_drops_group_message() {
        let (coordinator, chat, _broker) = coordinator();

        let result = coordinator.relay_from_group(GROUP_HELLO);

        assert!(matches!(result, Err(RelayError::DestinationUnresolved)));
        assert!(chat.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_payload_is_silent() {
        let (coordinator, chat, _broker) = coordinator();

        let result = coordinator.relay_from_group(&[0xff, 0xfe, 0x00]);

        let err = assert_err!(result);
        assert!(err.is_silent());
        assert!(chat.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_send_failure_is_reported() {
        let chat = RecordingChat {
            fail: true,
            ..Default::default()
        };
        let coordinator = RelayCoordinator::new(&config(), chat, RecordingBroker::default());
        coordinator.resolve_channel(&visible_channels()).unwrap();

        let send = assert_ok!(coordinator.relay_from_group(GROUP_HELLO));
        let result = send.await.unwrap();
        assert!(matches!(result, Err(RelayError::Transport { .. })));
    }

    #[tokio::test]
    async fn test_slow_discord_send_does_not_hold_up_group_relay() {
        let chat = RecordingChat {
            delay: Some(Duration::from_secs(2)),
            ..Default::default()
        };
        let broker = RecordingBroker::default();
        let coordinator = RelayCoordinator::new(&config(), chat.clone(), broker.clone());
        coordinator.resolve_channel(&visible_channels()).unwrap();

        let bundle = crate::bridge::ChannelBundle::new();
        bundle
            .broker
            .event_tx
            .send(BrokerEvent::Message {
                topic: "MyGroup/secret/group".to_string(),
                payload: Bytes::from_static(GROUP_HELLO),
            })
            .unwrap();

        let started = Instant::now();
        let task = tokio::spawn(coordinator.run(bundle.coordinator));
        tokio::time::sleep(Duration::from_millis(20)).await;
        bundle
            .chat
            .event_tx
            .send(ChatEvent::Message(discord_message("hi")))
            .unwrap();

        for _ in 0..50 {
            if !broker.published.lock().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(broker.published.lock().unwrap().len(), 1);
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(chat.sent.lock().unwrap().is_empty());

        // Shutdown is not held up by the pending send either.
        bundle.control.shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_millis(500), task)
            .await
            .expect("coordinator stops while a send is pending")
            .unwrap();
    }

    #[test]
    fn test_discord_message_published_to_group_topic() {
        let (coordinator, _chat, broker) = coordinator();
        coordinator.handle_chat_event(ChatEvent::Ready {
            channels: visible_channels(),
        });
        assert_eq!(coordinator.channel(), Some(ChannelId::new(CHANNEL)));

        coordinator.handle_chat_event(ChatEvent::Message(discord_message("hi")));

        let published = broker.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "MyGroup/secret/group");
        let values = decode(published[0].1.as_bytes()).unwrap();
        assert_eq!(values.get("message"), Some("Bob#0001 [Discord]: hi"));
    }

    #[test]
    fn test_bot_message_not_published() {
        let (coordinator, _chat, broker) = coordinator();
        coordinator.resolve_channel(&visible_channels()).unwrap();

        let mut message = discord_message("spam");
        message.author_is_bot = true;
        let result = coordinator.relay_from_discord(&message);

        assert!(assert_err!(result).is_silent());
        assert!(broker.published.lock().unwrap().is_empty());
    }

    #[test]
    fn test_nothing_published_before_ready() {
        let (coordinator, _chat, broker) = coordinator();

        coordinator.handle_chat_event(ChatEvent::Message(discord_message("hi")));
        assert!(broker.published.lock().unwrap().is_empty());
    }

    #[test]
    fn test_ready_without_channel_keeps_bridge_inert() {
        let (coordinator, _chat, broker) = coordinator();
        assert!(matches!(
            coordinator.resolve_channel(&[]),
            Err(RelayError::ChannelNotFound { .. })
        ));
        coordinator.handle_chat_event(ChatEvent::Ready { channels: Vec::new() });
        assert_eq!(coordinator.channel(), None);

        coordinator.handle_chat_event(ChatEvent::Message(discord_message("hi")));
        assert!(broker.published.lock().unwrap().is_empty());
    }

    #[test]
    fn test_second_ready_keeps_channel() {
        let (coordinator, _chat, _broker) = coordinator();
        coordinator.handle_chat_event(ChatEvent::Ready {
            channels: visible_channels(),
        });

        let mut moved = visible_channels();
        moved[1].id = ChannelId::new(555);
        coordinator.handle_chat_event(ChatEvent::Ready { channels: moved });

        assert_eq!(coordinator.channel(), Some(ChannelId::new(CHANNEL)));
    }

    #[test]
    fn test_round_trip_is_not_echoed() {
        let (coordinator, chat, broker) = coordinator();
        coordinator.resolve_channel(&visible_channels()).unwrap();

        let mut message = discord_message("hi");
        message.author_name = "Alice".to_string();
        message.author_discriminator = "1234".to_string();
        coordinator.relay_from_discord(&message).unwrap();

        // Corrade echoes the tell back to us as group chat.
        let (_, payload) = broker.published.lock().unwrap()[0].clone();
        let told = decode(payload.as_bytes()).unwrap();
        let echoed = format!(
            "type=group&group={}&firstname=Relay&lastname=Resident&message={}",
            told.get("group").unwrap(),
            urlencoding::encode(told.get("message").unwrap())
        );

        coordinator.handle_broker_event(BrokerEvent::Message {
            topic: "MyGroup/secret/group".to_string(),
            payload: Bytes::from(echoed),
        });
        assert!(chat.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let (coordinator, chat, _broker) = coordinator();
        let bundle = crate::bridge::ChannelBundle::new();

        bundle
            .chat
            .event_tx
            .send(ChatEvent::Ready {
                channels: visible_channels(),
            })
            .unwrap();

        let task = tokio::spawn(coordinator.run(bundle.coordinator));
        tokio::time::sleep(Duration::from_millis(20)).await;

        bundle
            .broker
            .event_tx
            .send(BrokerEvent::Message {
                topic: "MyGroup/secret/group".to_string(),
                payload: Bytes::from_static(GROUP_HELLO),
            })
            .unwrap();

        for _ in 0..50 {
            if !chat.sent.lock().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        bundle.control.shutdown_tx.send(true).unwrap();
        task.await.unwrap();

        assert_eq!(chat.sent.lock().unwrap().len(), 1);
    }
}
