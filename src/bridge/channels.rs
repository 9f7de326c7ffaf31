//! Bridge channel management.
//!
//! Groups the channels connecting the transport tasks to the relay
//! coordinator.

use tokio::sync::{mpsc, watch};

use crate::common::{BrokerEvent, ChatEvent};

/// Channels the MQTT task writes to.
pub struct BrokerSideChannels {
    pub event_tx: mpsc::UnboundedSender<BrokerEvent>,
    pub shutdown_rx: watch::Receiver<bool>,
}

/// Channels the Discord task writes to.
pub struct ChatSideChannels {
    pub event_tx: mpsc::UnboundedSender<ChatEvent>,
    pub shutdown_rx: watch::Receiver<bool>,
}

/// Channels the coordinator reads from.
pub struct CoordinatorChannels {
    pub broker_rx: mpsc::UnboundedReceiver<BrokerEvent>,
    pub chat_rx: mpsc::UnboundedReceiver<ChatEvent>,
    pub shutdown_rx: watch::Receiver<bool>,
}

/// Control channels for shutdown coordination.
pub struct ControlChannels {
    pub shutdown_tx: watch::Sender<bool>,
}

/// Bundle of all channels created by the bridge.
pub struct ChannelBundle {
    pub broker: BrokerSideChannels,
    pub chat: ChatSideChannels,
    pub coordinator: CoordinatorChannels,
    pub control: ControlChannels,
}

impl ChannelBundle {
    pub fn new() -> Self {
        let (broker_tx, broker_rx) = mpsc::unbounded_channel();
        let (chat_tx, chat_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            broker: BrokerSideChannels {
                event_tx: broker_tx,
                shutdown_rx: shutdown_rx.clone(),
            },
            chat: ChatSideChannels {
                event_tx: chat_tx,
                shutdown_rx: shutdown_rx.clone(),
            },
            coordinator: CoordinatorChannels {
                broker_rx,
                chat_rx,
                shutdown_rx,
            },
            control: ControlChannels { shutdown_tx },
        }
    }
}

impl Default for ChannelBundle {
    fn default() -> Self {
        Self::new()
    }
}
