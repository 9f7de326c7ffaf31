//! Bridge state management.
//!
//! The only mutable state in the bridge is the resolved Discord channel:
//! - `ChannelHandle`: owned by the coordinator, written once by the resolver
//! - `ChannelReader`: read-only view handed to the relay filters
//!
//! The handle starts unresolved and, once set, never changes for the
//! lifetime of the process.

use std::sync::{Arc, OnceLock};

use serenity::model::id::ChannelId;

/// Write-once handle to the destination Discord channel.
#[derive(Debug, Default)]
pub struct ChannelHandle {
    cell: Arc<OnceLock<ChannelId>>,
}

impl ChannelHandle {
    /// Create an unresolved handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the handle.
    ///
    /// Returns `true` if this call set it, `false` if it was already set
    /// (the stored id is left untouched).
    pub fn resolve(&self, channel_id: ChannelId) -> bool {
        self.cell.set(channel_id).is_ok()
    }

    pub fn get(&self) -> Option<ChannelId> {
        self.cell.get().copied()
    }

    /// Read-only view sharing this handle.
    pub fn reader(&self) -> ChannelReader {
        ChannelReader {
            cell: Arc::clone(&self.cell),
        }
    }
}

/// Read-only view of a `ChannelHandle`.
#[derive(Debug, Clone)]
pub struct ChannelReader {
    cell: Arc<OnceLock<ChannelId>>,
}

impl ChannelReader {
    /// The resolved channel, or `None` while unresolved.
    pub fn get(&self) -> Option<ChannelId> {
        self.cell.get().copied()
    }
}
