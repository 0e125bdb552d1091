//! Realtime fan-out hub
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                RealtimeHub                  │
//! │  DashMap<Channel, broadcast::Sender<event>> │
//! └───────────────┬─────────────────────────────┘
//!                 │
//!      ┌──────────┼───────────────┐
//!      ▼          ▼               ▼
//!  user:<a>    user:<b>    admin:broadcast
//! ```
//!
//! Two room types: a targeted per-user channel and one global broadcast
//! channel (admin consoles plus storefront clients watching live
//! stock). Publishing is synchronous and never blocks the HTTP response
//! path; delivery is at-most-once: a send with no subscribers or a
//! lagged receiver simply drops events, and clients re-fetch on
//! (re)connect. The sender's own message is echoed back on its channel;
//! de-duplication is the client protocol's job.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;

use shared::{Channel, StoreEvent};

/// Default per-channel event buffer.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug)]
pub struct RealtimeHub {
    capacity: usize,
    channels: DashMap<Channel, broadcast::Sender<Arc<StoreEvent>>>,
}

impl RealtimeHub {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            channels: DashMap::new(),
        }
    }

    /// Join a channel. The channel is created on first subscribe.
    pub fn subscribe(&self, channel: &Channel) -> broadcast::Receiver<Arc<StoreEvent>> {
        self.channels
            .entry(channel.clone())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Publish an event to one channel. Returns the number of
    /// subscribers reached.
    pub fn publish(&self, channel: &Channel, event: StoreEvent) -> usize {
        self.publish_arc(channel, &Arc::new(event))
    }

    /// Publish one event to several channels without re-serializing.
    pub fn publish_to(&self, channels: &[Channel], event: StoreEvent) -> usize {
        let event = Arc::new(event);
        channels
            .iter()
            .map(|channel| self.publish_arc(channel, &event))
            .sum()
    }

    fn publish_arc(&self, channel: &Channel, event: &Arc<StoreEvent>) -> usize {
        // A channel nobody has joined has no sender; nothing to deliver.
        let Some(sender) = self.channels.get(channel) else {
            tracing::debug!(channel = %channel, event = event.name(), "No subscribers");
            return 0;
        };
        match sender.send(Arc::clone(event)) {
            Ok(delivered) => {
                tracing::debug!(channel = %channel, event = event.name(), delivered, "Event published");
                delivered
            }
            Err(_) => {
                // All receivers dropped since the channel was created
                tracing::debug!(channel = %channel, event = event.name(), "All subscribers gone");
                0
            }
        }
    }
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new()
    }
}
