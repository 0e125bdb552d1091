//! Optimistic message timeline
//!
//! The visible message log of one thread. A send is appended
//! immediately as a pending entry and later reconciled with either the
//! HTTP response (`confirm_send` / `fail_send`) or the fan-out echo
//! (`ingest`); whichever arrives first wins, the other becomes a
//! no-op.
//!
//! De-duplication order for an incoming fan-out message:
//!
//! 1. exact `client_key` match: our own echo, replace the entry
//! 2. a pending entry with the same sender+body within 10 s: replace
//! 3. a confirmed entry with the same id, or same sender+body within
//!    5 s: skip as duplicate
//! 4. otherwise append as new
//!
//! The key match makes the timestamp windows a fallback for events
//! that lost their key (or messages sent before the key existed); the
//! windows alone cannot distinguish rapid identical messages.

use uuid::Uuid;

use shared::chat::{ChatMessage, Sender};

/// Pending entries match an echo with the same sender+body inside this
/// window.
pub const OPTIMISTIC_MATCH_WINDOW_MS: i64 = 10_000;

/// Confirmed entries treat a same sender+body arrival inside this
/// tighter window as a duplicate.
pub const DUPLICATE_MATCH_WINDOW_MS: i64 = 5_000;

/// One visible message, possibly not yet server-confirmed.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEntry {
    pub message: ChatMessage,
    /// Still waiting for confirmation (HTTP response or echo)
    pub pending: bool,
}

/// The visible message log of one thread.
#[derive(Debug, Clone, Default)]
pub struct ChatTimeline {
    entries: Vec<TimelineEntry>,
}

impl ChatTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from a thread fetch; everything is confirmed.
    pub fn from_messages(messages: Vec<ChatMessage>) -> Self {
        Self {
            entries: messages
                .into_iter()
                .map(|message| TimelineEntry {
                    message,
                    pending: false,
                })
                .collect(),
        }
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a pending entry for a message the user just submitted.
    ///
    /// Returns the locally generated idempotency key; thread it through
    /// the send so the server echoes it back.
    pub fn begin_send(
        &mut self,
        sender: Sender,
        sender_name: &str,
        body: &str,
        now_ms: i64,
    ) -> Uuid {
        let local_key = Uuid::new_v4();
        self.entries.push(TimelineEntry {
            message: ChatMessage {
                message_id: format!("local-{}", local_key.simple()),
                client_key: Some(local_key),
                sender,
                sender_name: sender_name.to_string(),
                body: body.to_string(),
                timestamp: now_ms,
                is_read: false,
                attachments: Vec::new(),
            },
            pending: true,
        });
        local_key
    }

    /// The send succeeded: replace the pending entry with the server's
    /// message. Harmless if the fan-out echo already confirmed it.
    pub fn confirm_send(&mut self, local_key: Uuid, confirmed: ChatMessage) {
        if let Some(entry) = self.entries.iter_mut().find(|e| {
            e.message.client_key == Some(local_key)
                || (!e.pending && e.message.message_id == confirmed.message_id)
        }) {
            entry.message = confirmed;
            entry.pending = false;
            return;
        }
        // Entry vanished (e.g. timeline was re-seeded mid-flight)
        self.entries.push(TimelineEntry {
            message: confirmed,
            pending: false,
        });
    }

    /// The send failed: drop the pending entry and hand the body back
    /// for the compose box.
    pub fn fail_send(&mut self, local_key: Uuid) -> Option<String> {
        let pos = self
            .entries
            .iter()
            .position(|e| e.pending && e.message.client_key == Some(local_key))?;
        Some(self.entries.remove(pos).message.body)
    }

    /// A fan-out message for this thread arrived (possibly our own
    /// echo; the hub does not suppress echo to the sender).
    pub fn ingest(&mut self, incoming: ChatMessage) {
        // 1. Idempotency key: our own echo, regardless of timing
        if let Some(key) = incoming.client_key
            && let Some(entry) = self
                .entries
                .iter_mut()
                .find(|e| e.message.client_key == Some(key))
        {
            entry.message = incoming;
            entry.pending = false;
            return;
        }

        // 2. Optimistic entry within the wide window
        if let Some(entry) = self.entries.iter_mut().find(|e| {
            e.pending
                && e.message.sender == incoming.sender
                && e.message.body == incoming.body
                && (incoming.timestamp - e.message.timestamp).abs() <= OPTIMISTIC_MATCH_WINDOW_MS
        }) {
            entry.message = incoming;
            entry.pending = false;
            return;
        }

        // 3. Already-confirmed duplicate
        let duplicate = self.entries.iter().any(|e| {
            !e.pending
                && (e.message.message_id == incoming.message_id
                    || (e.message.sender == incoming.sender
                        && e.message.body == incoming.body
                        && (incoming.timestamp - e.message.timestamp).abs()
                            <= DUPLICATE_MATCH_WINDOW_MS))
        });
        if duplicate {
            tracing::debug!(message_id = %incoming.message_id, "Dropping duplicate fan-out message");
            return;
        }

        // 4. Genuinely new
        self.entries.push(TimelineEntry {
            message: incoming,
            pending: false,
        });
    }
}
