//! Chat wire types
//!
//! One persistent thread per user. Messages are embedded in the thread
//! document on the server and travel verbatim in realtime events, so the
//! same struct serves storage, API responses, and fan-out payloads.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which side of the conversation authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Admin,
}

impl Sender {
    /// The other party in the conversation.
    pub fn opposite(self) -> Sender {
        match self {
            Sender::User => Sender::Admin,
            Sender::Admin => Sender::User,
        }
    }
}

/// Thread lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadStatus {
    Active,
    Pending,
    Closed,
}

/// Per-side unread tallies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCount {
    pub user: u32,
    pub admin: u32,
}

impl UnreadCount {
    /// Bump the counter of the party that did NOT send the message.
    pub fn bump_for(&mut self, sender: Sender) {
        match sender.opposite() {
            Sender::User => self.user += 1,
            Sender::Admin => self.admin += 1,
        }
    }

    /// Zero the reader's own counter.
    pub fn clear_for(&mut self, reader: Sender) {
        match reader {
            Sender::User => self.user = 0,
            Sender::Admin => self.admin = 0,
        }
    }
}

/// Uploaded file reference attached to a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub url: String,
    pub name: String,
    #[serde(default)]
    pub content_type: Option<String>,
}

/// One chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Time-derived unique id assigned by the server.
    pub message_id: String,
    /// Client-generated idempotency key, echoed back verbatim so the
    /// sending client can match the fan-out echo without timestamp
    /// guessing.
    #[serde(default)]
    pub client_key: Option<Uuid>,
    pub sender: Sender,
    pub sender_name: String,
    pub body: String,
    /// Server timestamp, milliseconds.
    pub timestamp: i64,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unread_bumps_opposite_side_only() {
        let mut unread = UnreadCount::default();
        unread.bump_for(Sender::User);
        assert_eq!(unread, UnreadCount { user: 0, admin: 1 });
        unread.bump_for(Sender::Admin);
        assert_eq!(unread, UnreadCount { user: 1, admin: 1 });
        unread.clear_for(Sender::Admin);
        assert_eq!(unread, UnreadCount { user: 1, admin: 0 });
    }
}
