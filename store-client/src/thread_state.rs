//! Thread-level client state
//!
//! Wraps [`ChatTimeline`] with the rest of what a chat view renders:
//! unread counters, thread status, and assignment, kept current by
//! applying realtime events for the thread. Events for other threads
//! must be filtered out by the caller (the admin console holds one
//! `ThreadState` per open thread).

use shared::StoreEvent;
use shared::chat::{ChatMessage, ThreadStatus, UnreadCount};

use crate::timeline::ChatTimeline;

#[derive(Debug, Clone)]
pub struct ThreadState {
    pub chat_id: String,
    pub timeline: ChatTimeline,
    pub unread: UnreadCount,
    pub status: ThreadStatus,
    pub assigned_admin: Option<String>,
    /// Set when the server hard-deleted the thread
    pub deleted: bool,
}

impl ThreadState {
    /// Seed from a thread fetch.
    pub fn new(
        chat_id: impl Into<String>,
        messages: Vec<ChatMessage>,
        unread: UnreadCount,
        status: ThreadStatus,
        assigned_admin: Option<String>,
    ) -> Self {
        Self {
            chat_id: chat_id.into(),
            timeline: ChatTimeline::from_messages(messages),
            unread,
            status,
            assigned_admin,
            deleted: false,
        }
    }

    /// Apply one fan-out event. Events for other threads are ignored.
    pub fn apply_event(&mut self, event: &StoreEvent) {
        match event {
            StoreEvent::ChatMessage {
                chat_id,
                message,
                unread,
                ..
            } if *chat_id == self.chat_id => {
                self.timeline.ingest(message.clone());
                self.unread = *unread;
            }
            StoreEvent::ChatUpdate {
                chat_id,
                status,
                assigned_admin,
                ..
            } if *chat_id == self.chat_id => {
                self.status = *status;
                self.assigned_admin = assigned_admin.clone();
            }
            StoreEvent::ChatDelete { chat_id, .. } if *chat_id == self.chat_id => {
                self.deleted = true;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::chat::Sender;

    fn message(body: &str, ts: i64) -> ChatMessage {
        ChatMessage {
            message_id: ts.to_string(),
            client_key: None,
            sender: Sender::Admin,
            sender_name: "Sam".into(),
            body: body.into(),
            timestamp: ts,
            is_read: false,
            attachments: vec![],
        }
    }

    fn state() -> ThreadState {
        ThreadState::new(
            "chat_thread:t1",
            vec![],
            UnreadCount::default(),
            ThreadStatus::Active,
            None,
        )
    }

    #[test]
    fn message_events_update_timeline_and_unread() {
        let mut state = state();
        state.apply_event(&StoreEvent::ChatMessage {
            chat_id: "chat_thread:t1".into(),
            user_id: "user:u1".into(),
            message: message("hello", 1_000),
            unread: UnreadCount { user: 1, admin: 0 },
        });
        assert_eq!(state.timeline.len(), 1);
        assert_eq!(state.unread.user, 1);
    }

    #[test]
    fn events_for_other_threads_are_ignored() {
        let mut state = state();
        state.apply_event(&StoreEvent::ChatMessage {
            chat_id: "chat_thread:other".into(),
            user_id: "user:u2".into(),
            message: message("not for us", 1_000),
            unread: UnreadCount { user: 5, admin: 5 },
        });
        assert!(state.timeline.is_empty());
        assert_eq!(state.unread, UnreadCount::default());
    }

    #[test]
    fn status_and_delete_events_apply() {
        let mut state = state();
        state.apply_event(&StoreEvent::ChatUpdate {
            chat_id: "chat_thread:t1".into(),
            user_id: "user:u1".into(),
            status: ThreadStatus::Closed,
            assigned_admin: Some("user:staff1".into()),
        });
        assert_eq!(state.status, ThreadStatus::Closed);
        assert_eq!(state.assigned_admin.as_deref(), Some("user:staff1"));

        state.apply_event(&StoreEvent::ChatDelete {
            chat_id: "chat_thread:t1".into(),
            user_id: "user:u1".into(),
        });
        assert!(state.deleted);
    }
}
