//! Chat Thread Model
//!
//! One document per user; the full message log is embedded. The
//! `assigned_admin` reference only ever holds a persisted account id:
//! the built-in admin identity is a distinct variant upstream and is
//! never written here.

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use shared::chat::{ChatMessage, ThreadStatus, UnreadCount};
use shared::util::now_millis;

use super::serde_helpers;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatThread {
    #[serde(
        default,
        with = "serde_helpers::option_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub user: RecordId,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    pub status: ThreadStatus,
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub assigned_admin: Option<RecordId>,
    #[serde(default)]
    pub unread: UnreadCount,
    pub last_activity: i64,
    pub created_at: i64,
}

impl ChatThread {
    /// Fresh empty thread for a user.
    pub fn new(user: RecordId) -> Self {
        let now = now_millis();
        Self {
            id: None,
            user,
            messages: Vec::new(),
            status: ThreadStatus::Active,
            assigned_admin: None,
            unread: UnreadCount::default(),
            last_activity: now,
            created_at: now,
        }
    }
}

/// Aggregate row for the admin console listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadStatusCount {
    pub status: ThreadStatus,
    pub count: i64,
}
