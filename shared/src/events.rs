//! Realtime event payloads
//!
//! Every event carries its wire name in an `event` tag so subscribers
//! can dispatch without inspecting the payload shape. Delivery is
//! at-most-once best-effort push; clients re-fetch on (re)connect.

use serde::{Deserialize, Serialize};

use crate::chat::{ChatMessage, ThreadStatus, UnreadCount};
use crate::order::OrderView;

/// Per-product outcome of a stock adjustment batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockUpdate {
    pub product_id: String,
    pub new_stock: i64,
    pub order_id: String,
    /// Set when the adjustment was a sale decrement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items_sold: Option<i64>,
    /// Set when the adjustment was a cancellation restore.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items_restored: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_title: Option<String>,
}

/// Fan-out envelope published on realtime channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum StoreEvent {
    #[serde(rename = "order:new")]
    OrderNew { order: OrderView },

    #[serde(rename = "order:update")]
    OrderUpdate { order: OrderView },

    #[serde(rename = "stock:update")]
    StockUpdate(StockUpdate),

    #[serde(rename = "chat:message")]
    ChatMessage {
        chat_id: String,
        user_id: String,
        message: ChatMessage,
        unread: UnreadCount,
    },

    #[serde(rename = "chat:update")]
    ChatUpdate {
        chat_id: String,
        user_id: String,
        status: ThreadStatus,
        #[serde(default)]
        assigned_admin: Option<String>,
    },

    #[serde(rename = "chat:delete")]
    ChatDelete { chat_id: String, user_id: String },
}

impl StoreEvent {
    /// Wire name of the event, as used in the serialized `event` tag.
    pub fn name(&self) -> &'static str {
        match self {
            StoreEvent::OrderNew { .. } => "order:new",
            StoreEvent::OrderUpdate { .. } => "order:update",
            StoreEvent::StockUpdate(_) => "stock:update",
            StoreEvent::ChatMessage { .. } => "chat:message",
            StoreEvent::ChatUpdate { .. } => "chat:update",
            StoreEvent::ChatDelete { .. } => "chat:delete",
        }
    }
}
