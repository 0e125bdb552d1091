//! Realtime channel naming
//!
//! Two room types exist: a per-user channel and one global broadcast
//! channel. Admin consoles subscribe to the broadcast channel and see
//! all traffic; storefront clients additionally use it for live stock.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical fan-out channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    /// Targeted channel for one user (`user:<id>`).
    User(String),
    /// Global channel every admin console and storefront client may join
    /// (`admin:broadcast`).
    Broadcast,
}

impl Channel {
    pub fn user(id: impl Into<String>) -> Self {
        Channel::User(id.into())
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::User(id) => write!(f, "user:{id}"),
            Channel::Broadcast => write!(f, "admin:broadcast"),
        }
    }
}
