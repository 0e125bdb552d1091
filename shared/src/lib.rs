//! Shared types for the storefront stack
//!
//! Wire-level domain types used by both the server and clients:
//! chat/order models, realtime event payloads, channel naming, and
//! time/id utilities.

pub mod channel;
pub mod chat;
pub mod events;
pub mod order;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use channel::Channel;
pub use events::StoreEvent;
