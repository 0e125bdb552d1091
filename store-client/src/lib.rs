//! Store Client - client-side state for the storefront
//!
//! Implements the optimistic reconciliation contract UIs follow when
//! talking to the store server: pending sends are shown immediately,
//! then merged with server-confirmed fan-out events without duplicates.

pub mod thread_state;
pub mod timeline;

pub use thread_state::ThreadState;
pub use timeline::{ChatTimeline, TimelineEntry};

// Re-export shared types for convenience
pub use shared::StoreEvent;
pub use shared::chat::{ChatMessage, Sender, ThreadStatus, UnreadCount};
