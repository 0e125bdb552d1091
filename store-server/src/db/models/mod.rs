//! Storage models
//!
//! Documents as persisted in SurrealDB. Record references serialize as
//! `table:id` strings in both directions (see [`serde_helpers`]), so the
//! same structs serve storage and API payloads.

pub mod serde_helpers;

pub mod chat;
pub mod order;
pub mod product;

pub use chat::{ChatThread, ThreadStatusCount};
pub use order::{Order, OrderCreate, OrderItem};
pub use product::{Product, ProductCreate, ProductUpdate};
