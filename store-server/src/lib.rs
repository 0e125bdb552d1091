//! Storefront Core Server
//!
//! Backend for a storefront: product catalog with a live stock ledger,
//! order lifecycle with stock reconciliation, and a per-user support
//! chat with an admin console, all fanned out over realtime channels.
//!
//! # Module structure
//!
//! ```text
//! store-server/src/
//! ├── core/          # Config, state, server bootstrap
//! ├── auth/          # JWT identity (tagged builtin/account variants)
//! ├── db/            # Embedded SurrealDB models and repositories
//! ├── orders/        # Order state machine, checkout
//! ├── stock/         # Atomic per-product stock ledger
//! ├── chat/          # Chat thread store and unread accounting
//! ├── realtime/      # Channel hub (per-user + broadcast fan-out)
//! ├── services/      # Payment gateway and outbound mailer adapters
//! ├── api/           # HTTP routes and handlers
//! └── utils/         # Errors, logging, result aliases
//! ```

pub mod api;
pub mod auth;
pub mod chat;
pub mod core;
pub mod db;
pub mod orders;
pub mod realtime;
pub mod services;
pub mod stock;
pub mod utils;

// Re-export common types
pub use auth::{CurrentUser, Identity, JwtService, Role};
pub use core::{Config, Server, ServerState};
pub use realtime::RealtimeHub;
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
