//! API routing module
//!
//! # Structure
//!
//! - [`health`] - liveness check
//! - [`products`] - catalog and stock administration
//! - [`orders`] - checkout, order listing, status transitions
//! - [`chat`] - support threads (user side and admin console)
//! - [`events`] - realtime channel subscription over SSE

pub mod chat;
pub mod events;
pub mod health;
pub mod orders;
pub mod products;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};

/// Assemble the full application router.
pub fn router(state: ServerState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(products::router())
        .merge(orders::router())
        .merge(chat::router())
        .merge(events::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
