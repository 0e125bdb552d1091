//! Order API Module
//!
//! Checkout and the status transition endpoint. Status mutations are
//! admin-only; the transition response message states whether stock was
//! adjusted or restored.

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/checkout", post(handler::checkout))
        .route("/", get(handler::list))
        .route("/mine", get(handler::list_mine))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/status", put(handler::update_status))
        // Gateway webhook; carries no user token
        .route("/{id}/paid", post(handler::mark_paid))
}
