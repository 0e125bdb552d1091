//! Chat API Module
//!
//! `/thread` routes serve the calling customer's own conversation;
//! `/admin` routes are the support console.

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/chat", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        // Customer side
        .route("/thread", get(handler::my_thread))
        .route("/thread/messages", post(handler::send_message))
        .route("/thread/read", post(handler::mark_my_thread_read))
        // Admin console
        .route("/admin/threads", get(handler::list_threads))
        .route(
            "/admin/threads/{id}",
            get(handler::get_thread).delete(handler::delete_thread),
        )
        .route("/admin/threads/{id}/messages", post(handler::send_as_admin))
        .route("/admin/threads/{id}/read", post(handler::mark_read_as_admin))
        .route("/admin/threads/{id}/status", put(handler::set_status))
}
