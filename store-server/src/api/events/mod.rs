//! Realtime subscription endpoint (SSE)
//!
//! Admins join the broadcast channel and see all order/stock/chat
//! traffic; customers join their own channel. Missed events are not
//! replayed; clients re-fetch state on (re)connect.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use futures::Stream;
use tokio::sync::broadcast;

use shared::{Channel, StoreEvent};

use crate::auth::CurrentUser;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/events", get(subscribe))
}

async fn subscribe(
    State(state): State<ServerState>,
    CurrentUser(identity): CurrentUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let channel = match identity.account_ref() {
        Some(id) if !identity.is_admin() => Channel::User(id.key().to_string()),
        _ => Channel::Broadcast,
    };
    tracing::debug!(channel = %channel, "SSE client joined");
    let rx = state.hub.subscribe(&channel);
    Sse::new(event_stream(rx)).keep_alive(KeepAlive::default())
}

fn event_stream(
    rx: broadcast::Receiver<Arc<StoreEvent>>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    futures::stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    match Event::default().event(event.name()).json_data(event.as_ref()) {
                        Ok(sse) => return Some((Ok(sse), rx)),
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to encode SSE event");
                            continue;
                        }
                    }
                }
                // Buffer overrun: events were dropped, client state is
                // stale until it re-fetches. At-most-once, no replay.
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "SSE subscriber lagged, events dropped");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    })
}
