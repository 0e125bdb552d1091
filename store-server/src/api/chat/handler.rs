//! Chat API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared::chat::{Attachment, ChatMessage, Sender, ThreadStatus};

use crate::auth::{AdminUser, CurrentUser, Identity};
use crate::chat::ThreadPage;
use crate::core::ServerState;
use crate::db::models::ChatThread;
use crate::db::repository::chat::CHAT_THREAD_TABLE;
use crate::db::repository::parse_id;
use crate::utils::{AppError, AppResult};

fn own_user_ref(identity: &Identity) -> AppResult<&surrealdb::RecordId> {
    identity
        .account_ref()
        .ok_or_else(|| AppError::validation("support chat requires a customer account"))
}

/// Fetch (lazily creating) the calling customer's thread
pub async fn my_thread(
    State(state): State<ServerState>,
    CurrentUser(identity): CurrentUser,
) -> AppResult<Json<ChatThread>> {
    let thread = state.chat().get_or_create(own_user_ref(&identity)?).await?;
    Ok(Json(thread))
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub body: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Client idempotency key, echoed back in the fan-out event
    #[serde(default)]
    pub client_key: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub thread: ChatThread,
    pub message: ChatMessage,
}

/// Send a message in the calling customer's own thread
pub async fn send_message(
    State(state): State<ServerState>,
    CurrentUser(identity): CurrentUser,
    Json(payload): Json<SendMessageRequest>,
) -> AppResult<Json<SendMessageResponse>> {
    let chat = state.chat();
    let thread = chat.get_or_create(own_user_ref(&identity)?).await?;
    let thread_id = thread
        .id
        .ok_or_else(|| AppError::internal("thread missing id"))?;
    let (thread, message) = chat
        .append_message(
            &thread_id,
            &identity,
            payload.body,
            payload.attachments,
            payload.client_key,
        )
        .await?;
    Ok(Json(SendMessageResponse { thread, message }))
}

/// Mark the admin side's messages read (customer viewed the thread)
pub async fn mark_my_thread_read(
    State(state): State<ServerState>,
    CurrentUser(identity): CurrentUser,
) -> AppResult<Json<ChatThread>> {
    let chat = state.chat();
    let thread = chat.get_or_create(own_user_ref(&identity)?).await?;
    let thread_id = thread
        .id
        .ok_or_else(|| AppError::internal("thread missing id"))?;
    let thread = chat.mark_read(&thread_id, Sender::User).await?;
    Ok(Json(thread))
}

// ========== Admin console ==========

#[derive(Debug, Deserialize)]
pub struct ListThreadsQuery {
    #[serde(default)]
    pub status: Option<ThreadStatus>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

/// List threads with per-status aggregates (admin)
pub async fn list_threads(
    State(state): State<ServerState>,
    AdminUser(_): AdminUser,
    Query(query): Query<ListThreadsQuery>,
) -> AppResult<Json<ThreadPage>> {
    let page = state
        .chat()
        .list(query.status, query.page, query.limit)
        .await?;
    Ok(Json(page))
}

/// Fetch one thread (admin)
pub async fn get_thread(
    State(state): State<ServerState>,
    AdminUser(_): AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<ChatThread>> {
    let id = parse_id(CHAT_THREAD_TABLE, &id)?;
    Ok(Json(state.chat().find(&id).await?))
}

/// Reply in any thread (admin)
pub async fn send_as_admin(
    State(state): State<ServerState>,
    AdminUser(identity): AdminUser,
    Path(id): Path<String>,
    Json(payload): Json<SendMessageRequest>,
) -> AppResult<Json<SendMessageResponse>> {
    let id = parse_id(CHAT_THREAD_TABLE, &id)?;
    let (thread, message) = state
        .chat()
        .append_message(
            &id,
            &identity,
            payload.body,
            payload.attachments,
            payload.client_key,
        )
        .await?;
    Ok(Json(SendMessageResponse { thread, message }))
}

/// Mark the user side's messages read (admin opened the thread)
pub async fn mark_read_as_admin(
    State(state): State<ServerState>,
    AdminUser(_): AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<ChatThread>> {
    let id = parse_id(CHAT_THREAD_TABLE, &id)?;
    let thread = state.chat().mark_read(&id, Sender::Admin).await?;
    Ok(Json(thread))
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: ThreadStatus,
    /// Reassign the thread to this admin account
    #[serde(default)]
    pub assigned_admin: Option<String>,
}

/// Open/close/reassign a thread (admin)
pub async fn set_status(
    State(state): State<ServerState>,
    AdminUser(_): AdminUser,
    Path(id): Path<String>,
    Json(payload): Json<SetStatusRequest>,
) -> AppResult<Json<ChatThread>> {
    let id = parse_id(CHAT_THREAD_TABLE, &id)?;
    let assigned = payload
        .assigned_admin
        .as_deref()
        .map(|raw| parse_id("user", raw))
        .transpose()?;
    let thread = state.chat().set_status(&id, payload.status, assigned).await?;
    Ok(Json(thread))
}

/// Hard delete a thread (admin)
pub async fn delete_thread(
    State(state): State<ServerState>,
    AdminUser(_): AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let id = parse_id(CHAT_THREAD_TABLE, &id)?;
    state.chat().delete(&id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}
