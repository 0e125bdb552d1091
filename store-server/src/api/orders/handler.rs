//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use shared::order::{OrderStatus, OrderView};

use crate::auth::{AdminUser, CurrentUser};
use crate::core::ServerState;
use crate::db::repository::order::ORDER_TABLE;
use crate::db::repository::parse_id;
use crate::orders::CheckoutItemInput;
use crate::utils::{AppError, AppResponse, AppResult, ok_with_message};

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutItemInput>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub order: OrderView,
    /// Gateway redirect URL
    pub checkout_url: String,
}

/// Place an order from the current cart
pub async fn checkout(
    State(state): State<ServerState>,
    CurrentUser(identity): CurrentUser,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<Json<CheckoutResponse>> {
    let outcome = state.checkout().place_order(&identity, payload.items).await?;
    Ok(Json(CheckoutResponse {
        order: outcome.order.to_view(),
        checkout_url: outcome.checkout_url,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// List all orders (admin console)
pub async fn list(
    State(state): State<ServerState>,
    AdminUser(_): AdminUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<OrderView>>> {
    let orders = state
        .orders()
        .find_all(query.limit.clamp(1, 200), query.offset.max(0))
        .await?;
    Ok(Json(orders.iter().map(|o| o.to_view()).collect()))
}

/// List the calling customer's orders
pub async fn list_mine(
    State(state): State<ServerState>,
    CurrentUser(identity): CurrentUser,
) -> AppResult<Json<Vec<OrderView>>> {
    let user = identity
        .account_ref()
        .ok_or_else(|| AppError::validation("order history requires a customer account"))?;
    let orders = state.orders().find_by_user(user).await?;
    Ok(Json(orders.iter().map(|o| o.to_view()).collect()))
}

/// Get one order; customers only see their own
pub async fn get_by_id(
    State(state): State<ServerState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<OrderView>> {
    let id = parse_id(ORDER_TABLE, &id)?;
    let order = state
        .orders()
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {id} not found")))?;
    if !identity.is_admin() && identity.account_ref() != Some(&order.user) {
        return Err(AppError::forbidden("Not your order"));
    }
    Ok(Json(order.to_view()))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
    #[serde(default)]
    pub cancel_reason: Option<String>,
}

/// Transition an order's status (admin)
///
/// The response message states whether stock moved.
pub async fn update_status(
    State(state): State<ServerState>,
    AdminUser(_): AdminUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<AppResponse<OrderView>>> {
    let id = parse_id(ORDER_TABLE, &id)?;
    let outcome = state
        .order_status()
        .transition(&id, payload.status, payload.cancel_reason)
        .await?;
    Ok(ok_with_message(outcome.order.to_view(), outcome.message))
}

/// Payment gateway webhook: the checkout session settled
pub async fn mark_paid(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<OrderView>> {
    let id = parse_id(ORDER_TABLE, &id)?;
    let order = state.checkout().mark_paid(&id).await?;
    Ok(Json(order.to_view()))
}
