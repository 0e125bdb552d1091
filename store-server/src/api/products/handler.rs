//! Product API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::auth::AdminUser;
use crate::core::ServerState;
use crate::db::models::{Product, ProductCreate, ProductUpdate};
use crate::db::repository::parse_id;
use crate::db::repository::product::PRODUCT_TABLE;
use crate::utils::{AppError, AppResult};

/// List active products (public storefront catalog)
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Product>>> {
    let products = state.products().find_all().await?;
    Ok(Json(products))
}

/// Get product by id (public)
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Product>> {
    let id = parse_id(PRODUCT_TABLE, &id)?;
    let product = state
        .products()
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {id} not found")))?;
    Ok(Json(product))
}

/// Create a product (admin)
pub async fn create(
    State(state): State<ServerState>,
    AdminUser(_): AdminUser,
    Json(payload): Json<ProductCreate>,
) -> AppResult<Json<Product>> {
    let product = state.products().create(payload).await?;
    Ok(Json(product))
}

/// Update a product (admin)
pub async fn update(
    State(state): State<ServerState>,
    AdminUser(_): AdminUser,
    Path(id): Path<String>,
    Json(payload): Json<ProductUpdate>,
) -> AppResult<Json<Product>> {
    let id = parse_id(PRODUCT_TABLE, &id)?;
    let product = state.products().update(&id, payload).await?;
    Ok(Json(product))
}

/// Hard delete a product (admin)
pub async fn delete(
    State(state): State<ServerState>,
    AdminUser(_): AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let id = parse_id(PRODUCT_TABLE, &id)?;
    state.products().delete(&id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}
