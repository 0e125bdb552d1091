//! Order Model
//!
//! Item title/price/image are snapshots copied from the product at
//! checkout so historical orders survive later product edits.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use shared::order::{OrderItemView, OrderStatus, OrderView, PaymentStatus};

use super::serde_helpers;

/// Snapshotted line item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(with = "serde_helpers::record_id")]
    pub product: RecordId,
    pub title: String,
    pub price: Decimal,
    pub quantity: i64,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Persisted order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    #[serde(
        default,
        with = "serde_helpers::option_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub user: RecordId,
    /// Human-readable order reference (e.g. receipt/confirmation emails)
    pub reference: String,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub cancel_reason: Option<String>,
    pub total: Decimal,
    pub created_at: i64,
}

impl Order {
    /// Wire representation for API responses and realtime events.
    pub fn to_view(&self) -> OrderView {
        OrderView {
            id: self
                .id
                .as_ref()
                .map(|id| id.to_string())
                .unwrap_or_default(),
            user_id: self.user.to_string(),
            reference: self.reference.clone(),
            items: self
                .items
                .iter()
                .map(|item| OrderItemView {
                    product_id: item.product.to_string(),
                    title: item.title.clone(),
                    price: item.price,
                    quantity: item.quantity,
                    size: item.size.clone(),
                    color: item.color.clone(),
                    image: item.image.clone(),
                })
                .collect(),
            status: self.status,
            payment_status: self.payment_status,
            cancel_reason: self.cancel_reason.clone(),
            total: self.total,
            created_at: self.created_at,
        }
    }
}

/// Checkout output, persisted as a new `order` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    #[serde(with = "serde_helpers::record_id")]
    pub user: RecordId,
    pub reference: String,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub total: Decimal,
    pub created_at: i64,
}
