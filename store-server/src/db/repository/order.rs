//! Order Repository

use surrealdb::{RecordId, Surreal};
use surrealdb::engine::local::Db;

use shared::order::{OrderStatus, PaymentStatus};

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Order, OrderCreate};

pub const ORDER_TABLE: &str = "order";

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn create(&self, data: OrderCreate) -> RepoResult<Order> {
        let created: Option<Order> = self.base.db().create(ORDER_TABLE).content(data).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create order".to_string()))
    }

    pub async fn find_by_id(&self, id: &RecordId) -> RepoResult<Option<Order>> {
        let order: Option<Order> = self.base.db().select(id.clone()).await?;
        Ok(order)
    }

    /// List all orders (admin console), newest first
    pub async fn find_all(&self, limit: i64, start: i64) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM order ORDER BY created_at DESC LIMIT $limit START $start")
            .bind(("limit", limit))
            .bind(("start", start))
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// List one user's orders, newest first
    pub async fn find_by_user(&self, user: &RecordId) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM order WHERE user = $user ORDER BY created_at DESC")
            .bind(("user", user.to_string()))
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// Persist a status change. `cancel_reason` is only written when the
    /// new status is `cancelled`.
    pub async fn update_status(
        &self,
        id: &RecordId,
        status: OrderStatus,
        cancel_reason: Option<String>,
    ) -> RepoResult<Order> {
        let mut result = if status == OrderStatus::Cancelled {
            self.base
                .db()
                .query("UPDATE $order SET status = $status, cancel_reason = $reason RETURN AFTER")
                .bind(("order", id.clone()))
                .bind(("status", status))
                .bind(("reason", cancel_reason))
                .await?
        } else {
            self.base
                .db()
                .query("UPDATE $order SET status = $status RETURN AFTER")
                .bind(("order", id.clone()))
                .bind(("status", status))
                .await?
        };
        let orders: Vec<Order> = result.take(0)?;
        orders
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Order {id} not found")))
    }

    pub async fn set_payment_status(
        &self,
        id: &RecordId,
        payment_status: PaymentStatus,
    ) -> RepoResult<Order> {
        let mut result = self
            .base
            .db()
            .query("UPDATE $order SET payment_status = $payment_status RETURN AFTER")
            .bind(("order", id.clone()))
            .bind(("payment_status", payment_status))
            .await?;
        let orders: Vec<Order> = result.take(0)?;
        orders
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Order {id} not found")))
    }
}
