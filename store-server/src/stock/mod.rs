//! Stock ledger
//!
//! Per-product available-quantity counter. Mutations go through the
//! repository's atomic single-statement updates (decrement clamps at
//! zero, increment never clamps). Batch adjustments for an order run
//! per-item, concurrently and independently: a missing product skips
//! that item with a logged failure and the rest proceed. Best-effort,
//! not transactional.

use std::sync::Arc;

use futures::future::join_all;
use surrealdb::RecordId;

use shared::Channel;
use shared::events::{StockUpdate, StoreEvent};

use crate::db::models::{Order, OrderItem, Product};
use crate::db::repository::{ProductRepository, RepoResult};
use crate::realtime::RealtimeHub;

/// Direction of a batch adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Adjustment {
    Sale,
    Restore,
}

/// Outcome of a per-order stock batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StockBatchOutcome {
    pub adjusted: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct StockLedger {
    products: ProductRepository,
    hub: Arc<RealtimeHub>,
}

impl StockLedger {
    pub fn new(products: ProductRepository, hub: Arc<RealtimeHub>) -> Self {
        Self { products, hub }
    }

    /// Atomic decrement with floor at zero. `None` marks a missing
    /// product; the caller decides whether that is fatal.
    pub async fn decrement(&self, product_id: &RecordId, qty: i64) -> RepoResult<Option<Product>> {
        let result = self.products.decrement_stock(product_id, qty).await?;
        if result.is_none() {
            tracing::warn!(product = %product_id, qty, "Stock decrement skipped: product missing");
        }
        Ok(result)
    }

    /// Atomic increment, no clamp.
    pub async fn increment(&self, product_id: &RecordId, qty: i64) -> RepoResult<Option<Product>> {
        let result = self.products.increment_stock(product_id, qty).await?;
        if result.is_none() {
            tracing::warn!(product = %product_id, qty, "Stock increment skipped: product missing");
        }
        Ok(result)
    }

    /// Decrement stock for every item of a newly shipped order.
    pub async fn decrement_for_order(&self, order: &Order) -> StockBatchOutcome {
        self.apply_for_order(order, Adjustment::Sale).await
    }

    /// Restore stock for every item of an order cancelled after shipping.
    pub async fn restore_for_order(&self, order: &Order) -> StockBatchOutcome {
        self.apply_for_order(order, Adjustment::Restore).await
    }

    async fn apply_for_order(&self, order: &Order, adjustment: Adjustment) -> StockBatchOutcome {
        let order_id = order
            .id
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_default();

        let updates = order
            .items
            .iter()
            .map(|item| self.apply_item(order_id.clone(), item, adjustment));
        let results = join_all(updates).await;

        let mut outcome = StockBatchOutcome::default();
        for ok in results {
            if ok {
                outcome.adjusted += 1;
            } else {
                outcome.failed += 1;
            }
        }
        if outcome.failed > 0 {
            tracing::warn!(
                order = %order_id,
                failed = outcome.failed,
                adjusted = outcome.adjusted,
                "Stock batch completed with failures"
            );
        }
        outcome
    }

    async fn apply_item(&self, order_id: String, item: &OrderItem, adjustment: Adjustment) -> bool {
        let result = match adjustment {
            Adjustment::Sale => self.decrement(&item.product, item.quantity).await,
            Adjustment::Restore => self.increment(&item.product, item.quantity).await,
        };

        let product = match result {
            Ok(Some(product)) => product,
            Ok(None) => return false,
            Err(e) => {
                tracing::error!(
                    order = %order_id,
                    product = %item.product,
                    error = %e,
                    "Stock adjustment failed"
                );
                return false;
            }
        };

        let (items_sold, items_restored) = match adjustment {
            Adjustment::Sale => (Some(item.quantity), None),
            Adjustment::Restore => (None, Some(item.quantity)),
        };
        // Live stock is public: broadcast so storefronts update without polling
        self.hub.publish(
            &Channel::Broadcast,
            StoreEvent::StockUpdate(StockUpdate {
                product_id: item.product.to_string(),
                new_stock: product.stock,
                order_id,
                items_sold,
                items_restored,
                product_title: Some(product.title),
            }),
        );
        true
    }
}
