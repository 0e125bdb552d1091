//! Order status state machine
//!
//! `transition` is the only mutation path for an order's status. Stock
//! side effects fire on exactly two edges, guarded by the status read
//! *before* the write:
//!
//! - entering `shipped` from any other status decrements stock
//! - leaving `shipped` for `cancelled` restores it
//!
//! Repeated same-status calls are accepted and never re-adjust stock.
//! Per-item stock failures are logged and counted, never rolled back,
//! and never fail the transition. The `order:update` event goes out on
//! the admin broadcast channel after the status write committed.

use std::sync::Arc;

use surrealdb::RecordId;

use shared::Channel;
use shared::StoreEvent;
use shared::order::OrderStatus;

use crate::db::models::Order;
use crate::db::repository::OrderRepository;
use crate::realtime::RealtimeHub;
use crate::services::Mailer;
use crate::stock::{StockBatchOutcome, StockLedger};
use crate::utils::{AppError, AppResult};

/// Result of a status transition.
#[derive(Debug)]
pub struct TransitionOutcome {
    pub order: Order,
    /// Human-readable summary, stating whether stock moved.
    pub message: String,
}

#[derive(Clone)]
pub struct OrderStatusService {
    orders: OrderRepository,
    ledger: StockLedger,
    hub: Arc<RealtimeHub>,
    mailer: Arc<Mailer>,
}

impl OrderStatusService {
    pub fn new(
        orders: OrderRepository,
        ledger: StockLedger,
        hub: Arc<RealtimeHub>,
        mailer: Arc<Mailer>,
    ) -> Self {
        Self {
            orders,
            ledger,
            hub,
            mailer,
        }
    }

    pub async fn transition(
        &self,
        order_id: &RecordId,
        new_status: OrderStatus,
        cancel_reason: Option<String>,
    ) -> AppResult<TransitionOutcome> {
        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Order {order_id} not found")))?;
        let previous = order.status;
        ensure_legal(previous, new_status)?;

        let reason = (new_status == OrderStatus::Cancelled)
            .then_some(cancel_reason)
            .flatten();
        let updated = self.orders.update_status(order_id, new_status, reason).await?;

        let message = if previous != OrderStatus::Shipped && new_status == OrderStatus::Shipped {
            let outcome = self.ledger.decrement_for_order(&updated).await;
            describe(&updated, "shipped", "adjusted", outcome)
        } else if previous == OrderStatus::Shipped && new_status == OrderStatus::Cancelled {
            let outcome = self.ledger.restore_for_order(&updated).await;
            describe(&updated, "cancelled", "restored", outcome)
        } else {
            format!("Order {} status updated to {new_status}", updated.reference)
        };

        self.hub.publish(
            &Channel::Broadcast,
            StoreEvent::OrderUpdate {
                order: updated.to_view(),
            },
        );
        self.mailer.send(
            updated.user.to_string(),
            "order-status-updated",
            serde_json::json!({
                "reference": updated.reference,
                "status": new_status.to_string(),
            }),
        );

        Ok(TransitionOutcome {
            order: updated,
            message,
        })
    }
}

/// Legal moves: forward along `pending → shipped → delivered`,
/// cancellation from any non-terminal status, and same-status repeats.
fn ensure_legal(previous: OrderStatus, new_status: OrderStatus) -> AppResult<()> {
    use OrderStatus::*;
    if previous == new_status {
        return Ok(());
    }
    if previous.is_terminal() {
        return Err(AppError::business_rule(format!(
            "Order is already {previous}"
        )));
    }
    let allowed = new_status == Cancelled
        || matches!((previous, new_status), (Pending, Shipped) | (Shipped, Delivered));
    if allowed {
        Ok(())
    } else {
        Err(AppError::business_rule(format!(
            "Cannot move order from {previous} to {new_status}"
        )))
    }
}

fn describe(order: &Order, status: &str, verb: &str, outcome: StockBatchOutcome) -> String {
    let mut message = format!(
        "Order {} {status}; stock {verb} for {} item(s)",
        order.reference, outcome.adjusted
    );
    if outcome.failed > 0 {
        message.push_str(&format!(", {} item(s) skipped", outcome.failed));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::db::models::{OrderCreate, OrderItem, ProductCreate};
    use crate::db::repository::ProductRepository;
    use rust_decimal::Decimal;
    use shared::order::PaymentStatus;
    use shared::util::now_millis;

    struct Fixture {
        products: ProductRepository,
        orders: OrderRepository,
        service: OrderStatusService,
        hub: Arc<RealtimeHub>,
    }

    async fn fixture() -> Fixture {
        let db = DbService::memory().await.unwrap().db;
        let products = ProductRepository::new(db.clone());
        let orders = OrderRepository::new(db.clone());
        let hub = Arc::new(RealtimeHub::new());
        let ledger = StockLedger::new(products.clone(), hub.clone());
        let service = OrderStatusService::new(
            orders.clone(),
            ledger,
            hub.clone(),
            Arc::new(Mailer::disabled()),
        );
        Fixture {
            products,
            orders,
            service,
            hub,
        }
    }

    async fn seed_product(fix: &Fixture, stock: i64) -> RecordId {
        fix.products
            .create(ProductCreate {
                title: "Canvas Tote".into(),
                description: None,
                image: None,
                price: Decimal::new(1800, 2),
                stock: Some(stock),
            })
            .await
            .unwrap()
            .id
            .unwrap()
    }

    async fn seed_order(fix: &Fixture, items: Vec<OrderItem>) -> RecordId {
        let total = items
            .iter()
            .map(|i| i.price * Decimal::from(i.quantity))
            .sum();
        fix.orders
            .create(OrderCreate {
                user: RecordId::from_table_key("user", "u1"),
                reference: "SO202608070001".into(),
                items,
                status: OrderStatus::Pending,
                payment_status: PaymentStatus::Paid,
                total,
                created_at: now_millis(),
            })
            .await
            .unwrap()
            .id
            .unwrap()
    }

    fn item(product: &RecordId, quantity: i64) -> OrderItem {
        OrderItem {
            product: product.clone(),
            title: "Canvas Tote".into(),
            price: Decimal::new(1800, 2),
            quantity,
            size: None,
            color: None,
            image: None,
        }
    }

    async fn stock_of(fix: &Fixture, id: &RecordId) -> i64 {
        fix.products.find_by_id(id).await.unwrap().unwrap().stock
    }

    #[tokio::test]
    async fn shipping_decrements_each_item_and_cancelling_restores() {
        let fix = fixture().await;
        let product = seed_product(&fix, 5).await;
        let order = seed_order(&fix, vec![item(&product, 3)]).await;

        let outcome = fix
            .service
            .transition(&order, OrderStatus::Shipped, None)
            .await
            .unwrap();
        assert_eq!(outcome.order.status, OrderStatus::Shipped);
        assert!(outcome.message.contains("stock adjusted for 1 item(s)"));
        assert_eq!(stock_of(&fix, &product).await, 2);

        let outcome = fix
            .service
            .transition(&order, OrderStatus::Cancelled, Some("changed mind".into()))
            .await
            .unwrap();
        assert_eq!(outcome.order.cancel_reason.as_deref(), Some("changed mind"));
        assert!(outcome.message.contains("stock restored for 1 item(s)"));
        // Restored exactly, not over-incremented
        assert_eq!(stock_of(&fix, &product).await, 5);
    }

    #[tokio::test]
    async fn repeated_shipped_call_does_not_re_decrement() {
        let fix = fixture().await;
        let product = seed_product(&fix, 5).await;
        let order = seed_order(&fix, vec![item(&product, 3)]).await;

        fix.service
            .transition(&order, OrderStatus::Shipped, None)
            .await
            .unwrap();
        fix.service
            .transition(&order, OrderStatus::Shipped, None)
            .await
            .unwrap();
        assert_eq!(stock_of(&fix, &product).await, 2);
    }

    #[tokio::test]
    async fn cancelling_before_shipping_leaves_stock_alone() {
        let fix = fixture().await;
        let product = seed_product(&fix, 5).await;
        let order = seed_order(&fix, vec![item(&product, 3)]).await;

        let outcome = fix
            .service
            .transition(&order, OrderStatus::Cancelled, None)
            .await
            .unwrap();
        assert_eq!(outcome.order.status, OrderStatus::Cancelled);
        assert_eq!(stock_of(&fix, &product).await, 5);
    }

    #[tokio::test]
    async fn shipping_decrements_all_items_with_clamping() {
        let fix = fixture().await;
        let p1 = seed_product(&fix, 5).await;
        let p2 = seed_product(&fix, 1).await;
        let order = seed_order(&fix, vec![item(&p1, 2), item(&p2, 4)]).await;

        fix.service
            .transition(&order, OrderStatus::Shipped, None)
            .await
            .unwrap();
        assert_eq!(stock_of(&fix, &p1).await, 3);
        // Clamped at zero, never negative
        assert_eq!(stock_of(&fix, &p2).await, 0);
    }

    #[tokio::test]
    async fn missing_product_is_skipped_not_fatal() {
        let fix = fixture().await;
        let real = seed_product(&fix, 5).await;
        let ghost = RecordId::from_table_key("product", "vanished");
        let order = seed_order(&fix, vec![item(&real, 1), item(&ghost, 2)]).await;

        let outcome = fix
            .service
            .transition(&order, OrderStatus::Shipped, None)
            .await
            .unwrap();
        assert_eq!(outcome.order.status, OrderStatus::Shipped);
        assert!(outcome.message.contains("1 item(s) skipped"));
        assert_eq!(stock_of(&fix, &real).await, 4);
    }

    #[tokio::test]
    async fn transition_always_broadcasts_order_update() {
        let fix = fixture().await;
        let product = seed_product(&fix, 5).await;
        let order = seed_order(&fix, vec![item(&product, 1)]).await;
        let mut rx = fix.hub.subscribe(&Channel::Broadcast);

        fix.service
            .transition(&order, OrderStatus::Shipped, None)
            .await
            .unwrap();

        // stock:update for the item plus the order:update itself
        let mut names = vec![
            rx.recv().await.unwrap().name(),
            rx.recv().await.unwrap().name(),
        ];
        names.sort();
        assert_eq!(names, vec!["order:update", "stock:update"]);
    }

    #[tokio::test]
    async fn terminal_states_reject_further_moves() {
        let fix = fixture().await;
        let product = seed_product(&fix, 5).await;
        let order = seed_order(&fix, vec![item(&product, 1)]).await;

        fix.service
            .transition(&order, OrderStatus::Cancelled, None)
            .await
            .unwrap();
        let err = fix
            .service
            .transition(&order, OrderStatus::Shipped, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(_)));
        assert_eq!(stock_of(&fix, &product).await, 5);
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let fix = fixture().await;
        let ghost = RecordId::from_table_key("order", "missing");
        let err = fix
            .service
            .transition(&ghost, OrderStatus::Shipped, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
