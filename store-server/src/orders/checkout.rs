//! Checkout
//!
//! Builds an order from cart input: snapshots product title/price/image
//! so later catalog edits never rewrite history, asks the gateway for a
//! checkout session (a gateway failure blocks checkout and leaves no
//! order behind), persists the order as `pending`/`unpaid`, announces it
//! on the admin broadcast channel, and fires the confirmation email
//! without waiting for it.

use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use rust_decimal::Decimal;
use serde::Deserialize;
use surrealdb::RecordId;

use shared::Channel;
use shared::StoreEvent;
use shared::order::{OrderStatus, PaymentStatus};
use shared::util::now_millis;

use crate::auth::Identity;
use crate::db::models::{Order, OrderCreate, OrderItem};
use crate::db::repository::product::PRODUCT_TABLE;
use crate::db::repository::{OrderRepository, ProductRepository, parse_id};
use crate::realtime::RealtimeHub;
use crate::services::{Mailer, PaymentGateway};
use crate::utils::validation::{MAX_SHORT_TEXT_LEN, validate_optional_text};
use crate::utils::{AppError, AppResult};

/// One cart line as submitted by the storefront.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutItemInput {
    pub product_id: String,
    pub quantity: i64,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug)]
pub struct CheckoutOutcome {
    pub order: Order,
    /// Gateway redirect URL the storefront sends the customer to.
    pub checkout_url: String,
}

#[derive(Clone)]
pub struct CheckoutService {
    orders: OrderRepository,
    products: ProductRepository,
    gateway: Arc<PaymentGateway>,
    mailer: Arc<Mailer>,
    hub: Arc<RealtimeHub>,
}

impl CheckoutService {
    pub fn new(
        orders: OrderRepository,
        products: ProductRepository,
        gateway: Arc<PaymentGateway>,
        mailer: Arc<Mailer>,
        hub: Arc<RealtimeHub>,
    ) -> Self {
        Self {
            orders,
            products,
            gateway,
            mailer,
            hub,
        }
    }

    pub async fn place_order(
        &self,
        customer: &Identity,
        items: Vec<CheckoutItemInput>,
    ) -> AppResult<CheckoutOutcome> {
        let user = customer
            .account_ref()
            .ok_or_else(|| AppError::validation("checkout requires a customer account"))?;
        if items.is_empty() {
            return Err(AppError::validation("cart is empty"));
        }

        let mut snapshots = Vec::with_capacity(items.len());
        for input in items {
            if input.quantity < 1 {
                return Err(AppError::validation("item quantity must be at least 1"));
            }
            validate_optional_text(&input.size, "size", MAX_SHORT_TEXT_LEN)?;
            validate_optional_text(&input.color, "color", MAX_SHORT_TEXT_LEN)?;
            let product_id = parse_id(PRODUCT_TABLE, &input.product_id)?;
            let product = self
                .products
                .find_by_id(&product_id)
                .await?
                .ok_or_else(|| {
                    AppError::not_found(format!("Product {} not found", input.product_id))
                })?;
            if !product.is_active {
                return Err(AppError::validation(format!(
                    "Product {} is no longer available",
                    product.title
                )));
            }
            snapshots.push(OrderItem {
                product: product_id,
                title: product.title,
                price: product.price,
                quantity: input.quantity,
                size: input.size,
                color: input.color,
                image: (!product.image.is_empty()).then_some(product.image),
            });
        }

        let total: Decimal = snapshots
            .iter()
            .map(|item| item.price * Decimal::from(item.quantity))
            .sum();
        let reference = new_reference();

        // Session first: a rejected payment leaves no half-created order
        let session = self
            .gateway
            .create_checkout_session(&reference, total)
            .await?;

        let order = self
            .orders
            .create(OrderCreate {
                user: user.clone(),
                reference,
                items: snapshots,
                status: OrderStatus::Pending,
                payment_status: PaymentStatus::Unpaid,
                total,
                created_at: now_millis(),
            })
            .await?;

        self.hub.publish(
            &Channel::Broadcast,
            StoreEvent::OrderNew {
                order: order.to_view(),
            },
        );
        self.mailer.send(
            order.user.to_string(),
            "order-confirmation",
            serde_json::json!({
                "reference": order.reference,
                "total": order.total,
                "items": order.items.len(),
            }),
        );

        Ok(CheckoutOutcome {
            order,
            checkout_url: session.url,
        })
    }

    /// Gateway webhook: the session settled.
    pub async fn mark_paid(&self, order_id: &RecordId) -> AppResult<Order> {
        let order = self
            .orders
            .set_payment_status(order_id, PaymentStatus::Paid)
            .await?;
        self.hub.publish(
            &Channel::Broadcast,
            StoreEvent::OrderUpdate {
                order: order.to_view(),
            },
        );
        Ok(order)
    }
}

/// Human-readable order reference: date plus a short random suffix.
fn new_reference() -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix: u16 = rand::thread_rng().r#gen();
    format!("SO{date}{suffix:04X}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::db::models::ProductCreate;

    struct Fixture {
        products: ProductRepository,
        service: CheckoutService,
        hub: Arc<RealtimeHub>,
    }

    async fn fixture() -> Fixture {
        let db = DbService::memory().await.unwrap().db;
        let products = ProductRepository::new(db.clone());
        let hub = Arc::new(RealtimeHub::new());
        let service = CheckoutService::new(
            OrderRepository::new(db.clone()),
            products.clone(),
            Arc::new(PaymentGateway::offline()),
            Arc::new(Mailer::disabled()),
            hub.clone(),
        );
        Fixture {
            products,
            service,
            hub,
        }
    }

    fn customer() -> Identity {
        Identity::Account {
            id: RecordId::from_table_key("user", "u1"),
            name: "Ana".into(),
            role: crate::auth::Role::Customer,
        }
    }

    #[tokio::test]
    async fn checkout_snapshots_items_and_announces_the_order() {
        let fix = fixture().await;
        let product = fix
            .products
            .create(ProductCreate {
                title: "Wool Scarf".into(),
                description: None,
                image: None,
                price: Decimal::new(3500, 2),
                stock: Some(10),
            })
            .await
            .unwrap();
        let mut rx = fix.hub.subscribe(&Channel::Broadcast);

        let outcome = fix
            .service
            .place_order(
                &customer(),
                vec![CheckoutItemInput {
                    product_id: product.id.unwrap().to_string(),
                    quantity: 2,
                    size: None,
                    color: Some("grey".into()),
                }],
            )
            .await
            .unwrap();

        assert_eq!(outcome.order.status, OrderStatus::Pending);
        assert_eq!(outcome.order.payment_status, PaymentStatus::Unpaid);
        assert_eq!(outcome.order.total, Decimal::new(7000, 2));
        assert_eq!(outcome.order.items[0].title, "Wool Scarf");
        assert!(outcome.checkout_url.starts_with("https://"));
        assert_eq!(rx.recv().await.unwrap().name(), "order:new");
    }

    #[tokio::test]
    async fn empty_cart_is_rejected() {
        let fix = fixture().await;
        let err = fix.service.place_order(&customer(), vec![]).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn missing_product_blocks_checkout() {
        let fix = fixture().await;
        let err = fix
            .service
            .place_order(
                &customer(),
                vec![CheckoutItemInput {
                    product_id: "product:gone".into(),
                    quantity: 1,
                    size: None,
                    color: None,
                }],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn builtin_admin_cannot_place_orders() {
        let fix = fixture().await;
        let err = fix
            .service
            .place_order(&Identity::BuiltinAdmin, vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
