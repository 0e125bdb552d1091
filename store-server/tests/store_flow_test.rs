//! End-to-end storefront flow over a fully initialized in-memory state
//!
//! Exercises the slice the server exists for: checkout → ship → cancel
//! with live stock reconciliation, and a support chat round trip where
//! a client timeline merges its own optimistic send with the fan-out
//! echo.

use rust_decimal::Decimal;
use surrealdb::RecordId;

use shared::Channel;
use shared::StoreEvent;
use shared::chat::Sender;
use shared::order::{OrderStatus, PaymentStatus};
use shared::util::now_millis;
use store_client::{ChatTimeline, ThreadState};
use store_server::{Config, Identity, Role, ServerState};
use store_server::db::models::ProductCreate;

async fn state() -> ServerState {
    ServerState::initialize(&Config::ephemeral())
        .await
        .expect("state init")
}

fn customer(key: &str, name: &str) -> Identity {
    Identity::Account {
        id: RecordId::from_table_key("user", key),
        name: name.into(),
        role: Role::Customer,
    }
}

fn admin(key: &str, name: &str) -> Identity {
    Identity::Account {
        id: RecordId::from_table_key("user", key),
        name: name.into(),
        role: Role::Admin,
    }
}

#[tokio::test]
async fn checkout_ship_cancel_reconciles_stock_and_fans_out() {
    let state = state().await;
    let product = state
        .products()
        .create(ProductCreate {
            title: "Denim Jacket".into(),
            description: None,
            image: None,
            price: Decimal::new(8900, 2),
            stock: Some(5),
        })
        .await
        .unwrap();
    let product_id = product.id.clone().unwrap();

    // Admin console watches the broadcast channel
    let mut console = state.hub.subscribe(&Channel::Broadcast);

    let outcome = state
        .checkout()
        .place_order(
            &customer("u1", "Ana"),
            vec![store_server::orders::CheckoutItemInput {
                product_id: product_id.to_string(),
                quantity: 3,
                size: Some("M".into()),
                color: None,
            }],
        )
        .await
        .unwrap();
    let order_id = outcome.order.id.clone().unwrap();
    assert_eq!(outcome.order.payment_status, PaymentStatus::Unpaid);
    assert!(!outcome.checkout_url.is_empty());

    match console.recv().await.unwrap().as_ref() {
        StoreEvent::OrderNew { order } => assert_eq!(order.items[0].quantity, 3),
        other => panic!("expected order:new, got {}", other.name()),
    }

    // Checkout does not touch stock; shipping does
    assert_eq!(
        state.products().find_by_id(&product_id).await.unwrap().unwrap().stock,
        5
    );

    let shipped = state
        .order_status()
        .transition(&order_id, OrderStatus::Shipped, None)
        .await
        .unwrap();
    assert!(shipped.message.contains("stock adjusted"));
    assert_eq!(
        state.products().find_by_id(&product_id).await.unwrap().unwrap().stock,
        2
    );

    // stock:update carries the sale and the new level
    let mut saw_stock_update = false;
    for _ in 0..2 {
        if let StoreEvent::StockUpdate(update) = console.recv().await.unwrap().as_ref() {
            assert_eq!(update.new_stock, 2);
            assert_eq!(update.items_sold, Some(3));
            assert_eq!(update.order_id, order_id.to_string());
            saw_stock_update = true;
        }
    }
    assert!(saw_stock_update);

    // Cancelling a shipped order restores exactly the sold quantity
    let cancelled = state
        .order_status()
        .transition(&order_id, OrderStatus::Cancelled, Some("damaged in transit".into()))
        .await
        .unwrap();
    assert!(cancelled.message.contains("stock restored"));
    assert_eq!(cancelled.order.cancel_reason.as_deref(), Some("damaged in transit"));
    assert_eq!(
        state.products().find_by_id(&product_id).await.unwrap().unwrap().stock,
        5
    );
}

#[tokio::test]
async fn chat_round_trip_merges_optimistic_send_with_echo() {
    let state = state().await;
    let user = customer("u7", "Bo");
    let user_ref = user.account_ref().unwrap().clone();

    // The storefront tab subscribes to its own channel before sending
    let mut feed = state.hub.subscribe(&Channel::User("u7".into()));

    let chat = state.chat();
    let thread = chat.get_or_create(&user_ref).await.unwrap();
    let thread_id = thread.id.clone().unwrap();

    // Optimistic append, then the real send carrying the same key
    let mut timeline = ChatTimeline::new();
    let key = timeline.begin_send(Sender::User, "Bo", "my order arrived damaged", now_millis());
    let (thread, confirmed) = chat
        .append_message(
            &thread_id,
            &user,
            "my order arrived damaged".into(),
            vec![],
            Some(key),
        )
        .await
        .unwrap();
    assert_eq!(thread.unread.admin, 1);
    timeline.confirm_send(key, confirmed.clone());

    // The broadcast echo of our own message must not duplicate
    let echo = feed.recv().await.unwrap();
    let mut view = ThreadState::new(
        thread_id.to_string(),
        vec![],
        Default::default(),
        store_client::ThreadStatus::Active,
        None,
    );
    if let StoreEvent::ChatMessage { message, .. } = echo.as_ref() {
        timeline.ingest(message.clone());
    }
    view.apply_event(echo.as_ref());
    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline.entries()[0].message.message_id, confirmed.message_id);
    assert!(!timeline.entries()[0].pending);

    // Admin reply reaches the user channel and lands as a second entry
    let (thread, _) = chat
        .append_message(
            &thread_id,
            &admin("staff1", "Sam"),
            "sending a replacement today".into(),
            vec![],
            None,
        )
        .await
        .unwrap();
    assert_eq!(thread.unread.user, 1);
    assert_eq!(
        thread.assigned_admin,
        Some(RecordId::from_table_key("user", "staff1"))
    );

    let reply = feed.recv().await.unwrap();
    if let StoreEvent::ChatMessage { message, .. } = reply.as_ref() {
        timeline.ingest(message.clone());
    }
    view.apply_event(reply.as_ref());
    assert_eq!(timeline.len(), 2);
    assert_eq!(view.unread.user, 1);
    assert_eq!(view.timeline.len(), 2);
}
