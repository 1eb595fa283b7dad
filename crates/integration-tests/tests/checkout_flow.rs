//! Integration tests for checkout against a persisted cart, and for the
//! order history that outlives each run.

#![allow(clippy::unwrap_used)]

use marketpulse_core::{OrderStatus, ProductId};
use marketpulse_integration_tests::{TestContext, address};
use marketpulse_storefront::cart::CartStore;
use marketpulse_storefront::checkout::{
    CheckoutError, CheckoutPolicy, ORDER_STORAGE_KEY, OrderError,
};
use rust_decimal::Decimal;

#[tokio::test]
async fn test_place_order_end_to_end() {
    let ctx = TestContext::new();
    let state = ctx.start().await;
    let lamp = state.catalog().get_by_id(&ProductId::from(1)).await.unwrap();
    let notebook = state.catalog().get_by_id(&ProductId::from(2)).await.unwrap();
    state.cart().add_to_cart(&lamp, 1).await.unwrap();
    state.cart().add_to_cart(&notebook, 2).await.unwrap();

    let summary = state.checkout().summary(state.cart()).await;
    assert_eq!(summary.subtotal, Decimal::new(34, 0));
    assert_eq!(summary.shipping, Decimal::new(999, 2));
    assert_eq!(summary.tax, Decimal::new(272, 2));
    assert_eq!(summary.total, Decimal::new(4671, 2));
    assert_eq!(summary.free_shipping_remaining, Decimal::new(16, 0));

    let order = state
        .checkout()
        .place_order(state.cart(), address())
        .await
        .unwrap();

    assert_eq!(order.number(), "#000001");
    assert_eq!(order.details.status, OrderStatus::Processing);
    assert_eq!(order.details.summary, summary);
    assert_eq!(order.details.items.len(), 2);
    assert!(state.cart().state().await.is_empty());
    assert!(ctx.read_snapshot().is_none());

    let restarted = ctx.start().await;
    assert!(restarted.cart().state().await.is_empty());
}

#[tokio::test]
async fn test_rejected_checkout_keeps_persisted_cart() {
    let ctx = TestContext::new();
    let state = ctx.start().await;
    let headphones = state.catalog().get_by_id(&ProductId::from(3)).await.unwrap();
    state.cart().add_to_cart(&headphones, 1).await.unwrap();

    let mut incomplete = address();
    incomplete.zip_code = "   ".to_string();
    let result = state.checkout().place_order(state.cart(), incomplete).await;
    assert!(matches!(result, Err(CheckoutError::MissingField("zipCode"))));

    let restarted = ctx.start().await;
    assert_eq!(restarted.cart().cart_count().await, 1);
    assert!(restarted.checkout().sink().all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_cart_cannot_check_out() {
    let ctx = TestContext::new();
    let state = ctx.start().await;

    let result = state.checkout().place_order(state.cart(), address()).await;
    assert!(matches!(result, Err(CheckoutError::EmptyCart)));
}

#[tokio::test]
async fn test_configured_policy_applies() {
    let ctx = TestContext::new();
    let config = marketpulse_storefront::config::StorefrontConfig {
        checkout: CheckoutPolicy {
            free_shipping_threshold: Decimal::new(20, 0),
            flat_shipping: Decimal::new(5, 0),
            tax_rate: Decimal::ZERO,
        },
        ..ctx.config()
    };
    let state = ctx.start_with(config).await;
    let lamp = state.catalog().get_by_id(&ProductId::from(1)).await.unwrap();
    state.cart().add_to_cart(&lamp, 1).await.unwrap();

    let summary = state.checkout().summary(state.cart()).await;
    assert!(summary.ships_free());
    assert_eq!(summary.total, Decimal::new(25, 0));
}

#[tokio::test]
async fn test_sequential_orders_get_sequential_numbers() {
    let ctx = TestContext::new();
    let state = ctx.start().await;
    let notebook = state.catalog().get_by_id(&ProductId::from(2)).await.unwrap();

    let mut numbers = Vec::new();
    for _ in 0..3 {
        state.cart().add_to_cart(&notebook, 1).await.unwrap();
        let order = state
            .checkout()
            .place_order(state.cart(), address())
            .await
            .unwrap();
        numbers.push(order.number());
    }

    assert_eq!(numbers, vec!["#000001", "#000002", "#000003"]);
    let recorded = state.checkout().sink().all().await.unwrap();
    assert!(recorded.iter().all(|o| o.details.items[0].line_total == Decimal::new(45, 1)));
}

#[tokio::test]
async fn test_order_history_survives_restart() {
    let ctx = TestContext::new();

    let first = {
        let state = ctx.start().await;
        let lamp = state.catalog().get_by_id(&ProductId::from(1)).await.unwrap();
        state.cart().add_to_cart(&lamp, 1).await.unwrap();
        state
            .checkout()
            .place_order(state.cart(), address())
            .await
            .unwrap()
    };

    let state = ctx.start().await;
    let notebook = state.catalog().get_by_id(&ProductId::from(2)).await.unwrap();
    state.cart().add_to_cart(&notebook, 3).await.unwrap();
    let second = state
        .checkout()
        .place_order(state.cart(), address())
        .await
        .unwrap();

    assert_eq!(first.number(), "#000001");
    assert_eq!(second.number(), "#000002");

    let sink = state.checkout().sink();
    assert_eq!(sink.get(&first.id).await.unwrap(), first);
    assert_eq!(sink.all().await.unwrap().len(), 2);
    assert!(ctx.store().read(ORDER_STORAGE_KEY).await.unwrap().is_some());
}

#[tokio::test]
async fn test_status_update_is_persisted() {
    let ctx = TestContext::new();
    let order = {
        let state = ctx.start().await;
        let lamp = state.catalog().get_by_id(&ProductId::from(1)).await.unwrap();
        state.cart().add_to_cart(&lamp, 2).await.unwrap();
        state
            .checkout()
            .place_order(state.cart(), address())
            .await
            .unwrap()
    };

    let state = ctx.start().await;
    state
        .checkout()
        .sink()
        .update_status(&order.id, OrderStatus::Shipped)
        .await
        .unwrap();

    let restarted = ctx.start().await;
    let stored = restarted.checkout().sink().get(&order.id).await.unwrap();
    assert_eq!(stored.details.status, OrderStatus::Shipped);
    assert_eq!(stored.details.summary, order.details.summary);

    let missing = marketpulse_core::OrderId::from(99);
    assert!(matches!(
        restarted.checkout().sink().get(&missing).await,
        Err(OrderError::NotFound(_))
    ));
}
