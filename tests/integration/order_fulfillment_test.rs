use esim_fulfillment_backend::app::App;
use esim_fulfillment_backend::models::order::Order;
use loco_rs::testing::prelude::*;
use serial_test::serial;

use crate::fixtures::OrderFixture;

/// With no provider API keys configured, every adapter reports
/// `is_enabled() == false` (§6), so the cascade exhausts immediately and,
/// with no Discord webhook configured either, the order lands on
/// `provider_failed` — covers spec §8 scenario S4 (provider exhaustion)
/// without needing network access to a real eSIM supplier.
#[tokio::test]
#[serial]
async fn fulfill_exhausts_to_provider_failed_without_configured_providers() {
    request::<App, _, _>(|request, ctx| async move {
        let order = Order::create(&ctx.db, OrderFixture::paid_order("order-fulfill-1"))
            .await
            .expect("seed order");

        let res = request.post(&format!("/api/orders/{}/fulfill", order.id)).await;
        assert_eq!(res.status_code(), 200);

        let body: serde_json::Value = res.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["final_state"], "provider_failed");

        let reloaded = Order::find_by_id(&ctx.db, order.id).await.unwrap().unwrap();
        assert!(reloaded.status.is_terminal());
    })
    .await;
}

/// A terminal order can't be re-fulfilled (§4.10): the controller rejects it
/// with 409 before spending a cascade attempt.
#[tokio::test]
#[serial]
async fn fulfill_rejects_an_already_terminal_order() {
    request::<App, _, _>(|request, ctx| async move {
        let order = Order::create(&ctx.db, OrderFixture::paid_order("order-fulfill-2"))
            .await
            .expect("seed order");

        let first = request.post(&format!("/api/orders/{}/fulfill", order.id)).await;
        assert_eq!(first.status_code(), 200);

        let second = request.post(&format!("/api/orders/{}/fulfill", order.id)).await;
        assert_eq!(second.status_code(), 409);
    })
    .await;
}

#[tokio::test]
#[serial]
async fn fulfill_on_missing_order_is_404() {
    request::<App, _, _>(|request, _ctx| async move {
        let res = request.post(&format!("/api/orders/{}/fulfill", uuid::Uuid::new_v4())).await;
        assert_eq!(res.status_code(), 404);
    })
    .await;
}
