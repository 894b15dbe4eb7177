use esim_fulfillment_backend::app::App;
use esim_fulfillment_backend::models::product_mapping::ProductMapping;
use loco_rs::testing::prelude::*;
use serial_test::serial;
use serde_json::json;

use crate::helpers::{configure_test_env, sign};

fn payment_payload(external_order_id: &str, external_product_id: &str, status: &str) -> serde_json::Value {
    json!({
        "sales_channel": "smartstore",
        "external_order_id": external_order_id,
        "external_product_id": external_product_id,
        "orderer": {
            "email": "buyer@example.com",
            "name": "Buyer",
            "safe_number": "050-1234-5678",
            "tel": null,
        },
        "quantity": 1,
        "amount": "29900",
        "currency": "KRW",
        "paid_at": chrono::Utc::now().to_rfc3339(),
        "status": status,
        "metadata": {},
    })
}

/// Covers spec §8 scenario S1 (happy-path payment webhook → order created)
/// and the §4.1 dedup rule on redelivery.
#[tokio::test]
#[serial]
async fn payment_webhook_creates_an_order_and_dedupes_on_redelivery() {
    configure_test_env();

    request::<App, _, _>(|request, ctx| async move {
        ProductMapping::upsert(&ctx.db, "smartstore", "sku-123", "esim-japan-5gb", None)
            .await
            .expect("seed product mapping");

        let payload = payment_payload("webhook-order-1", "sku-123", "paid");
        let body = serde_json::to_vec(&payload).unwrap();
        let signature = sign(&body);

        let first = request
            .post("/api/webhooks/payment/smartstore")
            .add_header("X-Signature", &signature)
            .json(&payload)
            .await;
        assert_eq!(first.status_code(), 200);
        let first_body: serde_json::Value = first.json();
        assert_eq!(first_body["accepted"], true);
        assert!(first_body["order"]["id"].is_string());

        let second = request
            .post("/api/webhooks/payment/smartstore")
            .add_header("X-Signature", &signature)
            .json(&payload)
            .await;
        assert_eq!(second.status_code(), 200);
        let second_body: serde_json::Value = second.json();
        assert_eq!(second_body["duplicate"], true);
    })
    .await;
}

#[tokio::test]
#[serial]
async fn payment_webhook_rejects_an_invalid_signature() {
    configure_test_env();

    request::<App, _, _>(|request, _ctx| async move {
        let payload = payment_payload("webhook-order-2", "sku-123", "paid");

        let res = request
            .post("/api/webhooks/payment/smartstore")
            .add_header("X-Signature", "0000")
            .json(&payload)
            .await;

        assert_eq!(res.status_code(), 401);
    })
    .await;
}

/// A cancelled order is accepted but not eligible for fulfillment (§4.1): no
/// order row is created for it.
#[tokio::test]
#[serial]
async fn payment_webhook_declines_a_cancelled_order() {
    configure_test_env();

    request::<App, _, _>(|request, ctx| async move {
        ProductMapping::upsert(&ctx.db, "smartstore", "sku-456", "esim-japan-5gb", None)
            .await
            .expect("seed product mapping");

        let payload = payment_payload("webhook-order-3", "sku-456", "canceled");
        let body = serde_json::to_vec(&payload).unwrap();
        let signature = sign(&body);

        let res = request
            .post("/api/webhooks/payment/smartstore")
            .add_header("X-Signature", &signature)
            .json(&payload)
            .await;

        assert_eq!(res.status_code(), 200);
        let response_body: serde_json::Value = res.json();
        assert_eq!(response_body["accepted"], false);
    })
    .await;
}

/// A push payload for an unmapped product id is a 400 (§4.12: unmapped
/// product ids are a validation failure, not a silent drop).
#[tokio::test]
#[serial]
async fn payment_webhook_rejects_an_unmapped_product() {
    configure_test_env();

    request::<App, _, _>(|request, _ctx| async move {
        let payload = payment_payload("webhook-order-4", "sku-unmapped", "paid");
        let body = serde_json::to_vec(&payload).unwrap();
        let signature = sign(&body);

        let res = request
            .post("/api/webhooks/payment/smartstore")
            .add_header("X-Signature", &signature)
            .json(&payload)
            .await;

        assert_eq!(res.status_code(), 400);
    })
    .await;
}

#[tokio::test]
#[serial]
async fn inquiry_webhook_creates_an_inquiry_and_dedupes() {
    configure_test_env();

    request::<App, _, _>(|request, _ctx| async move {
        let payload = json!({
            "external_id": "kakao-msg-1",
            "subject": "Activation help",
            "content": "My eSIM won't activate",
            "customer_name": "Jane",
            "customer_email": "jane@example.com",
        });
        let body = serde_json::to_vec(&payload).unwrap();
        let signature = sign(&body);

        let first = request
            .post("/api/webhooks/inquiry/kakao")
            .add_header("X-Signature", &signature)
            .json(&payload)
            .await;
        assert_eq!(first.status_code(), 200);
        let first_body: serde_json::Value = first.json();
        assert_eq!(first_body["accepted"], true);

        let second = request
            .post("/api/webhooks/inquiry/kakao")
            .add_header("X-Signature", &signature)
            .json(&payload)
            .await;
        let second_body: serde_json::Value = second.json();
        assert_eq!(second_body["duplicate"], true);
    })
    .await;
}
