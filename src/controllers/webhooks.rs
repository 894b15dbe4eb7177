use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use loco_rs::prelude::*;
use serde::Deserialize;
use serde_json::json;

use crate::config::AppConfig;
use crate::middleware::security_headers_middleware;
use crate::models::inquiry::CreateInquiryRequest;
use crate::models::order::{CreateOrderRequest, Order};
use crate::services::normalizer::{self, DbProductMapper, ExternalOrder};
use crate::utils::webhook_signature::verify_hmac_sha256;

pub fn routes() -> Routes {
    Routes::new()
        .prefix("webhooks")
        .add("/payment/{sales_channel}", post(payment))
        .add("/inquiry/{channel}", post(inquiry))
        .layer(middleware::from_fn(security_headers_middleware))
}

/// Reads the raw body once for signature verification, then parses JSON
/// against it. Loco/axum's `Json` extractor can't be used here: it would
/// consume the body before a signature check could run. Verifying inline
/// keeps the one HMAC check next to the one body read.
async fn verify_signature(headers: &HeaderMap, body: &Bytes, secret: &str) -> Result<(), Response> {
    let signature = headers
        .get("X-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| (StatusCode::UNAUTHORIZED, Json(json!({"error": "missing X-Signature header"}))).into_response())?;

    if !verify_hmac_sha256(secret, body, signature) {
        return Err((StatusCode::UNAUTHORIZED, Json(json!({"error": "invalid webhook signature"}))).into_response());
    }

    Ok(())
}

/// Inbound payment confirmation from a sales channel (§4.1/§6). Normalizes
/// the payload, dedupes on `(sales_channel, external_order_id)` so a
/// redelivered webhook is a no-op, and persists a new `payment_received`
/// order. Fulfillment itself is triggered separately via `POST
/// /orders/{id}/fulfill` rather than inline here, keeping the webhook path
/// fast and the fulfillment deadline budget (§4.10) scoped to its own call.
async fn payment(Path(sales_channel): Path<String>, State(ctx): State<AppContext>, headers: HeaderMap, body: Bytes) -> Response {
    let secret = match ctx.config.webhook_secret(&sales_channel) {
        Some(secret) => secret,
        None => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": format!("no webhook secret configured for channel '{sales_channel}'")})),
            )
                .into_response()
        }
    };

    if let Err(response) = verify_signature(&headers, &body, &secret).await {
        return response;
    }

    let mut external: ExternalOrder = match serde_json::from_slice(&body) {
        Ok(order) => order,
        Err(e) => return (StatusCode::BAD_REQUEST, Json(json!({"error": format!("invalid payload: {e}")}))).into_response(),
    };
    external.sales_channel = sales_channel.clone();

    if !normalizer::is_eligible_for_fulfillment(&external.status) {
        return (StatusCode::OK, Json(json!({"accepted": false, "reason": "not eligible for fulfillment"}))).into_response();
    }

    match Order::find_by_sales_channel_external_order_id(&ctx.db, &sales_channel, &external.external_order_id).await {
        Ok(Some(existing)) => return (StatusCode::OK, Json(json!({"accepted": true, "order": existing, "duplicate": true}))).into_response(),
        Ok(None) => {}
        Err(e) => return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": e.to_string()}))).into_response(),
    }

    let mapper = DbProductMapper { db: &ctx.db };
    let internal = match normalizer::normalize(&external, &mapper).await {
        Ok(internal) => internal,
        Err(e) => return (StatusCode::BAD_REQUEST, Json(json!({"error": e.to_string()}))).into_response(),
    };

    let order = match Order::create(
        &ctx.db,
        CreateOrderRequest {
            order_number: format!("{}-{}", sales_channel, internal.external_order_id),
            correlation_id: uuid::Uuid::new_v4(),
            sales_channel: internal.sales_channel,
            external_order_id: internal.external_order_id,
            customer_email: internal.customer_email,
            customer_name: internal.customer_name,
            customer_phone: internal.customer_phone,
            product_id: internal.product_id,
            provider_sku: internal.provider_sku,
            quantity: internal.quantity as i32,
            amount: internal.amount,
            currency: internal.currency,
            payment_reference: None,
            metadata: internal.metadata,
            paid_at: internal.paid_at.naive_utc(),
        },
    )
    .await
    {
        Ok(order) => order,
        Err(e) => return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": e.to_string()}))).into_response(),
    };

    (StatusCode::OK, Json(json!({"accepted": true, "order": order}))).into_response()
}

#[derive(Debug, Deserialize)]
struct InquiryPushPayload {
    external_id: String,
    subject: Option<String>,
    content: String,
    customer_name: Option<String>,
    customer_email: Option<String>,
}

/// Real-time push from Kakao/TalkTalk (§6), distinct from `InquiryService::
/// sync_from_all_channels`'s periodic pull: the two share the same dedup key
/// so a message that arrives by both paths only ever creates one inquiry.
async fn inquiry(Path(channel): Path<String>, State(ctx): State<AppContext>, headers: HeaderMap, body: Bytes) -> Response {
    let secret = match ctx.config.webhook_secret(&channel) {
        Some(secret) => secret,
        None => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": format!("no webhook secret configured for channel '{channel}'")})),
            )
                .into_response()
        }
    };

    if let Err(response) = verify_signature(&headers, &body, &secret).await {
        return response;
    }

    let payload: InquiryPushPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => return (StatusCode::BAD_REQUEST, Json(json!({"error": format!("invalid payload: {e}")}))).into_response(),
    };

    match crate::models::inquiry::Inquiry::find_by_channel_external_id(&ctx.db, &channel, &payload.external_id).await {
        Ok(Some(existing)) => return (StatusCode::OK, Json(json!({"accepted": true, "inquiry": existing, "duplicate": true}))).into_response(),
        Ok(None) => {}
        Err(e) => return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": e.to_string()}))).into_response(),
    }

    let services = crate::services::runtime::get_or_init(ctx.db.clone()).await;
    match services
        .inquiry
        .create(CreateInquiryRequest {
            channel,
            external_id: payload.external_id,
            subject: payload.subject,
            content: payload.content,
            customer_name: payload.customer_name,
            customer_email: payload.customer_email,
        })
        .await
    {
        Ok(inquiry) => (StatusCode::OK, Json(json!({"accepted": true, "inquiry": inquiry}))).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": e.to_string()}))).into_response(),
    }
}
