use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use loco_rs::prelude::*;
use serde_json::json;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::middleware::security_headers_middleware;
use crate::models::order::Order;
use crate::services::deadline::{fulfill_with_timeout, FulfillmentOutcome};
use crate::services::runtime;

pub fn routes() -> Routes {
    Routes::new()
        .prefix("orders")
        .add("/{id}/fulfill", post(fulfill))
        .layer(middleware::from_fn(security_headers_middleware))
}

/// Triggers C9's fulfillment pipeline for one order, racing it against the
/// per-request deadline budget (§4.10). A terminal order is rejected
/// up-front with 409 rather than let the state machine reject the first
/// transition — the order's current state is enough to know the request is
/// invalid without spending a cascade attempt.
async fn fulfill(Path(id): Path<Uuid>, State(ctx): State<AppContext>) -> Response {
    let order = match Order::find_by_id(&ctx.db, id).await {
        Ok(Some(order)) => order,
        Ok(None) => return (StatusCode::NOT_FOUND, Json(json!({"error": "order not found"}))).into_response(),
        Err(e) => return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": e.to_string()}))).into_response(),
    };

    if order.status.is_terminal() {
        return (
            StatusCode::CONFLICT,
            Json(json!({"error": format!("order is already in terminal state '{}'", order.status.as_str())})),
        )
            .into_response();
    }

    let services = runtime::get_or_init(ctx.db.clone()).await;
    let budget_ms = ctx.config.fulfillment_deadline_budget_ms();

    match fulfill_with_timeout(services.fulfillment.clone(), order, services.provider_configs.clone(), budget_ms).await {
        FulfillmentOutcome::Completed(result) => (StatusCode::OK, Json(result)).into_response(),
        FulfillmentOutcome::TimedOut(sentinel) => (StatusCode::GATEWAY_TIMEOUT, Json(sentinel)).into_response(),
    }
}
