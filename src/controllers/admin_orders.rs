use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use loco_rs::prelude::*;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::middleware::{admin_auth_middleware, security_headers_middleware};
use crate::models::automation_log::AutomationLog;
use crate::models::order::{Order, OrderStatus};

pub fn routes() -> Routes {
    Routes::new()
        .prefix("admin/orders")
        .add("/{id}", get(show))
        .add("/{id}", patch(patch_order))
        .add("/{id}/resend-email", post(resend_email))
        .layer(middleware::from_fn(admin_auth_middleware))
        .layer(middleware::from_fn(security_headers_middleware))
}

/// Order detail plus its full C13 log timeline, for the operator console's
/// order drill-down (§6).
async fn show(Path(id): Path<Uuid>, State(ctx): State<AppContext>) -> Response {
    let order = match Order::find_by_id(&ctx.db, id).await {
        Ok(Some(order)) => order,
        Ok(None) => return (StatusCode::NOT_FOUND, Json(json!({"error": "order not found"}))).into_response(),
        Err(e) => return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": e.to_string()}))).into_response(),
    };

    let timeline = match AutomationLog::for_correlation_id(&ctx.db, order.correlation_id).await {
        Ok(entries) => entries,
        Err(e) => return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": e.to_string()}))).into_response(),
    };

    (StatusCode::OK, Json(json!({"order": order, "timeline": timeline}))).into_response()
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum PatchAction {
    ManualFulfillment {
        iccid: String,
        activation_code: String,
        qr_code_url: Option<String>,
        provider_used: String,
    },
}

/// The operator console's manual-override path (§4.12): lets an operator key
/// in an eSIM artifact sourced outside the automated cascade (e.g. purchased
/// directly from a provider's own dashboard) and drive the order straight to
/// `delivered`.
async fn patch_order(Path(id): Path<Uuid>, State(ctx): State<AppContext>, Json(action): Json<PatchAction>) -> Response {
    let order = match Order::find_by_id(&ctx.db, id).await {
        Ok(Some(order)) => order,
        Ok(None) => return (StatusCode::NOT_FOUND, Json(json!({"error": "order not found"}))).into_response(),
        Err(e) => return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": e.to_string()}))).into_response(),
    };

    if order.status.is_terminal() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": format!("order is already in terminal state '{}'", order.status.as_str())})),
        )
            .into_response();
    }

    let PatchAction::ManualFulfillment {
        iccid,
        activation_code,
        qr_code_url,
        provider_used,
    } = action;

    if let Err(e) = Order::set_esim_artifact(&ctx.db, id, qr_code_url, iccid, activation_code, provider_used.clone()).await {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": e.to_string()}))).into_response();
    }

    let metadata_patch = json!({"manual_override": true, "manual_override_provider": provider_used});
    let updated = match Order::set_status(&ctx.db, id, OrderStatus::Delivered, Some(metadata_patch)).await {
        Ok(order) => order,
        Err(e) => return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": e.to_string()}))).into_response(),
    };

    let _ = AutomationLog::record(
        &ctx.db,
        updated.correlation_id,
        "manual_fulfillment",
        "success",
        None,
        json!({"operator_initiated": true}),
    )
    .await;

    (StatusCode::OK, Json(json!({"order": updated}))).into_response()
}

#[derive(Debug, Deserialize)]
struct ResendEmailRequest {
    success: bool,
    #[serde(rename = "messageId")]
    message_id: Option<String>,
}

/// Records the outcome of an operator-triggered email resend. The send
/// itself happens outside this process (the operator console calls the
/// email transport directly); this endpoint just reconciles order state
/// with what happened, mirroring the email branch of C9's own transition.
async fn resend_email(Path(id): Path<Uuid>, State(ctx): State<AppContext>, Json(body): Json<ResendEmailRequest>) -> Response {
    let order = match Order::find_by_id(&ctx.db, id).await {
        Ok(Some(order)) => order,
        Ok(None) => return (StatusCode::NOT_FOUND, Json(json!({"error": "order not found"}))).into_response(),
        Err(e) => return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": e.to_string()}))).into_response(),
    };

    if !order.artifact_is_present() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "order has no eSIM artifact to resend"})),
        )
            .into_response();
    }

    if !body.success {
        let _ = AutomationLog::record(
            &ctx.db,
            order.correlation_id,
            "resend_email",
            "failure",
            None,
            json!({"operator_initiated": true}),
        )
        .await;
        return (StatusCode::OK, Json(json!({"success": false}))).into_response();
    }

    let metadata_patch = json!({"resent_email_message_id": body.message_id});
    let target = if order.status.is_terminal() {
        order.status
    } else {
        OrderStatus::Delivered
    };

    if !order.status.is_terminal() {
        if let Err(e) = Order::set_status(&ctx.db, id, target, Some(metadata_patch)).await {
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": e.to_string()}))).into_response();
        }
    } else {
        let _ = Order::merge_metadata(&ctx.db, id, metadata_patch).await;
    }

    let _ = AutomationLog::record(
        &ctx.db,
        order.correlation_id,
        "resend_email",
        "success",
        None,
        json!({"operator_initiated": true, "message_id": body.message_id}),
    )
    .await;

    (StatusCode::OK, Json(json!({"success": true}))).into_response()
}
