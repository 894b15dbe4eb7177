use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use loco_rs::prelude::*;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::middleware::{admin_auth_middleware, security_headers_middleware};
use crate::models::inquiry::{InquiryPriority, InquiryStatus};
use crate::services::error::DomainError;
use crate::services::inquiry_service::{InquiryListFilter, InquiryUpdatePatch};
use crate::services::runtime;

pub fn routes() -> Routes {
    Routes::new()
        .prefix("admin/inquiries")
        .add("/", get(list))
        .add("/metrics", get(metrics))
        .add("/sync", post(sync))
        .add("/{id}", get(show))
        .add("/{id}", patch(patch_inquiry))
        .add("/{id}/reply", post(reply))
        .layer(middleware::from_fn(admin_auth_middleware))
        .layer(middleware::from_fn(security_headers_middleware))
}

/// `DomainError::InquiryNotFound` is the only variant this controller lets
/// surface as 404; everything else is either caller error (400) or an
/// internal failure (500).
fn domain_error_response(err: DomainError) -> Response {
    let status = match &err {
        DomainError::InquiryNotFound(_) => StatusCode::NOT_FOUND,
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({"error": err.to_string()}))).into_response()
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    channel: Option<String>,
    status: Option<String>,
    priority: Option<String>,
    assigned_to: Option<String>,
    search: Option<String>,
    query: Option<String>,
    limit: Option<u64>,
    offset: Option<u64>,
}

/// §6 `GET /admin/inquiries`: structured filters compose with the raw C11
/// predicate query via AND, same as `InquiryListFilter` already models.
async fn list(State(ctx): State<AppContext>, Query(q): Query<ListQuery>) -> Response {
    let services = runtime::get_or_init(ctx.db.clone()).await;

    let filter = InquiryListFilter {
        channel: q.channel,
        status: q.status.as_deref().map(|s| s.split(',').map(InquiryStatus::parse).collect()),
        priority: q.priority.as_deref().map(InquiryPriority::parse),
        assigned_to: q.assigned_to,
        search: q.search,
        query: q.query,
        limit: q.limit.unwrap_or(50).min(200),
        offset: q.offset.unwrap_or(0),
        sort: Default::default(),
    };

    match services.inquiry.list(filter).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => domain_error_response(e),
    }
}

async fn show(Path(id): Path<Uuid>, State(ctx): State<AppContext>) -> Response {
    let services = runtime::get_or_init(ctx.db.clone()).await;

    let inquiry = match services.inquiry.get(id).await {
        Ok(inquiry) => inquiry,
        Err(e) => return domain_error_response(e),
    };
    let messages = match services.inquiry.get_messages(id).await {
        Ok(messages) => messages,
        Err(e) => return domain_error_response(e),
    };

    (StatusCode::OK, Json(json!({"inquiry": inquiry, "messages": messages}))).into_response()
}

#[derive(Debug, Deserialize)]
struct PatchInquiryRequest {
    status: Option<InquiryStatus>,
    priority: Option<InquiryPriority>,
    #[serde(rename = "assignedTo")]
    assigned_to: Option<String>,
    #[serde(rename = "linkedOrderId")]
    linked_order_id: Option<Uuid>,
}

async fn patch_inquiry(Path(id): Path<Uuid>, State(ctx): State<AppContext>, Json(body): Json<PatchInquiryRequest>) -> Response {
    let services = runtime::get_or_init(ctx.db.clone()).await;

    let patch = InquiryUpdatePatch {
        status: body.status,
        priority: body.priority,
        assigned_to: body.assigned_to,
        linked_order_id: body.linked_order_id,
    };

    match services.inquiry.update(id, patch).await {
        Ok(inquiry) => (StatusCode::OK, Json(json!({"inquiry": inquiry}))).into_response(),
        Err(e) => domain_error_response(e),
    }
}

#[derive(Debug, Deserialize)]
struct ReplyRequest {
    content: String,
    #[serde(rename = "templateId")]
    #[allow(dead_code)]
    template_id: Option<String>,
    #[allow(dead_code)]
    variables: Option<serde_json::Value>,
}

/// Template rendering (variable substitution into `templateId`) is expected
/// to happen on the console side before this call reaches us — the service
/// layer only needs the rendered `content` to hand the channel adapter.
async fn reply(Path(id): Path<Uuid>, State(ctx): State<AppContext>, Json(body): Json<ReplyRequest>) -> Response {
    if body.content.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "content must not be empty"}))).into_response();
    }

    let services = runtime::get_or_init(ctx.db.clone()).await;

    match services.inquiry.send_reply(id, &body.content, Some("admin-console")).await {
        Ok(()) => (StatusCode::OK, Json(json!({"success": true}))).into_response(),
        Err(e) => match e {
            DomainError::InquiryNotFound(_) => domain_error_response(e),
            other => (StatusCode::OK, Json(json!({"success": false, "error": other.to_string()}))).into_response(),
        },
    }
}

async fn sync(State(ctx): State<AppContext>) -> Response {
    let services = runtime::get_or_init(ctx.db.clone()).await;
    let outcome = services.inquiry.sync_from_all_channels().await;
    (StatusCode::OK, Json(outcome)).into_response()
}

async fn metrics(State(ctx): State<AppContext>) -> Response {
    let services = runtime::get_or_init(ctx.db.clone()).await;
    match services.inquiry.metrics().await {
        Ok(metrics) => (StatusCode::OK, Json(metrics)).into_response(),
        Err(e) => domain_error_response(e),
    }
}
