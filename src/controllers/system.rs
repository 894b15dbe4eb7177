use std::sync::LazyLock;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use loco_rs::prelude::*;
use serde::Serialize;
use serde_json::json;

use crate::middleware::security_headers_middleware;
use crate::services::cascade_engine::ProviderHealthReport;
use crate::services::inquiry_service::ChannelHealthReport;
use crate::services::runtime;

/// Approximates process uptime from the first `/health` hit rather than a
/// boot-hook timestamp — close enough for an operator dashboard, and avoids
/// threading a start time through `Hooks::boot`.
static START_TIME: LazyLock<Instant> = LazyLock::new(Instant::now);

pub fn routes() -> Routes {
    Routes::new()
        .add("/health", get(health))
        .layer(middleware::from_fn(security_headers_middleware))
}

#[derive(Debug, Serialize)]
struct HealthServices {
    database: bool,
    providers: Vec<ProviderHealthReport>,
    channels: Vec<ChannelHealthReport>,
}

/// `{status, services{...}, uptime, timestamp}` per §6. `status` is
/// `unhealthy` (503) only when the database is unreachable; an individual
/// disabled/failing provider or channel degrades rather than fails the
/// whole process, since the cascade and inquiry sync already tolerate that.
async fn health(State(ctx): State<AppContext>) -> Response {
    let db_ok = ctx.db.ping().await.is_ok();

    let services = runtime::get_or_init(ctx.db.clone()).await;
    let providers = services.fulfillment.provider_health().await;
    let channels = services.inquiry.channel_health().await;

    let degraded = providers.iter().any(|p| p.enabled && !p.healthy) || channels.iter().any(|c| c.enabled && !c.healthy);

    let status = if !db_ok {
        "unhealthy"
    } else if degraded {
        "degraded"
    } else {
        "healthy"
    };

    let body = json!({
        "status": status,
        "services": HealthServices {
            database: db_ok,
            providers,
            channels,
        },
        "uptime": START_TIME.elapsed().as_secs(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    let code = if status == "unhealthy" {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (code, Json(body)).into_response()
}
