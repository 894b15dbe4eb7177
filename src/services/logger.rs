use std::sync::LazyLock;

use regex::Regex;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::automation_log::AutomationLog;

static EMAIL_KEY: LazyLock<Regex> = LazyLock::new(|| Regex::new("(?i)email").unwrap());
static SECRET_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("(?i)api[_-]?key|token|authorization|password|secret").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    Started,
    Success,
    Failed,
    Skipped,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// Closed set of step names this system ever logs against; keeps log
/// consumers from needing a free-text grep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepName {
    AuthAcquire,
    ProviderPurchase,
    CascadeAttempt,
    BreakerTransition,
    StateTransition,
    EmailSend,
    ManualFulfillmentNotify,
    InquirySync,
    InquiryReply,
    ReconciliationSweep,
}

impl StepName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthAcquire => "auth_acquire",
            Self::ProviderPurchase => "provider_purchase",
            Self::CascadeAttempt => "cascade_attempt",
            Self::BreakerTransition => "breaker_transition",
            Self::StateTransition => "state_transition",
            Self::EmailSend => "email_send",
            Self::ManualFulfillmentNotify => "manual_fulfillment_notify",
            Self::InquirySync => "inquiry_sync",
            Self::InquiryReply => "inquiry_reply",
            Self::ReconciliationSweep => "reconciliation_sweep",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogMetadata {
    pub order_id: Option<String>,
    pub provider_name: Option<String>,
    pub retry_count: Option<u32>,
    pub error_type: Option<String>,
    pub error_message: Option<String>,
    pub request_payload: Option<serde_json::Value>,
    pub response_payload: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub correlation_id: Uuid,
    pub step_name: StepName,
    pub status: LogStatus,
    pub duration_ms: Option<u64>,
    pub metadata: LogMetadata,
}

/// Emits a single-line redacted JSON document via `tracing` (grounded in the
/// teacher's structured-event style, generalized to a fixed schema), and
/// persists the same redacted entry to the `automation_logs` table so the
/// admin order timeline has a durable record of every automated step (§6).
/// A failure to persist is logged and swallowed rather than surfaced:
/// observability must never be able to fail the fulfillment path it's
/// observing.
pub async fn log_step(
    db: &DatabaseConnection,
    correlation_id: Uuid,
    step_name: StepName,
    status: LogStatus,
    duration_ms: Option<u64>,
    metadata: LogMetadata,
) {
    let entry = LogEntry {
        timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        correlation_id,
        step_name,
        status,
        duration_ms,
        metadata,
    };

    let value = serde_json::to_value(&entry).unwrap_or(serde_json::Value::Null);
    let redacted = redact(&value);

    match status {
        LogStatus::Failed => tracing::error!(log = %redacted, "step"),
        _ => tracing::info!(log = %redacted, "step"),
    }

    let metadata_value = redacted
        .get("metadata")
        .cloned()
        .unwrap_or(serde_json::Value::Null);

    if let Err(e) = AutomationLog::record(
        db,
        correlation_id,
        step_name.as_str(),
        status.as_str(),
        duration_ms.map(|d| d as i64),
        metadata_value,
    )
    .await
    {
        tracing::warn!(error = %e, "failed to persist automation log");
    }
}

/// Deterministic, non-cryptographic 8-hex-char digest used to mask email
/// values while keeping them correlatable across log lines for the same
/// address.
fn hash_email(value: &str) -> String {
    let digest = md5::compute(value.as_bytes());
    format!("{:x}", digest)[..8].to_string()
}

/// Recursively redacts a JSON value without mutating the input, per the
/// field-name rules: `/email/i` keys become an 8-hex-char hash of their
/// string value; secret-shaped keys become the literal `[REDACTED]`. Keys
/// that don't match either pattern, and non-string values under an email
/// key, pass through untouched.
pub fn redact(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, v) in map {
                if SECRET_KEY.is_match(key) {
                    out.insert(key.clone(), serde_json::Value::String("[REDACTED]".to_string()));
                } else if EMAIL_KEY.is_match(key) {
                    let redacted_value = match v {
                        serde_json::Value::String(s) => serde_json::Value::String(hash_email(s)),
                        other => redact(other),
                    };
                    out.insert(key.clone(), redacted_value);
                } else {
                    out.insert(key.clone(), redact(v));
                }
            }
            serde_json::Value::Object(out)
        }
        serde_json::Value::Array(items) => serde_json::Value::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn redacts_email_keys_to_stable_eight_char_hash() {
        let input = json!({ "customer_email": "person@example.com" });
        let redacted = redact(&input);
        let hashed = redacted["customer_email"].as_str().unwrap();
        assert_eq!(hashed.len(), 8);
        assert_ne!(hashed, "person@example.com");

        let redacted_again = redact(&input);
        assert_eq!(redacted["customer_email"], redacted_again["customer_email"]);
    }

    #[test]
    fn redacts_secret_shaped_keys_to_literal_marker() {
        let input = json!({ "api_key": "sk_live_abc", "Authorization": "Bearer xyz", "password": "hunter2" });
        let redacted = redact(&input);
        assert_eq!(redacted["api_key"], json!("[REDACTED]"));
        assert_eq!(redacted["Authorization"], json!("[REDACTED]"));
        assert_eq!(redacted["password"], json!("[REDACTED]"));
    }

    #[test]
    fn leaves_qr_urls_and_iccids_untouched() {
        let input = json!({ "qr_code_url": "https://example.com/qr.png", "iccid": "8901234567890123456" });
        let redacted = redact(&input);
        assert_eq!(redacted, input);
    }

    #[test]
    fn recurses_through_nested_objects_and_arrays_without_mutating_input() {
        let input = json!({
            "metadata": {
                "request_payload": { "email": "a@b.com", "items": [{ "token": "abc" }] }
            }
        });
        let redacted = redact(&input);
        assert_eq!(
            redacted["metadata"]["request_payload"]["items"][0]["token"],
            json!("[REDACTED]")
        );
        // input is untouched
        assert_eq!(input["metadata"]["request_payload"]["email"], json!("a@b.com"));
    }
}
