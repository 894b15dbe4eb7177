use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{DomainError, ErrorKind};
use super::logger::{log_step, LogMetadata, LogStatus, StepName};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualFulfillmentRequest {
    pub order_id: String,
    pub correlation_id: String,
    pub customer_email: String,
    pub product_id: String,
    pub attempted_providers: Vec<String>,
    pub aggregated_failure_reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualFulfillmentOutcome {
    pub notification_sent: bool,
}

/// Masks a customer email for operator-facing notifications: `jo***@example.com`.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) if local.len() > 2 => format!("{}***@{domain}", &local[..2]),
        Some((local, domain)) => format!("{local}***@{domain}"),
        None => "***".to_string(),
    }
}

/// Files a manual-fulfillment request with the operator by sending one
/// structured Discord webhook notification (§4.7). Activated only when the
/// cascade engine exhausts every provider.
pub struct ManualFulfillmentTerminal {
    client: reqwest::Client,
    webhook_url: Option<String>,
    db: DatabaseConnection,
}

impl ManualFulfillmentTerminal {
    pub fn from_env(db: DatabaseConnection) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url: std::env::var("DISCORD_WEBHOOK_URL")
                .ok()
                .filter(|v| !v.is_empty()),
            db,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.webhook_url.is_some()
    }

    pub async fn notify(&self, request: &ManualFulfillmentRequest) -> Result<ManualFulfillmentOutcome, DomainError> {
        let correlation_id = Uuid::parse_str(&request.correlation_id).unwrap_or_else(|_| Uuid::nil());
        log_step(
            &self.db,
            correlation_id,
            StepName::ManualFulfillmentNotify,
            LogStatus::Started,
            None,
            LogMetadata {
                order_id: Some(request.order_id.clone()),
                ..Default::default()
            },
        )
        .await;

        let Some(webhook_url) = self.webhook_url.as_ref() else {
            log_step(
                &self.db,
                correlation_id,
                StepName::ManualFulfillmentNotify,
                LogStatus::Skipped,
                None,
                LogMetadata {
                    order_id: Some(request.order_id.clone()),
                    error_message: Some("DISCORD_WEBHOOK_URL is not configured".to_string()),
                    ..Default::default()
                },
            )
            .await;
            return Err(DomainError::adapter_retryable(
                ErrorKind::Validation,
                "DISCORD_WEBHOOK_URL is not configured",
                false,
            ));
        };

        let masked_email = mask_email(&request.customer_email);
        let payload = serde_json::json!({
            "embeds": [{
                "title": "Manual eSIM Fulfillment Required",
                "fields": [
                    { "name": "Order", "value": request.order_id, "inline": true },
                    { "name": "Correlation ID", "value": request.correlation_id, "inline": true },
                    { "name": "Customer", "value": masked_email, "inline": true },
                    { "name": "Product", "value": request.product_id, "inline": true },
                    { "name": "Attempted Providers", "value": request.attempted_providers.join(", ") },
                    { "name": "Failure Reason", "value": request.aggregated_failure_reason },
                ],
                "description": "All automated providers were exhausted. Please fulfill this order manually and PATCH /admin/orders/{id} with the eSIM artifact.",
            }]
        });

        let response = match self.client.post(webhook_url).json(&payload).send().await {
            Ok(response) => response,
            Err(e) => {
                let error = DomainError::adapter(ErrorKind::NetworkError, e.to_string());
                log_step(
                    &self.db,
                    correlation_id,
                    StepName::ManualFulfillmentNotify,
                    LogStatus::Failed,
                    None,
                    LogMetadata {
                        order_id: Some(request.order_id.clone()),
                        error_message: Some(error.to_string()),
                        ..Default::default()
                    },
                )
                .await;
                return Err(error);
            }
        };

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error = DomainError::adapter_retryable(
                ErrorKind::from_http_status(status),
                format!("discord webhook returned HTTP {status}"),
                ErrorKind::http_status_retryable(status),
            );
            log_step(
                &self.db,
                correlation_id,
                StepName::ManualFulfillmentNotify,
                LogStatus::Failed,
                None,
                LogMetadata {
                    order_id: Some(request.order_id.clone()),
                    error_message: Some(error.to_string()),
                    ..Default::default()
                },
            )
            .await;
            return Err(error);
        }

        log_step(
            &self.db,
            correlation_id,
            StepName::ManualFulfillmentNotify,
            LogStatus::Success,
            None,
            LogMetadata {
                order_id: Some(request.order_id.clone()),
                ..Default::default()
            },
        )
        .await;

        Ok(ManualFulfillmentOutcome { notification_sent: true })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_short_local_part() {
        assert_eq!(mask_email("jo@example.com"), "jo***@example.com");
    }

    #[test]
    fn masks_long_local_part() {
        assert_eq!(mask_email("t@example.com"), "t***@example.com");
    }

    #[test]
    fn masks_malformed_email() {
        assert_eq!(mask_email("not-an-email"), "***");
    }
}
