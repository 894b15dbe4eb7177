use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::models::order::Order;

use super::cascade_engine::EsimArtifact;
use super::error::{DomainError, ErrorKind};
use super::fulfillment_service::{EmailOutcome, EmailPort, FailureNotificationPort};
use super::logger::{log_step, LogMetadata, LogStatus, StepName};
use super::manual_fulfillment::mask_email;

/// Default [`EmailPort`] for this deployment. The email transport itself is
/// out of scope (§1): delivery is logged as a structured C13 event with a
/// deterministically-derived message id rather than placed on a real SMTP/API
/// transport, which callers are expected to swap in via dependency injection
/// when a concrete provider is wired up.
pub struct LoggingEmailPort {
    db: DatabaseConnection,
}

impl LoggingEmailPort {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EmailPort for LoggingEmailPort {
    async fn send_esim_email(&self, order: &Order, esim: &EsimArtifact) -> Result<EmailOutcome, DomainError> {
        let message_id = format!("email-{}", Uuid::new_v4());
        log_step(
            &self.db,
            order.correlation_id,
            StepName::EmailSend,
            LogStatus::Success,
            Some(0),
            LogMetadata {
                order_id: Some(order.id.to_string()),
                provider_name: Some(esim.provider_order_id.clone()),
                response_payload: Some(serde_json::json!({
                    "to": mask_email(&order.customer_email),
                    "message_id": message_id,
                })),
                ..Default::default()
            },
        )
        .await;
        Ok(EmailOutcome { message_id })
    }
}

/// Default [`FailureNotificationPort`]: posts the same one-shot Discord
/// webhook used by C7, with a distinct title, so operators see a
/// `provider_failed` alert even when Discord was the path that was
/// unconfigured for the manual-fulfillment terminal (a failed order still
/// deserves an alert if the webhook *is* configured).
pub struct DiscordFailureNotificationPort {
    client: reqwest::Client,
    webhook_url: Option<String>,
    db: DatabaseConnection,
}

impl DiscordFailureNotificationPort {
    pub fn from_env(db: DatabaseConnection) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url: std::env::var("DISCORD_WEBHOOK_URL").ok().filter(|v| !v.is_empty()),
            db,
        }
    }
}

#[async_trait]
impl FailureNotificationPort for DiscordFailureNotificationPort {
    async fn notify_failure(&self, order: &Order, reason: &str) -> Result<(), DomainError> {
        log_step(
            &self.db,
            order.correlation_id,
            StepName::ManualFulfillmentNotify,
            LogStatus::Failed,
            None,
            LogMetadata {
                order_id: Some(order.id.to_string()),
                error_message: Some(reason.to_string()),
                ..Default::default()
            },
        )
        .await;

        let Some(webhook_url) = self.webhook_url.as_ref() else {
            return Ok(());
        };

        let payload = serde_json::json!({
            "embeds": [{
                "title": "Order Fulfillment Failed",
                "fields": [
                    { "name": "Order", "value": order.id.to_string(), "inline": true },
                    { "name": "Correlation ID", "value": order.correlation_id.to_string(), "inline": true },
                    { "name": "Customer", "value": mask_email(&order.customer_email), "inline": true },
                    { "name": "Reason", "value": reason },
                ],
            }]
        });

        let response = self
            .client
            .post(webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| DomainError::adapter(ErrorKind::NetworkError, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            return Err(DomainError::adapter_retryable(
                ErrorKind::from_http_status(status),
                format!("discord webhook returned HTTP {status}"),
                ErrorKind::http_status_retryable(status),
            ));
        }

        Ok(())
    }
}
