use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::order::{Order, OrderStatus};

use super::adapter::PurchaseRequest;
use super::cascade_engine::{CascadeEngine, CascadeOutcome, EsimArtifact, FulfillmentAttempt, ProviderHealthReport};
use super::error::DomainError;
use super::logger::{log_step, LogMetadata, LogStatus, StepName};
use super::manual_fulfillment::{ManualFulfillmentRequest, ManualFulfillmentTerminal};
use super::providers::ProviderConfig;
use super::state_machine;

/// Injected side-effect port for the delivery email (§1 Out of scope: "the
/// email/notification transports themselves").
#[async_trait]
pub trait EmailPort: Send + Sync {
    async fn send_esim_email(&self, order: &Order, esim: &EsimArtifact) -> Result<EmailOutcome, DomainError>;
}

#[derive(Debug, Clone)]
pub struct EmailOutcome {
    pub message_id: String,
}

/// Injected port for the `provider_failed` operator alert.
#[async_trait]
pub trait FailureNotificationPort: Send + Sync {
    async fn notify_failure(&self, order: &Order, reason: &str) -> Result<(), DomainError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FulfillmentResult {
    pub final_state: OrderStatus,
    pub success: bool,
    pub provider_used: Option<String>,
    pub esim_data: Option<EsimArtifact>,
    pub email_sent: Option<bool>,
    pub email_message_id: Option<String>,
    pub attempts: Vec<FulfillmentAttempt>,
    pub total_duration_ms: u64,
    pub error: Option<String>,
}

/// Orchestrates C6 → C7 → email → state transitions for one order (§4.9).
pub struct FulfillmentService {
    db: DatabaseConnection,
    cascade: CascadeEngine,
    manual_terminal: ManualFulfillmentTerminal,
    email_port: Arc<dyn EmailPort>,
    failure_port: Arc<dyn FailureNotificationPort>,
}

impl FulfillmentService {
    pub fn new(
        db: DatabaseConnection,
        cascade: CascadeEngine,
        manual_terminal: ManualFulfillmentTerminal,
        email_port: Arc<dyn EmailPort>,
        failure_port: Arc<dyn FailureNotificationPort>,
    ) -> Self {
        Self {
            db,
            cascade,
            manual_terminal,
            email_port,
            failure_port,
        }
    }

    pub async fn provider_health(&self) -> Vec<ProviderHealthReport> {
        self.cascade.provider_health().await
    }

    async fn do_transition(
        &self,
        order_id: Uuid,
        correlation_id: Uuid,
        target: OrderStatus,
        metadata_patch: Option<serde_json::Value>,
    ) -> Result<OrderStatus, DomainError> {
        let db = &self.db;
        let started_at = Instant::now();
        let result = state_machine::transition(
            target,
            metadata_patch,
            || async move {
                Order::find_by_id(db, order_id)
                    .await
                    .map_err(|e| DomainError::Persistence(e.to_string()))?
                    .map(|o| o.status)
                    .ok_or_else(|| DomainError::OrderNotFound(order_id.to_string()))
            },
            |target, patch| async move {
                Order::set_status(db, order_id, target, patch)
                    .await
                    .map(|_| ())
                    .map_err(|e| DomainError::Persistence(e.to_string()))
            },
        )
        .await;

        log_step(
            &self.db,
            correlation_id,
            StepName::StateTransition,
            if result.is_ok() { LogStatus::Success } else { LogStatus::Failed },
            Some(started_at.elapsed().as_millis() as u64),
            LogMetadata {
                order_id: Some(order_id.to_string()),
                response_payload: Some(serde_json::json!({ "target": target.as_str() })),
                error_message: result.as_ref().err().map(|e| e.to_string()),
                ..Default::default()
            },
        )
        .await;

        result
    }

    pub async fn fulfill(&self, order: &Order, providers: Vec<ProviderConfig>) -> FulfillmentResult {
        let started_at = Instant::now();

        if let Err(e) = self
            .do_transition(order.id, order.correlation_id, OrderStatus::FulfillmentStarted, None)
            .await
        {
            return FulfillmentResult {
                final_state: order.status,
                success: false,
                provider_used: None,
                esim_data: None,
                email_sent: None,
                email_message_id: None,
                attempts: Vec::new(),
                total_duration_ms: started_at.elapsed().as_millis() as u64,
                error: Some(e.to_string()),
            };
        }

        let request = PurchaseRequest {
            order_id: order.id.to_string(),
            correlation_id: order.correlation_id.to_string(),
            product_sku: order.provider_sku.clone().unwrap_or_else(|| order.product_id.clone()),
            customer_email: order.customer_email.clone(),
            amount: order.amount,
            currency: order.currency.clone(),
        };

        match self.cascade.run(providers, &request).await {
            CascadeOutcome::Success {
                provider_used,
                esim,
                attempted_providers: _,
                failover_events: _,
                attempts,
            } => self.handle_cascade_success(order, provider_used, esim, attempts, started_at).await,
            CascadeOutcome::Failure {
                attempted_providers,
                failure_reasons,
                attempts,
                ..
            } => {
                self.handle_cascade_exhaustion(order, attempted_providers, failure_reasons, attempts, started_at)
                    .await
            }
        }
    }

    async fn handle_cascade_success(
        &self,
        order: &Order,
        provider_used: String,
        esim: EsimArtifact,
        attempts: Vec<FulfillmentAttempt>,
        started_at: Instant,
    ) -> FulfillmentResult {
        let metadata_patch = serde_json::json!({
            "qr_code_url": esim.qr_code_url,
            "iccid": esim.iccid,
            "activation_code": esim.activation_code,
            "provider_used": provider_used,
            "provider_order_id": esim.provider_order_id,
        });

        if let Err(e) = self
            .do_transition(order.id, order.correlation_id, OrderStatus::ProviderConfirmed, Some(metadata_patch))
            .await
        {
            return FulfillmentResult {
                final_state: order.status,
                success: false,
                provider_used: Some(provider_used),
                esim_data: Some(esim),
                email_sent: None,
                email_message_id: None,
                attempts,
                total_duration_ms: started_at.elapsed().as_millis() as u64,
                error: Some(e.to_string()),
            };
        }

        if let Err(e) = Order::set_esim_artifact(
            &self.db,
            order.id,
            esim.qr_code_url.clone(),
            esim.iccid.clone(),
            esim.activation_code.clone(),
            provider_used.clone(),
        )
        .await
        {
            return FulfillmentResult {
                final_state: OrderStatus::ProviderConfirmed,
                success: false,
                provider_used: Some(provider_used),
                esim_data: Some(esim),
                email_sent: None,
                email_message_id: None,
                attempts,
                total_duration_ms: started_at.elapsed().as_millis() as u64,
                error: Some(e.to_string()),
            };
        }

        let (email_sent, email_message_id, email_error) = match self.email_port.send_esim_email(order, &esim).await {
            Ok(outcome) => (true, Some(outcome.message_id), None),
            Err(e) => (false, None, Some(e.to_string())),
        };

        // Email success walks email_sent -> delivered; email failure is
        // non-fatal and skips straight to delivered (§4.9 step 2).
        let target = if email_sent {
            OrderStatus::EmailSent
        } else {
            OrderStatus::Delivered
        };
        if email_sent {
            if let Err(e) = self.do_transition(order.id, order.correlation_id, target, None).await {
                return FulfillmentResult {
                    final_state: OrderStatus::ProviderConfirmed,
                    success: false,
                    provider_used: Some(provider_used),
                    esim_data: Some(esim),
                    email_sent: Some(email_sent),
                    email_message_id,
                    attempts,
                    total_duration_ms: started_at.elapsed().as_millis() as u64,
                    error: Some(e.to_string()),
                };
            }
        }

        if let Err(e) = self.do_transition(order.id, order.correlation_id, OrderStatus::Delivered, None).await {
            return FulfillmentResult {
                final_state: target,
                success: false,
                provider_used: Some(provider_used),
                esim_data: Some(esim),
                email_sent: Some(email_sent),
                email_message_id,
                attempts,
                total_duration_ms: started_at.elapsed().as_millis() as u64,
                error: Some(e.to_string()),
            };
        }

        FulfillmentResult {
            final_state: OrderStatus::Delivered,
            success: true,
            provider_used: Some(provider_used),
            esim_data: Some(esim),
            email_sent: Some(email_sent),
            email_message_id,
            attempts,
            total_duration_ms: started_at.elapsed().as_millis() as u64,
            error: email_error,
        }
    }

    async fn handle_cascade_exhaustion(
        &self,
        order: &Order,
        attempted_providers: Vec<String>,
        failure_reasons: std::collections::HashMap<String, String>,
        mut attempts: Vec<FulfillmentAttempt>,
        started_at: Instant,
    ) -> FulfillmentResult {
        let aggregated_reason = failure_reasons.values().cloned().collect::<Vec<_>>().join("; ");

        if self.manual_terminal.is_configured() {
            let manual_request = ManualFulfillmentRequest {
                order_id: order.id.to_string(),
                correlation_id: order.correlation_id.to_string(),
                customer_email: order.customer_email.clone(),
                product_id: order.product_id.clone(),
                attempted_providers: attempted_providers.clone(),
                aggregated_failure_reason: aggregated_reason.clone(),
            };

            match self.manual_terminal.notify(&manual_request).await {
                Ok(outcome) => {
                    let metadata_patch = serde_json::json!({
                        "pending_manual_fulfillment": true,
                        "manual_fulfillment_notification_sent": outcome.notification_sent,
                    });
                    attempts.push(FulfillmentAttempt {
                        provider_name: "manual".to_string(),
                        success: true,
                        error_type: None,
                        error_message: None,
                        duration_ms: 0,
                        retry_count: 0,
                    });

                    return match self
                        .do_transition(
                            order.id,
                            order.correlation_id,
                            OrderStatus::PendingManualFulfillment,
                            Some(metadata_patch),
                        )
                        .await
                    {
                        Ok(_) => FulfillmentResult {
                            final_state: OrderStatus::PendingManualFulfillment,
                            success: false,
                            provider_used: None,
                            esim_data: None,
                            email_sent: None,
                            email_message_id: None,
                            attempts,
                            total_duration_ms: started_at.elapsed().as_millis() as u64,
                            error: Some(aggregated_reason),
                        },
                        Err(e) => FulfillmentResult {
                            final_state: order.status,
                            success: false,
                            provider_used: None,
                            esim_data: None,
                            email_sent: None,
                            email_message_id: None,
                            attempts,
                            total_duration_ms: started_at.elapsed().as_millis() as u64,
                            error: Some(e.to_string()),
                        },
                    };
                }
                Err(e) => {
                    attempts.push(FulfillmentAttempt {
                        provider_name: "manual".to_string(),
                        success: false,
                        error_type: Some(e.kind()),
                        error_message: Some(e.to_string()),
                        duration_ms: 0,
                        retry_count: 0,
                    });
                }
            }
        }

        let transition_result = self
            .do_transition(order.id, order.correlation_id, OrderStatus::ProviderFailed, None)
            .await;
        let _ = self.failure_port.notify_failure(order, &aggregated_reason).await;

        FulfillmentResult {
            final_state: transition_result.map(|_| OrderStatus::ProviderFailed).unwrap_or(order.status),
            success: false,
            provider_used: None,
            esim_data: None,
            email_sent: None,
            email_message_id: None,
            attempts,
            total_duration_ms: started_at.elapsed().as_millis() as u64,
            error: Some(aggregated_reason),
        }
    }
}
