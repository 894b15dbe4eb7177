use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::adapter::{ProviderAdapter, PurchaseRequest, PurchaseResult};
use super::breaker_store::BreakerStore;
use super::error::ErrorKind;
use super::logger::{log_step, LogMetadata, LogStatus, StepName};
use super::retry::RetryConfig;
use super::providers::{sort_by_priority, ProviderConfig};

/// One provider attempt, retained for the fulfillment result's `attempts[]`
/// (§3 Fulfillment Attempt Record).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FulfillmentAttempt {
    pub provider_name: String,
    pub success: bool,
    pub error_type: Option<ErrorKind>,
    pub error_message: Option<String>,
    pub duration_ms: u64,
    pub retry_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailoverEvent {
    pub from: String,
    pub to: String,
    pub reason: String,
    pub attempt_index: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderHealthReport {
    pub slug: String,
    pub enabled: bool,
    pub healthy: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EsimArtifact {
    pub qr_code_url: Option<String>,
    pub iccid: String,
    pub activation_code: String,
    pub provider_order_id: String,
}

pub enum CascadeOutcome {
    Success {
        provider_used: String,
        esim: EsimArtifact,
        attempted_providers: Vec<String>,
        failover_events: Vec<FailoverEvent>,
        attempts: Vec<FulfillmentAttempt>,
    },
    Failure {
        attempted_providers: Vec<String>,
        failover_events: Vec<FailoverEvent>,
        failure_reasons: HashMap<String, String>,
        attempts: Vec<FulfillmentAttempt>,
        retryable: bool,
    },
}

/// Priority-ordered, circuit-breaker-gated, strictly sequential failover
/// across a set of provider adapters (§4.6).
pub struct CascadeEngine {
    db: DatabaseConnection,
    registry: HashMap<String, Arc<dyn ProviderAdapter>>,
    breaker_store: Arc<BreakerStore>,
}

impl CascadeEngine {
    pub fn new(db: DatabaseConnection, registry: Vec<Arc<dyn ProviderAdapter>>, breaker_store: Arc<BreakerStore>) -> Self {
        let registry = registry.into_iter().map(|a| (a.slug().to_string(), a)).collect();
        Self { db, registry, breaker_store }
    }

    pub async fn run(&self, mut providers: Vec<ProviderConfig>, request: &PurchaseRequest) -> CascadeOutcome {
        let correlation_id = Uuid::parse_str(&request.correlation_id).unwrap_or_else(|_| Uuid::nil());
        let cascade_started_at = Instant::now();
        log_step(
            &self.db,
            correlation_id,
            StepName::CascadeAttempt,
            LogStatus::Started,
            None,
            LogMetadata {
                order_id: Some(request.order_id.clone()),
                ..Default::default()
            },
        )
        .await;

        providers.retain(|p| p.active && self.registry.get(&p.slug).map(|a| a.is_enabled()).unwrap_or(false));

        if providers.is_empty() {
            log_step(
                &self.db,
                correlation_id,
                StepName::CascadeAttempt,
                LogStatus::Failed,
                Some(cascade_started_at.elapsed().as_millis() as u64),
                LogMetadata {
                    order_id: Some(request.order_id.clone()),
                    error_message: Some("no active, enabled providers configured".to_string()),
                    ..Default::default()
                },
            )
            .await;
            return CascadeOutcome::Failure {
                attempted_providers: Vec::new(),
                failover_events: Vec::new(),
                failure_reasons: HashMap::new(),
                attempts: Vec::new(),
                retryable: false,
            };
        }

        sort_by_priority(&mut providers);

        let candidates = self.breaker_store.filter(&providers).await;
        if candidates.is_empty() {
            let mut failure_reasons = HashMap::new();
            failure_reasons.insert("*".to_string(), "All provider circuits are open".to_string());
            log_step(
                &self.db,
                correlation_id,
                StepName::CascadeAttempt,
                LogStatus::Failed,
                Some(cascade_started_at.elapsed().as_millis() as u64),
                LogMetadata {
                    order_id: Some(request.order_id.clone()),
                    error_message: Some("all provider circuits are open".to_string()),
                    ..Default::default()
                },
            )
            .await;
            return CascadeOutcome::Failure {
                attempted_providers: Vec::new(),
                failover_events: Vec::new(),
                failure_reasons,
                attempts: Vec::new(),
                retryable: true,
            };
        }

        let mut attempted_providers = Vec::new();
        let mut failover_events = Vec::new();
        let mut failure_reasons = HashMap::new();
        let mut attempts = Vec::new();

        for (index, provider) in candidates.iter().enumerate() {
            let adapter = self.registry.get(&provider.slug).expect("filtered from registry above");
            let config = RetryConfig::new(provider.max_retries);
            let started_at = Instant::now();

            let (result, retry_count) = self.attempt_with_retries(adapter.as_ref(), request, &config).await;
            let duration_ms = started_at.elapsed().as_millis() as u64;
            attempted_providers.push(provider.slug.clone());

            match result {
                PurchaseResult::Ok {
                    qr_code_url,
                    iccid,
                    activation_code,
                    provider_order_id,
                } => {
                    self.breaker_store.record_success(correlation_id, &provider.slug).await;
                    attempts.push(FulfillmentAttempt {
                        provider_name: provider.slug.clone(),
                        success: true,
                        error_type: None,
                        error_message: None,
                        duration_ms,
                        retry_count,
                    });
                    info!(provider = %provider.slug, "purchase succeeded");
                    log_step(
                        &self.db,
                        correlation_id,
                        StepName::ProviderPurchase,
                        LogStatus::Success,
                        Some(duration_ms),
                        LogMetadata {
                            order_id: Some(request.order_id.clone()),
                            provider_name: Some(provider.slug.clone()),
                            retry_count: Some(retry_count),
                            ..Default::default()
                        },
                    )
                    .await;
                    log_step(
                        &self.db,
                        correlation_id,
                        StepName::CascadeAttempt,
                        LogStatus::Success,
                        Some(cascade_started_at.elapsed().as_millis() as u64),
                        LogMetadata {
                            order_id: Some(request.order_id.clone()),
                            provider_name: Some(provider.slug.clone()),
                            ..Default::default()
                        },
                    )
                    .await;
                    return CascadeOutcome::Success {
                        provider_used: provider.slug.clone(),
                        esim: EsimArtifact {
                            qr_code_url,
                            iccid,
                            activation_code,
                            provider_order_id,
                        },
                        attempted_providers,
                        failover_events,
                        attempts,
                    };
                }
                PurchaseResult::Failure {
                    error_type,
                    message,
                    retryable,
                } => {
                    self.breaker_store.record_failure(correlation_id, &provider.slug).await;
                    attempts.push(FulfillmentAttempt {
                        provider_name: provider.slug.clone(),
                        success: false,
                        error_type: Some(error_type),
                        error_message: Some(message.clone()),
                        duration_ms,
                        retry_count,
                    });
                    log_step(
                        &self.db,
                        correlation_id,
                        StepName::ProviderPurchase,
                        LogStatus::Failed,
                        Some(duration_ms),
                        LogMetadata {
                            order_id: Some(request.order_id.clone()),
                            provider_name: Some(provider.slug.clone()),
                            retry_count: Some(retry_count),
                            error_type: Some(format!("{error_type:?}")),
                            error_message: Some(message.clone()),
                            ..Default::default()
                        },
                    )
                    .await;
                    failure_reasons.insert(provider.slug.clone(), message.clone());

                    if let Some(next) = candidates.get(index + 1) {
                        failover_events.push(FailoverEvent {
                            from: provider.slug.clone(),
                            to: next.slug.clone(),
                            reason: message,
                            attempt_index: index,
                        });
                    }
                    let _ = retryable;
                }
            }
        }

        log_step(
            &self.db,
            correlation_id,
            StepName::CascadeAttempt,
            LogStatus::Failed,
            Some(cascade_started_at.elapsed().as_millis() as u64),
            LogMetadata {
                order_id: Some(request.order_id.clone()),
                error_message: Some("all providers exhausted".to_string()),
                ..Default::default()
            },
        )
        .await;

        CascadeOutcome::Failure {
            attempted_providers,
            failover_events,
            failure_reasons,
            attempts,
            retryable: true,
        }
    }

    /// Health snapshot of every registered provider adapter, used by the
    /// `/health` endpoint (§6).
    pub async fn provider_health(&self) -> Vec<ProviderHealthReport> {
        let mut reports = Vec::with_capacity(self.registry.len());
        for adapter in self.registry.values() {
            let enabled = adapter.is_enabled();
            let (healthy, error) = if enabled {
                adapter.health_check().await
            } else {
                (false, Some("not configured".to_string()))
            };
            reports.push(ProviderHealthReport {
                slug: adapter.slug().to_string(),
                enabled,
                healthy,
                error,
            });
        }
        reports.sort_by(|a, b| a.slug.cmp(&b.slug));
        reports
    }

    /// Runs `adapter.purchase` up to `config.max_retries + 1` times, honoring
    /// non-retryable early exit, and reports how many extra attempts ran.
    async fn attempt_with_retries(
        &self,
        adapter: &dyn ProviderAdapter,
        request: &PurchaseRequest,
        config: &RetryConfig,
    ) -> (PurchaseResult, u32) {
        let total_attempts = config.max_retries + 1;
        let mut last_result = None;

        for attempt in 0..total_attempts {
            let result = adapter.purchase(request).await;
            match &result {
                PurchaseResult::Ok { .. } => return (result, attempt),
                PurchaseResult::Failure { retryable, .. } if *retryable => {
                    if attempt + 1 < total_attempts {
                        tokio::time::sleep(config.jittered_delay(attempt)).await;
                    }
                    last_result = Some(result);
                }
                PurchaseResult::Failure { .. } => return (result, attempt),
            }
        }

        (last_result.expect("loop runs at least once"), total_attempts - 1)
    }
}
