use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::order::Order;

use super::fulfillment_service::{FulfillmentResult, FulfillmentService};
use super::providers::ProviderConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutSentinel {
    pub order_id: Uuid,
    pub correlation_id: Uuid,
    pub elapsed_ms: u64,
    pub message: String,
}

pub enum FulfillmentOutcome {
    Completed(FulfillmentResult),
    TimedOut(TimeoutSentinel),
}

/// Bounds [`FulfillmentService::fulfill`] to `budget_ms` (§4.10). On expiry,
/// the in-flight fulfillment is NOT cancelled — it keeps running in the
/// background on its own task so any in-progress state transition can
/// complete, leaving the order in a legal intermediate state rather than a
/// half-written one.
pub async fn fulfill_with_timeout(
    service: Arc<FulfillmentService>,
    order: Order,
    providers: Vec<ProviderConfig>,
    budget_ms: u64,
) -> FulfillmentOutcome {
    let started_at = Instant::now();
    let order_id = order.id;
    let correlation_id = order.correlation_id;

    let handle = tokio::spawn(async move { service.fulfill(&order, providers).await });

    tokio::select! {
        result = handle => {
            match result {
                Ok(result) => FulfillmentOutcome::Completed(result),
                Err(_join_error) => FulfillmentOutcome::TimedOut(TimeoutSentinel {
                    order_id,
                    correlation_id,
                    elapsed_ms: started_at.elapsed().as_millis() as u64,
                    message: "fulfillment task panicked".to_string(),
                }),
            }
        }
        _ = tokio::time::sleep(Duration::from_millis(budget_ms)) => {
            FulfillmentOutcome::TimedOut(TimeoutSentinel {
                order_id,
                correlation_id,
                elapsed_ms: started_at.elapsed().as_millis() as u64,
                message: format!("fulfillment exceeded budget of {budget_ms}ms; resuming via reconciliation sweep"),
            })
        }
    }
}
