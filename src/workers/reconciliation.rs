use loco_rs::prelude::*;
use loco_rs::worker::Worker;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::models::order::Order;
use crate::services::deadline::{fulfill_with_timeout, FulfillmentOutcome};
use crate::services::runtime;

#[derive(Deserialize, Debug, Serialize)]
pub struct ReconciliationWorkerArgs {
    /// Present for audit/log correlation only; the sweep itself always scans
    /// every stuck order rather than operating on a single one.
    pub operation_id: String,
}

pub struct ReconciliationWorker {
    pub ctx: AppContext,
}

impl ReconciliationWorker {
    pub fn build(ctx: &AppContext) -> Self {
        Self { ctx: ctx.clone() }
    }
}

#[async_trait::async_trait]
impl Worker<ReconciliationWorkerArgs> for ReconciliationWorker {
    /// C16's reconciliation sweep: resumes any order left in
    /// `fulfillment_started` past the hard deadline (§4.10, §8 "minimum
    /// requirement: pick up any order in fulfillment_started older than one
    /// deadline budget"). Each resumed order gets its own full deadline
    /// budget again rather than a shortened one — a sweep that only ever
    /// gives partial budgets would never let a genuinely slow provider
    /// succeed.
    async fn perform(&self, args: ReconciliationWorkerArgs) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
        let threshold_secs = self.ctx.config.fulfillment_hard_deadline_secs() as i64;
        let stuck = Order::find_stuck_in_fulfillment(&self.ctx.db, threshold_secs).await?;

        tracing::info!(operation_id = %args.operation_id, count = stuck.len(), "reconciliation sweep found stuck orders");

        let services = runtime::get_or_init(self.ctx.db.clone()).await;
        let budget_ms = self.ctx.config.fulfillment_deadline_budget_ms();

        for order in stuck {
            let order_id = order.id;
            match fulfill_with_timeout(services.fulfillment.clone(), order, services.provider_configs.clone(), budget_ms).await {
                FulfillmentOutcome::Completed(result) => {
                    tracing::info!(%order_id, success = result.success, "reconciliation resumed order");
                }
                FulfillmentOutcome::TimedOut(sentinel) => {
                    tracing::warn!(%order_id, message = %sentinel.message, "reconciliation attempt timed out again");
                }
            }
        }

        Ok(())
    }
}
