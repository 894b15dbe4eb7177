use loco_rs::prelude::*;
use loco_rs::worker::Worker;
use serde::{Deserialize, Serialize};

use crate::services::runtime;

#[derive(Deserialize, Debug, Serialize)]
pub struct InquirySyncWorkerArgs {
    pub trigger: String,
}

pub struct InquirySyncWorker {
    pub ctx: AppContext,
}

impl InquirySyncWorker {
    pub fn build(ctx: &AppContext) -> Self {
        Self { ctx: ctx.clone() }
    }
}

#[async_trait::async_trait]
impl Worker<InquirySyncWorkerArgs> for InquirySyncWorker {
    /// C16's inquiry sync cadence: the same sweep `POST /admin/inquiries/sync`
    /// triggers on demand, run here on a schedule so Kakao/TalkTalk/SmartStore
    /// inquiries that only support polling still show up without an operator
    /// clicking sync (§4.11).
    async fn perform(&self, args: InquirySyncWorkerArgs) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
        let services = runtime::get_or_init(self.ctx.db.clone()).await;
        let outcome = services.inquiry.sync_from_all_channels().await;

        tracing::info!(trigger = %args.trigger, synced = outcome.synced, errors = outcome.errors.len(), "inquiry sync completed");
        if !outcome.errors.is_empty() {
            tracing::warn!(errors = ?outcome.errors, "inquiry sync had per-channel failures");
        }

        Ok(())
    }
}
