use loco_rs::prelude::*;
use sea_orm::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::_entities::{automation_logs, prelude::*};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationLog {
    pub id: Uuid,
    pub correlation_id: Uuid,
    pub step_name: String,
    pub status: String,
    pub duration_ms: Option<i64>,
    pub metadata: serde_json::Value,
    pub created_at: chrono::NaiveDateTime,
}

impl From<automation_logs::Model> for AutomationLog {
    fn from(model: automation_logs::Model) -> Self {
        Self {
            id: model.id,
            correlation_id: model.correlation_id,
            step_name: model.step_name,
            status: model.status,
            duration_ms: model.duration_ms,
            metadata: model.metadata,
            created_at: model.created_at,
        }
    }
}

impl AutomationLog {
    /// Durable sink for C13 structured log events, queryable by correlation_id
    /// for the admin order timeline (§6).
    pub async fn record(
        db: &DatabaseConnection,
        correlation_id: Uuid,
        step_name: &str,
        status: &str,
        duration_ms: Option<i64>,
        metadata: serde_json::Value,
    ) -> Result<AutomationLog> {
        let active = automation_logs::ActiveModel {
            id: Set(Uuid::new_v4()),
            correlation_id: Set(correlation_id),
            step_name: Set(step_name.to_string()),
            status: Set(status.to_string()),
            duration_ms: Set(duration_ms),
            metadata: Set(metadata),
            created_at: Set(chrono::Utc::now().naive_utc()),
        };
        Ok(AutomationLog::from(active.insert(db).await?))
    }

    pub async fn for_correlation_id(db: &DatabaseConnection, correlation_id: Uuid) -> Result<Vec<AutomationLog>> {
        Ok(AutomationLogs::find()
            .filter(automation_logs::Column::CorrelationId.eq(correlation_id))
            .order_by_asc(automation_logs::Column::CreatedAt)
            .all(db)
            .await?
            .into_iter()
            .map(AutomationLog::from)
            .collect())
    }
}
