use loco_rs::prelude::*;
use sea_orm::*;
use serde::{Deserialize, Serialize};

use crate::models::_entities::{circuit_breaker_states, prelude::*};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerPhase {
    Closed,
    Open,
    HalfOpen,
}

impl BreakerPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "open" => Self::Open,
            "half_open" => Self::HalfOpen,
            _ => Self::Closed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerState {
    pub provider_slug: String,
    pub phase: BreakerPhase,
    pub consecutive_failure_count: i32,
    pub consecutive_success_count: i32,
    pub last_failure_time: Option<chrono::NaiveDateTime>,
    pub last_state_change: chrono::NaiveDateTime,
}

impl From<circuit_breaker_states::Model> for CircuitBreakerState {
    fn from(model: circuit_breaker_states::Model) -> Self {
        Self {
            provider_slug: model.provider_slug,
            phase: BreakerPhase::parse(&model.phase),
            consecutive_failure_count: model.consecutive_failure_count,
            consecutive_success_count: model.consecutive_success_count,
            last_failure_time: model.last_failure_time,
            last_state_change: model.last_state_change,
        }
    }
}

impl CircuitBreakerState {
    /// Loads the row for `provider_slug`, creating a fresh `closed` row on first use.
    pub async fn load_or_init(db: &DatabaseConnection, provider_slug: &str) -> Result<CircuitBreakerState> {
        if let Some(model) = CircuitBreakerStates::find_by_id(provider_slug.to_string())
            .one(db)
            .await?
        {
            return Ok(CircuitBreakerState::from(model));
        }

        let now = chrono::Utc::now().naive_utc();
        let active = circuit_breaker_states::ActiveModel {
            provider_slug: Set(provider_slug.to_string()),
            phase: Set(BreakerPhase::Closed.as_str().to_string()),
            consecutive_failure_count: Set(0),
            consecutive_success_count: Set(0),
            last_failure_time: Set(None),
            last_state_change: Set(now),
        };
        Ok(CircuitBreakerState::from(active.insert(db).await?))
    }

    pub async fn record_failure(db: &DatabaseConnection, provider_slug: &str, new_phase: BreakerPhase) -> Result<CircuitBreakerState> {
        let model = CircuitBreakerStates::find_by_id(provider_slug.to_string())
            .one(db)
            .await?
            .ok_or_else(|| Error::string("circuit breaker state not found"))?;

        let next_count = model.consecutive_failure_count + 1;
        let phase_changed = BreakerPhase::parse(&model.phase) != new_phase;
        let mut active: circuit_breaker_states::ActiveModel = model.into();
        active.consecutive_failure_count = Set(next_count);
        active.consecutive_success_count = Set(0);
        active.phase = Set(new_phase.as_str().to_string());
        active.last_failure_time = Set(Some(chrono::Utc::now().naive_utc()));
        if phase_changed {
            active.last_state_change = Set(chrono::Utc::now().naive_utc());
        }
        Ok(CircuitBreakerState::from(active.update(db).await?))
    }

    pub async fn record_success(db: &DatabaseConnection, provider_slug: &str, new_phase: BreakerPhase) -> Result<CircuitBreakerState> {
        let model = CircuitBreakerStates::find_by_id(provider_slug.to_string())
            .one(db)
            .await?
            .ok_or_else(|| Error::string("circuit breaker state not found"))?;

        let next_count = model.consecutive_success_count + 1;
        let phase_changed = BreakerPhase::parse(&model.phase) != new_phase;
        let mut active: circuit_breaker_states::ActiveModel = model.into();
        active.consecutive_success_count = Set(next_count);
        active.consecutive_failure_count = Set(0);
        active.phase = Set(new_phase.as_str().to_string());
        if phase_changed {
            active.last_state_change = Set(chrono::Utc::now().naive_utc());
        }
        Ok(CircuitBreakerState::from(active.update(db).await?))
    }

    pub async fn force_phase(db: &DatabaseConnection, provider_slug: &str, phase: BreakerPhase) -> Result<CircuitBreakerState> {
        let model = CircuitBreakerStates::find_by_id(provider_slug.to_string())
            .one(db)
            .await?
            .ok_or_else(|| Error::string("circuit breaker state not found"))?;

        let mut active: circuit_breaker_states::ActiveModel = model.into();
        active.phase = Set(phase.as_str().to_string());
        active.last_state_change = Set(chrono::Utc::now().naive_utc());
        Ok(CircuitBreakerState::from(active.update(db).await?))
    }

    pub async fn all(db: &DatabaseConnection) -> Result<Vec<CircuitBreakerState>> {
        Ok(CircuitBreakerStates::find()
            .all(db)
            .await?
            .into_iter()
            .map(CircuitBreakerState::from)
            .collect())
    }
}
