use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use sea_orm::DatabaseConnection;
use tokio::sync::Mutex;
use tracing::error;
use uuid::Uuid;

use crate::models::circuit_breaker_state::{BreakerPhase, CircuitBreakerState};
use crate::services::logger::{log_step, LogMetadata, LogStatus, StepName};
use crate::services::providers::ProviderConfig;

const CACHE_TTL: Duration = Duration::from_secs(5);
const DB_RETRY_AFTER: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy)]
pub struct BreakerDefaults {
    pub failure_threshold: i32,
    pub reset_timeout: Duration,
    pub success_threshold: i32,
}

impl Default for BreakerDefaults {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(30),
            success_threshold: 2,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    state: CircuitBreakerState,
    cached_at: Instant,
}

/// Persistent per-provider breaker state (§4.5): reads consult a 5s TTL
/// cache, fall back to the store, and fall back again to an in-memory map
/// when the store itself is unavailable. Writes update the cache and
/// fallback map synchronously and persist in the background — a
/// persistence failure never blocks the calling purchase.
pub struct BreakerStore {
    db: DatabaseConnection,
    defaults: BreakerDefaults,
    cache: Mutex<HashMap<String, CacheEntry>>,
    fallback: Mutex<HashMap<String, CircuitBreakerState>>,
    db_unavailable_since: Mutex<Option<Instant>>,
}

impl BreakerStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_defaults(db, BreakerDefaults::default())
    }

    pub fn with_defaults(db: DatabaseConnection, defaults: BreakerDefaults) -> Self {
        Self {
            db,
            defaults,
            cache: Mutex::new(HashMap::new()),
            fallback: Mutex::new(HashMap::new()),
            db_unavailable_since: Mutex::new(None),
        }
    }

    /// Logical phase right now, promoting `open` to `half_open` once the
    /// reset timeout has elapsed. Pure so the promotion rule is directly
    /// unit-testable without a database.
    pub fn effective_phase(state: &CircuitBreakerState, defaults: &BreakerDefaults) -> BreakerPhase {
        if state.phase != BreakerPhase::Open {
            return state.phase;
        }
        match state.last_failure_time {
            Some(last_failure) => {
                let elapsed = chrono::Utc::now().naive_utc() - last_failure;
                if elapsed.to_std().unwrap_or(Duration::ZERO) >= defaults.reset_timeout {
                    BreakerPhase::HalfOpen
                } else {
                    BreakerPhase::Open
                }
            }
            None => BreakerPhase::HalfOpen,
        }
    }

    async fn should_try_db(&self) -> bool {
        match *self.db_unavailable_since.lock().await {
            None => true,
            Some(since) => since.elapsed() >= DB_RETRY_AFTER,
        }
    }

    async fn mark_db_unavailable(&self) {
        let mut guard = self.db_unavailable_since.lock().await;
        if guard.is_none() {
            *guard = Some(Instant::now());
        }
    }

    async fn mark_db_available(&self) {
        *self.db_unavailable_since.lock().await = None;
    }

    pub async fn get(&self, slug: &str) -> CircuitBreakerState {
        if let Some(entry) = self.cache.lock().await.get(slug) {
            if entry.cached_at.elapsed() < CACHE_TTL {
                return entry.state.clone();
            }
        }

        if self.should_try_db().await {
            match CircuitBreakerState::load_or_init(&self.db, slug).await {
                Ok(state) => {
                    self.mark_db_available().await;
                    self.cache.lock().await.insert(
                        slug.to_string(),
                        CacheEntry {
                            state: state.clone(),
                            cached_at: Instant::now(),
                        },
                    );
                    self.fallback.lock().await.insert(slug.to_string(), state.clone());
                    return state;
                }
                Err(e) => {
                    error!(provider = slug, error = %e, "circuit breaker store unavailable, using fallback");
                    self.mark_db_unavailable().await;
                }
            }
        }

        self.fallback
            .lock()
            .await
            .get(slug)
            .cloned()
            .unwrap_or_else(|| fresh_closed_state(slug))
    }

    /// `filter(providers)` — the subset whose effective phase is not `open`.
    pub async fn filter(&self, providers: &[ProviderConfig]) -> Vec<ProviderConfig> {
        let mut kept = Vec::with_capacity(providers.len());
        for provider in providers {
            let state = self.get(&provider.slug).await;
            if Self::effective_phase(&state, &self.defaults) != BreakerPhase::Open {
                kept.push(provider.clone());
            }
        }
        kept
    }

    pub async fn record_success(self: &Arc<Self>, correlation_id: Uuid, slug: &str) {
        let current = self.get(slug).await;
        let phase = Self::effective_phase(&current, &self.defaults);
        let next_success_count = if phase == BreakerPhase::HalfOpen {
            current.consecutive_success_count + 1
        } else {
            1
        };
        let next_phase = if phase == BreakerPhase::HalfOpen && next_success_count >= self.defaults.success_threshold {
            BreakerPhase::Closed
        } else if phase == BreakerPhase::HalfOpen {
            BreakerPhase::HalfOpen
        } else {
            BreakerPhase::Closed
        };

        let mut updated = current;
        updated.phase = next_phase;
        updated.consecutive_success_count = next_success_count;
        updated.consecutive_failure_count = 0;
        self.apply_and_persist(correlation_id, slug, updated, true).await;
    }

    pub async fn record_failure(self: &Arc<Self>, correlation_id: Uuid, slug: &str) {
        let current = self.get(slug).await;
        let phase = Self::effective_phase(&current, &self.defaults);
        let next_failure_count = current.consecutive_failure_count + 1;
        let next_phase = if phase == BreakerPhase::HalfOpen {
            BreakerPhase::Open
        } else if next_failure_count >= self.defaults.failure_threshold {
            BreakerPhase::Open
        } else {
            BreakerPhase::Closed
        };

        let mut updated = current;
        updated.phase = next_phase;
        updated.consecutive_failure_count = next_failure_count;
        updated.consecutive_success_count = 0;
        updated.last_failure_time = Some(chrono::Utc::now().naive_utc());
        self.apply_and_persist(correlation_id, slug, updated, false).await;
    }

    async fn apply_and_persist(self: &Arc<Self>, correlation_id: Uuid, slug: &str, updated: CircuitBreakerState, success: bool) {
        self.cache.lock().await.insert(
            slug.to_string(),
            CacheEntry {
                state: updated.clone(),
                cached_at: Instant::now(),
            },
        );
        self.fallback.lock().await.insert(slug.to_string(), updated.clone());

        let store = Arc::clone(self);
        let slug = slug.to_string();
        let phase = updated.phase;
        tokio::spawn(async move {
            let result = if success {
                CircuitBreakerState::record_success(&store.db, &slug, phase).await
            } else {
                CircuitBreakerState::record_failure(&store.db, &slug, phase).await
            };
            if let Err(e) = &result {
                error!(provider = %slug, error = %e, "failed to persist circuit breaker transition");
            }
            log_step(
                &store.db,
                correlation_id,
                StepName::BreakerTransition,
                if result.is_ok() { LogStatus::Success } else { LogStatus::Failed },
                None,
                LogMetadata {
                    provider_name: Some(slug.clone()),
                    response_payload: Some(serde_json::json!({ "phase": phase.as_str() })),
                    error_message: result.err().map(|e| e.to_string()),
                    ..Default::default()
                },
            )
            .await;
        });
    }
}

fn fresh_closed_state(slug: &str) -> CircuitBreakerState {
    CircuitBreakerState {
        provider_slug: slug.to_string(),
        phase: BreakerPhase::Closed,
        consecutive_failure_count: 0,
        consecutive_success_count: 0,
        last_failure_time: None,
        last_state_change: chrono::Utc::now().naive_utc(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(phase: BreakerPhase, failures: i32, last_failure_secs_ago: Option<i64>) -> CircuitBreakerState {
        CircuitBreakerState {
            provider_slug: "test".to_string(),
            phase,
            consecutive_failure_count: failures,
            consecutive_success_count: 0,
            last_failure_time: last_failure_secs_ago
                .map(|secs| chrono::Utc::now().naive_utc() - chrono::Duration::seconds(secs)),
            last_state_change: chrono::Utc::now().naive_utc(),
        }
    }

    #[test]
    fn closed_stays_closed_below_threshold() {
        let defaults = BreakerDefaults::default();
        let s = state(BreakerPhase::Closed, 4, None);
        assert_eq!(BreakerStore::effective_phase(&s, &defaults), BreakerPhase::Closed);
    }

    #[test]
    fn open_promotes_to_half_open_after_reset_timeout() {
        let defaults = BreakerDefaults::default();
        let s = state(BreakerPhase::Open, 5, Some(31));
        assert_eq!(BreakerStore::effective_phase(&s, &defaults), BreakerPhase::HalfOpen);
    }

    #[test]
    fn open_stays_open_before_reset_timeout() {
        let defaults = BreakerDefaults::default();
        let s = state(BreakerPhase::Open, 5, Some(5));
        assert_eq!(BreakerStore::effective_phase(&s, &defaults), BreakerPhase::Open);
    }
}
