pub mod airalo;
pub mod common;
pub mod esimcard;
pub mod mobimatter;
pub mod redteago;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::services::adapter::ProviderAdapter;

/// Static configuration for one eSIM supplier (§3 Provider Config).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub slug: String,
    pub display_name: String,
    pub priority: i32,
    pub base_endpoint: String,
    pub credential_env_var: String,
    pub per_call_timeout_ms: u64,
    pub max_retries: u32,
    pub active: bool,
}

/// Sorts providers by priority descending, tie-broken by slug ascending,
/// the ordering the cascade engine walks (§4.6 step b).
pub fn sort_by_priority(providers: &mut [ProviderConfig]) {
    providers.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.slug.cmp(&b.slug)));
}

/// Builds the registered set of provider adapters from environment-sourced
/// credentials. An adapter whose credentials are absent reports
/// `is_enabled() == false` rather than panicking (§6).
pub fn build_registry() -> Vec<Arc<dyn ProviderAdapter>> {
    vec![
        Arc::new(esimcard::EsimCardAdapter::from_env()),
        Arc::new(airalo::AiraloAdapter::from_env()),
        Arc::new(mobimatter::MobimatterAdapter::from_env()),
        Arc::new(redteago::RedteaGoAdapter::from_env()),
    ]
}

fn env_or(var: &str, default: i32) -> i32 {
    std::env::var(var).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_or_u32(var: &str, default: u32) -> u32 {
    std::env::var(var).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_or_u64(var: &str, default: u64) -> u64 {
    std::env::var(var).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Builds the cascade's priority list (§3 Provider Config). Priority,
/// per-call timeout and max-retries are environment-overridable per slug
/// (`<SLUG>_PRIORITY`, `<SLUG>_TIMEOUT_MS`, `<SLUG>_MAX_RETRIES`) so an
/// operator can reorder the cascade or tune retry budgets without a
/// redeploy; the defaults reproduce the supplier order this backend has
/// shipped with (Airalo first, then eSIMCard, Mobimatter, RedteaGo).
pub fn load_provider_configs() -> Vec<ProviderConfig> {
    let specs: &[(&str, &str, i32, &str)] = &[
        ("airalo", "Airalo", 100, "AIRALO_API_URL"),
        ("esimcard", "eSIMCard", 90, "ESIMCARD_API_URL"),
        ("mobimatter", "Mobimatter", 80, "MOBIMATTER_API_URL"),
        ("redteago", "RedteaGo", 70, "REDTEAGO_API_URL"),
    ];

    specs
        .iter()
        .map(|(slug, display_name, default_priority, url_env)| {
            let upper = slug.to_uppercase();
            ProviderConfig {
                slug: slug.to_string(),
                display_name: display_name.to_string(),
                priority: env_or(&format!("{upper}_PRIORITY"), *default_priority),
                base_endpoint: std::env::var(url_env).unwrap_or_default(),
                credential_env_var: format!("{upper}_API_KEY"),
                per_call_timeout_ms: env_or_u64(&format!("{upper}_TIMEOUT_MS"), 10_000),
                max_retries: env_or_u32(&format!("{upper}_MAX_RETRIES"), 2),
                active: std::env::var(format!("{upper}_ACTIVE")).map(|v| v != "false").unwrap_or(true),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_by_priority_ties_break_on_slug() {
        let mut providers = vec![
            ProviderConfig {
                slug: "esimcard".into(),
                display_name: "eSIMCard".into(),
                priority: 1,
                base_endpoint: String::new(),
                credential_env_var: String::new(),
                per_call_timeout_ms: 5000,
                max_retries: 2,
                active: true,
            },
            ProviderConfig {
                slug: "airalo".into(),
                display_name: "Airalo".into(),
                priority: 1,
                base_endpoint: String::new(),
                credential_env_var: String::new(),
                per_call_timeout_ms: 5000,
                max_retries: 2,
                active: true,
            },
        ];
        sort_by_priority(&mut providers);
        assert_eq!(providers[0].slug, "airalo");
        assert_eq!(providers[1].slug, "esimcard");
    }
}
