use loco_rs::config::Config;

/// Extension trait for reading the ambient operational config this backend
/// needs beyond what loco's own `Config` covers: the admin console credential,
/// per-provider API secrets, and the fulfillment deadline budgets.
///
/// All of these are environment-driven rather than YAML-driven because they
/// are operational secrets (API keys, webhook secrets) and per-deploy tuning
/// knobs, not structural config that differs between `development`/`test`/
/// `production` app.yaml files.
pub trait AppConfig {
    fn admin_bearer_token(&self) -> Option<String>;
    fn webhook_secret(&self, sales_channel: &str) -> Option<String>;
    fn provider_credential(&self, provider_slug: &str, key: &str) -> Option<String>;
    fn discord_webhook_url(&self) -> Option<String>;
    fn fulfillment_soft_deadline_secs(&self) -> u64;
    fn fulfillment_hard_deadline_secs(&self) -> u64;
    /// Per-request budget C10 races `Fulfill` against (§4.10: "25s inside a
    /// 30s webhook budget"). Distinct from the reconciliation thresholds
    /// above, which govern when a *stuck* order is swept up, not the single
    /// request's deadline.
    fn fulfillment_deadline_budget_ms(&self) -> u64;
}

impl AppConfig for Config {
    fn admin_bearer_token(&self) -> Option<String> {
        std::env::var("ADMIN_BEARER_TOKEN").ok()
    }

    fn webhook_secret(&self, sales_channel: &str) -> Option<String> {
        let var_name = format!("{}_WEBHOOK_SECRET", sales_channel.to_uppercase());
        std::env::var(var_name).ok()
    }

    fn provider_credential(&self, provider_slug: &str, key: &str) -> Option<String> {
        let var_name = format!("{}_{}", provider_slug.to_uppercase(), key.to_uppercase());
        std::env::var(var_name).ok()
    }

    fn discord_webhook_url(&self) -> Option<String> {
        std::env::var("DISCORD_WEBHOOK_URL").ok()
    }

    fn fulfillment_soft_deadline_secs(&self) -> u64 {
        std::env::var("FULFILLMENT_SOFT_DEADLINE_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(300)
    }

    fn fulfillment_hard_deadline_secs(&self) -> u64 {
        std::env::var("FULFILLMENT_HARD_DEADLINE_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1800)
    }

    fn fulfillment_deadline_budget_ms(&self) -> u64 {
        std::env::var("FULFILLMENT_DEADLINE_BUDGET_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(25_000)
    }
}
