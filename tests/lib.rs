pub mod fixtures;
pub mod integration;

/// Test utilities shared across the integration suite: signing webhook
/// payloads the same way a real sales channel/CS channel would, and reading
/// back the admin bearer token the suite configures via env var.
pub mod helpers {
    use esim_fulfillment_backend::utils::webhook_signature::sign_hmac_sha256;

    pub const TEST_WEBHOOK_SECRET: &str = "test-webhook-secret";
    pub const TEST_ADMIN_TOKEN: &str = "test-admin-token";

    /// Sets the env vars the suite's webhook/admin-auth fixtures rely on.
    /// `AppConfig` reads these directly from the environment (see
    /// `src/config.rs`), so this is the one-time setup every such test needs.
    pub fn configure_test_env() {
        std::env::set_var("SMARTSTORE_WEBHOOK_SECRET", TEST_WEBHOOK_SECRET);
        std::env::set_var("KAKAO_WEBHOOK_SECRET", TEST_WEBHOOK_SECRET);
        std::env::set_var("ADMIN_BEARER_TOKEN", TEST_ADMIN_TOKEN);
    }

    pub fn sign(body: &[u8]) -> String {
        sign_hmac_sha256(TEST_WEBHOOK_SECRET, body)
    }
}
