use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::services::adapter::{ProviderAdapter, PurchaseRequest, PurchaseResult};
use crate::services::error::{DomainError, ErrorKind};
use crate::services::token_cache::{TokenCache, TokenSource};

use super::common::build_http_client;

/// Mobimatter's own transient codes, documented per the open question in §9
/// on supplier-specific retryable sets: these map to `provider_error` but
/// should still advance the retry loop rather than fail the attempt outright.
const RETRYABLE_ERROR_CODES: &[&str] = &["INVENTORY_LOCK_TIMEOUT", "UPSTREAM_BUSY"];

struct MobimatterTokenSource {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    api_secret: String,
}

#[derive(Deserialize)]
struct MobimatterTokenResponse {
    token: String,
    #[serde(rename = "expiresInSeconds")]
    expires_in_seconds: u64,
}

#[async_trait]
impl TokenSource for MobimatterTokenSource {
    async fn fetch_token(&self) -> Result<(String, Duration), DomainError> {
        let response = self
            .client
            .post(format!("{}/auth/token", self.base_url))
            .json(&serde_json::json!({
                "clientId": self.api_key,
                "clientSecret": self.api_secret,
            }))
            .send()
            .await
            .map_err(|e| DomainError::adapter(ErrorKind::NetworkError, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let kind = ErrorKind::from_http_status(status);
            return Err(DomainError::adapter_retryable(
                kind,
                "mobimatter token endpoint rejected credentials",
                ErrorKind::http_status_retryable(status),
            ));
        }

        let body: MobimatterTokenResponse = response
            .json()
            .await
            .map_err(|e| DomainError::adapter(ErrorKind::InvalidResponse, e.to_string()))?;

        Ok((body.token, Duration::from_secs(body.expires_in_seconds)))
    }
}

#[derive(Deserialize)]
struct MobimatterOrderResponse {
    success: bool,
    #[serde(rename = "errorCode")]
    error_code: Option<String>,
    data: Option<MobimatterOrderData>,
}

#[derive(Deserialize)]
struct MobimatterOrderData {
    #[serde(rename = "orderId")]
    order_id: String,
    iccid: String,
    #[serde(rename = "qrCodeUrl")]
    qr_code_url: Option<String>,
    #[serde(rename = "activationCode")]
    activation_code: Option<String>,
}

pub struct MobimatterAdapter {
    client: reqwest::Client,
    base_url: String,
    token_cache: Option<TokenCache<MobimatterTokenSource>>,
}

impl MobimatterAdapter {
    pub fn from_env() -> Self {
        let base_url = std::env::var("MOBIMATTER_API_URL").unwrap_or_default();
        let api_key = std::env::var("MOBIMATTER_API_KEY").ok();
        let api_secret = std::env::var("MOBIMATTER_API_SECRET").ok();
        let client = build_http_client("mobimatter");

        let token_cache = match (api_key, api_secret) {
            (Some(key), Some(secret)) if !base_url.is_empty() => Some(TokenCache::new(MobimatterTokenSource {
                client: client.clone(),
                base_url: base_url.clone(),
                api_key: key,
                api_secret: secret,
            })),
            _ => None,
        };

        Self {
            client,
            base_url,
            token_cache,
        }
    }
}

#[async_trait]
impl ProviderAdapter for MobimatterAdapter {
    fn slug(&self) -> &str {
        "mobimatter"
    }

    fn display_name(&self) -> &str {
        "Mobimatter"
    }

    fn is_enabled(&self) -> bool {
        self.token_cache.is_some()
    }

    async fn health_check(&self) -> (bool, Option<String>) {
        if !self.is_enabled() {
            return (false, Some("missing MOBIMATTER_API_KEY/SECRET/URL".to_string()));
        }
        match self.token_cache.as_ref().unwrap().acquire_auth_headers().await {
            Ok(_) => (true, None),
            Err(e) => (false, Some(e.to_string())),
        }
    }

    async fn purchase(&self, request: &PurchaseRequest) -> PurchaseResult {
        let Some(token_cache) = self.token_cache.as_ref() else {
            return PurchaseResult::failure(ErrorKind::Authentication, "mobimatter adapter not configured", false);
        };

        let token = match token_cache.acquire_auth_headers().await {
            Ok(token) => token,
            Err(e) => return PurchaseResult::failure(e.kind(), e.to_string(), e.is_retryable()),
        };

        let mut response = match self.send_purchase(&token, request).await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return PurchaseResult::failure(ErrorKind::Timeout, e.to_string(), true)
            }
            Err(e) => return PurchaseResult::failure(ErrorKind::NetworkError, e.to_string(), true),
        };

        // §7: a 401 invalidates the cached token and is retried once with a
        // freshly-acquired one before being surfaced as a failure.
        if response.status().as_u16() == 401 {
            token_cache.invalidate_token().await;
            let token = match token_cache.acquire_auth_headers().await {
                Ok(token) => token,
                Err(e) => return PurchaseResult::failure(e.kind(), e.to_string(), e.is_retryable()),
            };
            response = match self.send_purchase(&token, request).await {
                Ok(response) => response,
                Err(e) if e.is_timeout() => {
                    return PurchaseResult::failure(ErrorKind::Timeout, e.to_string(), true)
                }
                Err(e) => return PurchaseResult::failure(ErrorKind::NetworkError, e.to_string(), true),
            };
        }

        let status = response.status();
        if !status.is_success() {
            let kind = ErrorKind::from_http_status(status.as_u16());
            return PurchaseResult::failure(kind, format!("mobimatter returned HTTP {status}"), ErrorKind::http_status_retryable(status.as_u16()));
        }

        let body: MobimatterOrderResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => return PurchaseResult::failure(ErrorKind::InvalidResponse, e.to_string(), false),
        };

        if !body.success {
            let code = body.error_code.unwrap_or_else(|| "UNKNOWN".to_string());
            let retryable = RETRYABLE_ERROR_CODES.contains(&code.as_str());
            return PurchaseResult::failure(ErrorKind::ProviderError, format!("mobimatter error code {code}"), retryable);
        }

        let Some(data) = body.data else {
            return PurchaseResult::failure(ErrorKind::ProviderError, "mobimatter returned no order data", false);
        };

        let Some(activation_code) = data.activation_code else {
            return PurchaseResult::failure(ErrorKind::ProviderError, "mobimatter order missing activation code", false);
        };

        PurchaseResult::Ok {
            qr_code_url: data.qr_code_url,
            iccid: data.iccid,
            activation_code,
            provider_order_id: data.order_id,
        }
    }
}

impl MobimatterAdapter {
    async fn send_purchase(&self, token: &str, request: &PurchaseRequest) -> Result<reqwest::Response, reqwest::Error> {
        self.client
            .post(format!("{}/v2/orders", self.base_url))
            .bearer_auth(token)
            .header("X-Correlation-Id", &request.correlation_id)
            .header("User-Agent", "esim-fulfillment-backend/1.0")
            .json(&serde_json::json!({
                "productId": request.product_sku,
                "quantity": 1,
            }))
            .send()
            .await
    }
}
