use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::services::adapter::{ProviderAdapter, PurchaseRequest, PurchaseResult};
use crate::services::error::{DomainError, ErrorKind};
use crate::services::token_cache::{TokenCache, TokenSource};

use super::common::{build_http_client, split_lpa, synthesize_qr_url};

struct AiraloTokenSource {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    api_secret: String,
}

#[derive(Deserialize)]
struct AiraloTokenResponse {
    access_token: String,
    expires_in: u64,
}

#[async_trait]
impl TokenSource for AiraloTokenSource {
    async fn fetch_token(&self) -> Result<(String, Duration), DomainError> {
        let response = self
            .client
            .post(format!("{}/auth/token", self.base_url))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.api_key.as_str()),
                ("client_secret", self.api_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| DomainError::adapter(ErrorKind::NetworkError, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let kind = ErrorKind::from_http_status(status);
            return Err(DomainError::adapter_retryable(
                kind,
                "airalo token endpoint rejected credentials",
                ErrorKind::http_status_retryable(status),
            ));
        }

        let body: AiraloTokenResponse = response
            .json()
            .await
            .map_err(|e| DomainError::adapter(ErrorKind::InvalidResponse, e.to_string()))?;

        Ok((body.access_token, Duration::from_secs(body.expires_in)))
    }
}

#[derive(Deserialize)]
struct AiraloOrderResponse {
    data: AiraloOrderData,
}

#[derive(Deserialize)]
struct AiraloOrderData {
    id: serde_json::Value,
    sims: Vec<AiraloSim>,
}

#[derive(Deserialize)]
struct AiraloSim {
    iccid: String,
    qrcode_url: Option<String>,
    lpa: Option<String>,
}

pub struct AiraloAdapter {
    client: reqwest::Client,
    base_url: String,
    token_cache: Option<TokenCache<AiraloTokenSource>>,
}

impl AiraloAdapter {
    pub fn from_env() -> Self {
        let base_url = std::env::var("AIRALO_API_URL").unwrap_or_default();
        let api_key = std::env::var("AIRALO_API_KEY").ok();
        let api_secret = std::env::var("AIRALO_API_SECRET").ok();
        let client = build_http_client("airalo");

        let token_cache = match (api_key, api_secret) {
            (Some(key), Some(secret)) if !base_url.is_empty() => Some(TokenCache::new(AiraloTokenSource {
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
impl ProviderAdapter for AiraloAdapter {
    fn slug(&self) -> &str {
        "airalo"
    }

    fn display_name(&self) -> &str {
        "Airalo"
    }

    fn is_enabled(&self) -> bool {
        self.token_cache.is_some()
    }

    async fn health_check(&self) -> (bool, Option<String>) {
        if !self.is_enabled() {
            return (false, Some("missing AIRALO_API_KEY/SECRET/URL".to_string()));
        }
        match self.token_cache.as_ref().unwrap().acquire_auth_headers().await {
            Ok(_) => (true, None),
            Err(e) => (false, Some(e.to_string())),
        }
    }

    async fn purchase(&self, request: &PurchaseRequest) -> PurchaseResult {
        let Some(token_cache) = self.token_cache.as_ref() else {
            return PurchaseResult::failure(ErrorKind::Authentication, "airalo adapter not configured", false);
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
            return PurchaseResult::failure(kind, format!("airalo returned HTTP {status}"), ErrorKind::http_status_retryable(status.as_u16()));
        }

        let body: AiraloOrderResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => return PurchaseResult::failure(ErrorKind::InvalidResponse, e.to_string(), false),
        };

        let Some(sim) = body.data.sims.first() else {
            return PurchaseResult::failure(ErrorKind::ProviderError, "airalo returned an empty SIM list", false);
        };

        let activation_code = match (&sim.lpa, sim.qrcode_url.is_some()) {
            (Some(lpa), _) => lpa.clone(),
            (None, _) => {
                return PurchaseResult::failure(ErrorKind::ProviderError, "airalo SIM missing LPA data", false)
            }
        };

        let qr_code_url = sim
            .qrcode_url
            .clone()
            .or_else(|| split_lpa(&activation_code).map(|_| synthesize_qr_url(&activation_code)));

        PurchaseResult::Ok {
            qr_code_url,
            iccid: sim.iccid.clone(),
            activation_code,
            provider_order_id: body.data.id.to_string(),
        }
    }
}

impl AiraloAdapter {
    async fn send_purchase(&self, token: &str, request: &PurchaseRequest) -> Result<reqwest::Response, reqwest::Error> {
        self.client
            .post(format!("{}/orders/create", self.base_url))
            .bearer_auth(token)
            .header("X-Correlation-ID", &request.correlation_id)
            .header("User-Agent", "esim-fulfillment-backend/1.0")
            .json(&serde_json::json!({
                "package_id": request.product_sku,
                "quantity": 1,
            }))
            .send()
            .await
    }
}
