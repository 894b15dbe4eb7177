use async_trait::async_trait;
use serde::Deserialize;

use crate::services::adapter::{ProviderAdapter, PurchaseRequest, PurchaseResult};
use crate::services::error::ErrorKind;

use super::common::{build_http_client, split_lpa, synthesize_activation_code, synthesize_qr_url};

#[derive(Deserialize)]
struct EsimCardOrderResponse {
    status: String,
    order: Option<EsimCardOrder>,
}

#[derive(Deserialize)]
struct EsimCardOrder {
    order_id: String,
    iccid: String,
    qr_code: Option<String>,
    smdp_address: Option<String>,
    matching_id: Option<String>,
}

/// eSIMCard uses a static bearer key rather than OAuth2 client-credentials
/// (§6: "static bearer" is the other documented auth shape).
pub struct EsimCardAdapter {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl EsimCardAdapter {
    pub fn from_env() -> Self {
        Self {
            client: build_http_client("esimcard"),
            base_url: std::env::var("ESIMCARD_API_URL").unwrap_or_default(),
            api_key: std::env::var("ESIMCARD_API_KEY").ok(),
        }
    }
}

#[async_trait]
impl ProviderAdapter for EsimCardAdapter {
    fn slug(&self) -> &str {
        "esimcard"
    }

    fn display_name(&self) -> &str {
        "eSIMCard"
    }

    fn is_enabled(&self) -> bool {
        self.api_key.is_some() && !self.base_url.is_empty()
    }

    async fn health_check(&self) -> (bool, Option<String>) {
        if !self.is_enabled() {
            return (false, Some("missing ESIMCARD_API_KEY/URL".to_string()));
        }
        match self
            .client
            .get(format!("{}/status", self.base_url))
            .bearer_auth(self.api_key.as_ref().unwrap())
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => (true, None),
            Ok(response) => (false, Some(format!("status endpoint returned HTTP {}", response.status()))),
            Err(e) => (false, Some(e.to_string())),
        }
    }

    async fn purchase(&self, request: &PurchaseRequest) -> PurchaseResult {
        let Some(api_key) = self.api_key.as_ref() else {
            return PurchaseResult::failure(ErrorKind::Authentication, "esimcard adapter not configured", false);
        };

        let response = match self
            .client
            .post(format!("{}/orders/create", self.base_url))
            .bearer_auth(api_key)
            .header("X-Correlation-Id", &request.correlation_id)
            .header("User-Agent", "esim-fulfillment-backend/1.0")
            .json(&serde_json::json!({
                "sku": request.product_sku,
                "customer_email": request.customer_email,
            }))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return PurchaseResult::failure(ErrorKind::Timeout, e.to_string(), true)
            }
            Err(e) => return PurchaseResult::failure(ErrorKind::NetworkError, e.to_string(), true),
        };

        let status = response.status();
        if !status.is_success() {
            let kind = ErrorKind::from_http_status(status.as_u16());
            return PurchaseResult::failure(kind, format!("esimcard returned HTTP {status}"), ErrorKind::http_status_retryable(status.as_u16()));
        }

        let body: EsimCardOrderResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => return PurchaseResult::failure(ErrorKind::InvalidResponse, e.to_string(), false),
        };

        if body.status != "COMPLETED" {
            return PurchaseResult::failure(
                ErrorKind::ProviderError,
                format!("esimcard order status was {}", body.status),
                false,
            );
        }

        let Some(order) = body.order else {
            return PurchaseResult::failure(ErrorKind::ProviderError, "esimcard returned no order payload", false);
        };

        let activation_code = match (&order.smdp_address, &order.matching_id) {
            (Some(smdp), Some(matching_id)) => synthesize_activation_code(smdp, matching_id),
            _ => {
                return PurchaseResult::failure(
                    ErrorKind::ProviderError,
                    "esimcard order missing LPA components",
                    false,
                )
            }
        };

        let qr_code_url = order
            .qr_code
            .clone()
            .or_else(|| split_lpa(&activation_code).map(|_| synthesize_qr_url(&activation_code)));

        PurchaseResult::Ok {
            qr_code_url,
            iccid: order.iccid,
            activation_code,
            provider_order_id: order.order_id,
        }
    }
}
