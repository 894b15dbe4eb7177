use async_trait::async_trait;
use serde::Deserialize;

use crate::services::adapter::{ProviderAdapter, PurchaseRequest, PurchaseResult};
use crate::services::error::ErrorKind;

use super::common::build_http_client;

#[derive(Deserialize)]
struct RedteaGoOrderResponse {
    code: i32,
    msg: String,
    obj: Option<RedteaGoOrderObj>,
}

#[derive(Deserialize)]
struct RedteaGoOrderObj {
    #[serde(rename = "orderNo")]
    order_no: String,
    #[serde(rename = "iccidList")]
    iccid_list: Vec<String>,
    #[serde(rename = "qrCodeUrl")]
    qr_code_url: Option<String>,
    #[serde(rename = "acCode")]
    ac_code: Option<String>,
}

/// RedteaGo uses a static partner key rather than OAuth2, like eSIMCard, but
/// signs requests with the key directly in a custom header instead of a
/// bearer token.
pub struct RedteaGoAdapter {
    client: reqwest::Client,
    base_url: String,
    partner_key: Option<String>,
}

impl RedteaGoAdapter {
    pub fn from_env() -> Self {
        Self {
            client: build_http_client("redteago"),
            base_url: std::env::var("REDTEAGO_API_URL").unwrap_or_default(),
            partner_key: std::env::var("REDTEAGO_API_KEY").ok(),
        }
    }
}

#[async_trait]
impl ProviderAdapter for RedteaGoAdapter {
    fn slug(&self) -> &str {
        "redteago"
    }

    fn display_name(&self) -> &str {
        "RedteaGo"
    }

    fn is_enabled(&self) -> bool {
        self.partner_key.is_some() && !self.base_url.is_empty()
    }

    async fn health_check(&self) -> (bool, Option<String>) {
        if !self.is_enabled() {
            return (false, Some("missing REDTEAGO_API_KEY/URL".to_string()));
        }
        match self
            .client
            .get(format!("{}/status", self.base_url))
            .header("X-Partner-Key", self.partner_key.as_ref().unwrap())
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => (true, None),
            Ok(response) => (false, Some(format!("status endpoint returned HTTP {}", response.status()))),
            Err(e) => (false, Some(e.to_string())),
        }
    }

    async fn purchase(&self, request: &PurchaseRequest) -> PurchaseResult {
        let Some(partner_key) = self.partner_key.as_ref() else {
            return PurchaseResult::failure(ErrorKind::Authentication, "redteago adapter not configured", false);
        };

        let response = match self
            .client
            .post(format!("{}/api/order/create", self.base_url))
            .header("X-Partner-Key", partner_key)
            .header("X-Correlation-Id", &request.correlation_id)
            .header("User-Agent", "esim-fulfillment-backend/1.0")
            .json(&serde_json::json!({
                "packageCode": request.product_sku,
                "count": 1,
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
            return PurchaseResult::failure(kind, format!("redteago returned HTTP {status}"), ErrorKind::http_status_retryable(status.as_u16()));
        }

        let body: RedteaGoOrderResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => return PurchaseResult::failure(ErrorKind::InvalidResponse, e.to_string(), false),
        };

        if body.code != 200 {
            return PurchaseResult::failure(ErrorKind::ProviderError, format!("redteago error: {}", body.msg), false);
        }

        let Some(obj) = body.obj else {
            return PurchaseResult::failure(ErrorKind::ProviderError, "redteago returned no order object", false);
        };

        let Some(iccid) = obj.iccid_list.into_iter().next() else {
            return PurchaseResult::failure(ErrorKind::ProviderError, "redteago returned an empty SIM list", false);
        };

        let Some(activation_code) = obj.ac_code else {
            return PurchaseResult::failure(ErrorKind::ProviderError, "redteago order missing activation code", false);
        };

        PurchaseResult::Ok {
            qr_code_url: obj.qr_code_url,
            iccid,
            activation_code,
            provider_order_id: obj.order_no,
        }
    }
}
