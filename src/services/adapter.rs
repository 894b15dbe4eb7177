use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::ErrorKind;

/// Request handed to a [`ProviderAdapter::purchase`] call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseRequest {
    pub order_id: String,
    pub correlation_id: String,
    pub product_sku: String,
    pub customer_email: String,
    pub amount: Decimal,
    pub currency: String,
}

/// Tagged outcome of a purchase attempt. Adapters never throw across their
/// boundary — transport and parsing failures are folded into `Failure`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PurchaseResult {
    Ok {
        qr_code_url: Option<String>,
        iccid: String,
        activation_code: String,
        provider_order_id: String,
    },
    Failure {
        error_type: ErrorKind,
        message: String,
        retryable: bool,
    },
}

impl PurchaseResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    pub fn failure(error_type: ErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self::Failure {
            error_type,
            message: message.into(),
            retryable,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchInquiriesOptions {
    pub include_replied: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalInquiry {
    pub external_id: String,
    pub subject: Option<String>,
    pub content: String,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalMessage {
    pub direction: String,
    pub sender_type: String,
    pub content: String,
    pub external_message_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyResult {
    pub success: bool,
    pub delivery_status: String,
    pub external_message_id: Option<String>,
}

/// Uniform contract for per-supplier eSIM provider clients (§4.3, Provider
/// family: esimcard, airalo, mobimatter, redteago, manual).
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn slug(&self) -> &str;
    fn display_name(&self) -> &str;
    fn is_enabled(&self) -> bool;
    async fn health_check(&self) -> (bool, Option<String>);
    async fn purchase(&self, request: &PurchaseRequest) -> PurchaseResult;
}

/// Uniform contract for inquiry channels (§4.3, InquiryChannel family:
/// smartstore, email, kakao, talktalk). Push-only channels may return an
/// empty list from `fetch_inquiries`.
#[async_trait]
pub trait InquiryChannelAdapter: Send + Sync {
    fn slug(&self) -> &str;
    fn display_name(&self) -> &str;
    fn is_enabled(&self) -> bool;
    async fn health_check(&self) -> (bool, Option<String>);
    async fn fetch_inquiries(
        &self,
        options: &FetchInquiriesOptions,
    ) -> Result<Vec<ExternalInquiry>, super::error::DomainError>;
    async fn fetch_messages(
        &self,
        external_id: &str,
    ) -> Result<Option<Vec<ExternalMessage>>, super::error::DomainError>;
    async fn send_reply(
        &self,
        external_id: &str,
        content: &str,
    ) -> Result<ReplyResult, super::error::DomainError>;
}
