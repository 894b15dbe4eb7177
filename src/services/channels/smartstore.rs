use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::services::adapter::{
    ExternalInquiry, ExternalMessage, FetchInquiriesOptions, InquiryChannelAdapter, ReplyResult,
};
use crate::services::error::{DomainError, ErrorKind};
use crate::services::token_cache::{TokenCache, TokenSource};

struct NaverCommerceTokenSource {
    client: reqwest::Client,
    app_id: String,
    app_secret: String,
}

#[derive(Deserialize)]
struct NaverTokenResponse {
    access_token: String,
    expires_in: u64,
}

#[async_trait]
impl TokenSource for NaverCommerceTokenSource {
    async fn fetch_token(&self) -> Result<(String, Duration), DomainError> {
        let response = self
            .client
            .post("https://api.commerce.naver.com/external/v1/oauth2/token")
            .form(&[
                ("client_id", self.app_id.as_str()),
                ("client_secret", self.app_secret.as_str()),
                ("grant_type", "client_credentials"),
                ("type", "SELF"),
            ])
            .send()
            .await
            .map_err(|e| DomainError::adapter(ErrorKind::NetworkError, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let kind = ErrorKind::from_http_status(status);
            return Err(DomainError::adapter_retryable(
                kind,
                "naver commerce token endpoint rejected credentials",
                ErrorKind::http_status_retryable(status),
            ));
        }

        let body: NaverTokenResponse = response
            .json()
            .await
            .map_err(|e| DomainError::adapter(ErrorKind::InvalidResponse, e.to_string()))?;

        Ok((body.access_token, Duration::from_secs(body.expires_in)))
    }
}

#[derive(Deserialize)]
struct SmartStoreQnaItem {
    #[serde(rename = "inquiryNo")]
    inquiry_no: String,
    title: Option<String>,
    content: String,
    #[serde(rename = "customerName")]
    customer_name: Option<String>,
    #[serde(rename = "customerEmail")]
    customer_email: Option<String>,
}

#[derive(Deserialize)]
struct SmartStoreQnaListResponse {
    contents: Vec<SmartStoreQnaItem>,
}

/// Sales + inquiry channel for Naver SmartStore (the only channel that also
/// sells products; its purchase-facing side is consumed by C12's normalizer
/// rather than this trait).
pub struct SmartStoreChannel {
    client: reqwest::Client,
    token_cache: Option<TokenCache<NaverCommerceTokenSource>>,
}

impl SmartStoreChannel {
    pub fn from_env() -> Self {
        let app_id = std::env::var("NAVER_COMMERCE_APP_ID").ok();
        let app_secret = std::env::var("NAVER_COMMERCE_APP_SECRET").ok();
        let client = reqwest::Client::new();

        let token_cache = match (app_id, app_secret) {
            (Some(app_id), Some(app_secret)) => Some(TokenCache::new(NaverCommerceTokenSource {
                client: client.clone(),
                app_id,
                app_secret,
            })),
            _ => None,
        };

        Self { client, token_cache }
    }
}

#[async_trait]
impl InquiryChannelAdapter for SmartStoreChannel {
    fn slug(&self) -> &str {
        "smartstore"
    }

    fn display_name(&self) -> &str {
        "Naver SmartStore"
    }

    fn is_enabled(&self) -> bool {
        self.token_cache.is_some()
    }

    async fn health_check(&self) -> (bool, Option<String>) {
        if !self.is_enabled() {
            return (false, Some("missing NAVER_COMMERCE_APP_ID/SECRET".to_string()));
        }
        match self.token_cache.as_ref().unwrap().acquire_auth_headers().await {
            Ok(_) => (true, None),
            Err(e) => (false, Some(e.to_string())),
        }
    }

    async fn fetch_inquiries(&self, options: &FetchInquiriesOptions) -> Result<Vec<ExternalInquiry>, DomainError> {
        let Some(token_cache) = self.token_cache.as_ref() else {
            return Err(DomainError::adapter_retryable(ErrorKind::Authentication, "smartstore channel not configured", false));
        };
        let token = token_cache.acquire_auth_headers().await?;

        let response = self
            .client
            .get("https://api.commerce.naver.com/external/v1/pay-user/qnas")
            .bearer_auth(token)
            .query(&[("answered", &options.include_replied.to_string())])
            .send()
            .await
            .map_err(|e| DomainError::adapter(ErrorKind::NetworkError, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let kind = ErrorKind::from_http_status(status);
            return Err(DomainError::adapter_retryable(
                kind,
                format!("smartstore qna list returned HTTP {status}"),
                ErrorKind::http_status_retryable(status),
            ));
        }

        let body: SmartStoreQnaListResponse = response
            .json()
            .await
            .map_err(|e| DomainError::adapter(ErrorKind::InvalidResponse, e.to_string()))?;

        Ok(body
            .contents
            .into_iter()
            .map(|item| ExternalInquiry {
                external_id: item.inquiry_no,
                subject: item.title,
                content: item.content,
                customer_name: item.customer_name,
                customer_email: item.customer_email,
            })
            .collect())
    }

    async fn fetch_messages(&self, _external_id: &str) -> Result<Option<Vec<ExternalMessage>>, DomainError> {
        // SmartStore Q&A is single-message-per-thread until a reply is posted.
        Ok(None)
    }

    async fn send_reply(&self, external_id: &str, content: &str) -> Result<ReplyResult, DomainError> {
        let Some(token_cache) = self.token_cache.as_ref() else {
            return Err(DomainError::adapter_retryable(ErrorKind::Authentication, "smartstore channel not configured", false));
        };
        let token = token_cache.acquire_auth_headers().await?;

        let response = self
            .client
            .put(format!(
                "https://api.commerce.naver.com/external/v1/pay-user/qnas/{external_id}/answer"
            ))
            .bearer_auth(token)
            .json(&serde_json::json!({ "answerContent": content }))
            .send()
            .await
            .map_err(|e| DomainError::adapter(ErrorKind::NetworkError, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let kind = ErrorKind::from_http_status(status);
            return Err(DomainError::adapter_retryable(
                kind,
                format!("smartstore answer returned HTTP {status}"),
                ErrorKind::http_status_retryable(status),
            ));
        }

        Ok(ReplyResult {
            success: true,
            delivery_status: "delivered".to_string(),
            external_message_id: None,
        })
    }
}
