use async_trait::async_trait;
use serde::Deserialize;

use crate::services::adapter::{
    ExternalInquiry, ExternalMessage, FetchInquiriesOptions, InquiryChannelAdapter, ReplyResult,
};
use crate::services::error::{DomainError, ErrorKind};

#[derive(Deserialize)]
struct TalkTalkEventItem {
    #[serde(rename = "userKey")]
    user_key: String,
    #[serde(rename = "eventToken")]
    event_token: String,
    #[serde(rename = "userMessage")]
    user_message: String,
}

#[derive(Deserialize)]
struct TalkTalkEventListResponse {
    events: Vec<TalkTalkEventItem>,
}

/// Naver TalkTalk partner API. Partner credentials are a static
/// `partner_key`/`event_token` pair issued per-conversation rather than a
/// refreshable token, so there is no [`super::super::token_cache`] here.
pub struct TalkTalkChannel {
    client: reqwest::Client,
    partner_key: Option<String>,
}

impl TalkTalkChannel {
    pub fn from_env() -> Self {
        Self {
            client: reqwest::Client::new(),
            partner_key: std::env::var("TALKTALK_PARTNER_KEY").ok(),
        }
    }

    fn require_partner_key(&self) -> Result<&str, DomainError> {
        self.partner_key
            .as_deref()
            .ok_or_else(|| DomainError::adapter_retryable(ErrorKind::Authentication, "talktalk channel not configured", false))
    }
}

#[async_trait]
impl InquiryChannelAdapter for TalkTalkChannel {
    fn slug(&self) -> &str {
        "talktalk"
    }

    fn display_name(&self) -> &str {
        "Naver TalkTalk"
    }

    fn is_enabled(&self) -> bool {
        self.partner_key.is_some()
    }

    async fn health_check(&self) -> (bool, Option<String>) {
        let Ok(partner_key) = self.require_partner_key() else {
            return (false, Some("missing TALKTALK_PARTNER_KEY".to_string()));
        };
        match self
            .client
            .get("https://talktalkapi.com/partner/status")
            .header("X-Partner-Key", partner_key)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => (true, None),
            Ok(response) => (false, Some(format!("health endpoint returned HTTP {}", response.status()))),
            Err(e) => (false, Some(e.to_string())),
        }
    }

    async fn fetch_inquiries(&self, options: &FetchInquiriesOptions) -> Result<Vec<ExternalInquiry>, DomainError> {
        let partner_key = self.require_partner_key()?;

        let response = self
            .client
            .get("https://talktalkapi.com/partner/events")
            .header("X-Partner-Key", partner_key)
            .query(&[("include_replied", options.include_replied.to_string())])
            .send()
            .await
            .map_err(|e| DomainError::adapter(ErrorKind::NetworkError, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let kind = ErrorKind::from_http_status(status);
            return Err(DomainError::adapter_retryable(
                kind,
                format!("talktalk event list returned HTTP {status}"),
                ErrorKind::http_status_retryable(status),
            ));
        }

        let body: TalkTalkEventListResponse = response
            .json()
            .await
            .map_err(|e| DomainError::adapter(ErrorKind::InvalidResponse, e.to_string()))?;

        Ok(body
            .events
            .into_iter()
            .map(|event| ExternalInquiry {
                external_id: event.event_token,
                subject: None,
                content: event.user_message,
                customer_name: Some(event.user_key),
                customer_email: None,
            })
            .collect())
    }

    async fn fetch_messages(&self, _external_id: &str) -> Result<Option<Vec<ExternalMessage>>, DomainError> {
        Ok(None)
    }

    async fn send_reply(&self, external_id: &str, content: &str) -> Result<ReplyResult, DomainError> {
        let partner_key = self.require_partner_key()?;

        let response = self
            .client
            .post("https://talktalkapi.com/partner/v1/message")
            .header("X-Partner-Key", partner_key)
            .json(&serde_json::json!({
                "event": external_id,
                "type": "TEXT",
                "payload": { "text": content }
            }))
            .send()
            .await
            .map_err(|e| DomainError::adapter(ErrorKind::NetworkError, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let kind = ErrorKind::from_http_status(status);
            return Err(DomainError::adapter_retryable(
                kind,
                format!("talktalk send returned HTTP {status}"),
                ErrorKind::http_status_retryable(status),
            ));
        }

        Ok(ReplyResult {
            success: true,
            delivery_status: "sent".to_string(),
            external_message_id: None,
        })
    }
}
