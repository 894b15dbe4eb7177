use async_trait::async_trait;
use serde::Deserialize;

use crate::services::adapter::{
    ExternalInquiry, ExternalMessage, FetchInquiriesOptions, InquiryChannelAdapter, ReplyResult,
};
use crate::services::error::{DomainError, ErrorKind};

#[derive(Deserialize)]
struct InboxMessage {
    #[serde(rename = "messageId")]
    message_id: String,
    subject: Option<String>,
    body: String,
    #[serde(rename = "fromName")]
    from_name: Option<String>,
    #[serde(rename = "fromEmail")]
    from_email: String,
}

#[derive(Deserialize)]
struct InboxListResponse {
    messages: Vec<InboxMessage>,
}

/// Customer-support inbox channel, backed by a transactional-email
/// provider's inbound/outbound HTTP API rather than raw SMTP/IMAP (the
/// email transport itself is an injected side-effect port elsewhere in this
/// system; this adapter only covers the inquiry-channel surface).
pub struct EmailChannel {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl EmailChannel {
    pub fn from_env() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: std::env::var("SUPPORT_INBOX_API_URL").unwrap_or_default(),
            api_key: std::env::var("SUPPORT_INBOX_API_KEY").ok(),
        }
    }
}

#[async_trait]
impl InquiryChannelAdapter for EmailChannel {
    fn slug(&self) -> &str {
        "email"
    }

    fn display_name(&self) -> &str {
        "Email"
    }

    fn is_enabled(&self) -> bool {
        self.api_key.is_some() && !self.base_url.is_empty()
    }

    async fn health_check(&self) -> (bool, Option<String>) {
        if !self.is_enabled() {
            return (false, Some("missing SUPPORT_INBOX_API_KEY/URL".to_string()));
        }
        match self
            .client
            .get(format!("{}/health", self.base_url))
            .bearer_auth(self.api_key.as_ref().unwrap())
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => (true, None),
            Ok(response) => (false, Some(format!("health endpoint returned HTTP {}", response.status()))),
            Err(e) => (false, Some(e.to_string())),
        }
    }

    async fn fetch_inquiries(&self, options: &FetchInquiriesOptions) -> Result<Vec<ExternalInquiry>, DomainError> {
        let Some(api_key) = self.api_key.as_ref() else {
            return Err(DomainError::adapter_retryable(ErrorKind::Authentication, "email channel not configured", false));
        };

        let response = self
            .client
            .get(format!("{}/inbox/messages", self.base_url))
            .bearer_auth(api_key)
            .query(&[("unanswered_only", (!options.include_replied).to_string())])
            .send()
            .await
            .map_err(|e| DomainError::adapter(ErrorKind::NetworkError, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let kind = ErrorKind::from_http_status(status);
            return Err(DomainError::adapter_retryable(
                kind,
                format!("inbox list returned HTTP {status}"),
                ErrorKind::http_status_retryable(status),
            ));
        }

        let body: InboxListResponse = response
            .json()
            .await
            .map_err(|e| DomainError::adapter(ErrorKind::InvalidResponse, e.to_string()))?;

        Ok(body
            .messages
            .into_iter()
            .map(|m| ExternalInquiry {
                external_id: m.message_id,
                subject: m.subject,
                content: m.body,
                customer_name: m.from_name,
                customer_email: Some(m.from_email),
            })
            .collect())
    }

    async fn fetch_messages(&self, _external_id: &str) -> Result<Option<Vec<ExternalMessage>>, DomainError> {
        Ok(None)
    }

    async fn send_reply(&self, external_id: &str, content: &str) -> Result<ReplyResult, DomainError> {
        let Some(api_key) = self.api_key.as_ref() else {
            return Err(DomainError::adapter_retryable(ErrorKind::Authentication, "email channel not configured", false));
        };

        let response = self
            .client
            .post(format!("{}/inbox/messages/{external_id}/reply", self.base_url))
            .bearer_auth(api_key)
            .json(&serde_json::json!({ "body": content }))
            .send()
            .await
            .map_err(|e| DomainError::adapter(ErrorKind::NetworkError, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let kind = ErrorKind::from_http_status(status);
            return Err(DomainError::adapter_retryable(
                kind,
                format!("inbox reply returned HTTP {status}"),
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
