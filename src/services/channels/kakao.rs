use async_trait::async_trait;
use serde::Deserialize;

use crate::services::adapter::{
    ExternalInquiry, ExternalMessage, FetchInquiriesOptions, InquiryChannelAdapter, ReplyResult,
};
use crate::services::error::{DomainError, ErrorKind};

#[derive(Deserialize)]
struct KakaoChatItem {
    #[serde(rename = "chatId")]
    chat_id: String,
    #[serde(rename = "lastMessage")]
    last_message: String,
    #[serde(rename = "userName")]
    user_name: Option<String>,
}

#[derive(Deserialize)]
struct KakaoChatListResponse {
    chats: Vec<KakaoChatItem>,
}

#[derive(Deserialize)]
struct KakaoMessageItem {
    direction: String,
    text: String,
    #[serde(rename = "messageId")]
    message_id: Option<String>,
}

#[derive(Deserialize)]
struct KakaoMessageListResponse {
    messages: Vec<KakaoMessageItem>,
}

/// Kakao Channel (플러스친구) 1:1 chat inquiries, authenticated with a
/// static REST API key rather than an OAuth2 client-credentials grant.
pub struct KakaoChannel {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl KakaoChannel {
    pub fn from_env() -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: std::env::var("KAKAO_CHANNEL_API_KEY").ok(),
        }
    }

    fn require_api_key(&self) -> Result<&str, DomainError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| DomainError::adapter_retryable(ErrorKind::Authentication, "kakao channel not configured", false))
    }
}

#[async_trait]
impl InquiryChannelAdapter for KakaoChannel {
    fn slug(&self) -> &str {
        "kakao"
    }

    fn display_name(&self) -> &str {
        "Kakao Channel"
    }

    fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    async fn health_check(&self) -> (bool, Option<String>) {
        let Ok(api_key) = self.require_api_key() else {
            return (false, Some("missing KAKAO_CHANNEL_API_KEY".to_string()));
        };
        match self
            .client
            .get("https://api.kakao.com/v1/channels/me")
            .header("Authorization", format!("KakaoAK {api_key}"))
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => (true, None),
            Ok(response) => (false, Some(format!("health endpoint returned HTTP {}", response.status()))),
            Err(e) => (false, Some(e.to_string())),
        }
    }

    async fn fetch_inquiries(&self, options: &FetchInquiriesOptions) -> Result<Vec<ExternalInquiry>, DomainError> {
        let api_key = self.require_api_key()?;

        let response = self
            .client
            .get("https://api.kakao.com/v1/channels/me/chats")
            .header("Authorization", format!("KakaoAK {api_key}"))
            .query(&[("include_answered", options.include_replied.to_string())])
            .send()
            .await
            .map_err(|e| DomainError::adapter(ErrorKind::NetworkError, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let kind = ErrorKind::from_http_status(status);
            return Err(DomainError::adapter_retryable(
                kind,
                format!("kakao chat list returned HTTP {status}"),
                ErrorKind::http_status_retryable(status),
            ));
        }

        let body: KakaoChatListResponse = response
            .json()
            .await
            .map_err(|e| DomainError::adapter(ErrorKind::InvalidResponse, e.to_string()))?;

        Ok(body
            .chats
            .into_iter()
            .map(|chat| ExternalInquiry {
                external_id: chat.chat_id,
                subject: None,
                content: chat.last_message,
                customer_name: chat.user_name,
                customer_email: None,
            })
            .collect())
    }

    async fn fetch_messages(&self, external_id: &str) -> Result<Option<Vec<ExternalMessage>>, DomainError> {
        let api_key = self.require_api_key()?;

        let response = self
            .client
            .get(format!("https://api.kakao.com/v1/channels/me/chats/{external_id}/messages"))
            .header("Authorization", format!("KakaoAK {api_key}"))
            .send()
            .await
            .map_err(|e| DomainError::adapter(ErrorKind::NetworkError, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let kind = ErrorKind::from_http_status(status);
            return Err(DomainError::adapter_retryable(
                kind,
                format!("kakao message list returned HTTP {status}"),
                ErrorKind::http_status_retryable(status),
            ));
        }

        let body: KakaoMessageListResponse = response
            .json()
            .await
            .map_err(|e| DomainError::adapter(ErrorKind::InvalidResponse, e.to_string()))?;

        Ok(Some(
            body.messages
                .into_iter()
                .map(|m| ExternalMessage {
                    direction: if m.direction == "in" { "inbound".to_string() } else { "outbound".to_string() },
                    sender_type: if m.direction == "in" { "customer".to_string() } else { "agent".to_string() },
                    content: m.text,
                    external_message_id: m.message_id,
                })
                .collect(),
        ))
    }

    async fn send_reply(&self, external_id: &str, content: &str) -> Result<ReplyResult, DomainError> {
        let api_key = self.require_api_key()?;

        let response = self
            .client
            .post(format!("https://api.kakao.com/v1/channels/me/chats/{external_id}/messages"))
            .header("Authorization", format!("KakaoAK {api_key}"))
            .json(&serde_json::json!({ "text": content }))
            .send()
            .await
            .map_err(|e| DomainError::adapter(ErrorKind::NetworkError, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let kind = ErrorKind::from_http_status(status);
            return Err(DomainError::adapter_retryable(
                kind,
                format!("kakao send returned HTTP {status}"),
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
