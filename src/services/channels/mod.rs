pub mod email_channel;
pub mod kakao;
pub mod smartstore;
pub mod talktalk;

use std::sync::Arc;

use crate::services::adapter::InquiryChannelAdapter;

/// Builds the registered set of inquiry channel adapters from
/// environment-sourced credentials (§4.3 InquiryChannel family).
pub fn build_registry() -> Vec<Arc<dyn InquiryChannelAdapter>> {
    vec![
        Arc::new(smartstore::SmartStoreChannel::from_env()),
        Arc::new(email_channel::EmailChannel::from_env()),
        Arc::new(kakao::KakaoChannel::from_env()),
        Arc::new(talktalk::TalkTalkChannel::from_env()),
    ]
}
