use esim_fulfillment_backend::models::inquiry::CreateInquiryRequest;
use esim_fulfillment_backend::models::order::CreateOrderRequest;
use rust_decimal::Decimal;
use uuid::Uuid;

pub struct OrderFixture;

impl OrderFixture {
    /// A freshly-paid order for `smartstore`, eligible for fulfillment.
    pub fn paid_order(external_order_id: &str) -> CreateOrderRequest {
        CreateOrderRequest {
            order_number: format!("smartstore-{external_order_id}"),
            correlation_id: Uuid::new_v4(),
            sales_channel: "smartstore".to_string(),
            external_order_id: external_order_id.to_string(),
            customer_email: "buyer@example.com".to_string(),
            customer_name: Some("Test Buyer".to_string()),
            customer_phone: Some("010-1234-5678".to_string()),
            product_id: "esim-japan-5gb".to_string(),
            provider_sku: None,
            quantity: 1,
            amount: Decimal::new(2990000, 2),
            currency: "KRW".to_string(),
            payment_reference: Some(format!("pay-{external_order_id}")),
            metadata: serde_json::json!({}),
            paid_at: chrono::Utc::now().naive_utc(),
        }
    }

    pub fn with_pinned_provider_sku(mut req: CreateOrderRequest, provider_sku: &str) -> CreateOrderRequest {
        req.provider_sku = Some(provider_sku.to_string());
        req
    }
}

pub struct InquiryFixture;

impl InquiryFixture {
    pub fn pulled_from_kakao(external_id: &str) -> CreateInquiryRequest {
        CreateInquiryRequest {
            channel: "kakao".to_string(),
            external_id: external_id.to_string(),
            subject: Some("eSIM activation question".to_string()),
            content: "My QR code won't scan, can you help?".to_string(),
            customer_name: Some("Jane Traveler".to_string()),
            customer_email: Some("jane@example.com".to_string()),
        }
    }
}
