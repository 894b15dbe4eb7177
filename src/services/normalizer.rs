use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

use crate::models::product_mapping::ProductMapping;

use super::error::DomainError;

/// Raw order payload as received from a sales channel, before mapping to an
/// internal product id or projecting its status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalOrderer {
    pub email: String,
    pub name: Option<String>,
    pub safe_number: Option<String>,
    pub tel: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalOrder {
    pub sales_channel: String,
    pub external_order_id: String,
    pub external_product_id: String,
    pub orderer: ExternalOrderer,
    pub quantity: Option<u32>,
    pub amount: Decimal,
    pub currency: String,
    pub paid_at: chrono::DateTime<chrono::Utc>,
    pub status: String,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InternalOrder {
    pub sales_channel: String,
    pub external_order_id: String,
    pub customer_email: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub product_id: String,
    pub provider_sku: Option<String>,
    pub quantity: u32,
    pub amount: Decimal,
    pub currency: String,
    pub paid_at: chrono::DateTime<chrono::Utc>,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeError {
    pub external_id: String,
    pub error: String,
}

/// Resolves a channel-specific product id to an internal product (and,
/// optionally, a pinned provider SKU). Implemented over C14's
/// `ProductMapping::resolve` at the call site; kept as a trait here so the
/// normalizer's pure logic can be unit tested without a database.
#[async_trait::async_trait]
pub trait ProductMapper: Send + Sync {
    async fn resolve(&self, sales_channel: &str, external_product_id: &str) -> Option<(String, Option<String>)>;
}

/// The live `ProductMapper` used outside tests: C14's lookup table over a
/// real database connection.
pub struct DbProductMapper<'a> {
    pub db: &'a DatabaseConnection,
}

#[async_trait::async_trait]
impl<'a> ProductMapper for DbProductMapper<'a> {
    async fn resolve(&self, sales_channel: &str, external_product_id: &str) -> Option<(String, Option<String>)> {
        ProductMapping::resolve(self.db, sales_channel, external_product_id)
            .await
            .ok()
            .flatten()
            .map(|m| (m.product_id, m.provider_sku))
    }
}

const PAID_STATUSES: &[&str] = &["paid", "payment_completed", "결제완료", "PAYMENT_WAITING_FOR_SHIPPING"];
const CANCELED_STATUSES: &[&str] = &["canceled", "cancelled", "취소", "CANCELED"];

pub fn is_payment_complete(status: &str) -> bool {
    PAID_STATUSES.iter().any(|s| s.eq_ignore_ascii_case(status))
}

pub fn is_canceled(status: &str) -> bool {
    CANCELED_STATUSES.iter().any(|s| s.eq_ignore_ascii_case(status))
}

/// `no active claim` is evaluated by the caller (it requires checking for an
/// existing order against this external id) — this predicate covers only the
/// payment/cancellation half the normalizer can decide in isolation.
pub fn is_eligible_for_fulfillment(status: &str) -> bool {
    is_payment_complete(status) && !is_canceled(status)
}

/// Internal order status projection table. Unknown external statuses default
/// to `pending` rather than erroring, since channels add statuses over time.
pub fn project_status(external_status: &str) -> &'static str {
    if is_canceled(external_status) {
        return "failed";
    }
    match external_status {
        s if is_payment_complete(s) => "processing",
        "delivered" | "완료" | "DELIVERED" => "completed",
        "refunded" | "환불" | "REFUNDED" => "refunded",
        _ => "pending",
    }
}

pub async fn normalize(
    external: &ExternalOrder,
    product_mapper: &dyn ProductMapper,
) -> Result<InternalOrder, DomainError> {
    if external.external_order_id.trim().is_empty() {
        return Err(DomainError::Validation("external_order_id is required".to_string()));
    }
    if external.orderer.email.trim().is_empty() {
        return Err(DomainError::Validation("orderer.email is required".to_string()));
    }

    let (product_id, provider_sku) = product_mapper
        .resolve(&external.sales_channel, &external.external_product_id)
        .await
        .ok_or_else(|| {
            DomainError::Validation(format!(
                "not_found: no product mapping for {}/{}",
                external.sales_channel, external.external_product_id
            ))
        })?;

    let customer_phone = external.orderer.safe_number.clone().or_else(|| external.orderer.tel.clone());

    Ok(InternalOrder {
        sales_channel: external.sales_channel.clone(),
        external_order_id: external.external_order_id.clone(),
        customer_email: external.orderer.email.clone(),
        customer_name: external.orderer.name.clone(),
        customer_phone,
        product_id,
        provider_sku,
        quantity: external.quantity.unwrap_or(1),
        amount: external.amount,
        currency: external.currency.clone(),
        paid_at: external.paid_at,
        metadata: external.metadata.clone(),
    })
}

/// Batch variant: never aborts on a single failure, collecting successes and
/// `{external_id, error}` pairs separately.
pub async fn normalize_batch(
    externals: &[ExternalOrder],
    product_mapper: &dyn ProductMapper,
) -> (Vec<InternalOrder>, Vec<NormalizeError>) {
    let mut successes = Vec::new();
    let mut errors = Vec::new();

    for external in externals {
        match normalize(external, product_mapper).await {
            Ok(order) => successes.push(order),
            Err(e) => errors.push(NormalizeError {
                external_id: external.external_order_id.clone(),
                error: e.to_string(),
            }),
        }
    }

    (successes, errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticMapper;

    #[async_trait::async_trait]
    impl ProductMapper for StaticMapper {
        async fn resolve(&self, _sales_channel: &str, external_product_id: &str) -> Option<(String, Option<String>)> {
            if external_product_id == "sku-known" {
                Some(("prod-1".to_string(), Some("provider-sku-1".to_string())))
            } else {
                None
            }
        }
    }

    fn sample(external_product_id: &str) -> ExternalOrder {
        ExternalOrder {
            sales_channel: "smartstore".to_string(),
            external_order_id: "ext-1".to_string(),
            external_product_id: external_product_id.to_string(),
            orderer: ExternalOrderer {
                email: "buyer@example.com".to_string(),
                name: Some("Buyer".to_string()),
                safe_number: Some("050-1234-5678".to_string()),
                tel: Some("010-1111-2222".to_string()),
            },
            quantity: None,
            amount: Decimal::new(1000, 0),
            currency: "KRW".to_string(),
            paid_at: chrono::Utc::now(),
            status: "paid".to_string(),
            metadata: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn maps_known_product_and_prefers_safe_number() {
        let result = normalize(&sample("sku-known"), &StaticMapper).await.unwrap();
        assert_eq!(result.product_id, "prod-1");
        assert_eq!(result.provider_sku, Some("provider-sku-1".to_string()));
        assert_eq!(result.customer_phone, Some("050-1234-5678".to_string()));
        assert_eq!(result.quantity, 1);
    }

    #[tokio::test]
    async fn falls_back_to_tel_when_safe_number_absent() {
        let mut external = sample("sku-known");
        external.orderer.safe_number = None;
        let result = normalize(&external, &StaticMapper).await.unwrap();
        assert_eq!(result.customer_phone, Some("010-1111-2222".to_string()));
    }

    #[tokio::test]
    async fn unknown_product_id_is_not_found() {
        let err = normalize(&sample("sku-unknown"), &StaticMapper).await.unwrap_err();
        assert!(err.to_string().contains("not_found"));
    }

    #[tokio::test]
    async fn blank_external_order_id_is_rejected() {
        let mut external = sample("sku-known");
        external.external_order_id = "  ".to_string();
        assert!(normalize(&external, &StaticMapper).await.is_err());
    }

    #[test]
    fn eligibility_requires_paid_and_not_canceled() {
        assert!(is_eligible_for_fulfillment("paid"));
        assert!(!is_eligible_for_fulfillment("canceled"));
        assert!(!is_eligible_for_fulfillment("pending"));
    }

    #[test]
    fn status_projection_defaults_to_pending_for_unknown() {
        assert_eq!(project_status("paid"), "processing");
        assert_eq!(project_status("refunded"), "refunded");
        assert_eq!(project_status("some_unmapped_status"), "pending");
        assert_eq!(project_status("canceled"), "failed");
    }
}
