use loco_rs::prelude::*;
use rust_decimal::Decimal;
use sea_orm::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::_entities::{orders, prelude::*};

/// Order lifecycle state. Transitions form a fixed DAG (see [`OrderStatus::can_transition_to`]);
/// any edge not in the DAG fails with [`Error::InvalidTransition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    PaymentReceived,
    FulfillmentStarted,
    ProviderConfirmed,
    EmailSent,
    Delivered,
    ProviderFailed,
    PendingManualFulfillment,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PaymentReceived => "payment_received",
            Self::FulfillmentStarted => "fulfillment_started",
            Self::ProviderConfirmed => "provider_confirmed",
            Self::EmailSent => "email_sent",
            Self::Delivered => "delivered",
            Self::ProviderFailed => "provider_failed",
            Self::PendingManualFulfillment => "pending_manual_fulfillment",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Some(match value {
            "payment_received" => Self::PaymentReceived,
            "fulfillment_started" => Self::FulfillmentStarted,
            "provider_confirmed" => Self::ProviderConfirmed,
            "email_sent" => Self::EmailSent,
            "delivered" => Self::Delivered,
            "provider_failed" => Self::ProviderFailed,
            "pending_manual_fulfillment" => Self::PendingManualFulfillment,
            _ => return None,
        })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Delivered | Self::ProviderFailed | Self::PendingManualFulfillment
        )
    }

    /// The fixed transition DAG from §3. Self-transitions are always allowed
    /// (idempotent re-application) and are checked separately by the caller.
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        use OrderStatus::*;
        match self {
            PaymentReceived => matches!(
                target,
                FulfillmentStarted | ProviderFailed | PendingManualFulfillment
            ),
            FulfillmentStarted => matches!(
                target,
                ProviderConfirmed | ProviderFailed | PendingManualFulfillment
            ),
            ProviderConfirmed => matches!(
                target,
                EmailSent | Delivered | ProviderFailed | PendingManualFulfillment
            ),
            EmailSent => matches!(target, Delivered | ProviderFailed | PendingManualFulfillment),
            Delivered | ProviderFailed | PendingManualFulfillment => false,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub correlation_id: Uuid,
    pub sales_channel: String,
    pub external_order_id: String,
    pub customer_email: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub product_id: String,
    pub provider_sku: Option<String>,
    pub quantity: i32,
    pub amount: Decimal,
    pub currency: String,
    pub status: OrderStatus,
    pub payment_reference: Option<String>,
    pub qr_code_url: Option<String>,
    pub iccid: Option<String>,
    pub activation_code: Option<String>,
    pub provider_used: Option<String>,
    pub error_message: Option<String>,
    pub metadata: serde_json::Value,
    pub paid_at: chrono::NaiveDateTime,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub order_number: String,
    pub correlation_id: Uuid,
    pub sales_channel: String,
    pub external_order_id: String,
    pub customer_email: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub product_id: String,
    pub provider_sku: Option<String>,
    pub quantity: i32,
    pub amount: Decimal,
    pub currency: String,
    pub payment_reference: Option<String>,
    pub metadata: serde_json::Value,
    pub paid_at: chrono::NaiveDateTime,
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            order_number: model.order_number,
            correlation_id: model.correlation_id,
            sales_channel: model.sales_channel,
            external_order_id: model.external_order_id,
            customer_email: model.customer_email,
            customer_name: model.customer_name,
            customer_phone: model.customer_phone,
            product_id: model.product_id,
            provider_sku: model.provider_sku,
            quantity: model.quantity,
            amount: model.amount,
            currency: model.currency,
            status: OrderStatus::parse(&model.status).unwrap_or(OrderStatus::PaymentReceived),
            payment_reference: model.payment_reference,
            qr_code_url: model.qr_code_url,
            iccid: model.iccid,
            activation_code: model.activation_code,
            provider_used: model.provider_used,
            error_message: model.error_message,
            metadata: model.metadata,
            paid_at: model.paid_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl Order {
    /// Non-empty iff `status` is one of `{email_sent, delivered}` (§3 invariant).
    pub fn artifact_is_present(&self) -> bool {
        self.iccid.is_some() && self.activation_code.is_some() && self.provider_used.is_some()
    }

    pub async fn create(db: &DatabaseConnection, req: CreateOrderRequest) -> Result<Order> {
        let order = orders::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_number: Set(req.order_number),
            correlation_id: Set(req.correlation_id),
            sales_channel: Set(req.sales_channel),
            external_order_id: Set(req.external_order_id),
            customer_email: Set(req.customer_email),
            customer_name: Set(req.customer_name),
            customer_phone: Set(req.customer_phone),
            product_id: Set(req.product_id),
            provider_sku: Set(req.provider_sku),
            quantity: Set(req.quantity),
            amount: Set(req.amount),
            currency: Set(req.currency),
            status: Set(OrderStatus::PaymentReceived.as_str().to_string()),
            payment_reference: Set(req.payment_reference),
            qr_code_url: Set(None),
            iccid: Set(None),
            activation_code: Set(None),
            provider_used: Set(None),
            error_message: Set(None),
            metadata: Set(req.metadata),
            paid_at: Set(req.paid_at),
            created_at: Set(chrono::Utc::now().naive_utc()),
            updated_at: Set(chrono::Utc::now().naive_utc()),
        };

        Ok(Order::from(order.insert(db).await?))
    }

    pub async fn find_by_id(db: &DatabaseConnection, id: Uuid) -> Result<Option<Order>> {
        Ok(Orders::find_by_id(id).one(db).await?.map(Order::from))
    }

    pub async fn find_by_order_number(db: &DatabaseConnection, order_number: &str) -> Result<Option<Order>> {
        Ok(Orders::find()
            .filter(orders::Column::OrderNumber.eq(order_number))
            .one(db)
            .await?
            .map(Order::from))
    }

    pub async fn find_by_correlation_id(db: &DatabaseConnection, correlation_id: Uuid) -> Result<Option<Order>> {
        Ok(Orders::find()
            .filter(orders::Column::CorrelationId.eq(correlation_id))
            .one(db)
            .await?
            .map(Order::from))
    }

    /// Dedup key for inbound payment webhooks: a re-delivered webhook for the
    /// same channel order must not create a second order.
    pub async fn find_by_sales_channel_external_order_id(
        db: &DatabaseConnection,
        sales_channel: &str,
        external_order_id: &str,
    ) -> Result<Option<Order>> {
        Ok(Orders::find()
            .filter(orders::Column::SalesChannel.eq(sales_channel))
            .filter(orders::Column::ExternalOrderId.eq(external_order_id))
            .one(db)
            .await?
            .map(Order::from))
    }

    /// Orders stuck in `fulfillment_started` older than `older_than_secs`, for the
    /// reconciliation sweep (C16).
    pub async fn find_stuck_in_fulfillment(
        db: &DatabaseConnection,
        older_than_secs: i64,
    ) -> Result<Vec<Order>> {
        let cutoff = chrono::Utc::now().naive_utc() - chrono::Duration::seconds(older_than_secs);
        Ok(Orders::find()
            .filter(orders::Column::Status.eq(OrderStatus::FulfillmentStarted.as_str()))
            .filter(orders::Column::UpdatedAt.lt(cutoff))
            .all(db)
            .await?
            .into_iter()
            .map(Order::from)
            .collect())
    }

    /// Merge `patch` additively into `metadata`, never dropping existing keys.
    pub async fn merge_metadata(
        db: &DatabaseConnection,
        id: Uuid,
        patch: serde_json::Value,
    ) -> Result<Order> {
        let model = Orders::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| Error::string("Order not found"))?;

        let mut metadata = model.metadata.clone();
        if let (Some(existing), Some(incoming)) = (metadata.as_object_mut(), patch.as_object()) {
            for (key, value) in incoming {
                existing.insert(key.clone(), value.clone());
            }
        }

        let mut active: orders::ActiveModel = model.into();
        active.metadata = Set(metadata);
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        Ok(Order::from(active.update(db).await?))
    }

    pub async fn set_esim_artifact(
        db: &DatabaseConnection,
        id: Uuid,
        qr_code_url: Option<String>,
        iccid: String,
        activation_code: String,
        provider_used: String,
    ) -> Result<Order> {
        let model = Orders::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| Error::string("Order not found"))?;

        let mut active: orders::ActiveModel = model.into();
        active.qr_code_url = Set(qr_code_url);
        active.iccid = Set(Some(iccid));
        active.activation_code = Set(Some(activation_code));
        active.provider_used = Set(Some(provider_used));
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        Ok(Order::from(active.update(db).await?))
    }

    pub async fn set_error_message(db: &DatabaseConnection, id: Uuid, message: String) -> Result<Order> {
        let model = Orders::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| Error::string("Order not found"))?;

        let mut active: orders::ActiveModel = model.into();
        active.error_message = Set(Some(message));
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        Ok(Order::from(active.update(db).await?))
    }

    /// Persists a status transition, optionally merging a metadata patch in
    /// the same write. Used by the state machine's injected `persist_fn`.
    pub async fn set_status(
        db: &DatabaseConnection,
        id: Uuid,
        status: OrderStatus,
        metadata_patch: Option<serde_json::Value>,
    ) -> Result<Order> {
        let model = Orders::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| Error::string("Order not found"))?;

        let mut metadata = model.metadata.clone();
        if let Some(patch) = metadata_patch {
            if let (Some(existing), Some(incoming)) = (metadata.as_object_mut(), patch.as_object()) {
                for (key, value) in incoming {
                    existing.insert(key.clone(), value.clone());
                }
            }
        }

        let mut active: orders::ActiveModel = model.into();
        active.status = Set(status.as_str().to_string());
        active.metadata = Set(metadata);
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        Ok(Order::from(active.update(db).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_dag_is_legal() {
        assert!(OrderStatus::PaymentReceived.can_transition_to(OrderStatus::FulfillmentStarted));
        assert!(OrderStatus::FulfillmentStarted.can_transition_to(OrderStatus::ProviderConfirmed));
        assert!(OrderStatus::ProviderConfirmed.can_transition_to(OrderStatus::EmailSent));
        assert!(OrderStatus::EmailSent.can_transition_to(OrderStatus::Delivered));
    }

    #[test]
    fn email_failure_path_skips_email_sent() {
        assert!(OrderStatus::ProviderConfirmed.can_transition_to(OrderStatus::Delivered));
    }

    #[test]
    fn failure_branches_reachable_from_any_non_terminal_state() {
        for state in [
            OrderStatus::PaymentReceived,
            OrderStatus::FulfillmentStarted,
            OrderStatus::ProviderConfirmed,
            OrderStatus::EmailSent,
        ] {
            assert!(state.can_transition_to(OrderStatus::ProviderFailed));
            assert!(state.can_transition_to(OrderStatus::PendingManualFulfillment));
        }
    }

    #[test]
    fn terminal_states_have_no_outgoing_edges() {
        for state in [
            OrderStatus::Delivered,
            OrderStatus::ProviderFailed,
            OrderStatus::PendingManualFulfillment,
        ] {
            assert!(state.is_terminal());
            assert!(!state.can_transition_to(OrderStatus::Delivered));
        }
    }

    #[test]
    fn invalid_jump_is_rejected() {
        assert!(!OrderStatus::PaymentReceived.can_transition_to(OrderStatus::Delivered));
    }
}
