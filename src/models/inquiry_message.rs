use loco_rs::prelude::*;
use sea_orm::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::_entities::{inquiry_messages, prelude::*};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageDirection {
    Inbound,
    Outbound,
}

impl MessageDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderType {
    Customer,
    Agent,
    System,
}

impl SenderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Agent => "agent",
            Self::System => "system",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InquiryMessage {
    pub id: Uuid,
    pub inquiry_id: Uuid,
    pub direction: String,
    pub sender_type: String,
    pub content: String,
    pub template_id: Option<String>,
    pub delivery_status: String,
    pub external_message_id: Option<String>,
    pub created_at: chrono::NaiveDateTime,
}

impl From<inquiry_messages::Model> for InquiryMessage {
    fn from(model: inquiry_messages::Model) -> Self {
        Self {
            id: model.id,
            inquiry_id: model.inquiry_id,
            direction: model.direction,
            sender_type: model.sender_type,
            content: model.content,
            template_id: model.template_id,
            delivery_status: model.delivery_status,
            external_message_id: model.external_message_id,
            created_at: model.created_at,
        }
    }
}

impl InquiryMessage {
    pub async fn append(
        db: &DatabaseConnection,
        inquiry_id: Uuid,
        direction: MessageDirection,
        sender_type: SenderType,
        content: String,
        template_id: Option<String>,
        external_message_id: Option<String>,
    ) -> Result<InquiryMessage> {
        let active = inquiry_messages::ActiveModel {
            id: Set(Uuid::new_v4()),
            inquiry_id: Set(inquiry_id),
            direction: Set(direction.as_str().to_string()),
            sender_type: Set(sender_type.as_str().to_string()),
            content: Set(content),
            template_id: Set(template_id),
            delivery_status: Set("pending".to_string()),
            external_message_id: Set(external_message_id),
            created_at: Set(chrono::Utc::now().naive_utc()),
        };
        Ok(InquiryMessage::from(active.insert(db).await?))
    }

    pub async fn mark_delivered(db: &DatabaseConnection, id: Uuid) -> Result<InquiryMessage> {
        let model = InquiryMessages::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| Error::string("InquiryMessage not found"))?;

        let mut active: inquiry_messages::ActiveModel = model.into();
        active.delivery_status = Set("delivered".to_string());
        Ok(InquiryMessage::from(active.update(db).await?))
    }

    pub async fn mark_failed(db: &DatabaseConnection, id: Uuid) -> Result<InquiryMessage> {
        let model = InquiryMessages::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| Error::string("InquiryMessage not found"))?;

        let mut active: inquiry_messages::ActiveModel = model.into();
        active.delivery_status = Set("failed".to_string());
        Ok(InquiryMessage::from(active.update(db).await?))
    }

    pub async fn for_inquiry(db: &DatabaseConnection, inquiry_id: Uuid) -> Result<Vec<InquiryMessage>> {
        Ok(InquiryMessages::find()
            .filter(inquiry_messages::Column::InquiryId.eq(inquiry_id))
            .order_by_asc(inquiry_messages::Column::CreatedAt)
            .all(db)
            .await?
            .into_iter()
            .map(InquiryMessage::from)
            .collect())
    }
}
