use loco_rs::prelude::*;
use sea_orm::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::_entities::{inquiries, prelude::*};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InquiryStatus {
    New,
    InProgress,
    Resolved,
    Closed,
}

impl InquiryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "in_progress" => Self::InProgress,
            "resolved" => Self::Resolved,
            "closed" => Self::Closed,
            _ => Self::New,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InquiryPriority {
    Low,
    Normal,
    High,
    Urgent,
}

impl InquiryPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "low" => Self::Low,
            "high" => Self::High,
            "urgent" => Self::Urgent,
            _ => Self::Normal,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inquiry {
    pub id: Uuid,
    pub channel: String,
    pub external_id: String,
    pub status: InquiryStatus,
    pub priority: InquiryPriority,
    pub subject: Option<String>,
    pub content: String,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub assigned_to: Option<String>,
    pub linked_order_id: Option<Uuid>,
    pub first_response_at: Option<chrono::NaiveDateTime>,
    pub resolved_at: Option<chrono::NaiveDateTime>,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInquiryRequest {
    pub channel: String,
    pub external_id: String,
    pub subject: Option<String>,
    pub content: String,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
}

impl From<inquiries::Model> for Inquiry {
    fn from(model: inquiries::Model) -> Self {
        Self {
            id: model.id,
            channel: model.channel,
            external_id: model.external_id,
            status: InquiryStatus::parse(&model.status),
            priority: InquiryPriority::parse(&model.priority),
            subject: model.subject,
            content: model.content,
            customer_name: model.customer_name,
            customer_email: model.customer_email,
            assigned_to: model.assigned_to,
            linked_order_id: model.linked_order_id,
            first_response_at: model.first_response_at,
            resolved_at: model.resolved_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl Inquiry {
    /// Inbound inquiries are deduplicated on `(channel, external_id)` so a
    /// re-delivered webhook never creates a duplicate ticket.
    pub async fn find_by_channel_external_id(
        db: &DatabaseConnection,
        channel: &str,
        external_id: &str,
    ) -> Result<Option<Inquiry>> {
        Ok(Inquiries::find()
            .filter(inquiries::Column::Channel.eq(channel))
            .filter(inquiries::Column::ExternalId.eq(external_id))
            .one(db)
            .await?
            .map(Inquiry::from))
    }

    pub async fn find_by_id(db: &DatabaseConnection, id: Uuid) -> Result<Option<Inquiry>> {
        Ok(Inquiries::find_by_id(id).one(db).await?.map(Inquiry::from))
    }

    pub async fn create(db: &DatabaseConnection, req: CreateInquiryRequest) -> Result<Inquiry> {
        let now = chrono::Utc::now().naive_utc();
        let active = inquiries::ActiveModel {
            id: Set(Uuid::new_v4()),
            channel: Set(req.channel),
            external_id: Set(req.external_id),
            status: Set(InquiryStatus::New.as_str().to_string()),
            priority: Set(InquiryPriority::Normal.as_str().to_string()),
            subject: Set(req.subject),
            content: Set(req.content),
            customer_name: Set(req.customer_name),
            customer_email: Set(req.customer_email),
            assigned_to: Set(None),
            linked_order_id: Set(None),
            first_response_at: Set(None),
            resolved_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(Inquiry::from(active.insert(db).await?))
    }

    pub async fn list(db: &DatabaseConnection, condition: Condition) -> Result<Vec<Inquiry>> {
        Ok(Inquiries::find()
            .filter(condition)
            .order_by_desc(inquiries::Column::CreatedAt)
            .all(db)
            .await?
            .into_iter()
            .map(Inquiry::from)
            .collect())
    }

    /// Paged variant used by C11's `List(filter)`, with an explicit sort
    /// column and offset/limit.
    pub async fn page(
        db: &DatabaseConnection,
        condition: Condition,
        sort: inquiries::Column,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<Inquiry>, u64)> {
        let query = Inquiries::find().filter(condition).order_by_desc(sort);
        let total = query.clone().count(db).await?;
        let rows = query.limit(limit).offset(offset).all(db).await?;
        Ok((rows.into_iter().map(Inquiry::from).collect(), total))
    }

    pub async fn update_status(db: &DatabaseConnection, id: Uuid, status: InquiryStatus) -> Result<Inquiry> {
        let model = Inquiries::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| Error::string("Inquiry not found"))?;

        let mut active: inquiries::ActiveModel = model.into();
        active.status = Set(status.as_str().to_string());
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        if status == InquiryStatus::Resolved || status == InquiryStatus::Closed {
            active.resolved_at = Set(Some(chrono::Utc::now().naive_utc()));
        }
        Ok(Inquiry::from(active.update(db).await?))
    }

    pub async fn set_priority(db: &DatabaseConnection, id: Uuid, priority: InquiryPriority) -> Result<Inquiry> {
        let model = Inquiries::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| Error::string("Inquiry not found"))?;

        let mut active: inquiries::ActiveModel = model.into();
        active.priority = Set(priority.as_str().to_string());
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        Ok(Inquiry::from(active.update(db).await?))
    }

    pub async fn assign(db: &DatabaseConnection, id: Uuid, assignee: String) -> Result<Inquiry> {
        let model = Inquiries::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| Error::string("Inquiry not found"))?;

        let mut active: inquiries::ActiveModel = model.into();
        active.assigned_to = Set(Some(assignee));
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        Ok(Inquiry::from(active.update(db).await?))
    }

    pub async fn link_order(db: &DatabaseConnection, id: Uuid, order_id: Uuid) -> Result<Inquiry> {
        let model = Inquiries::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| Error::string("Inquiry not found"))?;

        let mut active: inquiries::ActiveModel = model.into();
        active.linked_order_id = Set(Some(order_id));
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        Ok(Inquiry::from(active.update(db).await?))
    }

    pub async fn mark_first_response(db: &DatabaseConnection, id: Uuid) -> Result<Inquiry> {
        let model = Inquiries::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| Error::string("Inquiry not found"))?;

        if model.first_response_at.is_some() {
            return Ok(Inquiry::from(model));
        }

        let mut active: inquiries::ActiveModel = model.into();
        active.first_response_at = Set(Some(chrono::Utc::now().naive_utc()));
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        Ok(Inquiry::from(active.update(db).await?))
    }
}
