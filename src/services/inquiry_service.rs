use std::collections::HashMap;
use std::sync::Arc;

use sea_orm::{ColumnTrait, Condition, DatabaseConnection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::_entities::inquiries;
use crate::models::inquiry::{CreateInquiryRequest, Inquiry, InquiryPriority, InquiryStatus};
use crate::models::inquiry_message::{InquiryMessage, MessageDirection, SenderType};

use super::adapter::{FetchInquiriesOptions, InquiryChannelAdapter};
use super::error::DomainError;
use super::filter_query::{self, Comparison};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InquiryListFilter {
    pub channel: Option<String>,
    pub status: Option<Vec<InquiryStatus>>,
    pub priority: Option<InquiryPriority>,
    pub assigned_to: Option<String>,
    /// Free-text search over `{subject, content, customer_name}`.
    pub search: Option<String>,
    /// Raw `=`/`~`/`&&`/`||` predicate string (§6), composed with the
    /// structured fields above via AND.
    pub query: Option<String>,
    pub limit: u64,
    pub offset: u64,
    pub sort: InquirySort,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InquirySort {
    #[default]
    Created,
    Updated,
    Priority,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InquiryPage {
    pub items: Vec<Inquiry>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InquiryUpdatePatch {
    pub status: Option<InquiryStatus>,
    pub priority: Option<InquiryPriority>,
    pub assigned_to: Option<String>,
    pub linked_order_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncOutcome {
    pub synced: u32,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InquiryMetrics {
    pub open: u64,
    pub resolved: u64,
    pub avg_first_response_minutes: Option<u64>,
    pub by_channel: HashMap<String, u64>,
    pub by_status: HashMap<String, u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelHealthReport {
    pub slug: String,
    pub display_name: String,
    pub enabled: bool,
    pub healthy: bool,
    pub error: Option<String>,
}

/// Resolves the persisted filter-query field names C11 accepts. Kept
/// separate from `inquiries::Column` naming (e.g. `assignee` vs the
/// `assigned_to` column) since the predicate language is an external
/// contract (§6) and the schema is free to evolve.
fn resolve_inquiry_field(field: &str, op: Comparison, value: &str) -> Result<Condition, DomainError> {
    let column = match field {
        "channel" => inquiries::Column::Channel,
        "status" => inquiries::Column::Status,
        "priority" => inquiries::Column::Priority,
        "assignee" | "assigned_to" => inquiries::Column::AssignedTo,
        "subject" => inquiries::Column::Subject,
        "content" => inquiries::Column::Content,
        "customer_name" => inquiries::Column::CustomerName,
        "customer_email" => inquiries::Column::CustomerEmail,
        other => return Err(DomainError::Validation(format!("unknown filter field '{other}'"))),
    };
    Ok(match op {
        Comparison::Eq => Condition::all().add(column.eq(value)),
        Comparison::Contains => Condition::all().add(column.contains(value)),
    })
}

/// Cross-channel orchestration (§4.11). Holds the registered channel
/// adapters and dispatches reads/writes to them by slug.
pub struct InquiryService {
    db: DatabaseConnection,
    channels: Vec<Arc<dyn InquiryChannelAdapter>>,
}

impl InquiryService {
    pub fn new(db: DatabaseConnection, channels: Vec<Arc<dyn InquiryChannelAdapter>>) -> Self {
        Self { db, channels }
    }

    fn find_channel(&self, slug: &str) -> Result<&Arc<dyn InquiryChannelAdapter>, DomainError> {
        self.channels
            .iter()
            .find(|c| c.slug() == slug)
            .ok_or_else(|| DomainError::Configuration(format!("no channel adapter registered for '{slug}'")))
    }

    pub async fn list(&self, filter: InquiryListFilter) -> Result<InquiryPage, DomainError> {
        let mut condition = Condition::all();

        if let Some(channel) = &filter.channel {
            condition = condition.add(inquiries::Column::Channel.eq(channel.as_str()));
        }
        if let Some(statuses) = &filter.status {
            condition = condition.add(inquiries::Column::Status.is_in(statuses.iter().map(InquiryStatus::as_str)));
        }
        if let Some(priority) = filter.priority {
            condition = condition.add(inquiries::Column::Priority.eq(priority.as_str()));
        }
        if let Some(assigned_to) = &filter.assigned_to {
            condition = condition.add(inquiries::Column::AssignedTo.eq(assigned_to.as_str()));
        }
        if let Some(search) = &filter.search {
            condition = condition.add(
                Condition::any()
                    .add(inquiries::Column::Subject.contains(search))
                    .add(inquiries::Column::Content.contains(search))
                    .add(inquiries::Column::CustomerName.contains(search)),
            );
        }
        if let Some(query) = &filter.query {
            let predicate = filter_query::parse(query)?;
            condition = condition.add(filter_query::compile(&predicate, &resolve_inquiry_field)?);
        }

        let sort_column = match filter.sort {
            InquirySort::Created => inquiries::Column::CreatedAt,
            InquirySort::Updated => inquiries::Column::UpdatedAt,
            InquirySort::Priority => inquiries::Column::Priority,
        };

        let (items, total) = Inquiry::page(&self.db, condition, sort_column, filter.limit, filter.offset)
            .await
            .map_err(|e| DomainError::Persistence(e.to_string()))?;

        Ok(InquiryPage {
            items,
            total,
            limit: filter.limit,
            offset: filter.offset,
        })
    }

    pub async fn get(&self, id: Uuid) -> Result<Inquiry, DomainError> {
        Inquiry::find_by_id(&self.db, id)
            .await
            .map_err(|e| DomainError::Persistence(e.to_string()))?
            .ok_or_else(|| DomainError::InquiryNotFound(id.to_string()))
    }

    pub async fn get_by_external(&self, channel: &str, external_id: &str) -> Result<Inquiry, DomainError> {
        Inquiry::find_by_channel_external_id(&self.db, channel, external_id)
            .await
            .map_err(|e| DomainError::Persistence(e.to_string()))?
            .ok_or_else(|| DomainError::InquiryNotFound(format!("{channel}/{external_id}")))
    }

    pub async fn get_messages(&self, inquiry_id: Uuid) -> Result<Vec<InquiryMessage>, DomainError> {
        InquiryMessage::for_inquiry(&self.db, inquiry_id)
            .await
            .map_err(|e| DomainError::Persistence(e.to_string()))
    }

    pub async fn create(&self, req: CreateInquiryRequest) -> Result<Inquiry, DomainError> {
        let seed_content = req.content.clone();
        let inquiry = Inquiry::create(&self.db, req)
            .await
            .map_err(|e| DomainError::Persistence(e.to_string()))?;

        InquiryMessage::append(
            &self.db,
            inquiry.id,
            MessageDirection::Inbound,
            SenderType::Customer,
            seed_content,
            None,
            None,
        )
        .await
        .map_err(|e| DomainError::Persistence(e.to_string()))?;

        Ok(inquiry)
    }

    pub async fn update(&self, id: Uuid, patch: InquiryUpdatePatch) -> Result<Inquiry, DomainError> {
        let mut inquiry = self.get(id).await?;

        if let Some(status) = patch.status {
            inquiry = Inquiry::update_status(&self.db, id, status)
                .await
                .map_err(|e| DomainError::Persistence(e.to_string()))?;
        }
        if let Some(assigned_to) = patch.assigned_to {
            inquiry = Inquiry::assign(&self.db, id, assigned_to)
                .await
                .map_err(|e| DomainError::Persistence(e.to_string()))?;
        }
        if let Some(linked_order_id) = patch.linked_order_id {
            inquiry = Inquiry::link_order(&self.db, id, linked_order_id)
                .await
                .map_err(|e| DomainError::Persistence(e.to_string()))?;
        }
        if let Some(priority) = patch.priority {
            inquiry = Inquiry::set_priority(&self.db, id, priority)
                .await
                .map_err(|e| DomainError::Persistence(e.to_string()))?;
        }

        Ok(inquiry)
    }

    pub async fn send_reply(&self, id: Uuid, content: &str, agent_name: Option<&str>) -> Result<(), DomainError> {
        let inquiry = self.get(id).await?;
        let channel = self.find_channel(&inquiry.channel)?;

        let reply = channel.send_reply(&inquiry.external_id, content).await?;

        let message = InquiryMessage::append(
            &self.db,
            id,
            MessageDirection::Outbound,
            if agent_name.is_some() { SenderType::Agent } else { SenderType::System },
            content.to_string(),
            None,
            reply.external_message_id.clone(),
        )
        .await
        .map_err(|e| DomainError::Persistence(e.to_string()))?;

        if reply.success {
            InquiryMessage::mark_delivered(&self.db, message.id).await
        } else {
            InquiryMessage::mark_failed(&self.db, message.id).await
        }
        .map_err(|e| DomainError::Persistence(e.to_string()))?;

        Inquiry::update_status(&self.db, id, InquiryStatus::InProgress)
            .await
            .map_err(|e| DomainError::Persistence(e.to_string()))?;
        Inquiry::mark_first_response(&self.db, id)
            .await
            .map_err(|e| DomainError::Persistence(e.to_string()))?;

        Ok(())
    }

    pub async fn sync_from_all_channels(&self) -> SyncOutcome {
        let mut synced = 0;
        let mut errors = Vec::new();

        for channel in &self.channels {
            if !channel.is_enabled() {
                continue;
            }

            let fetched = channel.fetch_inquiries(&FetchInquiriesOptions { include_replied: false }).await;
            match fetched {
                Ok(inquiries) => {
                    for external in inquiries {
                        let existing = Inquiry::find_by_channel_external_id(&self.db, channel.slug(), &external.external_id).await;
                        match existing {
                            Ok(Some(_)) => continue,
                            Ok(None) => {
                                let created = Inquiry::create(
                                    &self.db,
                                    CreateInquiryRequest {
                                        channel: channel.slug().to_string(),
                                        external_id: external.external_id.clone(),
                                        subject: external.subject.clone(),
                                        content: external.content.clone(),
                                        customer_name: external.customer_name.clone(),
                                        customer_email: external.customer_email.clone(),
                                    },
                                )
                                .await;
                                match created {
                                    Ok(inquiry) => {
                                        let _ = InquiryMessage::append(
                                            &self.db,
                                            inquiry.id,
                                            MessageDirection::Inbound,
                                            SenderType::Customer,
                                            external.content,
                                            None,
                                            None,
                                        )
                                        .await;
                                        synced += 1;
                                    }
                                    Err(e) => errors.push(format!("{}: {e}", channel.slug())),
                                }
                            }
                            Err(e) => errors.push(format!("{}: {e}", channel.slug())),
                        }
                    }
                }
                Err(e) => errors.push(format!("{}: {e}", channel.slug())),
            }
        }

        SyncOutcome { synced, errors }
    }

    pub async fn metrics(&self) -> Result<InquiryMetrics, DomainError> {
        let all = Inquiry::list(&self.db, Condition::all())
            .await
            .map_err(|e| DomainError::Persistence(e.to_string()))?;

        let mut by_channel: HashMap<String, u64> = HashMap::new();
        let mut by_status: HashMap<String, u64> = HashMap::new();
        let mut open = 0u64;
        let mut resolved = 0u64;
        let mut response_minutes_total: i64 = 0;
        let mut response_minutes_count: i64 = 0;

        for inquiry in &all {
            *by_channel.entry(inquiry.channel.clone()).or_insert(0) += 1;
            *by_status.entry(inquiry.status.as_str().to_string()).or_insert(0) += 1;

            match inquiry.status {
                InquiryStatus::Resolved | InquiryStatus::Closed => resolved += 1,
                _ => open += 1,
            }

            if let Some(first_response_at) = inquiry.first_response_at {
                let minutes = (first_response_at - inquiry.created_at).num_minutes();
                response_minutes_total += minutes;
                response_minutes_count += 1;
            }
        }

        let avg_first_response_minutes = if response_minutes_count > 0 {
            Some((response_minutes_total as f64 / response_minutes_count as f64).round() as u64)
        } else {
            None
        };

        Ok(InquiryMetrics {
            open,
            resolved,
            avg_first_response_minutes,
            by_channel,
            by_status,
        })
    }

    pub async fn channel_health(&self) -> Vec<ChannelHealthReport> {
        let mut reports = Vec::with_capacity(self.channels.len());
        for channel in &self.channels {
            let enabled = channel.is_enabled();
            let (healthy, error) = if enabled {
                channel.health_check().await
            } else {
                (false, Some("not configured".to_string()))
            };
            reports.push(ChannelHealthReport {
                slug: channel.slug().to_string(),
                display_name: channel.display_name().to_string(),
                enabled,
                healthy,
                error,
            });
        }
        reports
    }
}
