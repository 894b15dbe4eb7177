use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "inquiries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub channel: String,
    pub external_id: String,
    pub status: String,
    pub priority: String,
    pub subject: Option<String>,
    pub content: String,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub assigned_to: Option<String>,
    pub linked_order_id: Option<Uuid>,
    pub first_response_at: Option<DateTime>,
    pub resolved_at: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::inquiry_messages::Entity")]
    InquiryMessages,
}

impl Related<super::inquiry_messages::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InquiryMessages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
