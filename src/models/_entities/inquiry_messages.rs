use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "inquiry_messages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub inquiry_id: Uuid,
    pub direction: String,
    pub sender_type: String,
    pub content: String,
    pub template_id: Option<String>,
    pub delivery_status: String,
    pub external_message_id: Option<String>,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::inquiries::Entity",
        from = "Column::InquiryId",
        to = "super::inquiries::Column::Id"
    )]
    Inquiries,
}

impl Related<super::inquiries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Inquiries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
