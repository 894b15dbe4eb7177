use sea_orm_migration::prelude::*;

use super::m20240601_000004_create_inquiries::Inquiries;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(InquiryMessages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InquiryMessages::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .extra("DEFAULT gen_random_uuid()".to_string()),
                    )
                    .col(ColumnDef::new(InquiryMessages::InquiryId).uuid().not_null())
                    .col(ColumnDef::new(InquiryMessages::Direction).string().not_null())
                    .col(ColumnDef::new(InquiryMessages::SenderType).string().not_null())
                    .col(ColumnDef::new(InquiryMessages::Content).text().not_null())
                    .col(ColumnDef::new(InquiryMessages::TemplateId).string())
                    .col(ColumnDef::new(InquiryMessages::DeliveryStatus).string().not_null().default("pending"))
                    .col(ColumnDef::new(InquiryMessages::ExternalMessageId).string())
                    .col(ColumnDef::new(InquiryMessages::CreatedAt).timestamp().not_null().extra("DEFAULT CURRENT_TIMESTAMP".to_string()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_inquiry_messages_inquiry_id")
                            .from(InquiryMessages::Table, InquiryMessages::InquiryId)
                            .to(Inquiries::Table, Inquiries::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_inquiry_messages_inquiry_id")
                    .table(InquiryMessages::Table)
                    .col(InquiryMessages::InquiryId)
                    .col(InquiryMessages::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InquiryMessages::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum InquiryMessages {
    Table,
    Id,
    InquiryId,
    Direction,
    SenderType,
    Content,
    TemplateId,
    DeliveryStatus,
    ExternalMessageId,
    CreatedAt,
}
