use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Inquiries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Inquiries::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .extra("DEFAULT gen_random_uuid()".to_string()),
                    )
                    .col(ColumnDef::new(Inquiries::Channel).string().not_null())
                    .col(ColumnDef::new(Inquiries::ExternalId).string().not_null())
                    .col(ColumnDef::new(Inquiries::Status).string().not_null().default("new"))
                    .col(ColumnDef::new(Inquiries::Priority).string().not_null().default("normal"))
                    .col(ColumnDef::new(Inquiries::Subject).text())
                    .col(ColumnDef::new(Inquiries::Content).text().not_null())
                    .col(ColumnDef::new(Inquiries::CustomerName).string())
                    .col(ColumnDef::new(Inquiries::CustomerEmail).string())
                    .col(ColumnDef::new(Inquiries::AssignedTo).string())
                    .col(ColumnDef::new(Inquiries::LinkedOrderId).uuid())
                    .col(ColumnDef::new(Inquiries::FirstResponseAt).timestamp())
                    .col(ColumnDef::new(Inquiries::ResolvedAt).timestamp())
                    .col(ColumnDef::new(Inquiries::CreatedAt).timestamp().not_null().extra("DEFAULT CURRENT_TIMESTAMP".to_string()))
                    .col(ColumnDef::new(Inquiries::UpdatedAt).timestamp().not_null().extra("DEFAULT CURRENT_TIMESTAMP".to_string()))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_inquiries_channel_external_id")
                    .table(Inquiries::Table)
                    .col(Inquiries::Channel)
                    .col(Inquiries::ExternalId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_inquiries_status")
                    .table(Inquiries::Table)
                    .col(Inquiries::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Inquiries::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Inquiries {
    Table,
    Id,
    Channel,
    ExternalId,
    Status,
    Priority,
    Subject,
    Content,
    CustomerName,
    CustomerEmail,
    AssignedTo,
    LinkedOrderId,
    FirstResponseAt,
    ResolvedAt,
    CreatedAt,
    UpdatedAt,
}
