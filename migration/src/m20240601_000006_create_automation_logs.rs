use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AutomationLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AutomationLogs::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .extra("DEFAULT gen_random_uuid()".to_string()),
                    )
                    .col(ColumnDef::new(AutomationLogs::CorrelationId).uuid().not_null())
                    .col(ColumnDef::new(AutomationLogs::StepName).string().not_null())
                    .col(ColumnDef::new(AutomationLogs::Status).string().not_null())
                    .col(ColumnDef::new(AutomationLogs::DurationMs).big_integer())
                    .col(ColumnDef::new(AutomationLogs::Metadata).json().not_null().default("{}"))
                    .col(ColumnDef::new(AutomationLogs::CreatedAt).timestamp().not_null().extra("DEFAULT CURRENT_TIMESTAMP".to_string()))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_automation_logs_correlation_id")
                    .table(AutomationLogs::Table)
                    .col(AutomationLogs::CorrelationId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AutomationLogs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum AutomationLogs {
    Table,
    Id,
    CorrelationId,
    StepName,
    Status,
    DurationMs,
    Metadata,
    CreatedAt,
}
