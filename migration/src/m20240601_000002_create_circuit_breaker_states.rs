use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CircuitBreakerStates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CircuitBreakerStates::ProviderSlug)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CircuitBreakerStates::Phase).string().not_null().default("closed"))
                    .col(ColumnDef::new(CircuitBreakerStates::ConsecutiveFailureCount).integer().not_null().default(0))
                    .col(ColumnDef::new(CircuitBreakerStates::ConsecutiveSuccessCount).integer().not_null().default(0))
                    .col(ColumnDef::new(CircuitBreakerStates::LastFailureTime).timestamp())
                    .col(ColumnDef::new(CircuitBreakerStates::LastStateChange).timestamp().not_null().extra("DEFAULT CURRENT_TIMESTAMP".to_string()))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CircuitBreakerStates::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum CircuitBreakerStates {
    Table,
    ProviderSlug,
    Phase,
    ConsecutiveFailureCount,
    ConsecutiveSuccessCount,
    LastFailureTime,
    LastStateChange,
}
