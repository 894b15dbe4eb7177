use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Orders::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .extra("DEFAULT gen_random_uuid()".to_string()),
                    )
                    .col(ColumnDef::new(Orders::OrderNumber).string().not_null())
                    .col(ColumnDef::new(Orders::CorrelationId).uuid().not_null())
                    .col(ColumnDef::new(Orders::SalesChannel).string().not_null())
                    .col(ColumnDef::new(Orders::ExternalOrderId).string().not_null())
                    .col(ColumnDef::new(Orders::CustomerEmail).string().not_null())
                    .col(ColumnDef::new(Orders::CustomerName).string())
                    .col(ColumnDef::new(Orders::CustomerPhone).string())
                    .col(ColumnDef::new(Orders::ProductId).string().not_null())
                    .col(ColumnDef::new(Orders::ProviderSku).string())
                    .col(ColumnDef::new(Orders::Quantity).integer().not_null().default(1))
                    .col(ColumnDef::new(Orders::Amount).decimal().not_null())
                    .col(ColumnDef::new(Orders::Currency).string().not_null().default("KRW"))
                    .col(ColumnDef::new(Orders::Status).string().not_null().default("payment_received"))
                    .col(ColumnDef::new(Orders::PaymentReference).string())
                    .col(ColumnDef::new(Orders::QrCodeUrl).text())
                    .col(ColumnDef::new(Orders::Iccid).string())
                    .col(ColumnDef::new(Orders::ActivationCode).text())
                    .col(ColumnDef::new(Orders::ProviderUsed).string())
                    .col(ColumnDef::new(Orders::ErrorMessage).text())
                    .col(ColumnDef::new(Orders::Metadata).json().not_null().default("{}"))
                    .col(ColumnDef::new(Orders::PaidAt).timestamp().not_null())
                    .col(ColumnDef::new(Orders::CreatedAt).timestamp().not_null().extra("DEFAULT CURRENT_TIMESTAMP".to_string()))
                    .col(ColumnDef::new(Orders::UpdatedAt).timestamp().not_null().extra("DEFAULT CURRENT_TIMESTAMP".to_string()))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_order_number")
                    .table(Orders::Table)
                    .col(Orders::OrderNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_sales_channel_external_order_id")
                    .table(Orders::Table)
                    .col(Orders::SalesChannel)
                    .col(Orders::ExternalOrderId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_correlation_id")
                    .table(Orders::Table)
                    .col(Orders::CorrelationId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_status")
                    .table(Orders::Table)
                    .col(Orders::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Orders {
    Table,
    Id,
    OrderNumber,
    CorrelationId,
    SalesChannel,
    ExternalOrderId,
    CustomerEmail,
    CustomerName,
    CustomerPhone,
    ProductId,
    ProviderSku,
    Quantity,
    Amount,
    Currency,
    Status,
    PaymentReference,
    QrCodeUrl,
    Iccid,
    ActivationCode,
    ProviderUsed,
    ErrorMessage,
    Metadata,
    PaidAt,
    CreatedAt,
    UpdatedAt,
}
