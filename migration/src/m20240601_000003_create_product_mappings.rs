use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ProductMappings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProductMappings::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .extra("DEFAULT gen_random_uuid()".to_string()),
                    )
                    .col(ColumnDef::new(ProductMappings::ExternalProductId).string().not_null())
                    .col(ColumnDef::new(ProductMappings::SalesChannel).string().not_null())
                    .col(ColumnDef::new(ProductMappings::ProductId).string().not_null())
                    .col(ColumnDef::new(ProductMappings::ProviderSku).string())
                    .col(ColumnDef::new(ProductMappings::CreatedAt).timestamp().not_null().extra("DEFAULT CURRENT_TIMESTAMP".to_string()))
                    .col(ColumnDef::new(ProductMappings::UpdatedAt).timestamp().not_null().extra("DEFAULT CURRENT_TIMESTAMP".to_string()))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_product_mappings_external")
                    .table(ProductMappings::Table)
                    .col(ProductMappings::SalesChannel)
                    .col(ProductMappings::ExternalProductId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProductMappings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum ProductMappings {
    Table,
    Id,
    ExternalProductId,
    SalesChannel,
    ProductId,
    ProviderSku,
    CreatedAt,
    UpdatedAt,
}
