use loco_rs::prelude::*;
use sea_orm::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::_entities::{prelude::*, product_mappings};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductMapping {
    pub id: Uuid,
    pub external_product_id: String,
    pub sales_channel: String,
    pub product_id: String,
    pub provider_sku: Option<String>,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

impl From<product_mappings::Model> for ProductMapping {
    fn from(model: product_mappings::Model) -> Self {
        Self {
            id: model.id,
            external_product_id: model.external_product_id,
            sales_channel: model.sales_channel,
            product_id: model.product_id,
            provider_sku: model.provider_sku,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl ProductMapping {
    /// The C12 lookup: given a channel's own product identifier, find the internal
    /// product (and, if pinned, the provider SKU to use instead of cascade order).
    pub async fn resolve(
        db: &DatabaseConnection,
        sales_channel: &str,
        external_product_id: &str,
    ) -> Result<Option<ProductMapping>> {
        Ok(ProductMappings::find()
            .filter(product_mappings::Column::SalesChannel.eq(sales_channel))
            .filter(product_mappings::Column::ExternalProductId.eq(external_product_id))
            .one(db)
            .await?
            .map(ProductMapping::from))
    }

    pub async fn upsert(
        db: &DatabaseConnection,
        sales_channel: &str,
        external_product_id: &str,
        product_id: &str,
        provider_sku: Option<String>,
    ) -> Result<ProductMapping> {
        if let Some(existing) = ProductMappings::find()
            .filter(product_mappings::Column::SalesChannel.eq(sales_channel))
            .filter(product_mappings::Column::ExternalProductId.eq(external_product_id))
            .one(db)
            .await?
        {
            let mut active: product_mappings::ActiveModel = existing.into();
            active.product_id = Set(product_id.to_string());
            active.provider_sku = Set(provider_sku);
            active.updated_at = Set(chrono::Utc::now().naive_utc());
            return Ok(ProductMapping::from(active.update(db).await?));
        }

        let now = chrono::Utc::now().naive_utc();
        let active = product_mappings::ActiveModel {
            id: Set(Uuid::new_v4()),
            external_product_id: Set(external_product_id.to_string()),
            sales_channel: Set(sales_channel.to_string()),
            product_id: Set(product_id.to_string()),
            provider_sku: Set(provider_sku),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(ProductMapping::from(active.insert(db).await?))
    }
}
