use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub order_number: String,
    pub correlation_id: Uuid,
    pub sales_channel: String,
    pub external_order_id: String,
    pub customer_email: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub product_id: String,
    pub provider_sku: Option<String>,
    pub quantity: i32,
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    pub payment_reference: Option<String>,
    pub qr_code_url: Option<String>,
    pub iccid: Option<String>,
    pub activation_code: Option<String>,
    pub provider_used: Option<String>,
    pub error_message: Option<String>,
    pub metadata: Json,
    pub paid_at: DateTime,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
