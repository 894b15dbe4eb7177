pub use sea_orm_migration::prelude::*;

mod m20240601_000001_create_orders;
mod m20240601_000002_create_circuit_breaker_states;
mod m20240601_000003_create_product_mappings;
mod m20240601_000004_create_inquiries;
mod m20240601_000005_create_inquiry_messages;
mod m20240601_000006_create_automation_logs;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_create_orders::Migration),
            Box::new(m20240601_000002_create_circuit_breaker_states::Migration),
            Box::new(m20240601_000003_create_product_mappings::Migration),
            Box::new(m20240601_000004_create_inquiries::Migration),
            Box::new(m20240601_000005_create_inquiry_messages::Migration),
            Box::new(m20240601_000006_create_automation_logs::Migration),
        ]
    }
}
