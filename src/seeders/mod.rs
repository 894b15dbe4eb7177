use loco_rs::prelude::*;
use rust_decimal::Decimal;
use sea_orm::*;
use uuid::Uuid;

use crate::models::_entities::{automation_logs, circuit_breaker_states, inquiries, inquiry_messages, orders, product_mappings};

pub struct DatabaseSeeder;

impl DatabaseSeeder {
    /// Seed the database with initial development data: one product mapping
    /// per sales channel, a breaker row per built-in provider, and a handful
    /// of orders/inquiries spanning the lifecycle.
    pub async fn seed_development(db: &DatabaseConnection) -> Result<()> {
        tracing::info!("Starting development database seeding...");

        Self::create_product_mappings(db).await?;
        Self::create_breaker_rows(db).await?;
        Self::create_sample_orders(db).await?;
        Self::create_sample_inquiries(db).await?;

        tracing::info!("Development database seeding completed successfully");
        Ok(())
    }

    async fn create_product_mappings(db: &DatabaseConnection) -> Result<()> {
        let now = chrono::Utc::now().naive_utc();
        let mappings = vec![
            ("smartstore", "N_ESIM_JP_5GB", "esim-jp-5gb", Some("AIRALO-JP-5GB")),
            ("email", "KAKAO_ESIM_US_3GB", "esim-us-3gb", None),
        ];

        for (sales_channel, external_product_id, product_id, provider_sku) in mappings {
            let active = product_mappings::ActiveModel {
                id: Set(Uuid::new_v4()),
                sales_channel: Set(sales_channel.to_string()),
                external_product_id: Set(external_product_id.to_string()),
                product_id: Set(product_id.to_string()),
                provider_sku: Set(provider_sku.map(str::to_string)),
                created_at: Set(now),
                updated_at: Set(now),
            };
            active.insert(db).await?;
        }

        Ok(())
    }

    async fn create_breaker_rows(db: &DatabaseConnection) -> Result<()> {
        let now = chrono::Utc::now().naive_utc();
        for slug in ["airalo", "esimcard", "mobimatter", "redteago"] {
            let active = circuit_breaker_states::ActiveModel {
                provider_slug: Set(slug.to_string()),
                phase: Set("closed".to_string()),
                consecutive_failure_count: Set(0),
                consecutive_success_count: Set(0),
                last_failure_time: Set(None),
                last_state_change: Set(now),
            };
            active.insert(db).await?;
        }
        Ok(())
    }

    async fn create_sample_orders(db: &DatabaseConnection) -> Result<()> {
        let now = chrono::Utc::now().naive_utc();
        let samples = vec![
            ("smartstore", "delivered", Decimal::new(1999, 2)),
            ("email", "fulfillment_started", Decimal::new(2999, 2)),
            ("smartstore", "provider_failed", Decimal::new(1499, 2)),
        ];

        for (sales_channel, status, amount) in samples {
            let active = orders::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_number: Set(format!("ORD-{}", Uuid::new_v4().simple())),
                correlation_id: Set(Uuid::new_v4()),
                sales_channel: Set(sales_channel.to_string()),
                external_order_id: Set(format!("ext-{}", Uuid::new_v4().simple())),
                status: Set(status.to_string()),
                customer_email: Set("buyer@example.com".to_string()),
                customer_name: Set(Some("Sample Buyer".to_string())),
                customer_phone: Set(None),
                product_id: Set("esim-jp-5gb".to_string()),
                provider_sku: Set(Some("AIRALO-JP-5GB".to_string())),
                provider_used: Set(if status == "delivered" { Some("airalo".to_string()) } else { None }),
                payment_reference: Set(None),
                quantity: Set(1),
                amount: Set(amount),
                currency: Set("KRW".to_string()),
                qr_code_url: Set(None),
                iccid: Set(None),
                activation_code: Set(None),
                error_message: Set(if status == "provider_failed" {
                    Some("All provider circuits are open".to_string())
                } else {
                    None
                }),
                metadata: Set(serde_json::json!({})),
                paid_at: Set(now),
                created_at: Set(now),
                updated_at: Set(now),
            };
            active.insert(db).await?;
        }

        Ok(())
    }

    async fn create_sample_inquiries(db: &DatabaseConnection) -> Result<()> {
        let now = chrono::Utc::now().naive_utc();

        let inquiry = inquiries::ActiveModel {
            id: Set(Uuid::new_v4()),
            channel: Set("smartstore".to_string()),
            external_id: Set("qna-1001".to_string()),
            status: Set("new".to_string()),
            priority: Set("normal".to_string()),
            subject: Set(Some("My eSIM won't activate".to_string())),
            content: Set("I scanned the QR code but the eSIM shows no signal.".to_string()),
            customer_name: Set(Some("Sample Buyer".to_string())),
            customer_email: Set(Some("buyer@example.com".to_string())),
            assigned_to: Set(None),
            linked_order_id: Set(None),
            first_response_at: Set(None),
            resolved_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let inquiry = inquiry.insert(db).await?;

        let message = inquiry_messages::ActiveModel {
            id: Set(Uuid::new_v4()),
            inquiry_id: Set(inquiry.id),
            direction: Set("inbound".to_string()),
            sender_type: Set("customer".to_string()),
            content: Set(inquiry.content.clone()),
            template_id: Set(None),
            delivery_status: Set("delivered".to_string()),
            external_message_id: Set(None),
            created_at: Set(now),
        };
        message.insert(db).await?;

        Ok(())
    }

    /// Check if the database has already been seeded.
    pub async fn is_seeded(db: &DatabaseConnection) -> Result<bool> {
        let count = orders::Entity::find().count(db).await?;
        Ok(count > 0)
    }

    /// Clear all seeded data (used by `App::truncate` between test runs).
    pub async fn clear_all(db: &DatabaseConnection) -> Result<()> {
        tracing::warn!("Clearing all database data...");

        inquiry_messages::Entity::delete_many().exec(db).await?;
        inquiries::Entity::delete_many().exec(db).await?;
        automation_logs::Entity::delete_many().exec(db).await?;
        orders::Entity::delete_many().exec(db).await?;
        circuit_breaker_states::Entity::delete_many().exec(db).await?;
        product_mappings::Entity::delete_many().exec(db).await?;

        tracing::info!("All database data cleared");
        Ok(())
    }
}
