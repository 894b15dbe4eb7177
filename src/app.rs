use async_trait::async_trait;
use loco_rs::{
    app::{AppContext, Hooks},
    boot::{create_app, BootResult, StartMode},
    controller::AppRoutes,
    environment::Environment,
    task::Tasks,
    worker::{Processor, Worker},
    Result,
};
use migration::Migrator;
use sea_orm::DatabaseConnection;

use crate::{controllers, workers};

pub struct App;

#[async_trait]
impl Hooks for App {
    fn app_name() -> &'static str {
        env!("CARGO_CRATE_NAME")
    }

    fn app_version() -> String {
        format!(
            "{} ({})",
            env!("CARGO_PKG_VERSION"),
            option_env!("BUILD_SHA")
                .or(option_env!("GITHUB_SHA"))
                .unwrap_or("dev")
        )
    }

    async fn boot(mode: StartMode, environment: &Environment) -> Result<BootResult> {
        let boot_result = create_app::<Self, Migrator>(mode, environment).await?;
        spawn_background_sweeps(&boot_result.app_context);
        Ok(boot_result)
    }

    async fn truncate(db: &DatabaseConnection) -> Result<()> {
        use crate::seeders::DatabaseSeeder;
        
        // Clear all data for testing
        DatabaseSeeder::clear_all(db).await?;
        Ok(())
    }

    async fn seed(db: &DatabaseConnection, _base: &std::path::Path) -> Result<()> {
        use crate::seeders::DatabaseSeeder;
        
        // Only seed in development environment
        if std::env::var("LOCO_ENV").unwrap_or_else(|_| "development".to_string()) == "development" {
            if !DatabaseSeeder::is_seeded(db).await? {
                tracing::info!("Seeding development database...");
                DatabaseSeeder::seed_development(db).await?;
                tracing::info!("Database seeding completed");
            } else {
                tracing::info!("Database already seeded, skipping");
            }
        }
        
        Ok(())
    }

    fn routes(_ctx: &AppContext) -> AppRoutes {
        AppRoutes::with_default_routes()
            .prefix("/api")
            .add_route(controllers::system::routes())
            .add_route(controllers::orders::routes())
            .add_route(controllers::admin_orders::routes())
            .add_route(controllers::admin_inquiries::routes())
            .add_route(controllers::webhooks::routes())
    }

    fn connect_workers<'a>(p: &'a mut Processor, ctx: &'a AppContext) {
        p.register(workers::reconciliation::ReconciliationWorker::build(ctx));
        p.register(workers::inquiry_sync::InquirySyncWorker::build(ctx));
    }

    fn register_tasks(_tasks: &mut Tasks) {
        // Database management commands are handled through CLI
        // Use: cargo loco task database --help
    }
}

/// Drives C16's two cadences directly rather than through the worker queue's
/// own enqueue API: both sweeps are idempotent and self-contained, so a
/// plain interval loop alongside the server is simpler than a scheduled job
/// with no cron-like scheduler in this stack to lean on.
fn spawn_background_sweeps(ctx: &AppContext) {
    let reconciliation_ctx = ctx.clone();
    tokio::spawn(async move {
        let worker = workers::reconciliation::ReconciliationWorker { ctx: reconciliation_ctx };
        loop {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            if let Err(e) = worker
                .perform(workers::reconciliation::ReconciliationWorkerArgs {
                    operation_id: uuid::Uuid::new_v4().to_string(),
                })
                .await
            {
                tracing::error!(error = %e, "reconciliation sweep failed");
            }
        }
    });

    let inquiry_ctx = ctx.clone();
    tokio::spawn(async move {
        let worker = workers::inquiry_sync::InquirySyncWorker { ctx: inquiry_ctx };
        let interval_secs = std::env::var("INQUIRY_SYNC_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(300);
        loop {
            tokio::time::sleep(std::time::Duration::from_secs(interval_secs)).await;
            if let Err(e) = worker
                .perform(workers::inquiry_sync::InquirySyncWorkerArgs {
                    trigger: "scheduled".to_string(),
                })
                .await
            {
                tracing::error!(error = %e, "inquiry sync sweep failed");
            }
        }
    });
}