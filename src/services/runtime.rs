use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tokio::sync::OnceCell;

use super::breaker_store::BreakerStore;
use super::cascade_engine::CascadeEngine;
use super::channels;
use super::fulfillment_service::FulfillmentService;
use super::inquiry_service::InquiryService;
use super::manual_fulfillment::ManualFulfillmentTerminal;
use super::notification_ports::{DiscordFailureNotificationPort, LoggingEmailPort};
use super::providers;

/// Process-lifetime handle bundling the services a request handler needs.
/// Built once per process from the first [`AppContext`]'s database
/// connection (every call site shares one pool) and accessed through
/// [`get_or_init`] rather than a bare global, per the "global singletons"
/// design note: explicit construction, no hidden `Default::default()`.
pub struct AppServices {
    pub fulfillment: Arc<FulfillmentService>,
    pub inquiry: Arc<InquiryService>,
    pub provider_configs: Vec<providers::ProviderConfig>,
}

static SERVICES: OnceCell<Arc<AppServices>> = OnceCell::const_new();

pub async fn get_or_init(db: DatabaseConnection) -> Arc<AppServices> {
    SERVICES
        .get_or_init(|| async {
            let provider_registry = providers::build_registry();
            let breaker_store = Arc::new(BreakerStore::new(db.clone()));
            let cascade = CascadeEngine::new(db.clone(), provider_registry, breaker_store);
            let manual_terminal = ManualFulfillmentTerminal::from_env(db.clone());

            let fulfillment = Arc::new(FulfillmentService::new(
                db.clone(),
                cascade,
                manual_terminal,
                Arc::new(LoggingEmailPort::new(db.clone())),
                Arc::new(DiscordFailureNotificationPort::from_env(db.clone())),
            ));

            let channel_registry = channels::build_registry();
            let inquiry = Arc::new(InquiryService::new(db, channel_registry));

            Arc::new(AppServices {
                fulfillment,
                inquiry,
                provider_configs: providers::load_provider_configs(),
            })
        })
        .await
        .clone()
}
