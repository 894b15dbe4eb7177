//! Generated-style sea-orm entities, one module per table.
//!
//! Mirrors the shape `sea-orm-cli generate entity` would produce; checked in
//! rather than generated at build time so the crate compiles without a live
//! database connection.

pub mod automation_logs;
pub mod circuit_breaker_states;
pub mod inquiries;
pub mod inquiry_messages;
pub mod orders;
pub mod product_mappings;

pub mod prelude {
    pub use super::automation_logs::Entity as AutomationLogs;
    pub use super::circuit_breaker_states::Entity as CircuitBreakerStates;
    pub use super::inquiries::Entity as Inquiries;
    pub use super::inquiry_messages::Entity as InquiryMessages;
    pub use super::orders::Entity as Orders;
    pub use super::product_mappings::Entity as ProductMappings;
}
