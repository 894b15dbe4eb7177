pub mod admin_inquiries;
pub mod admin_orders;
pub mod orders;
pub mod system;
pub mod webhooks;
