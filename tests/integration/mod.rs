pub mod health_test;
pub mod order_fulfillment_test;
pub mod webhooks_test;
