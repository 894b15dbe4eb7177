pub mod _entities;

pub mod automation_log;
pub mod circuit_breaker_state;
pub mod inquiry;
pub mod inquiry_message;
pub mod order;
pub mod product_mapping;

pub use automation_log::AutomationLog;
pub use circuit_breaker_state::{BreakerPhase, CircuitBreakerState};
pub use inquiry::{CreateInquiryRequest, Inquiry, InquiryPriority, InquiryStatus};
pub use inquiry_message::{InquiryMessage, MessageDirection, SenderType};
pub use order::{CreateOrderRequest, Order, OrderStatus};
pub use product_mapping::ProductMapping;
