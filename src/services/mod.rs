pub mod adapter;
pub mod breaker_store;
pub mod cascade_engine;
pub mod channels;
pub mod deadline;
pub mod error;
pub mod filter_query;
pub mod fulfillment_service;
pub mod inquiry_service;
pub mod logger;
pub mod manual_fulfillment;
pub mod normalizer;
pub mod notification_ports;
pub mod providers;
pub mod retry;
pub mod runtime;
pub mod state_machine;
pub mod token_cache;
