pub mod auth;
pub mod cors;

pub use auth::{admin_auth_middleware, security_headers_middleware};
