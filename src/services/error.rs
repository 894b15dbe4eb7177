use serde::{Deserialize, Serialize};

/// Failure classification shared by every adapter, the cascade engine, and
/// the retry loop. Retryable-ness is a property of the *kind plus context*,
/// not the kind alone — see [`ErrorKind::default_retryable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Timeout,
    RateLimit,
    InvalidResponse,
    NetworkError,
    Authentication,
    Validation,
    ProviderError,
    Unknown,
}

impl ErrorKind {
    /// Whether this kind is retryable when the adapter expresses no opinion
    /// of its own (provider-specific overrides happen at the call site).
    pub fn default_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::RateLimit | Self::NetworkError)
    }

    /// HTTP status → kind, per the documented mapping. `5xx` and `429` are
    /// retryable provider errors; `4xx` besides those are not.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Authentication,
            429 => Self::RateLimit,
            400 | 422 => Self::Validation,
            s if s >= 500 => Self::ProviderError,
            _ => Self::Unknown,
        }
    }

    /// Whether a *non-2xx HTTP response* should be retried, per §4.1's
    /// mapping: `429` and `5xx` are transient and retryable even though
    /// `ProviderError` is not retryable by default — that default instead
    /// governs a 2xx response that fails an adapter's own success predicate
    /// (§4.4), which is non-retryable unless the adapter says otherwise.
    pub fn http_status_retryable(status: u16) -> bool {
        matches!(Self::from_http_status(status), Self::RateLimit | Self::ProviderError)
    }
}

/// Custom error types for the order-fulfillment and channel-integration domain.
#[derive(Debug, Clone, thiserror::Error, Serialize, Deserialize)]
pub enum DomainError {
    #[error("{kind:?}: {message}")]
    Adapter {
        kind: ErrorKind,
        message: String,
        retryable: bool,
    },

    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("order not found: {0}")]
    OrderNotFound(String),

    #[error("inquiry not found: {0}")]
    InquiryNotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("all provider circuits are open")]
    AllCircuitsOpen,
}

impl DomainError {
    pub fn adapter(kind: ErrorKind, message: impl Into<String>) -> Self {
        let retryable = kind.default_retryable();
        Self::Adapter {
            kind,
            message: message.into(),
            retryable,
        }
    }

    pub fn adapter_retryable(kind: ErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self::Adapter {
            kind,
            message: message.into(),
            retryable,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Adapter { retryable, .. } => *retryable,
            Self::AllCircuitsOpen => true,
            _ => false,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Adapter { kind, .. } => *kind,
            Self::AllCircuitsOpen => ErrorKind::ProviderError,
            Self::InvalidTransition { .. } | Self::OrderNotFound(_) | Self::InquiryNotFound(_) => {
                ErrorKind::Validation
            }
            Self::Validation(_) => ErrorKind::Validation,
            Self::Configuration(_) => ErrorKind::Unknown,
            Self::Persistence(_) => ErrorKind::Unknown,
        }
    }
}

impl From<DomainError> for loco_rs::Error {
    fn from(err: DomainError) -> Self {
        loco_rs::Error::string(&err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_mapping_matches_taxonomy() {
        assert_eq!(ErrorKind::from_http_status(401), ErrorKind::Authentication);
        assert_eq!(ErrorKind::from_http_status(403), ErrorKind::Authentication);
        assert_eq!(ErrorKind::from_http_status(429), ErrorKind::RateLimit);
        assert_eq!(ErrorKind::from_http_status(400), ErrorKind::Validation);
        assert_eq!(ErrorKind::from_http_status(422), ErrorKind::Validation);
        assert_eq!(ErrorKind::from_http_status(500), ErrorKind::ProviderError);
        assert_eq!(ErrorKind::from_http_status(503), ErrorKind::ProviderError);
    }

    #[test]
    fn retryable_set_matches_taxonomy() {
        assert!(ErrorKind::Timeout.default_retryable());
        assert!(ErrorKind::RateLimit.default_retryable());
        assert!(ErrorKind::NetworkError.default_retryable());
        assert!(!ErrorKind::Authentication.default_retryable());
        assert!(!ErrorKind::Validation.default_retryable());
        assert!(!ErrorKind::InvalidResponse.default_retryable());
        assert!(!ErrorKind::Unknown.default_retryable());
    }

    #[test]
    fn all_circuits_open_is_retryable() {
        assert!(DomainError::AllCircuitsOpen.is_retryable());
    }

    #[test]
    fn http_status_retryable_covers_5xx_and_429_despite_provider_error_default() {
        assert!(ErrorKind::http_status_retryable(500));
        assert!(ErrorKind::http_status_retryable(503));
        assert!(ErrorKind::http_status_retryable(429));
        assert!(!ErrorKind::http_status_retryable(401));
        assert!(!ErrorKind::http_status_retryable(400));
        assert!(!ErrorKind::ProviderError.default_retryable());
    }
}
