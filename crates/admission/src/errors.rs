use gatehouse_rate_limit::{LimitConfigError, LimitType, Throttled};
use thiserror::Error;

/// Failure while assembling the pipeline. Fatal at startup.
#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("invalid rate limit: {0}")]
    Limit(#[from] LimitConfigError),
    #[error("unknown identity provider '{0}'")]
    UnknownProvider(String),
    #[error("identity provider '{provider}' requires {field}")]
    ProviderConfig {
        provider: &'static str,
        field: &'static str,
    },
}

/// Terminal outcome for a request that did not pass admission.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Rejection {
    #[error("too many requests for key '{key}' ({limit_type} limit)")]
    TooManyRequests { key: String, limit_type: LimitType },
    #[error("authentication required")]
    Unauthenticated,
    #[error("user '{user}' may not {verb} {resource} in namespace '{namespace}'")]
    Forbidden {
        user: String,
        verb: String,
        resource: String,
        namespace: String,
    },
    #[error("admission failed: {0}")]
    Internal(String),
}

impl From<Throttled> for Rejection {
    fn from(throttled: Throttled) -> Self {
        Rejection::TooManyRequests {
            key: throttled.key,
            limit_type: throttled.limit_type,
        }
    }
}
