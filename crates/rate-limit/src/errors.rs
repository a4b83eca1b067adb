use thiserror::Error;

use crate::config::LimitType;

/// Rejected rate limit configuration. Fatal at startup.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LimitConfigError {
    #[error("rate limit qps and burst must be non-zero (qps={qps}, burst={burst})")]
    Zero { qps: u32, burst: u32 },
    #[error("rate limit qps ({qps}) must not exceed burst ({burst})")]
    QpsExceedsBurst { qps: u32, burst: u32 },
    #[error("unknown rate limit type '{0}'")]
    UnknownLimitType(String),
}

/// A request ran out of tokens.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("key '{key}' reached the {limit_type} rate limit")]
pub struct Throttled {
    pub key: String,
    pub limit_type: LimitType,
}
