use std::fmt;
use std::num::{NonZeroU32, NonZeroUsize};
use std::str::FromStr;

use governor::Quota;
use serde::{Deserialize, Serialize};

use crate::errors::LimitConfigError;

pub const DEFAULT_CACHE_SIZE: usize = 2048;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitType {
    /// One bucket shared by the whole process.
    Server,
    /// One bucket per client address.
    Ip,
}

impl LimitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LimitType::Server => "server",
            LimitType::Ip => "ip",
        }
    }
}

impl fmt::Display for LimitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LimitType {
    type Err = LimitConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "server" => Ok(LimitType::Server),
            "ip" => Ok(LimitType::Ip),
            other => Err(LimitConfigError::UnknownLimitType(other.to_string())),
        }
    }
}

/// Raw limiter configuration as it appears in the config file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitConfig {
    pub limit_type: String,
    pub qps: u32,
    pub burst: u32,
    #[serde(default)]
    pub cache_size: usize,
}

impl LimitConfig {
    pub fn new(limit_type: LimitType, qps: u32, burst: u32) -> Self {
        Self {
            limit_type: limit_type.as_str().to_string(),
            qps,
            burst,
            cache_size: 0,
        }
    }

    pub fn with_cache_size(mut self, cache_size: usize) -> Self {
        self.cache_size = cache_size;
        self
    }

    pub fn validate(&self) -> Result<ValidatedLimit, LimitConfigError> {
        let (Some(qps), Some(burst)) = (NonZeroU32::new(self.qps), NonZeroU32::new(self.burst))
        else {
            return Err(LimitConfigError::Zero {
                qps: self.qps,
                burst: self.burst,
            });
        };
        if qps > burst {
            return Err(LimitConfigError::QpsExceedsBurst {
                qps: self.qps,
                burst: self.burst,
            });
        }
        let limit_type = self.limit_type.parse()?;
        let cache_size = match self.cache_size {
            0 => DEFAULT_CACHE_SIZE,
            size => size,
        };
        let cache_size = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);
        Ok(ValidatedLimit {
            limit_type,
            qps,
            burst,
            cache_size,
        })
    }
}

/// A [`LimitConfig`] that passed validation; `qps <= burst` holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValidatedLimit {
    pub limit_type: LimitType,
    pub qps: NonZeroU32,
    pub burst: NonZeroU32,
    pub cache_size: NonZeroUsize,
}

impl ValidatedLimit {
    /// `burst` tokens of capacity, refilled continuously at `qps` per second.
    pub fn quota(&self) -> Quota {
        Quota::per_second(self.qps).allow_burst(self.burst)
    }
}
