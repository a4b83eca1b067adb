//! Keyed token-bucket rate limiting.
//!
//! Each [`RateLimiter`] keeps one GCRA bucket per key in a bounded LRU store.
//! Server limits use a single shared key; ip limits key on the client address.

pub mod config;
pub mod errors;
pub mod limiter;
pub mod store;

pub use config::{LimitConfig, LimitType, ValidatedLimit, DEFAULT_CACHE_SIZE};
pub use errors::{LimitConfigError, Throttled};
pub use limiter::{RateLimiter, RateLimiterChain, SERVER_KEY};
pub use store::{Bucket, BucketStore};
