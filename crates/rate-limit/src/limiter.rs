use governor::clock::{Clock, DefaultClock};
use tracing::debug;

use crate::config::{LimitConfig, LimitType, ValidatedLimit};
use crate::errors::{LimitConfigError, Throttled};
use crate::store::BucketStore;

/// Key shared by every request under a server-wide limit.
pub const SERVER_KEY: &str = "";

/// Token-bucket limiter keyed by [`LimitType`].
pub struct RateLimiter<C: Clock = DefaultClock> {
    limit: ValidatedLimit,
    store: BucketStore<C>,
}

impl RateLimiter<DefaultClock> {
    pub fn new(config: &LimitConfig) -> Result<Self, LimitConfigError> {
        Self::with_clock(config, DefaultClock::default())
    }
}

impl<C: Clock> RateLimiter<C> {
    pub fn with_clock(config: &LimitConfig, clock: C) -> Result<Self, LimitConfigError> {
        let limit = config.validate()?;
        debug!(
            limit_type = %limit.limit_type,
            qps = limit.qps.get(),
            burst = limit.burst.get(),
            cache_size = limit.cache_size.get(),
            "rate limiter configured"
        );
        Ok(Self {
            store: BucketStore::new(limit.cache_size, limit.quota(), clock),
            limit,
        })
    }

    fn key_for(&self, client_addr: &str) -> String {
        match self.limit.limit_type {
            LimitType::Server => SERVER_KEY.to_string(),
            LimitType::Ip => client_addr.to_string(),
        }
    }

    /// Takes one token from the bucket for `client_addr`.
    pub fn accept(&self, client_addr: &str) -> Result<(), Throttled> {
        let key = self.key_for(client_addr);
        let bucket = self.store.bucket(&key);
        bucket.check().map_err(|_| {
            debug!(key = %key, limit_type = %self.limit.limit_type, "request throttled");
            Throttled {
                key,
                limit_type: self.limit.limit_type,
            }
        })
    }

    pub fn store(&self) -> &BucketStore<C> {
        &self.store
    }
}

/// Limiters applied in configuration order; the first rejection wins.
pub struct RateLimiterChain<C: Clock = DefaultClock> {
    limiters: Vec<RateLimiter<C>>,
}

impl RateLimiterChain<DefaultClock> {
    pub fn from_configs(configs: &[LimitConfig]) -> Result<Self, LimitConfigError> {
        Self::with_clock(configs, DefaultClock::default())
    }
}

impl<C: Clock> RateLimiterChain<C> {
    pub fn with_clock(configs: &[LimitConfig], clock: C) -> Result<Self, LimitConfigError> {
        let limiters = configs
            .iter()
            .map(|config| RateLimiter::with_clock(config, clock.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { limiters })
    }

    pub fn accept(&self, client_addr: &str) -> Result<(), Throttled> {
        self.limiters
            .iter()
            .try_for_each(|limiter| limiter.accept(client_addr))
    }

    pub fn len(&self) -> usize {
        self.limiters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.limiters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use governor::clock::FakeRelativeClock;

    use super::*;

    fn limiter(
        limit_type: LimitType,
        qps: u32,
        burst: u32,
    ) -> (RateLimiter<FakeRelativeClock>, FakeRelativeClock) {
        let clock = FakeRelativeClock::default();
        let config = LimitConfig::new(limit_type, qps, burst);
        (RateLimiter::with_clock(&config, clock.clone()).unwrap(), clock)
    }

    #[test]
    fn single_token_refills_after_one_second() {
        let (limiter, clock) = limiter(LimitType::Server, 1, 1);
        assert!(limiter.accept("10.0.0.1").is_ok());
        let throttled = limiter.accept("10.0.0.1").unwrap_err();
        assert_eq!(throttled.key, SERVER_KEY);
        assert_eq!(throttled.limit_type, LimitType::Server);

        clock.advance(Duration::from_secs(1));
        assert!(limiter.accept("10.0.0.1").is_ok());
    }

    #[test]
    fn burst_is_spent_then_refills_continuously() {
        let (limiter, clock) = limiter(LimitType::Ip, 1, 3);
        for _ in 0..3 {
            assert!(limiter.accept("10.0.0.1").is_ok());
        }
        assert!(limiter.accept("10.0.0.1").is_err());
        clock.advance(Duration::from_millis(500));
        assert!(limiter.accept("10.0.0.1").is_err());
        clock.advance(Duration::from_millis(500));
        assert!(limiter.accept("10.0.0.1").is_ok());
    }

    #[test]
    fn server_limit_shares_one_bucket() {
        let (limiter, _clock) = limiter(LimitType::Server, 1, 1);
        assert!(limiter.accept("10.0.0.1").is_ok());
        assert!(limiter.accept("10.0.0.2").is_err());
        assert_eq!(limiter.store().len(), 1);
    }

    #[test]
    fn ip_limit_isolates_addresses() {
        let (limiter, _clock) = limiter(LimitType::Ip, 1, 1);
        assert!(limiter.accept("10.0.0.1").is_ok());
        assert!(limiter.accept("10.0.0.2").is_ok());
        let throttled = limiter.accept("10.0.0.1").unwrap_err();
        assert_eq!(throttled.key, "10.0.0.1");
        assert_eq!(throttled.limit_type, LimitType::Ip);
        assert_eq!(
            throttled.to_string(),
            "key '10.0.0.1' reached the ip rate limit"
        );
    }

    #[test]
    fn chain_stops_at_first_rejection() {
        let clock = FakeRelativeClock::default();
        let chain = RateLimiterChain::with_clock(
            &[
                LimitConfig::new(LimitType::Server, 5, 5),
                LimitConfig::new(LimitType::Ip, 1, 1),
            ],
            clock,
        )
        .unwrap();
        assert_eq!(chain.len(), 2);
        assert!(chain.accept("10.0.0.1").is_ok());
        let throttled = chain.accept("10.0.0.1").unwrap_err();
        assert_eq!(throttled.limit_type, LimitType::Ip);
    }

    #[test]
    fn chain_rejects_invalid_config() {
        let err = RateLimiterChain::from_configs(&[LimitConfig::new(LimitType::Server, 10, 5)])
            .err()
            .unwrap();
        assert_eq!(err, LimitConfigError::QpsExceedsBurst { qps: 10, burst: 5 });
    }
}
