use std::num::NonZeroUsize;
use std::sync::Arc;

use governor::clock::Clock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::Quota;
use lru::LruCache;
use parking_lot::Mutex;
use tracing::debug;

pub type Bucket<C> =
    governor::RateLimiter<NotKeyed, InMemoryState, C, NoOpMiddleware<<C as Clock>::Instant>>;

/// Bounded map from key to token bucket. Least recently used keys are
/// evicted once `capacity` is reached; an evicted key starts over with a
/// full bucket.
pub struct BucketStore<C: Clock> {
    buckets: Mutex<LruCache<String, Arc<Bucket<C>>>>,
    quota: Quota,
    clock: C,
}

impl<C: Clock> BucketStore<C> {
    pub fn new(capacity: NonZeroUsize, quota: Quota, clock: C) -> Self {
        Self {
            buckets: Mutex::new(LruCache::new(capacity)),
            quota,
            clock,
        }
    }

    /// Returns the bucket for `key`, creating it when absent. Lookup and
    /// insertion happen under one lock so concurrent callers share a bucket.
    pub fn bucket(&self, key: &str) -> Arc<Bucket<C>> {
        let mut buckets = self.buckets.lock();
        if let Some(bucket) = buckets.get(key) {
            return Arc::clone(bucket);
        }
        let bucket = Arc::new(Bucket::<C>::direct_with_clock(self.quota, &self.clock));
        if let Some((evicted, _)) = buckets.push(key.to_string(), Arc::clone(&bucket)) {
            debug!(key = %evicted, "rate limit bucket evicted");
        }
        bucket
    }

    pub fn contains(&self, key: &str) -> bool {
        self.buckets.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.buckets.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.buckets.lock().cap().get()
    }
}
