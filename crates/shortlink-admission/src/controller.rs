use crate::clock::{Clock, SystemClock};
use crate::error::{AdmissionError, Result};
use crate::token_bucket::TokenBucket;
use std::sync::Arc;
use tracing::debug;
use typed_builder::TypedBuilder;

/// Bucket size and refill rate for the redirect path.
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct RateLimitConfig {
    #[builder(default = 1000)]
    pub capacity: u32,
    #[builder(default = 100)]
    pub refill_per_second: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Global gate in front of resolution.
///
/// Does not distinguish callers or codes. Clones share one bucket.
#[derive(Debug)]
pub struct AdmissionController<C = SystemClock> {
    bucket: Arc<TokenBucket<C>>,
}

impl<C> Clone for AdmissionController<C> {
    fn clone(&self) -> Self {
        Self {
            bucket: Arc::clone(&self.bucket),
        }
    }
}

impl AdmissionController<SystemClock> {
    pub fn new(config: RateLimitConfig) -> Result<Self> {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> AdmissionController<C> {
    pub fn with_clock(config: RateLimitConfig, clock: C) -> Result<Self> {
        let bucket = TokenBucket::with_clock(config.capacity, config.refill_per_second, clock)?;
        Ok(Self {
            bucket: Arc::new(bucket),
        })
    }

    /// Admits one request or rejects it immediately.
    pub fn try_admit(&self) -> Result<()> {
        if self.bucket.try_acquire(1) {
            Ok(())
        } else {
            debug!("admission rejected, token bucket is empty");
            Err(AdmissionError::RateLimited)
        }
    }

    pub fn bucket(&self) -> &TokenBucket<C> {
        &self.bucket
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManualClock;
    use jiff::{SignedDuration, Timestamp};

    fn controller(capacity: u32, rate: u32) -> (AdmissionController<ManualClock>, ManualClock) {
        let clock = ManualClock::new(Timestamp::from_second(1_700_000_000).unwrap());
        let config = RateLimitConfig::builder()
            .capacity(capacity)
            .refill_per_second(rate)
            .build();
        let controller = AdmissionController::with_clock(config, clock.clone()).unwrap();
        (controller, clock)
    }

    #[test]
    fn defaults_match_service_limits() {
        let config = RateLimitConfig::default();
        assert_eq!(config.capacity, 1000);
        assert_eq!(config.refill_per_second, 100);
    }

    #[test]
    fn admits_exactly_capacity_then_rejects() {
        let (controller, _clock) = controller(10, 5);

        for _ in 0..10 {
            assert_eq!(controller.try_admit(), Ok(()));
        }
        assert_eq!(controller.try_admit(), Err(AdmissionError::RateLimited));
    }

    #[test]
    fn admits_again_after_one_refill_interval() {
        let (controller, clock) = controller(10, 5);
        for _ in 0..10 {
            controller.try_admit().unwrap();
        }
        assert!(controller.try_admit().is_err());

        // one token every 200ms at 5 tokens/s
        clock.advance(SignedDuration::from_millis(200));
        assert_eq!(controller.try_admit(), Ok(()));
    }

    #[test]
    fn clones_share_the_bucket() {
        let (controller, _clock) = controller(2, 1);
        let other = controller.clone();

        controller.try_admit().unwrap();
        other.try_admit().unwrap();
        assert!(controller.try_admit().is_err());
        assert!(other.try_admit().is_err());
    }

    #[test]
    fn separate_controllers_are_isolated() {
        let (first, _) = controller(1, 1);
        let (second, _) = controller(1, 1);

        first.try_admit().unwrap();
        assert!(first.try_admit().is_err());
        assert!(second.try_admit().is_ok());
    }

    #[tokio::test]
    async fn system_clock_refills_in_real_time() {
        let controller = AdmissionController::new(
            RateLimitConfig::builder()
                .capacity(1)
                .refill_per_second(20)
                .build(),
        )
        .unwrap();

        controller.try_admit().unwrap();
        assert!(controller.try_admit().is_err());

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert!(controller.try_admit().is_ok());
    }
}
