use crate::clock::{Clock, SystemClock};
use crate::error::{AdmissionError, Result};
use jiff::Timestamp;
use parking_lot::Mutex;

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Timestamp,
}

/// A token bucket with a fixed capacity and a fixed refill rate.
///
/// The only mutable state is the token count and the instant it was last
/// topped up. Refill is computed lazily on every acquire from the time
/// elapsed since then, capped at capacity. A new bucket starts full.
#[derive(Debug)]
pub struct TokenBucket<C = SystemClock> {
    capacity: f64,
    refill_per_second: f64,
    clock: C,
    state: Mutex<BucketState>,
}

impl TokenBucket<SystemClock> {
    pub fn new(capacity: u32, refill_per_second: u32) -> Result<Self> {
        Self::with_clock(capacity, refill_per_second, SystemClock)
    }
}

impl<C: Clock> TokenBucket<C> {
    pub fn with_clock(capacity: u32, refill_per_second: u32, clock: C) -> Result<Self> {
        if capacity == 0 {
            return Err(AdmissionError::InvalidConfig(
                "capacity must be greater than zero".to_string(),
            ));
        }

        let capacity = f64::from(capacity);
        let state = BucketState {
            tokens: capacity,
            last_refill: clock.now(),
        };
        Ok(Self {
            capacity,
            refill_per_second: f64::from(refill_per_second),
            clock,
            state: Mutex::new(state),
        })
    }

    /// Takes `n` tokens if they are available right now.
    ///
    /// Returns `false` without consuming anything otherwise.
    pub fn try_acquire(&self, n: u32) -> bool {
        let now = self.clock.now();
        let mut state = self.state.lock();

        // a clock that steps backwards must not mint tokens
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        if elapsed > 0.0 {
            state.tokens = (state.tokens + elapsed * self.refill_per_second).min(self.capacity);
            state.last_refill = now;
        }

        let wanted = f64::from(n);
        if state.tokens >= wanted {
            state.tokens -= wanted;
            true
        } else {
            false
        }
    }

    /// Tokens currently available, without refilling.
    pub fn available(&self) -> f64 {
        self.state.lock().tokens
    }

    pub fn capacity(&self) -> u32 {
        self.capacity as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManualClock;
    use jiff::SignedDuration;
    use std::sync::Arc;

    fn bucket(capacity: u32, rate: u32) -> (TokenBucket<ManualClock>, ManualClock) {
        let clock = ManualClock::new(Timestamp::from_second(1_700_000_000).unwrap());
        let bucket = TokenBucket::with_clock(capacity, rate, clock.clone()).unwrap();
        (bucket, clock)
    }

    #[test]
    fn starts_full_and_drains_to_zero() {
        let (bucket, _clock) = bucket(5, 1);

        for _ in 0..5 {
            assert!(bucket.try_acquire(1));
        }
        assert!(!bucket.try_acquire(1));
        assert_eq!(bucket.available(), 0.0);
    }

    #[test]
    fn refills_at_the_configured_rate() {
        let (bucket, clock) = bucket(3, 2);
        for _ in 0..3 {
            assert!(bucket.try_acquire(1));
        }
        assert!(!bucket.try_acquire(1));

        clock.advance(SignedDuration::from_millis(500));
        assert!(bucket.try_acquire(1));
        assert!(!bucket.try_acquire(1));
    }

    #[test]
    fn refill_is_capped_at_capacity() {
        let (bucket, clock) = bucket(4, 100);
        assert!(bucket.try_acquire(4));

        clock.advance(SignedDuration::from_secs(3600));
        assert!(bucket.try_acquire(4));
        assert!(!bucket.try_acquire(1));
    }

    #[test]
    fn failed_acquire_consumes_nothing() {
        let (bucket, _clock) = bucket(3, 1);

        assert!(!bucket.try_acquire(4));
        assert!(bucket.try_acquire(3));
    }

    #[test]
    fn backwards_clock_does_not_add_tokens() {
        let (bucket, clock) = bucket(2, 1);
        assert!(bucket.try_acquire(2));

        clock.advance(SignedDuration::from_secs(-10));
        assert!(!bucket.try_acquire(1));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = TokenBucket::new(0, 10).unwrap_err();
        assert!(matches!(err, AdmissionError::InvalidConfig(_)));
    }

    #[test]
    fn concurrent_acquires_never_exceed_capacity() {
        let (bucket, _clock) = bucket(100, 0);
        let bucket = Arc::new(bucket);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let bucket = Arc::clone(&bucket);
                std::thread::spawn(move || (0..50).filter(|_| bucket.try_acquire(1)).count())
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 100);
    }
}
