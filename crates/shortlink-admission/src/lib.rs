//! Admission control for the public redirect path.
//!
//! A single global token bucket bounds the aggregate request rate. Requests
//! are either admitted immediately or rejected immediately; nothing queues.

pub mod clock;
pub mod controller;
pub mod error;
pub mod token_bucket;

pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{AdmissionController, RateLimitConfig};
pub use error::{AdmissionError, Result};
pub use token_bucket::TokenBucket;
