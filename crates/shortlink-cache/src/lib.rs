//! Fast cache, shared bit stores and the probabilistic membership filter.

pub mod bit_store;
pub mod bloom_filter;
mod error;
pub mod moka;
pub mod redis;

pub use bit_store::{InMemoryBitStore, RedisBitStore};
pub use bloom_filter::{Membership, MembershipFilter, MembershipFilterConfig, MembershipFilterStats};
pub use moka::MokaUrlCache;
pub use redis::RedisUrlCache;
pub use shortlink_core::cache::Result;
pub use shortlink_core::{BitStore, CacheError, UrlCache};

/// Key prefix shared by cached URLs and the filter bitmap.
pub const DEFAULT_KEY_PREFIX: &str = "shortlink:";
