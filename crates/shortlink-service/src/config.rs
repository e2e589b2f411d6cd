use std::time::Duration;
use typed_builder::TypedBuilder;

/// Cache lifetime for links that never expire.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, TypedBuilder)]
pub struct LinkServiceConfig {
    /// Public prefix of every short URL, e.g. `https://sho.rt`.
    #[builder(default = "http://localhost:8080".to_string(), setter(into))]
    pub base_url: String,
    #[builder(default = DEFAULT_CACHE_TTL)]
    pub default_cache_ttl: Duration,
    /// Candidates tried before giving up on a create.
    #[builder(default = 10)]
    pub max_generation_attempts: u32,
    /// Deadline for each call to the durable store or the cache.
    #[builder(default = Duration::from_secs(5))]
    pub operation_timeout: Duration,
}

impl Default for LinkServiceConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
