use crate::clicks::ClickRecorder;
use crate::config::LinkServiceConfig;
use crate::error::{LinkError, Result};
use jiff::Timestamp;
use serde::Serialize;
use shortlink_cache::{Membership, MembershipFilter};
use shortlink_core::{
    parse_expiration, validate_url, BitStore, CacheError, LinkRecord, NewLink, Repository,
    ShortCode, StorageError, UrlCache,
};
use shortlink_generator::Generator;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

/// The outcome of a successful create.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedLink {
    pub code: ShortCode,
    pub short_url: String,
    pub original_url: String,
    pub expires_at: Option<Timestamp>,
}

/// Creates, resolves and deletes short links.
///
/// The durable store is the source of truth. The fast cache and the
/// membership filter are consulted first on reads and kept up to date on a
/// best-effort basis: their failures are logged and never fail a call.
///
/// A definitely-absent answer from the filter is final, so every service
/// sharing a repository must also share the filter's bit store. A
/// process-local bit array is only sound when the repository is local too.
pub struct LinkService<R, C, B, G> {
    repository: Arc<R>,
    cache: C,
    filter: MembershipFilter<B>,
    generator: G,
    clicks: ClickRecorder,
    config: LinkServiceConfig,
}

impl<R, C, B, G> LinkService<R, C, B, G>
where
    R: Repository,
    C: UrlCache,
    B: BitStore,
    G: Generator,
{
    /// Wires the service together and starts click accounting.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        config: LinkServiceConfig,
        repository: R,
        cache: C,
        filter: MembershipFilter<B>,
        generator: G,
    ) -> Self {
        let repository = Arc::new(repository);
        let clicks = ClickRecorder::spawn(Arc::clone(&repository), config.operation_timeout);
        Self {
            repository,
            cache,
            filter,
            generator,
            clicks,
            config,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn filter(&self) -> &MembershipFilter<B> {
        &self.filter
    }

    pub fn config(&self) -> &LinkServiceConfig {
        &self.config
    }

    /// Shortens `original_url`.
    ///
    /// `expires_at` may be empty, meaning the link never expires. Input is
    /// validated before anything is written. Candidate codes that are already
    /// taken, either at the probe or at insert time, are retried up to
    /// `max_generation_attempts` times.
    pub async fn create(&self, original_url: &str, expires_at: &str) -> Result<CreatedLink> {
        let original_url = original_url.trim();
        validate_url(original_url)?;
        let expire_at = parse_expiration(expires_at)?;

        let attempts = self.config.max_generation_attempts;
        for attempt in 1..=attempts {
            let code = self.generator.generate();

            if self.store(self.repository.exists(&code)).await? {
                debug!(code = %code, attempt, "Generated code is taken, retrying");
                continue;
            }

            let link = NewLink {
                code: code.clone(),
                original_url: original_url.to_string(),
                expire_at,
            };
            match self.store(self.repository.insert(link)).await {
                Ok(()) => {}
                Err(StorageError::Conflict(_)) => {
                    debug!(code = %code, attempt, "Generated code was taken concurrently, retrying");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }

            if let Err(e) = self.cached(self.filter.add(&code)).await {
                warn!(code = %code, error = %e, "Failed to add code to membership filter");
            }

            info!(code = %code, attempt, "Created short link");
            return Ok(CreatedLink {
                short_url: code.to_url(&self.config.base_url),
                code,
                original_url: original_url.to_string(),
                expires_at: expire_at,
            });
        }

        error!(attempts, "Exhausted short code generation attempts");
        Err(LinkError::CodeGenerationExhausted { attempts })
    }

    /// Resolves a code to its original URL and records a click.
    pub async fn resolve(&self, code: &str) -> Result<String> {
        let code = parse_code(code)?;

        match self.cached(self.filter.contains(&code)).await {
            Ok(Membership::DefinitelyAbsent) => {
                trace!(code = %code, "Membership filter rules the code out");
                return Err(LinkError::NotFound);
            }
            Ok(Membership::PossiblyPresent) => {}
            Err(e) => {
                warn!(code = %code, error = %e, "Membership filter unavailable, checking the store");
            }
        }

        match self.cached(self.cache.get_url(&code)).await {
            Ok(Some(url)) => {
                self.clicks.record_hit(code);
                return Ok(url);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(code = %code, error = %e, "Cache read failed, falling back to the store");
            }
        }

        let record = self
            .store(self.repository.get(&code))
            .await?
            .ok_or(LinkError::NotFound)?;

        let ttl = self.cache_ttl(&record, Timestamp::now())?;
        if let Err(e) = self
            .cached(self.cache.set_url(&code, &record.original_url, ttl))
            .await
        {
            warn!(code = %code, error = %e, "Failed to cache resolved URL");
        }
        // Only reached with a code missing from the filter when the filter
        // read above failed; re-adding repairs bits lost with that backend.
        if let Err(e) = self.cached(self.filter.add(&code)).await {
            warn!(code = %code, error = %e, "Failed to add code to membership filter");
        }

        self.clicks.record_hit(code);
        Ok(record.original_url)
    }

    /// Returns the stored record, clicks included.
    pub async fn get_info(&self, code: &str) -> Result<LinkRecord> {
        let code = parse_code(code)?;
        self.store(self.repository.get(&code))
            .await?
            .ok_or(LinkError::NotFound)
    }

    /// Deletes a link. Returns `false` if there was nothing to delete.
    ///
    /// The cached URL is dropped afterwards on a best-effort basis. The code
    /// stays in the membership filter.
    pub async fn delete(&self, code: &str) -> Result<bool> {
        let Ok(code) = parse_code(code) else {
            return Ok(false);
        };

        let deleted = self.store(self.repository.delete(&code)).await?;
        if let Err(e) = self.cached(self.cache.del(&code)).await {
            warn!(code = %code, error = %e, "Failed to evict deleted link from cache");
        }

        if deleted {
            info!(code = %code, "Deleted short link");
        }
        Ok(deleted)
    }

    /// Adds every live code in the store to the membership filter.
    ///
    /// Needed whenever the filter's bits do not outlive the process. Returns
    /// the number of codes added.
    pub async fn warm_filter(&self) -> Result<usize> {
        let codes = self.store(self.repository.live_codes()).await?;

        let mut added = 0;
        for code in &codes {
            match self.cached(self.filter.add(code)).await {
                Ok(()) => added += 1,
                Err(e) => warn!(code = %code, error = %e, "Failed to add code to membership filter"),
            }
        }

        info!(added, total = codes.len(), "Warmed membership filter");
        Ok(added)
    }

    fn cache_ttl(&self, record: &LinkRecord, now: Timestamp) -> Result<Duration> {
        let Some(expire_at) = record.expire_at else {
            return Ok(self.config.default_cache_ttl);
        };

        let remaining = expire_at.duration_since(now);
        if remaining.is_zero() || remaining.is_negative() {
            debug!(code = %record.code, %expire_at, "Record expired before it could be cached");
            return Err(LinkError::Expired);
        }
        Duration::try_from(remaining).map_err(|_| LinkError::Expired)
    }

    async fn store<T, F>(&self, op: F) -> std::result::Result<T, StorageError>
    where
        F: Future<Output = std::result::Result<T, StorageError>>,
    {
        let timeout = self.config.operation_timeout;
        tokio::time::timeout(timeout, op)
            .await
            .unwrap_or_else(|_| Err(StorageError::Timeout(format!("no response within {timeout:?}"))))
    }

    async fn cached<T, F>(&self, op: F) -> std::result::Result<T, CacheError>
    where
        F: Future<Output = std::result::Result<T, CacheError>>,
    {
        let timeout = self.config.operation_timeout;
        tokio::time::timeout(timeout, op)
            .await
            .unwrap_or_else(|_| Err(CacheError::Timeout(format!("no response within {timeout:?}"))))
    }
}

/// Codes that cannot have been issued resolve like unknown ones.
fn parse_code(raw: &str) -> Result<ShortCode> {
    ShortCode::new(raw).map_err(|_| LinkError::NotFound)
}
