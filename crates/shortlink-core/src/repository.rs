use crate::error::StorageError;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A stored short link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// The short code identifying this link. Immutable once assigned.
    pub code: ShortCode,
    /// The original URL that was shortened.
    pub original_url: String,
    pub created_at: Timestamp,
    pub modified_at: Timestamp,
    /// When the record expires, if ever.
    pub expire_at: Option<Timestamp>,
    /// Number of successful resolutions. Never decreases.
    pub click_count: u64,
}

impl LinkRecord {
    /// Returns `true` once `now` has reached the expiration timestamp.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expire_at.is_some_and(|expire_at| expire_at <= now)
    }
}

/// A link about to be persisted.
///
/// The store stamps the creation and modification times and starts the
/// click counter at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLink {
    pub code: ShortCode,
    pub original_url: String,
    pub expire_at: Option<Timestamp>,
}

impl NewLink {
    /// Materializes the record as it looks right after insertion.
    pub fn into_record(self, now: Timestamp) -> LinkRecord {
        LinkRecord {
            code: self.code,
            original_url: self.original_url,
            created_at: now,
            modified_at: now,
            expire_at: self.expire_at,
            click_count: 0,
        }
    }
}

/// A read-only view of the durable store.
#[async_trait]
pub trait ReadRepository: Send + Sync + 'static {
    /// Retrieves the record for a given short code.
    ///
    /// Returns `None` if the code does not exist or its expiration has passed;
    /// expired rows are invisible to reads even while still stored.
    async fn get(&self, code: &ShortCode) -> Result<Option<LinkRecord>>;

    /// Checks whether a short code is taken, including by expired records.
    async fn exists(&self, code: &ShortCode) -> Result<bool>;

    /// Lists the codes of every record that has not expired yet.
    ///
    /// Used to seed in-process lookup structures at startup.
    async fn live_codes(&self) -> Result<Vec<ShortCode>>;
}

#[async_trait]
pub trait Repository: ReadRepository {
    /// Inserts a new record. Returns `Err(Conflict)` if the code already exists.
    async fn insert(&self, link: NewLink) -> Result<()>;

    /// Atomically increments the click counter. Unknown codes are ignored.
    async fn increment_clicks(&self, code: &ShortCode) -> Result<()>;

    /// Deletes the record for a given short code.
    /// Returns `true` if the record existed and was removed.
    async fn delete(&self, code: &ShortCode) -> Result<bool>;
}

#[async_trait]
impl<T: ReadRepository + ?Sized> ReadRepository for Arc<T> {
    async fn get(&self, code: &ShortCode) -> Result<Option<LinkRecord>> {
        (**self).get(code).await
    }

    async fn exists(&self, code: &ShortCode) -> Result<bool> {
        (**self).exists(code).await
    }

    async fn live_codes(&self) -> Result<Vec<ShortCode>> {
        (**self).live_codes().await
    }
}

#[async_trait]
impl<T: Repository + ?Sized> Repository for Arc<T> {
    async fn insert(&self, link: NewLink) -> Result<()> {
        (**self).insert(link).await
    }

    async fn increment_clicks(&self, code: &ShortCode) -> Result<()> {
        (**self).increment_clicks(code).await
    }

    async fn delete(&self, code: &ShortCode) -> Result<bool> {
        (**self).delete(code).await
    }
}
