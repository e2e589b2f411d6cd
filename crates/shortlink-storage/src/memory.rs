use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use jiff::Timestamp;
use shortlink_core::repository::Result;
use shortlink_core::{LinkRecord, NewLink, ReadRepository, Repository, ShortCode, StorageError};
use tracing::trace;

/// In-memory implementation of the Repository trait using DashMap.
///
/// DashMap shards its locks, so inserts, reads and click increments on
/// different codes do not block each other. Expired records stay in the map
/// (their codes remain taken) but are hidden from [`ReadRepository::get`].
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    storage: DashMap<String, LinkRecord>,
}

impl InMemoryRepository {
    /// Creates a new in-memory repository.
    pub fn new() -> Self {
        Self {
            storage: DashMap::new(),
        }
    }

    /// Creates a new in-memory repository with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: DashMap::with_capacity(capacity),
        }
    }

    /// Number of stored records, expired ones included.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

#[async_trait]
impl ReadRepository for InMemoryRepository {
    async fn get(&self, code: &ShortCode) -> Result<Option<LinkRecord>> {
        let Some(entry) = self.storage.get(code.as_str()) else {
            return Ok(None);
        };

        if entry.is_expired_at(Timestamp::now()) {
            trace!(code = %code, "stored record has expired");
            return Ok(None);
        }

        Ok(Some(entry.clone()))
    }

    async fn exists(&self, code: &ShortCode) -> Result<bool> {
        Ok(self.storage.contains_key(code.as_str()))
    }

    async fn live_codes(&self) -> Result<Vec<ShortCode>> {
        let now = Timestamp::now();
        Ok(self
            .storage
            .iter()
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| entry.code.clone())
            .collect())
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn insert(&self, link: NewLink) -> Result<()> {
        // entry() holds the shard lock, so check-and-insert is atomic.
        match self.storage.entry(link.code.as_str().to_owned()) {
            Entry::Occupied(_) => Err(StorageError::Conflict(link.code.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(link.into_record(Timestamp::now()));
                Ok(())
            }
        }
    }

    async fn increment_clicks(&self, code: &ShortCode) -> Result<()> {
        if let Some(mut entry) = self.storage.get_mut(code.as_str()) {
            entry.click_count = entry.click_count.saturating_add(1);
        }
        Ok(())
    }

    async fn delete(&self, code: &ShortCode) -> Result<bool> {
        Ok(self.storage.remove(code.as_str()).is_some())
    }
}
