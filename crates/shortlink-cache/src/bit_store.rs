use async_trait::async_trait;
use parking_lot::RwLock;
use shortlink_core::cache::Result;
use shortlink_core::{BitStore, CacheError};
use tracing::{trace, warn};

use crate::error::map_redis_error;

/// Default Redis key holding the membership filter bitmap.
pub const DEFAULT_BITMAP_KEY: &str = "shortlink:bloom";

/// A bit array stored in a single Redis string.
///
/// Each call is sent as one pipeline, so setting or reading `k` bits costs a
/// single round trip no matter how large `k` is. Redis grows the string on
/// demand; bits that were never set read as zero.
#[derive(Debug, Clone)]
pub struct RedisBitStore {
    conn: redis::aio::MultiplexedConnection,
    key: String,
}

impl RedisBitStore {
    pub fn new(conn: redis::aio::MultiplexedConnection) -> Self {
        Self::with_key(conn, DEFAULT_BITMAP_KEY)
    }

    pub fn with_key(conn: redis::aio::MultiplexedConnection, key: impl Into<String>) -> Self {
        Self {
            conn,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

fn to_offset(offset: u64) -> Result<usize> {
    usize::try_from(offset)
        .map_err(|_| CacheError::InvalidData(format!("bit offset {offset} does not fit in usize")))
}

#[async_trait]
impl BitStore for RedisBitStore {
    async fn set_bits(&self, offsets: &[u64]) -> Result<()> {
        if offsets.is_empty() {
            return Ok(());
        }

        let mut pipe = redis::pipe();
        for &offset in offsets {
            pipe.setbit(&self.key, to_offset(offset)?, true).ignore();
        }

        let mut conn = self.conn.clone();
        pipe.query_async::<()>(&mut conn).await.map_err(|e| {
            warn!(key = %self.key, error = %e, "Failed to set bitmap bits");
            map_redis_error("failed to set bits in Redis", e)
        })?;
        trace!(key = %self.key, count = offsets.len(), "Set bitmap bits");
        Ok(())
    }

    async fn get_bits(&self, offsets: &[u64]) -> Result<Vec<bool>> {
        if offsets.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        for &offset in offsets {
            pipe.getbit(&self.key, to_offset(offset)?);
        }

        let mut conn = self.conn.clone();
        let bits = pipe.query_async::<Vec<bool>>(&mut conn).await.map_err(|e| {
            warn!(key = %self.key, error = %e, "Failed to read bitmap bits");
            map_redis_error("failed to read bits from Redis", e)
        })?;

        if bits.len() != offsets.len() {
            return Err(CacheError::InvalidData(format!(
                "expected {} bits from Redis, got {}",
                offsets.len(),
                bits.len()
            )));
        }
        Ok(bits)
    }
}

/// A process-local bit array, packed into 64-bit words.
///
/// Grows on demand like its Redis counterpart.
#[derive(Debug, Default)]
pub struct InMemoryBitStore {
    words: RwLock<Vec<u64>>,
}

impl InMemoryBitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preallocates room for `bits` bits.
    pub fn with_bits(bits: u64) -> Self {
        let words = bits.div_ceil(64) as usize;
        Self {
            words: RwLock::new(vec![0; words]),
        }
    }

    /// Number of bits currently set.
    pub fn count_ones(&self) -> u64 {
        self.words
            .read()
            .iter()
            .map(|word| u64::from(word.count_ones()))
            .sum()
    }
}

fn locate(offset: u64) -> Result<(usize, u64)> {
    let word = to_offset(offset / 64)?;
    Ok((word, 1u64 << (offset % 64)))
}

#[async_trait]
impl BitStore for InMemoryBitStore {
    async fn set_bits(&self, offsets: &[u64]) -> Result<()> {
        let mut words = self.words.write();
        for &offset in offsets {
            let (word, mask) = locate(offset)?;
            if word >= words.len() {
                words.resize(word + 1, 0);
            }
            words[word] |= mask;
        }
        Ok(())
    }

    async fn get_bits(&self, offsets: &[u64]) -> Result<Vec<bool>> {
        let words = self.words.read();
        offsets
            .iter()
            .map(|&offset| {
                let (word, mask) = locate(offset)?;
                Ok(words.get(word).is_some_and(|w| w & mask != 0))
            })
            .collect()
    }
}
