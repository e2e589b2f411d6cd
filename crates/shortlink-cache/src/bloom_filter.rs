//! Probabilistic membership filter for fast negative lookups.
//!
//! The filter answers "is this short code definitely unknown?" without
//! touching the durable store. It never produces false negatives: once a
//! code has been added, [`MembershipFilter::contains`] reports it as possibly
//! present forever. Codes that were never added are reported as definitely
//! absent with probability of at least `1 - p`.
//!
//! # Sizing
//!
//! For `n` expected items and a target false positive rate `p`:
//!
//! ```text
//! m = ceil(-n * ln(p) / ln(2)^2 * 1.5)
//! k = ceil(m / n * ln(2) * 1.5)
//! ```
//!
//! Both values carry a 1.5x margin so the realized rate stays under `p` as the
//! load approaches `n`.
//!
//! # Hashing
//!
//! Bit indices come from double hashing: `index_i = (h1 + i * h2) mod m`,
//! where `h1` is 64-bit FNV-1a and `h2` is 64-bit FNV-1 over the code bytes.
//!
//! # Limitations
//!
//! Bits are never cleared, so deletions cannot be represented. A deleted code
//! stays "possibly present" until the bit array is rebuilt; a positive answer
//! is only ever a hint to consult the durable store.

use shortlink_core::cache::Result;
use shortlink_core::{BitStore, CacheError, ShortCode};
use tracing::trace;
use typed_builder::TypedBuilder;

const SIZING_MARGIN: f64 = 1.5;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Configuration for the membership filter.
#[derive(Debug, Clone, TypedBuilder)]
pub struct MembershipFilterConfig {
    /// Expected number of distinct codes.
    ///
    /// Setting this too low increases the false positive rate once the
    /// filter fills up.
    pub expected_items: u64,

    /// Target false positive rate, strictly between 0.0 and 1.0.
    pub false_positive_rate: f64,
}

/// Sizing information for a constructed filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MembershipFilterStats {
    pub bit_size: u64,
    pub hash_count: u32,
    pub expected_items: u64,
    pub false_positive_rate: f64,
}

/// Outcome of a membership query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    DefinitelyAbsent,
    PossiblyPresent,
}

impl Membership {
    pub fn is_possibly_present(self) -> bool {
        matches!(self, Membership::PossiblyPresent)
    }
}

/// A Bloom filter whose bit array lives in a [`BitStore`].
///
/// The bit store may be shared between processes (e.g. one Redis key), in
/// which case every process sees every other process's additions.
#[derive(Debug)]
pub struct MembershipFilter<B> {
    store: B,
    bit_size: u64,
    hash_count: u32,
    config: MembershipFilterConfig,
}

impl<B: BitStore> MembershipFilter<B> {
    /// Creates a filter over `store`.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Initialization` when `expected_items` is zero or
    /// the false positive rate is not in `(0, 1)`.
    pub fn new(config: MembershipFilterConfig, store: B) -> Result<Self> {
        let (bit_size, hash_count) = optimal_size(&config)?;
        Ok(Self {
            store,
            bit_size,
            hash_count,
            config,
        })
    }

    /// Marks `code` as present.
    pub async fn add(&self, code: &ShortCode) -> Result<()> {
        let offsets = self.offsets(code);
        self.store.set_bits(&offsets).await?;
        trace!(code = %code, "Added code to membership filter");
        Ok(())
    }

    /// Checks whether `code` may have been added.
    pub async fn contains(&self, code: &ShortCode) -> Result<Membership> {
        let offsets = self.offsets(code);
        let bits = self.store.get_bits(&offsets).await?;

        if bits.iter().all(|&bit| bit) {
            Ok(Membership::PossiblyPresent)
        } else {
            Ok(Membership::DefinitelyAbsent)
        }
    }

    pub fn stats(&self) -> MembershipFilterStats {
        MembershipFilterStats {
            bit_size: self.bit_size,
            hash_count: self.hash_count,
            expected_items: self.config.expected_items,
            false_positive_rate: self.config.false_positive_rate,
        }
    }

    pub fn store(&self) -> &B {
        &self.store
    }

    fn offsets(&self, code: &ShortCode) -> Vec<u64> {
        let bytes = code.as_str().as_bytes();
        let h1 = fnv1a_64(bytes);
        let h2 = fnv1_64(bytes);

        (0..u64::from(self.hash_count))
            .map(|i| h1.wrapping_add(i.wrapping_mul(h2)) % self.bit_size)
            .collect()
    }
}

fn optimal_size(config: &MembershipFilterConfig) -> Result<(u64, u32)> {
    let n = config.expected_items;
    let p = config.false_positive_rate;

    if n == 0 {
        return Err(CacheError::Initialization(
            "expected_items must be greater than zero".to_string(),
        ));
    }
    if !(p > 0.0 && p < 1.0) {
        return Err(CacheError::Initialization(format!(
            "false_positive_rate must be in (0, 1), got {p}"
        )));
    }

    let n = n as f64;
    let ln2 = std::f64::consts::LN_2;
    let m = (-n * p.ln() / (ln2 * ln2) * SIZING_MARGIN).ceil();
    let k = (m / n * ln2 * SIZING_MARGIN).ceil();

    Ok((m as u64, k as u32))
}

fn fnv1a_64(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

fn fnv1_64(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &byte| {
        hash.wrapping_mul(FNV_PRIME) ^ u64::from(byte)
    })
}
