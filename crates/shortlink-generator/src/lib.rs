pub mod random;

pub use random::RandomGenerator;

use shortlink_core::ShortCode;
use std::sync::Arc;

/// Trait for generating short codes.
///
/// Implementations are pure generators that don't interact with storage.
/// Uniqueness is checked by the caller against the durable store, which
/// retries with a fresh candidate on collision.
pub trait Generator: Send + Sync + 'static {
    /// Produces the next candidate code.
    fn generate(&self) -> ShortCode;
}

impl<G: Generator + ?Sized> Generator for Arc<G> {
    fn generate(&self) -> ShortCode {
        (**self).generate()
    }
}

impl<G: Generator + ?Sized> Generator for Box<G> {
    fn generate(&self) -> ShortCode {
        (**self).generate()
    }
}
