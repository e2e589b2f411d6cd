//! Core types and traits for the short link service.
//!
//! This crate provides the shared vocabulary used by the storage, cache,
//! generator and service crates: short codes, link records, input validation
//! and the traits that describe the durable store and the fast cache.

pub mod cache;
pub mod error;
pub mod expiration;
pub mod repository;
pub mod shortcode;
pub mod validate;

pub use cache::{BitStore, UrlCache};
pub use error::{CacheError, CoreError, StorageError};
pub use expiration::parse_expiration;
pub use repository::{LinkRecord, NewLink, ReadRepository, Repository};
pub use shortcode::ShortCode;
pub use validate::{validate_url, MAX_URL_LENGTH};
