//! Durable store implementations for short links.

pub mod memory;
pub mod mysql;

pub use memory::InMemoryRepository;
pub use mysql::MySqlRepository;
pub use shortlink_core::{LinkRecord, NewLink, ReadRepository, Repository, StorageError};
