//! Link creation, resolution and deletion on top of the durable store, the
//! fast cache and the membership filter.

pub mod clicks;
pub mod config;
pub mod error;
pub mod service;
pub mod shortener;

pub use clicks::ClickRecorder;
pub use config::LinkServiceConfig;
pub use error::{LinkError, Result};
pub use service::{CreatedLink, LinkService};
pub use shortener::Shortener;
