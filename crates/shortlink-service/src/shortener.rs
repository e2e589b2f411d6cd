use crate::error::Result;
use crate::service::{CreatedLink, LinkService};
use async_trait::async_trait;
use shortlink_core::{BitStore, LinkRecord, Repository, UrlCache};
use shortlink_generator::Generator;

/// Object-safe view of [`LinkService`], so transports can hold one without
/// naming its backends.
#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    async fn create(&self, original_url: &str, expires_at: &str) -> Result<CreatedLink>;

    async fn resolve(&self, code: &str) -> Result<String>;

    async fn get_info(&self, code: &str) -> Result<LinkRecord>;

    async fn delete(&self, code: &str) -> Result<bool>;
}

#[async_trait]
impl<R, C, B, G> Shortener for LinkService<R, C, B, G>
where
    R: Repository,
    C: UrlCache,
    B: BitStore,
    G: Generator,
{
    async fn create(&self, original_url: &str, expires_at: &str) -> Result<CreatedLink> {
        LinkService::create(self, original_url, expires_at).await
    }

    async fn resolve(&self, code: &str) -> Result<String> {
        LinkService::resolve(self, code).await
    }

    async fn get_info(&self, code: &str) -> Result<LinkRecord> {
        LinkService::get_info(self, code).await
    }

    async fn delete(&self, code: &str) -> Result<bool> {
        LinkService::delete(self, code).await
    }
}
