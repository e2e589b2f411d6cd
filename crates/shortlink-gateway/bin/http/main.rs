use anyhow::Context;
use clap::Parser;
use shortlink_admission::{AdmissionController, RateLimitConfig};
use shortlink_cache::{
    InMemoryBitStore, MembershipFilter, MembershipFilterConfig, MokaUrlCache, RedisBitStore,
    RedisUrlCache,
};
use shortlink_core::{BitStore, Repository, UrlCache};
use shortlink_gateway::cli::{CacheBackendArg, StorageBackendArg, CLI};
use shortlink_gateway::{App, AppState};
use shortlink_generator::RandomGenerator;
use shortlink_service::{LinkService, LinkServiceConfig};
use shortlink_storage::{InMemoryRepository, MySqlRepository};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = CLI::try_parse()?;
    config.check_backends()?;

    info!(
        listen_addr = %config.listen_addr,
        base_url = %config.base_url,
        storage_backend = %config.storage,
        cache_backend = %config.cache,
        "starting short link gateway"
    );

    match config.storage {
        StorageBackendArg::InMemory => with_cache(config, InMemoryRepository::new()).await,
        StorageBackendArg::Mysql => {
            let dsn = config
                .mysql_dsn
                .clone()
                .context("mysql dsn is required when storage backend is mysql")?;
            let repository = MySqlRepository::connect(&dsn).await?;
            repository.ensure_schema().await?;
            with_cache(config, repository).await
        }
    }
}

async fn with_cache<R: Repository>(config: CLI, repository: R) -> anyhow::Result<()> {
    match config.cache {
        CacheBackendArg::InMemory => {
            let bits = InMemoryBitStore::new();
            run_server(config, repository, MokaUrlCache::new(), bits).await
        }
        CacheBackendArg::Redis => {
            let url = config
                .redis_url
                .clone()
                .context("redis url is required when cache backend is redis")?;
            let conn = redis::Client::open(url)?
                .get_multiplexed_async_connection()
                .await?;
            let cache = RedisUrlCache::new(conn.clone());
            run_server(config, repository, cache, RedisBitStore::new(conn)).await
        }
    }
}

async fn run_server<R, C, B>(config: CLI, repository: R, cache: C, bits: B) -> anyhow::Result<()>
where
    R: Repository,
    C: UrlCache,
    B: BitStore,
{
    let filter = MembershipFilter::new(
        MembershipFilterConfig::builder()
            .expected_items(config.bloom_expected_items)
            .false_positive_rate(config.bloom_false_positive_rate)
            .build(),
        bits,
    )?;
    let stats = filter.stats();
    info!(
        bit_size = stats.bit_size,
        hash_count = stats.hash_count,
        "membership filter ready"
    );

    let service = LinkService::new(
        LinkServiceConfig::builder()
            .base_url(config.base_url.clone())
            .build(),
        repository,
        cache,
        filter,
        RandomGenerator::new(),
    );
    if config.warm_filter {
        let warmed = service.warm_filter().await?;
        info!(codes = warmed, "warmed membership filter from store");
    }

    let admission = AdmissionController::new(
        RateLimitConfig::builder()
            .capacity(config.rate_limit_capacity)
            .refill_per_second(config.rate_limit_refill_per_second)
            .build(),
    )?;

    let state = AppState::new(Arc::new(service), admission, config.api_keys);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!(listen_addr = %listener.local_addr()?, "serving HTTP");

    axum::serve(listener, App::router(state)).await?;
    Ok(())
}
