use std::sync::Arc;
use std::time::Duration;

use redis::AsyncCommands;
use shortlink_cache::{MembershipFilter, MembershipFilterConfig, RedisBitStore, RedisUrlCache};
use shortlink_generator::RandomGenerator;
use shortlink_service::{LinkError, LinkService, LinkServiceConfig};
use shortlink_storage::InMemoryRepository;
use shortlink_test_infra::redis::RedisServer;

type Service = LinkService<InMemoryRepository, RedisUrlCache, RedisBitStore, RandomGenerator>;

struct Fixture {
    _redis: RedisServer,
    conn: redis::aio::MultiplexedConnection,
    service: Service,
}

impl Fixture {
    async fn start() -> Self {
        let redis = RedisServer::new().await.expect("start redis");
        let conn = redis.connection().await.expect("connect redis");

        let filter = MembershipFilter::new(
            MembershipFilterConfig::builder()
                .expected_items(10_000)
                .false_positive_rate(0.01)
                .build(),
            RedisBitStore::new(conn.clone()),
        )
        .unwrap();
        let service = LinkService::new(
            LinkServiceConfig::builder().base_url("https://sho.rt").build(),
            InMemoryRepository::new(),
            RedisUrlCache::new(conn.clone()),
            filter,
            RandomGenerator::new(),
        );

        Self {
            _redis: redis,
            conn,
            service,
        }
    }
}

#[tokio::test]
async fn resolve_populates_redis_with_a_day_long_ttl() {
    let mut fixture = Fixture::start().await;

    let created = fixture
        .service
        .create("https://example.com/page", "")
        .await
        .unwrap();
    assert_eq!(created.short_url, format!("https://sho.rt/{}", created.code));

    let url = fixture.service.resolve(created.code.as_str()).await.unwrap();
    assert_eq!(url, "https://example.com/page");

    let key = format!("shortlink:{}", created.code);
    let cached: Option<String> = fixture.conn.get(&key).await.unwrap();
    assert_eq!(cached.as_deref(), Some("https://example.com/page"));

    let ttl: i64 = fixture.conn.ttl(&key).await.unwrap();
    assert!(ttl > 24 * 60 * 60 - 5 && ttl <= 24 * 60 * 60, "ttl = {ttl}");

    let bloom_exists: bool = fixture.conn.exists("shortlink:bloom").await.unwrap();
    assert!(bloom_exists);
}

#[tokio::test]
async fn delete_evicts_the_cached_url() {
    let mut fixture = Fixture::start().await;

    let created = fixture.service.create("https://example.com", "").await.unwrap();
    let code = created.code.as_str();
    fixture.service.resolve(code).await.unwrap();

    assert!(fixture.service.delete(code).await.unwrap());

    let key = format!("shortlink:{code}");
    let cached: Option<String> = fixture.conn.get(&key).await.unwrap();
    assert!(cached.is_none());
    assert!(matches!(
        fixture.service.resolve(code).await,
        Err(LinkError::NotFound)
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn clicks_are_counted_for_cache_hits() {
    let fixture = Fixture::start().await;

    let created = fixture.service.create("https://example.com", "").await.unwrap();
    let code = created.code.as_str();
    for _ in 0..5 {
        fixture.service.resolve(code).await.unwrap();
    }

    awaitility::at_most(Duration::from_secs(5))
        .poll_interval(Duration::from_millis(50))
        .until_async(|| async {
            fixture
                .service
                .get_info(code)
                .await
                .map(|record| record.click_count == 5)
                .unwrap_or(false)
        })
        .await;
}

#[tokio::test]
async fn nodes_sharing_the_bloom_key_resolve_each_others_links() {
    let redis = RedisServer::new().await.expect("start redis");
    let conn = redis.connection().await.expect("connect redis");
    let repository = Arc::new(InMemoryRepository::new());

    let node = || {
        let filter = MembershipFilter::new(
            MembershipFilterConfig::builder()
                .expected_items(10_000)
                .false_positive_rate(0.01)
                .build(),
            RedisBitStore::new(conn.clone()),
        )
        .unwrap();
        LinkService::new(
            LinkServiceConfig::builder().base_url("https://sho.rt").build(),
            Arc::clone(&repository),
            RedisUrlCache::new(conn.clone()),
            filter,
            RandomGenerator::new(),
        )
    };
    let (node_a, node_b) = (node(), node());

    node_b.warm_filter().await.unwrap();
    let created = node_a.create("https://example.com/shared", "").await.unwrap();

    assert_eq!(
        node_b.resolve(created.code.as_str()).await.unwrap(),
        "https://example.com/shared"
    );
}
