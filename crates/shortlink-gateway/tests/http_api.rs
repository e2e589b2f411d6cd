use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use shortlink_admission::{AdmissionController, RateLimitConfig};
use jiff::Timestamp;
use shortlink_cache::{InMemoryBitStore, MembershipFilter, MembershipFilterConfig, MokaUrlCache};
use shortlink_core::repository::Result as StoreResult;
use shortlink_core::{LinkRecord, NewLink, ReadRepository, Repository, ShortCode};
use shortlink_gateway::middleware::API_KEY_HEADER;
use shortlink_gateway::{App, AppState};
use shortlink_generator::RandomGenerator;
use shortlink_service::{LinkService, LinkServiceConfig};
use shortlink_storage::InMemoryRepository;
use std::sync::Arc;
use tower::ServiceExt;

const API_KEY: &str = "test-api-key";

fn router_with_rate_limit(capacity: u32) -> Router {
    router_over(InMemoryRepository::new(), capacity)
}

fn router_over<R: Repository>(repository: R, capacity: u32) -> Router {
    let filter = MembershipFilter::new(
        MembershipFilterConfig::builder()
            .expected_items(1000)
            .false_positive_rate(0.01)
            .build(),
        InMemoryBitStore::new(),
    )
    .unwrap();
    let service = LinkService::new(
        LinkServiceConfig::builder()
            .base_url("https://sho.rt")
            .build(),
        repository,
        MokaUrlCache::new(),
        filter,
        RandomGenerator::new(),
    );
    let admission = AdmissionController::new(
        RateLimitConfig::builder()
            .capacity(capacity)
            .refill_per_second(1)
            .build(),
    )
    .unwrap();

    App::router(AppState::new(
        Arc::new(service),
        admission,
        [API_KEY.to_string()],
    ))
}

/// Serves every stored record as if it expired the moment it was read.
#[derive(Default)]
struct ExpiresOnRead {
    inner: InMemoryRepository,
}

#[async_trait]
impl ReadRepository for ExpiresOnRead {
    async fn get(&self, code: &ShortCode) -> StoreResult<Option<LinkRecord>> {
        let record = self.inner.get(code).await?;
        Ok(record.map(|record| LinkRecord {
            expire_at: Some(Timestamp::now()),
            ..record
        }))
    }

    async fn exists(&self, code: &ShortCode) -> StoreResult<bool> {
        self.inner.exists(code).await
    }

    async fn live_codes(&self) -> StoreResult<Vec<ShortCode>> {
        self.inner.live_codes().await
    }
}

#[async_trait]
impl Repository for ExpiresOnRead {
    async fn insert(&self, link: NewLink) -> StoreResult<()> {
        self.inner.insert(link).await
    }

    async fn increment_clicks(&self, code: &ShortCode) -> StoreResult<()> {
        self.inner.increment_clicks(code).await
    }

    async fn delete(&self, code: &ShortCode) -> StoreResult<bool> {
        self.inner.delete(code).await
    }
}

fn router() -> Router {
    router_with_rate_limit(1000)
}

fn shorten_request(key: Option<&str>, body: String) -> Request<Body> {
    let mut builder = Request::post("/api/v1/shorten").header(header::CONTENT_TYPE, "application/json");
    if let Some(key) = key {
        builder = builder.header(API_KEY_HEADER, key);
    }
    builder.body(Body::from(body)).unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn shorten(app: &Router, url: &str) -> Value {
    let response = app
        .clone()
        .oneshot(shorten_request(
            Some(API_KEY),
            json!({ "original_url": url }).to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    json_body(response).await
}

#[tokio::test]
async fn health_reports_ok() {
    let response = router()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "status": "ok" }));
}

#[tokio::test]
async fn shorten_requires_an_api_key() {
    let body = json!({ "original_url": "https://example.com" }).to_string();

    let response = router()
        .oneshot(shorten_request(None, body.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "API key required");

    let response = router()
        .oneshot(shorten_request(Some("wrong"), body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "Invalid API key");
}

#[tokio::test]
async fn shortened_link_redirects() {
    let app = router();
    let created = shorten(&app, "https://example.com/landing").await;

    let code = created["short_code"].as_str().unwrap().to_string();
    assert_eq!(code.len(), 6);
    assert_eq!(created["short_url"], format!("https://sho.rt/{code}"));
    assert_eq!(created["original_url"], "https://example.com/landing");
    assert!(created["expires_at"].is_null());

    let response = app
        .oneshot(Request::get(format!("/{code}")).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "https://example.com/landing"
    );
}

#[tokio::test]
async fn unknown_code_is_not_found() {
    let response = router()
        .oneshot(Request::get("/nope42").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["error"], "Short link not found");
}

#[tokio::test]
async fn invalid_url_is_a_bad_request() {
    let response = router()
        .oneshot(shorten_request(
            Some(API_KEY),
            json!({ "original_url": "ftp://example.com" }).to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["error"].is_string());
}

#[tokio::test]
async fn oversized_url_is_a_bad_request() {
    let url = format!("https://example.com/{}", "a".repeat(2000));
    let response = router()
        .oneshot(shorten_request(
            Some(API_KEY),
            json!({ "original_url": url }).to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let response = router()
        .oneshot(shorten_request(Some(API_KEY), "{not json".to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn link_info_and_delete() {
    let app = router();
    let created = shorten(&app, "https://example.com/info").await;
    let code = created["short_code"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(
            Request::get(format!("/api/v1/links/{code}"))
                .header(API_KEY_HEADER, API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let info = json_body(response).await;
    assert_eq!(info["short_code"], code.as_str());
    assert_eq!(info["original_url"], "https://example.com/info");

    let response = app
        .clone()
        .oneshot(
            Request::delete(format!("/api/v1/links/{code}"))
                .header(API_KEY_HEADER, API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(Request::get(format!("/{code}")).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn redirects_are_rate_limited() {
    let app = router_with_rate_limit(2);

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(Request::get("/nope42").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    let response = app
        .oneshot(Request::get("/nope42").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json_body(response).await["error"], "Too many requests");
}

#[tokio::test]
async fn expired_link_is_gone() {
    let app = router_over(ExpiresOnRead::default(), 1000);
    let created = shorten(&app, "https://example.com/stale").await;
    let code = created["short_code"].as_str().unwrap().to_string();

    let response = app
        .oneshot(Request::get(format!("/{code}")).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GONE);
    assert_eq!(
        json_body(response).await,
        json!({ "error": "Short link has expired" })
    );
}
