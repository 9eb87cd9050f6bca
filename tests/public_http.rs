//! End-to-end tests for the public HTTP surface, driven through the router
//! with an in-memory stand-in for the external view store.

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use tokio::sync::Mutex;
use tower::ServiceExt;

use zefiro::{
    application::{
        catalog::CatalogService,
        stores::{StoreError, ViewStore},
        syndication::SyndicationService,
        views::{ViewCounterService, view_key},
    },
    config::SiteSettings,
    infra::http::{HttpState, build_router},
    presentation::views::LayoutChrome,
};

#[derive(Default)]
struct MemoryViewStore {
    counts: Mutex<HashMap<String, u64>>,
}

impl MemoryViewStore {
    async fn seed(&self, key: &str, value: u64) {
        self.counts.lock().await.insert(key.to_string(), value);
    }
}

#[async_trait]
impl ViewStore for MemoryViewStore {
    async fn incr(&self, key: &str) -> Result<u64, StoreError> {
        let mut counts = self.counts.lock().await;
        let entry = counts.entry(key.to_string()).or_insert(0);
        *entry += 1;
        Ok(*entry)
    }

    async fn get(&self, key: &str) -> Result<Option<u64>, StoreError> {
        Ok(self.counts.lock().await.get(key).copied())
    }
}

struct FailingViewStore;

#[async_trait]
impl ViewStore for FailingViewStore {
    async fn incr(&self, _key: &str) -> Result<u64, StoreError> {
        Err(StoreError::Transport("connection refused".to_string()))
    }

    async fn get(&self, _key: &str) -> Result<Option<u64>, StoreError> {
        Err(StoreError::Transport("connection refused".to_string()))
    }
}

fn site_settings() -> SiteSettings {
    SiteSettings {
        public_url: "https://example.dev".to_string(),
        title: "Example".to_string(),
        description: "An example site".to_string(),
        author: "Example Author".to_string(),
    }
}

fn router_with(store: Arc<dyn ViewStore>) -> Router {
    let site = site_settings();
    build_router(HttpState {
        catalog: Arc::new(CatalogService::new()),
        views: ViewCounterService::new(store),
        syndication: Arc::new(SyndicationService::new(&site)),
        chrome: LayoutChrome::from_site(&site),
    })
}

async fn send(router: &Router, method: &str, uri: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("valid request");
    let response = router.clone().oneshot(request).await.expect("router response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("readable body")
        .to_bytes();
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

async fn wait_for_count(router: &Router, slug: &str, expected: u64) {
    for _ in 0..100 {
        let (status, body) = send(router, "GET", &format!("/api/views/{slug}")).await;
        assert_eq!(status, StatusCode::OK);
        let value: serde_json::Value = serde_json::from_str(&body).expect("json body");
        if value["count"].as_u64() == Some(expected) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("count for `{slug}` never reached {expected}");
}

#[tokio::test]
async fn landing_page_lists_published_posts_only() {
    let router = router_with(Arc::new(MemoryViewStore::default()));
    let (status, body) = send(&router, "GET", "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("CREATE, CREATE2, CREATE3"));
    assert!(body.contains("/posts/contract-creation"));
    assert!(!body.contains("Counting Views Honestly"));
}

#[tokio::test]
async fn post_page_renders_with_prior_view_count() {
    let store = Arc::new(MemoryViewStore::default());
    store.seed(&view_key("contract-creation"), 41).await;
    let router = router_with(store);

    let (status, body) = send(&router, "GET", "/posts/contract-creation").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("CREATE, CREATE2, CREATE3"));
    assert!(body.contains("41 views"));
}

#[tokio::test]
async fn post_page_survives_store_read_failures() {
    let router = router_with(Arc::new(FailingViewStore));
    let (status, body) = send(&router, "GET", "/posts/contract-creation").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("0 views"));
}

#[tokio::test]
async fn unknown_slug_renders_the_not_found_page() {
    let router = router_with(Arc::new(MemoryViewStore::default()));
    let (status, body) = send(&router, "GET", "/posts/does-not-exist").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Page Not Found"));
}

#[tokio::test]
async fn drafts_stay_reachable_by_direct_slug() {
    let router = router_with(Arc::new(MemoryViewStore::default()));
    let (status, body) = send(&router, "GET", "/posts/counting-views-honestly").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Counting Views Honestly"));
}

#[tokio::test]
async fn beacon_increments_exactly_once_per_call() {
    let router = router_with(Arc::new(MemoryViewStore::default()));

    let (status, body) = send(&router, "POST", "/api/views/contract-creation").await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert!(body.is_empty());

    wait_for_count(&router, "contract-creation", 1).await;

    let (status, _) = send(&router, "POST", "/api/views/contract-creation").await;
    assert_eq!(status, StatusCode::ACCEPTED);
    wait_for_count(&router, "contract-creation", 2).await;
}

#[tokio::test]
async fn rendered_count_reflects_views_before_that_render() {
    let router = router_with(Arc::new(MemoryViewStore::default()));

    let (_, body) = send(&router, "GET", "/posts/latency-budgets").await;
    assert!(body.contains("0 views"));

    let (status, _) = send(&router, "POST", "/api/views/latency-budgets").await;
    assert_eq!(status, StatusCode::ACCEPTED);
    wait_for_count(&router, "latency-budgets", 1).await;

    let (_, body) = send(&router, "GET", "/posts/latency-budgets").await;
    assert!(body.contains("1 views"));
}

#[tokio::test]
async fn api_rejects_slugs_missing_from_the_index() {
    let router = router_with(Arc::new(MemoryViewStore::default()));

    let (status, body) = send(&router, "GET", "/api/views/does-not-exist").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("unknown slug"));

    let (status, _) = send(&router, "POST", "/api/views/does-not-exist").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_probe_answers_without_touching_the_store() {
    let router = router_with(Arc::new(FailingViewStore));
    let (status, body) = send(&router, "GET", "/healthz").await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());
}

#[tokio::test]
async fn crawl_surface_covers_published_posts() {
    let router = router_with(Arc::new(MemoryViewStore::default()));

    let (status, robots) = send(&router, "GET", "/robots.txt").await;
    assert_eq!(status, StatusCode::OK);
    assert!(robots.contains("Sitemap: https://example.dev/sitemap.xml"));

    let (status, sitemap) = send(&router, "GET", "/sitemap.xml").await;
    assert_eq!(status, StatusCode::OK);
    assert!(sitemap.contains("https://example.dev/posts/contract-creation"));

    let (status, rss) = send(&router, "GET", "/rss.xml").await;
    assert_eq!(status, StatusCode::OK);
    assert!(rss.contains("<rss version=\"2.0\">"));
    assert!(!rss.contains("counting-views-honestly"));
}

#[tokio::test]
async fn embedded_stylesheet_is_served_immutable() {
    let router = router_with(Arc::new(MemoryViewStore::default()));

    let request = Request::builder()
        .uri("/static/site.css")
        .body(Body::empty())
        .expect("valid request");
    let response = router.clone().oneshot(request).await.expect("router response");

    assert_eq!(response.status(), StatusCode::OK);
    let cache = response
        .headers()
        .get(header::CACHE_CONTROL)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    assert!(cache.contains("immutable"));
}

#[tokio::test]
async fn stray_paths_fall_back_to_not_found() {
    let router = router_with(Arc::new(MemoryViewStore::default()));
    let (status, body) = send(&router, "GET", "/no/such/page").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Page Not Found"));
}
