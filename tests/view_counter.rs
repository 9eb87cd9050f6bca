//! Behavioral tests for the view counter service against store doubles.

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::sync::Mutex;

use zefiro::{
    application::{
        stores::{StoreError, ViewStore},
        views::{ViewCounterService, view_key},
    },
    infra::kv::DisabledViewStore,
};

#[derive(Default)]
struct MemoryViewStore {
    counts: Mutex<HashMap<String, u64>>,
}

impl MemoryViewStore {
    async fn count(&self, key: &str) -> Option<u64> {
        self.counts.lock().await.get(key).copied()
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

async fn wait_for(service: &ViewCounterService, slug: &str, expected: u64) {
    for _ in 0..100 {
        if service.view_count(slug).await == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("count for `{slug}` never reached {expected}");
}

#[tokio::test]
async fn never_viewed_slugs_read_as_zero() {
    let service = ViewCounterService::new(Arc::new(MemoryViewStore::default()));
    assert_eq!(service.view_count("contract-creation").await, 0);
}

#[tokio::test]
async fn one_recorded_view_reads_back_plus_one() {
    let store = Arc::new(MemoryViewStore::default());
    let service = ViewCounterService::new(store.clone());

    let before = service.view_count("contract-creation").await;
    service.record_view("contract-creation");
    wait_for(&service, "contract-creation", before + 1).await;

    assert_eq!(
        store.count(&view_key("contract-creation")).await,
        Some(before + 1)
    );
}

#[tokio::test]
async fn concurrent_views_all_land_and_never_decrease() {
    let store = Arc::new(MemoryViewStore::default());
    let service = ViewCounterService::new(store.clone());

    for _ in 0..20 {
        service.record_view("edge-rate-limiting");
    }
    wait_for(&service, "edge-rate-limiting", 20).await;

    // Creation starts the counter at one; it only ever moves up from there.
    let mut last = 0;
    for _ in 0..5 {
        service.record_view("edge-rate-limiting");
        let seen = service.view_count("edge-rate-limiting").await;
        assert!(seen >= last);
        last = seen;
    }
    wait_for(&service, "edge-rate-limiting", 25).await;
}

#[tokio::test]
async fn store_read_failures_degrade_to_zero() {
    let service = ViewCounterService::new(Arc::new(FailingViewStore));
    assert_eq!(service.view_count("contract-creation").await, 0);
}

#[tokio::test]
async fn store_increment_failures_are_swallowed() {
    let service = ViewCounterService::new(Arc::new(FailingViewStore));
    // Nothing to assert beyond "this neither panics nor blocks".
    service.record_view("contract-creation");
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(service.view_count("contract-creation").await, 0);
}

#[tokio::test]
async fn disabled_store_reads_zero_and_drops_increments() {
    let service = ViewCounterService::new(Arc::new(DisabledViewStore));

    assert_eq!(service.view_count("contract-creation").await, 0);
    service.record_view("contract-creation");
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(service.view_count("contract-creation").await, 0);
}
