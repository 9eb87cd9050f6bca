//! Per-post view counters over the external key-value store.
//!
//! Reads happen during server render and degrade to zero on any failure.
//! Increments are detached from the request that triggered them; a lost
//! increment is tolerated and never retried.

use std::sync::Arc;

use metrics::counter;
use tracing::warn;

use crate::application::stores::{StoreError, ViewStore};

const VIEW_KEY_PREFIX: &str = "pageviews:posts";

/// Counter key for a post slug, e.g. `pageviews:posts:contract-creation`.
pub fn view_key(slug: &str) -> String {
    format!("{VIEW_KEY_PREFIX}:{slug}")
}

#[derive(Clone)]
pub struct ViewCounterService {
    store: Arc<dyn ViewStore>,
}

impl ViewCounterService {
    pub fn new(store: Arc<dyn ViewStore>) -> Self {
        Self { store }
    }

    /// Current count for a slug. Absent keys and store failures both read
    /// as zero; the page renders either way.
    pub async fn view_count(&self, slug: &str) -> u64 {
        counter!("zefiro_views_read_total").increment(1);
        match self.store.get(&view_key(slug)).await {
            Ok(Some(count)) => count,
            Ok(None) | Err(StoreError::Disabled) => 0,
            Err(err) => {
                counter!("zefiro_views_read_error_total").increment(1);
                warn!(
                    target = "zefiro::views",
                    slug = slug,
                    error = %err,
                    "view count read failed, rendering zero"
                );
                0
            }
        }
    }

    /// Record one page view. Fire-and-forget: the increment runs on a
    /// detached task and the caller never observes its outcome.
    pub fn record_view(&self, slug: &str) {
        let store = self.store.clone();
        let key = view_key(slug);
        let slug = slug.to_string();
        tokio::spawn(async move {
            counter!("zefiro_views_incr_total").increment(1);
            match store.incr(&key).await {
                Ok(_) | Err(StoreError::Disabled) => {}
                Err(err) => {
                    counter!("zefiro_views_incr_error_total").increment(1);
                    warn!(
                        target = "zefiro::views",
                        slug = %slug,
                        error = %err,
                        "view increment dropped"
                    );
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_keys_are_namespaced_by_slug() {
        assert_eq!(
            view_key("contract-creation"),
            "pageviews:posts:contract-creation"
        );
    }
}
