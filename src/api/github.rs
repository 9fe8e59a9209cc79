use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{Json, extract::State};
use tokio::sync::RwLock;
use tracing::debug;

use crate::AppState;
use crate::github::{self, GithubData};

/// Last aggregated payload with its fetch instant. Shared across requests;
/// a degraded (empty) payload is never kept, so the next request retries.
#[derive(Clone, Default)]
pub struct GithubCache {
    inner: Arc<RwLock<Option<CacheEntry>>>,
}

#[derive(Clone)]
struct CacheEntry {
    fetched_at: Instant,
    data: GithubData,
}

impl GithubCache {
    pub fn new() -> Self {
        Self::default()
    }

    async fn fresh(&self, ttl: Duration) -> Option<GithubData> {
        if ttl.is_zero() {
            return None;
        }
        let guard = self.inner.read().await;
        guard
            .as_ref()
            .filter(|entry| entry.fetched_at.elapsed() < ttl)
            .map(|entry| entry.data.clone())
    }

    async fn put(&self, data: GithubData) {
        if data.repos.is_empty() {
            return;
        }
        *self.inner.write().await = Some(CacheEntry {
            fetched_at: Instant::now(),
            data,
        });
    }
}

/// GET /api/github
///
/// Always answers 200; upstream trouble degrades to an empty payload.
pub async fn github_data(State(state): State<AppState>) -> Json<GithubData> {
    if let Some(data) = state.github_cache.fresh(state.cfg.github_cache_ttl).await {
        debug!("serving cached aggregation");
        return Json(data);
    }
    let data = github::aggregate(&state.cfg, &state.github).await;
    state.github_cache.put(data.clone()).await;
    Json(data)
}
