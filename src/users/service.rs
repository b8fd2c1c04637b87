//! User Data Service
//!
//! Coalesced two-tier cache in front of the forum's user profile API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::cache::{
    CacheStats, Clock, IndexedBoundedStore, Namespace, ReconcileReport, RequestCoalescer,
    SystemClock, TtlCache,
};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::fetch::{Credentials, FetchRequest, HttpFetcher};
use crate::modules::Module;
use crate::store::KeyValueStore;

/// Profile payload returned by the API's `detail` field.
pub type UserInfo = Value;

/// Namespace of the persistent user cache.
pub const USER_CACHE_NAMESPACE: &str = "ns_user_data_cache";

/// Manifest id of this service.
pub const USER_DATA_MODULE_ID: &str = "userDataService";

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    #[serde(default)]
    success: bool,
    detail: Option<Value>,
}

// == User Data Service ==
pub struct UserDataService {
    cache: RequestCoalescer<UserInfo>,
    fetcher: Arc<dyn HttpFetcher>,
    api_base: String,
}

impl UserDataService {
    // == Constructor ==
    pub fn new(store: Arc<dyn KeyValueStore>, fetcher: Arc<dyn HttpFetcher>, config: &Config) -> Self {
        Self::with_clock(store, fetcher, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn KeyValueStore>,
        fetcher: Arc<dyn HttpFetcher>,
        config: &Config,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let ttl = Duration::from_secs(config.cache_expiry);
        let storage = IndexedBoundedStore::new(
            TtlCache::with_clock(store, ttl, clock),
            config.max_storage_entries,
        );
        Self {
            cache: RequestCoalescer::new(
                Namespace::new(USER_CACHE_NAMESPACE),
                storage,
                config.max_memory_entries,
            ),
            fetcher,
            api_base: config.user_api_base.trim_end_matches('/').to_string(),
        }
    }

    // == Get User Info ==
    /// Returns the profile of `user_id`, or `None` when it is unavailable
    /// right now. Failed lookups are not cached.
    pub async fn get_user_info(&self, user_id: &str) -> Option<UserInfo> {
        if user_id.is_empty() {
            warn!("get_user_info called with empty user id");
            return None;
        }

        let fetcher = Arc::clone(&self.fetcher);
        let url = format!("{}/{}", self.api_base, user_id);
        self.cache
            .load(user_id, move || fetch_user_info(fetcher, url))
            .await
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drops both tiers, returning how many persistent entries were removed.
    pub fn clear_all_cache(&self) -> Result<usize> {
        self.cache.clear()
    }

    pub fn reconcile(&self) -> Result<ReconcileReport> {
        self.cache.reconcile()
    }
}

async fn fetch_user_info(fetcher: Arc<dyn HttpFetcher>, url: String) -> Result<UserInfo> {
    let request = FetchRequest::get(url)
        .header("Accept", "application/json")
        .credentials(Credentials::Include);
    let response = fetcher.fetch(request).await?.error_for_status()?;

    let envelope: ApiEnvelope = serde_json::from_str(&response.body)?;
    if !envelope.success {
        return Err(Error::Api("user info request reported failure".to_string()));
    }
    match envelope.detail {
        Some(detail) if !detail.is_null() => Ok(detail),
        _ => Err(Error::Api("user info response has no detail".to_string())),
    }
}

#[async_trait]
impl Module for UserDataService {
    fn id(&self) -> &str {
        USER_DATA_MODULE_ID
    }

    fn name(&self) -> &str {
        "User data service"
    }

    async fn init(&self) -> anyhow::Result<()> {
        info!("Initializing user data service");
        let report = self.cache.init()?;
        info!(
            kept = report.kept,
            removed = report.removed,
            "User data service ready"
        );
        Ok(())
    }
}
