//! Remote Resources Module
//!
//! Cached loading of remote text such as the module manifest and module
//! resources.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{FetchRequest, HttpFetcher};
use crate::cache::{Lookup, TtlCache};
use crate::error::{Error, Result};

/// Loads text resources through a [`TtlCache`].
#[derive(Clone)]
pub struct RemoteResources {
    cache: TtlCache,
    fetcher: Arc<dyn HttpFetcher>,
}

impl RemoteResources {
    pub fn new(cache: TtlCache, fetcher: Arc<dyn HttpFetcher>) -> Self {
        Self { cache, fetcher }
    }

    // == Fetch With Cache ==
    /// Returns the cached text under `cache_key`, or fetches `url` and
    /// caches the body.
    ///
    /// The request carries a `t=<now>` query parameter and no-cache headers
    /// so intermediaries never answer from their own caches. Only status 200
    /// is accepted.
    pub async fn fetch_with_cache(&self, url: &str, cache_key: &str) -> Result<String> {
        match self.cache.get::<String>(cache_key) {
            Lookup::Hit(text) if !text.is_empty() => {
                info!(cache_key = %cache_key, "Using cached resource");
                return Ok(text);
            }
            Lookup::Failed(e) => {
                warn!(cache_key = %cache_key, error = %e, "Resource cache read failed");
            }
            _ => {}
        }

        let request = FetchRequest::get(self.busted_url(url))
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache");
        let response = self.fetcher.fetch(request).await?;
        if response.status != 200 {
            return Err(Error::Status(response.status));
        }

        if let Err(e) = self.cache.set(cache_key, &response.body) {
            warn!(cache_key = %cache_key, error = %e, "Failed to cache resource");
        }
        debug!(url = %url, bytes = response.body.len(), "Fetched resource");
        Ok(response.body)
    }

    fn busted_url(&self, url: &str) -> String {
        let separator = if url.contains('?') { '&' } else { '?' };
        format!("{}{}t={}", url, separator, self.cache.clock().now_ms())
    }
}
