//! Configuration Module
//!
//! Handles loading and managing helper configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Default location of the module manifest.
pub const DEFAULT_CONFIG_URL: &str =
    "https://raw.githubusercontent.com/dengshu2/NSaide/main/modules/config.json";

/// Default user profile endpoint; the user id is appended as a path segment.
pub const DEFAULT_USER_API_BASE: &str = "https://www.nodeseek.com/api/account/getInfo";

/// Helper configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the module manifest
    pub config_url: String,
    /// Cache expiry in seconds, shared by resource and user-data caches
    pub cache_expiry: u64,
    /// Maximum entries held by the in-memory user-data tier
    pub max_memory_entries: usize,
    /// Maximum entries held by the persistent user-data index
    pub max_storage_entries: usize,
    /// Path of the durable key-value store file
    pub store_path: String,
    /// Base URL of the user profile API
    pub user_api_base: String,
    /// Cookie attached to credentialed forum requests
    pub forum_cookie: Option<String>,
    /// Admin HTTP server port
    pub server_port: u16,
    /// Interval in seconds between reconcile sweeps, 0 disables the sweep
    pub reconcile_interval: u64,
    /// How long startup waits for module initialization, in milliseconds
    pub ready_timeout_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CONFIG_URL` - Module manifest URL
    /// - `CACHE_EXPIRY` - Cache TTL in seconds (default: 1800)
    /// - `MAX_MEMORY_ENTRIES` - Memory tier capacity (default: 200)
    /// - `MAX_STORAGE_ENTRIES` - Persistent index capacity (default: 500)
    /// - `STORE_PATH` - Store file (default: nsaide-store.json)
    /// - `USER_API_BASE` - User profile endpoint
    /// - `FORUM_COOKIE` - Optional session cookie
    /// - `SERVER_PORT` - Admin HTTP port (default: 3000)
    /// - `RECONCILE_INTERVAL` - Sweep frequency in seconds (default: 600)
    /// - `READY_TIMEOUT_MS` - Module readiness deadline (default: 5000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            config_url: env::var("CONFIG_URL").unwrap_or(defaults.config_url),
            cache_expiry: parse_var("CACHE_EXPIRY").unwrap_or(defaults.cache_expiry),
            max_memory_entries: parse_var("MAX_MEMORY_ENTRIES")
                .unwrap_or(defaults.max_memory_entries),
            max_storage_entries: parse_var("MAX_STORAGE_ENTRIES")
                .unwrap_or(defaults.max_storage_entries),
            store_path: env::var("STORE_PATH").unwrap_or(defaults.store_path),
            user_api_base: env::var("USER_API_BASE").unwrap_or(defaults.user_api_base),
            forum_cookie: env::var("FORUM_COOKIE").ok().filter(|c| !c.is_empty()),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            reconcile_interval: parse_var("RECONCILE_INTERVAL")
                .unwrap_or(defaults.reconcile_interval),
            ready_timeout_ms: parse_var("READY_TIMEOUT_MS").unwrap_or(defaults.ready_timeout_ms),
        }
    }

    /// Cache expiry as a Duration.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.cache_expiry)
    }

    /// Readiness deadline as a Duration.
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_url: DEFAULT_CONFIG_URL.to_string(),
            cache_expiry: 30 * 60,
            max_memory_entries: 200,
            max_storage_entries: 500,
            store_path: "nsaide-store.json".to_string(),
            user_api_base: DEFAULT_USER_API_BASE.to_string(),
            forum_cookie: None,
            server_port: 3000,
            reconcile_interval: 600,
            ready_timeout_ms: 5000,
        }
    }
}
