//! Users Module
//!
//! Shared, cached user profile lookups for feature modules.

mod service;

pub use service::{UserDataService, UserInfo, USER_CACHE_NAMESPACE, USER_DATA_MODULE_ID};
