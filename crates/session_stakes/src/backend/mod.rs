//! Backend data source: REST fetch and response caching.

mod cache;
mod fetch;

pub use cache::{CacheError, ResponseCache};
pub use fetch::{BackendClient, BackendConfig, FetchError, NetworkInfo, StakesResponse};
