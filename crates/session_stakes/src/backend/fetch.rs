//! Session staking backend client with rate limiting, retries, and caching.

use crate::backend::cache::{CacheError, ResponseCache};
use crate::node::contract::StakeContract;
use crate::node::stake::{Stake, VestingContract};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

const DEFAULT_BACKEND_URL: &str = "https://stake.getsession.org/api";
const RATE_LIMIT_MS: u64 = 200;
const MAX_RETRIES: u32 = 3;
const RETRY_BACKOFF_MS: u64 = 500;

#[derive(Clone, Debug)]
pub struct BackendConfig {
    pub base_url: String,
    pub rate_limit_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub offline: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BACKEND_URL.to_string(),
            rate_limit_ms: RATE_LIMIT_MS,
            max_retries: MAX_RETRIES,
            retry_backoff_ms: RETRY_BACKOFF_MS,
            offline: false,
        }
    }
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request: {0}")]
    Request(#[from] reqwest::Error),
    #[error("cache: {0}")]
    Cache(#[from] CacheError),
    #[error("decode: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("api error: status {0} body {1}")]
    Api(u16, String),
    #[error("offline mode: no cached data for key")]
    OfflineMiss,
}

/// Network-level block info attached to backend responses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct NetworkInfo {
    /// Current Arbitrum block height.
    pub block_height: u64,
}

/// Envelope returned by `GET /stakes/{address}`.
#[derive(Clone, Debug, Deserialize)]
pub struct StakesResponse {
    #[serde(default)]
    pub stakes: Vec<Stake>,
    #[serde(default)]
    pub contracts: Vec<StakeContract>,
    #[serde(default)]
    pub vesting: Vec<VestingContract>,
    /// BLS pubkey -> rewards-contract id for nodes currently live in the
    /// network.
    #[serde(default)]
    pub added_bls_keys: BTreeMap<String, u64>,
    pub network: NetworkInfo,
}

/// Backend client with serial rate limiting and an optional SQLite cache.
pub struct BackendClient {
    config: BackendConfig,
    client: Option<reqwest::Client>,
    cache: Option<ResponseCache>,
    last_request: Mutex<Option<OffsetDateTime>>,
    request_count: AtomicU64,
}

impl BackendClient {
    pub fn new(config: BackendConfig, cache: Option<ResponseCache>) -> Result<Self, FetchError> {
        let client = if config.offline {
            None
        } else {
            Some(
                reqwest::Client::builder()
                    .use_rustls_tls()
                    .timeout(Duration::from_secs(30))
                    .build()?,
            )
        };
        Ok(Self {
            config,
            client,
            cache,
            last_request: Mutex::new(None),
            request_count: AtomicU64::new(0),
        })
    }

    async fn rate_limit(&self) {
        let sleep_ms = {
            let prev = *self.last_request.lock().unwrap_or_else(|e| e.into_inner());
            match prev {
                Some(prev) => {
                    let elapsed = (OffsetDateTime::now_utc() - prev).whole_milliseconds();
                    let need = i128::from(self.config.rate_limit_ms);
                    if elapsed < need {
                        (need - elapsed).max(0) as u64
                    } else {
                        0
                    }
                }
                None => 0,
            }
        };
        if sleep_ms > 0 {
            tokio::time::sleep(Duration::from_millis(sleep_ms)).await;
        }
        *self.last_request.lock().unwrap_or_else(|e| e.into_inner()) =
            Some(OffsetDateTime::now_utc());
    }

    async fn get_json(&self, path: &str, cache_key: &str) -> Result<String, FetchError> {
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get_json(cache_key)? {
                debug!(key = %cache_key, "cache hit");
                return Ok(cached);
            }
            if self.config.offline {
                return Err(FetchError::OfflineMiss);
            }
        }

        let client = self.client.as_ref().ok_or(FetchError::OfflineMiss)?;
        self.rate_limit().await;

        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        let mut last_err = None;
        for attempt in 0..=self.config.max_retries {
            match client.get(&url).send().await {
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    if !status.is_success() {
                        last_err = Some(FetchError::Api(status.as_u16(), body));
                        if attempt < self.config.max_retries {
                            let ms = self.config.retry_backoff_ms * (1 << attempt);
                            tokio::time::sleep(Duration::from_millis(ms)).await;
                        }
                        continue;
                    }
                    self.request_count.fetch_add(1, Ordering::Relaxed);
                    if let Some(cache) = &self.cache {
                        let _ = cache.put_json(cache_key, &body);
                    }
                    return Ok(body);
                }
                Err(e) => {
                    last_err = Some(FetchError::Request(e));
                    if attempt < self.config.max_retries {
                        let ms = self.config.retry_backoff_ms * (1 << attempt);
                        warn!(attempt, ms, "retry after request error");
                        tokio::time::sleep(Duration::from_millis(ms)).await;
                    }
                }
            }
        }
        Err(last_err.unwrap_or(FetchError::Api(0, "unknown".to_string())))
    }

    /// Fetch the full stakes payload for an address: stakes, contribution
    /// contracts, vesting contracts, live network keys, and block height.
    pub async fn stakes(&self, address: &str) -> Result<StakesResponse, FetchError> {
        let norm = serde_json::to_string(&serde_json::json!({
            "endpoint": "stakes",
            "address": address,
        }))?;
        let cache_key = ResponseCache::key_for(&norm);
        let path = format!("/stakes/{}", urlencoding::encode(address));
        let body = self.get_json(&path, &cache_key).await?;
        let parsed: StakesResponse = serde_json::from_str(&body)?;
        info!(
            stakes = parsed.stakes.len(),
            contracts = parsed.contracts.len(),
            vesting = parsed.vesting.len(),
            block_height = parsed.network.block_height,
            "stakes response"
        );
        Ok(parsed)
    }

    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }
}
