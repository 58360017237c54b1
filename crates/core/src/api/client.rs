use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, warn};

use super::cache::TtlCache;
use super::envelope::{list_payload, unwrap_envelope};
use super::retry::{with_retry, RetryPolicy};
use super::transport::{HttpTransport, Transport};
use crate::config::AppConfig;
use crate::errors::CoreError;
use crate::models::record::{BloodPressureRecord, Record, WeightRecord};
use crate::models::settings::UserSettings;
use crate::models::stats::ExpenseStats;
use crate::storage::manager::{backup_key, StorageManager};

/// Cache keys of the read endpoints.
pub mod keys {
    pub const EXPENSE_STATS: &str = "expenseStats";
    pub const WEIGHT: &str = "weight";
    pub const BLOOD_PRESSURE: &str = "bloodPressure";
    pub const SETTINGS: &str = "settings";
    pub const HEALTH_STATS: &str = "healthStats";
}

/// Query parameters of one request.
pub type Params = Vec<(String, String)>;

/// Result of one request inside [`ApiClient::batch_request`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub index: usize,
    pub success: bool,
    pub data: Option<Value>,
    pub error: Option<String>,
}

/// Client for the sheet backend.
///
/// Owns the response cache and the retry policy; nothing here is global, so
/// several clients (e.g. one per test) never share state. Successful cached
/// reads are also written to local storage as `backup_<key>` and served from
/// there when the backend is unreachable.
pub struct ApiClient {
    url: String,
    api_key: String,
    transport: Arc<dyn Transport>,
    cache: Mutex<TtlCache<Value>>,
    retry: RetryPolicy,
    storage: StorageManager,
    auto_backup: bool,
    offline: bool,
    log_requests: bool,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("url", &self.url)
            .field("transport", &self.transport.name())
            .field("cached", &self.cache_len())
            .field("retry", &self.retry)
            .finish()
    }
}

impl ApiClient {
    /// Build a client talking HTTP to `config.api.url`.
    pub fn new(config: &AppConfig, storage: StorageManager) -> Self {
        let transport = Arc::new(HttpTransport::new(config.api.timeout()));
        Self::with_transport(config, transport, storage)
    }

    /// Build a client on top of any transport.
    pub fn with_transport(
        config: &AppConfig,
        transport: Arc<dyn Transport>,
        storage: StorageManager,
    ) -> Self {
        Self {
            url: config.api.url.clone(),
            api_key: config.api.key.clone(),
            transport,
            cache: Mutex::new(TtlCache::new(config.cache.ttl())),
            retry: RetryPolicy::from(&config.retry),
            storage,
            auto_backup: config.features.auto_backup,
            offline: config.features.offline_mode,
            log_requests: config.debug.log_api_requests,
        }
    }

    /// Replace the retry policy used by the cached read endpoints.
    pub fn set_retry_policy(&mut self, policy: RetryPolicy) {
        self.retry = policy;
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    // ── Core request ────────────────────────────────────────────────

    /// Send `params` plus the API key and return the payload.
    ///
    /// A `{success: false}` answer becomes a typed error: `Permission`,
    /// `Network` or `Api`, chosen from the backend's error code.
    pub async fn request(&self, params: Params) -> Result<Value, CoreError> {
        let mut query = params;
        query.push(("apiKey".to_string(), self.api_key.clone()));

        if self.log_requests {
            let shown: Vec<String> = query
                .iter()
                .map(|(k, v)| {
                    if k == "apiKey" {
                        format!("{k}=<redacted>")
                    } else {
                        format!("{k}={v}")
                    }
                })
                .collect();
            debug!(url = %self.url, query = %shown.join("&"), "api request");
        }

        let result = self
            .transport
            .fetch(&self.url, &query)
            .await
            .and_then(unwrap_envelope);

        if let Err(e) = &result {
            debug!(error = %e, "api request failed");
        }
        result
    }

    /// [`request`](Self::request) wrapped in the client's retry policy.
    pub async fn request_with_retry(&self, params: Params) -> Result<Value, CoreError> {
        with_retry(&self.retry, || self.request(params.clone())).await
    }

    /// Serve `key` from the cache, or run `call` and cache its result.
    ///
    /// On failure the persisted `backup_<key>` is returned if present;
    /// otherwise the error from `call` propagates unchanged. In offline mode
    /// `call` is never run and only the backup is consulted.
    pub async fn request_with_cache<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        call: F,
    ) -> Result<Value, CoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, CoreError>>,
    {
        let cached = self.lock_cache().get(key);
        if let Some(value) = cached {
            debug!(key, "using cached data");
            return Ok(value);
        }

        let result = if self.offline {
            Err(CoreError::Network("offline mode".to_string()))
        } else {
            call().await
        };

        match result {
            Ok(value) => {
                self.lock_cache().set_with_ttl(key, value.clone(), ttl);
                if self.auto_backup {
                    self.storage.set(&backup_key(key), &value);
                }
                Ok(value)
            }
            Err(e) => match self.storage.get::<Value>(&backup_key(key)) {
                Some(backup) => {
                    warn!(key, error = %e, "backend unavailable, using backup data");
                    Ok(backup)
                }
                None => Err(e),
            },
        }
    }

    /// Cached + retried `type=<query_type>` read.
    async fn cached_query(&self, key: &str, query_type: &str) -> Result<Value, CoreError> {
        let params: Params = vec![("type".to_string(), query_type.to_string())];
        let ttl = self.lock_cache().default_ttl();
        self.request_with_cache(key, ttl, || self.request_with_retry(params))
            .await
    }

    // ── Endpoints ───────────────────────────────────────────────────

    /// Append a record to its sheet. Never cached and never retried.
    pub async fn save_record(&self, record: &Record) -> Result<Value, CoreError> {
        if self.offline {
            return Err(CoreError::Network("offline mode".to_string()));
        }
        self.request(record.to_params()).await
    }

    pub async fn get_expense_stats(&self) -> Result<ExpenseStats, CoreError> {
        let value = self.cached_query(keys::EXPENSE_STATS, "expenseStats").await?;
        decode(value)
    }

    pub async fn get_weight_data(&self) -> Result<Vec<WeightRecord>, CoreError> {
        let value = self.cached_query(keys::WEIGHT, "weight").await?;
        decode_list(value)
    }

    pub async fn get_blood_pressure_data(&self) -> Result<Vec<BloodPressureRecord>, CoreError> {
        let value = self
            .cached_query(keys::BLOOD_PRESSURE, "bloodPressure")
            .await?;
        decode_list(value)
    }

    pub async fn get_settings(&self) -> Result<UserSettings, CoreError> {
        let value = self.cached_query(keys::SETTINGS, "settings").await?;
        decode(value)
    }

    /// Server-side health aggregates; the shape is owned by the backend.
    pub async fn get_health_stats(&self) -> Result<Value, CoreError> {
        self.cached_query(keys::HEALTH_STATS, "healthStats").await
    }

    /// Run several requests, one after another, collecting each outcome.
    /// Individual failures never fail the batch.
    pub async fn batch_request(&self, requests: Vec<Params>) -> Vec<BatchOutcome> {
        let mut outcomes = Vec::with_capacity(requests.len());
        for (index, params) in requests.into_iter().enumerate() {
            let outcome = match self.request(params).await {
                Ok(data) => BatchOutcome {
                    index,
                    success: true,
                    data: Some(data),
                    error: None,
                },
                Err(e) => BatchOutcome {
                    index,
                    success: false,
                    data: None,
                    error: Some(e.to_string()),
                },
            };
            outcomes.push(outcome);
        }
        outcomes
    }

    // ── Cache management ────────────────────────────────────────────

    pub fn cache_clear(&self, key: &str) {
        self.lock_cache().clear(key);
    }

    pub fn cache_clear_all(&self) {
        self.lock_cache().clear_all();
    }

    /// Evict expired entries, returning how many were dropped.
    pub fn cache_cleanup(&self) -> usize {
        self.lock_cache().cleanup()
    }

    pub fn cache_len(&self) -> usize {
        self.lock_cache().len()
    }

    fn lock_cache(&self) -> MutexGuard<'_, TtlCache<Value>> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, CoreError> {
    serde_json::from_value(value).map_err(|e| CoreError::Deserialization(e.to_string()))
}

/// Decode a record list, skipping rows that do not parse.
fn decode_list<T: DeserializeOwned>(value: Value) -> Result<Vec<T>, CoreError> {
    let items = list_payload(value)?;
    let total = items.len();
    let records: Vec<T> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, "skipping malformed record");
                None
            }
        })
        .collect();
    if records.len() < total {
        debug!(kept = records.len(), total, "dropped malformed records");
    }
    Ok(records)
}
