// Shared fixtures for the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use daily_tracker_core::api::client::ApiClient;
use daily_tracker_core::api::transport::Transport;
use daily_tracker_core::config::AppConfig;
use daily_tracker_core::errors::CoreError;
use daily_tracker_core::storage::manager::StorageManager;
use daily_tracker_core::storage::store::MemoryStore;

pub const TEST_URL: &str = "https://backend.test/exec";
pub const TEST_KEY: &str = "test-key";

/// Default configuration pointed at a fake backend, without retries.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.api.url = TEST_URL.to_string();
    config.api.key = TEST_KEY.to_string();
    config.retry.max_retries = 0;
    config
}

pub fn memory_storage() -> (Arc<MemoryStore>, StorageManager) {
    let store = Arc::new(MemoryStore::new());
    let storage = StorageManager::new(store.clone());
    (store, storage)
}

/// Canned answer of the mock backend.
#[derive(Debug, Clone)]
pub enum Reply {
    Ok(Value),
    Network(String),
    Permission(String),
    Api(String),
}

impl Reply {
    fn into_result(self) -> Result<Value, CoreError> {
        match self {
            Reply::Ok(v) => Ok(v),
            Reply::Network(m) => Err(CoreError::Network(m)),
            Reply::Permission(m) => Err(CoreError::Permission(m)),
            Reply::Api(m) => Err(CoreError::Api(m)),
        }
    }
}

/// Scripted backend keyed by the `type` query parameter; save requests
/// (those carrying `sheet`) are keyed as `"save"`.
///
/// Replies are consumed in order; the last one repeats forever.
#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<Vec<(String, String)>>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, key: &str, reply: Reply) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    pub fn reply_ok(&self, key: &str, value: Value) -> &Self {
        self.reply(key, Reply::Ok(value))
    }

    /// Every query received so far.
    pub fn calls(&self) -> Vec<Vec<(String, String)>> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of requests received for `key`.
    pub fn count(&self, key: &str) -> usize {
        self.calls()
            .iter()
            .filter(|q| route(q) == key)
            .count()
    }
}

fn route(query: &[(String, String)]) -> String {
    let find = |name: &str| {
        query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    };
    match (find("type"), find("sheet")) {
        (Some(t), _) => t,
        (None, Some(_)) => "save".to_string(),
        (None, None) => "unknown".to_string(),
    }
}

pub fn param<'a>(query: &'a [(String, String)], name: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

#[async_trait]
impl Transport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, _url: &str, query: &[(String, String)]) -> Result<Value, CoreError> {
        self.calls.lock().unwrap().push(query.to_vec());
        let key = route(query);

        let mut replies = self.replies.lock().unwrap();
        let queue = replies.get_mut(&key);
        let reply = match queue {
            Some(q) if q.len() > 1 => q.pop_front(),
            Some(q) => q.front().cloned(),
            None => None,
        };
        match reply {
            Some(reply) => reply.into_result(),
            None => Err(CoreError::Network(format!("no reply scripted for '{key}'"))),
        }
    }
}

pub fn client(transport: Arc<MockTransport>, storage: StorageManager) -> ApiClient {
    ApiClient::with_transport(&test_config(), transport, storage)
}
