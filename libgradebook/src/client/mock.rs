//! In-memory [`ResourceClient`] for tests
//!
//! Responses are keyed by method and path. Every call is recorded so tests
//! can assert on request counts and submitted payloads. Unconfigured GETs
//! answer 404; unconfigured POSTs and DELETEs succeed.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::ResourceClient;
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Delete,
}

/// One request seen by the mock
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub payload: Option<Value>,
}

#[derive(Debug, Default)]
struct MockState {
    gets: HashMap<String, Result<Value, ApiError>>,
    writes: HashMap<(Method, String), ApiError>,
    calls: Vec<RecordedCall>,
}

/// Mock client; clones share responses and the call log
#[derive(Debug, Clone, Default)]
pub struct MockClient {
    state: Arc<Mutex<MockState>>,
    delay: Duration,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call, to observe concurrent requests
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Answer `GET path` with a document
    pub fn respond_get(&self, path: &str, document: Value) {
        self.state().gets.insert(path.to_string(), Ok(document));
    }

    /// Answer `GET path` with an error
    pub fn fail_get(&self, path: &str, error: ApiError) {
        self.state().gets.insert(path.to_string(), Err(error));
    }

    /// Make `POST path` fail
    pub fn fail_create(&self, path: &str, error: ApiError) {
        self.state()
            .writes
            .insert((Method::Post, path.to_string()), error);
    }

    /// Make `DELETE path` fail
    pub fn fail_remove(&self, path: &str, error: ApiError) {
        self.state()
            .writes
            .insert((Method::Delete, path.to_string()), error);
    }

    /// Drop every configured response and the call log
    pub fn reset(&self) {
        *self.state() = MockState::default();
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state().calls.clone()
    }

    pub fn call_count(&self, method: Method) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    pub fn calls_to(&self, method: Method, path: &str) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .count()
    }

    /// Payload of the most recent POST to `path`
    pub fn last_payload(&self, path: &str) -> Option<Value> {
        self.state()
            .calls
            .iter()
            .rev()
            .find(|c| c.method == Method::Post && c.path == path)
            .and_then(|c| c.payload.clone())
    }

    async fn record(&self, method: Method, path: &str, payload: Option<Value>) {
        self.state().calls.push(RecordedCall {
            method,
            path: path.to_string(),
            payload,
        });
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    fn write_result(&self, method: Method, path: &str) -> Result<(), ApiError> {
        match self.state().writes.get(&(method, path.to_string())) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ResourceClient for MockClient {
    async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.record(Method::Get, path, None).await;
        self.state()
            .gets
            .get(path)
            .cloned()
            .unwrap_or_else(|| Err(ApiError::status(404, "")))
    }

    async fn create(&self, path: &str, payload: &Value) -> Result<(), ApiError> {
        self.record(Method::Post, path, Some(payload.clone())).await;
        self.write_result(Method::Post, path)
    }

    async fn remove(&self, path: &str) -> Result<(), ApiError> {
        self.record(Method::Delete, path, None).await;
        self.write_result(Method::Delete, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_unconfigured_get_is_not_found() {
        let client = MockClient::new();
        let err = client.get("/students").await.unwrap_err();
        assert_eq!(err.status_code(), Some(404));
    }

    #[tokio::test]
    async fn test_records_calls_and_payloads() {
        let client = MockClient::new();
        client.create("/modules", &json!({"code": "CS101"})).await.unwrap();
        client.remove("/modules/CS101").await.unwrap();

        assert_eq!(client.call_count(Method::Post), 1);
        assert_eq!(client.calls_to(Method::Delete, "/modules/CS101"), 1);
        assert_eq!(client.last_payload("/modules"), Some(json!({"code": "CS101"})));
    }

    #[tokio::test]
    async fn test_configured_write_failures() {
        let client = MockClient::new();
        client.fail_remove("/students/9", ApiError::status(404, ""));
        client.fail_create("/students", ApiError::Network("refused".into()));

        assert!(client.remove("/students/9").await.is_err());
        assert!(client.remove("/students/1").await.is_ok());
        assert!(client.create("/students", &json!({})).await.is_err());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let client = MockClient::new();
        let clone = client.clone();
        clone.respond_get("/grades", json!({"_embedded": {"grades": []}}));

        assert!(client.get("/grades").await.is_ok());
        assert_eq!(clone.call_count(Method::Get), 1);

        client.reset();
        assert!(clone.calls().is_empty());
    }
}
