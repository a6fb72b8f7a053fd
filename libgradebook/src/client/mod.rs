//! Remote resource client
//!
//! [`ResourceClient`] is the only seam between the library and the network.
//! It speaks untyped JSON; [`fetch_collection`] and [`fetch_one`] layer serde
//! decoding on top. Two implementations ship with the crate:
//!
//! - [`HttpResourceClient`]: reqwest against a configured base endpoint
//! - [`MockClient`]: canned responses with call recording, for tests

pub mod http;
pub mod mock;

pub use http::HttpResourceClient;
pub use mock::{Method, MockClient, RecordedCall};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashSet;

use crate::error::ApiError;

/// Untyped access to the REST API
///
/// Paths are relative to the base endpoint (`/students`) unless they are
/// absolute `http(s)://` URLs, which are used as given.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// GET a JSON document
    async fn get(&self, path: &str) -> Result<Value, ApiError>;

    /// POST a JSON payload; the response body is ignored
    async fn create(&self, path: &str, payload: &Value) -> Result<(), ApiError>;

    /// DELETE a resource
    async fn remove(&self, path: &str) -> Result<(), ApiError>;
}

/// Fetch a whole HAL collection
///
/// Items are read from `_embedded.<key>`. When the server paginates, every
/// `_links.next.href` is followed until the last page. A bare JSON array is
/// accepted as well.
pub async fn fetch_collection<T>(
    client: &dyn ResourceClient,
    path: &str,
    key: &str,
) -> Result<Vec<T>, ApiError>
where
    T: DeserializeOwned,
{
    let mut items = Vec::new();
    let mut visited = HashSet::new();
    let mut next = Some(path.to_string());

    while let Some(current) = next.take() {
        if !visited.insert(current.clone()) {
            tracing::warn!("Pagination loop detected at {}, stopping", current);
            break;
        }

        let document = client.get(&current).await?;
        items.extend(decode_page::<T>(&document, key)?);
        next = next_link(&document);
    }

    tracing::debug!("Fetched {} {} from {}", items.len(), key, path);
    Ok(items)
}

/// Fetch and decode a single document
pub async fn fetch_one<T>(client: &dyn ResourceClient, path: &str) -> Result<T, ApiError>
where
    T: DeserializeOwned,
{
    let document = client.get(path).await?;
    serde_json::from_value(document)
        .map_err(|e| ApiError::Parse(format!("unexpected response from {}: {}", path, e)))
}

/// Percent-encode `value` so it occupies exactly one path segment
///
/// Dot segments survive percent-encoding in URL parsing, so empty input,
/// `.` and `..` are rejected instead.
pub fn path_segment(value: &str) -> Result<String, ApiError> {
    if matches!(value, "" | "." | "..") {
        return Err(ApiError::InvalidPath(value.to_string()));
    }
    Ok(urlencoding::encode(value).into_owned())
}

fn decode_page<T: DeserializeOwned>(document: &Value, key: &str) -> Result<Vec<T>, ApiError> {
    let raw = match document {
        Value::Array(_) => document.clone(),
        Value::Object(map) => match map.get("_embedded") {
            Some(embedded) => match embedded.get(key) {
                Some(list) => list.clone(),
                None => return Ok(Vec::new()),
            },
            None => {
                return Err(ApiError::Parse(format!(
                    "response has no _embedded.{} collection",
                    key
                )))
            }
        },
        _ => {
            return Err(ApiError::Parse(format!(
                "expected a collection of {}, got {}",
                key,
                kind_of(document)
            )))
        }
    };

    serde_json::from_value(raw)
        .map_err(|e| ApiError::Parse(format!("invalid {} collection: {}", key, e)))
}

fn next_link(document: &Value) -> Option<String> {
    document
        .pointer("/_links/next/href")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
