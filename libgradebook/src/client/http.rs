//! reqwest-backed [`ResourceClient`]

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde_json::Value;

use super::ResourceClient;
use crate::config::Config;
use crate::error::{ApiError, ConfigError, Result};

/// HTTP client bound to one base endpoint
///
/// One attempt per request, no retries and no timeout override.
#[derive(Debug, Clone)]
pub struct HttpResourceClient {
    client: Client,
    base_url: String,
}

impl HttpResourceClient {
    /// Build a client for `base_url`, which must be an absolute http(s) URL
    pub fn new(base_url: &str) -> Result<Self> {
        let parsed = Url::parse(base_url.trim()).map_err(|e| ConfigError::InvalidValue {
            field: "api.base_url".to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue {
                field: "api.base_url".to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            }
            .into());
        }

        let client = Client::builder()
            .user_agent(concat!("gradebook/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                field: "api.base_url".to_string(),
                reason: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.api.base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join a path to the base endpoint with exactly one slash
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl ResourceClient for HttpResourceClient {
    async fn get(&self, path: &str) -> std::result::Result<Value, ApiError> {
        let url = self.url_for(path);
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;
        let response = check_status(response).await?;

        let body = response.bytes().await.map_err(map_transport_error)?;
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::Parse(format!("invalid JSON from {}: {}", url, e)))
    }

    async fn create(&self, path: &str, payload: &Value) -> std::result::Result<(), ApiError> {
        let url = self.url_for(path);
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(map_transport_error)?;
        check_status(response).await?;
        Ok(())
    }

    async fn remove(&self, path: &str) -> std::result::Result<(), ApiError> {
        let url = self.url_for(path);
        tracing::debug!("DELETE {}", url);

        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(map_transport_error)?;
        check_status(response).await?;
        Ok(())
    }
}

/// Pass 2xx responses through; turn anything else into [`ApiError::Status`]
async fn check_status(response: Response) -> std::result::Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    // A body that cannot be read still leaves the status meaningful
    let body = response.text().await.unwrap_or_default();
    tracing::debug!("Request failed with status {}", status.as_u16());
    Err(ApiError::status(status.as_u16(), body))
}

fn map_transport_error(error: reqwest::Error) -> ApiError {
    ApiError::Network(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_join_uses_single_slash() {
        let client = HttpResourceClient::new("http://localhost:8080/").unwrap();
        assert_eq!(client.url_for("/students"), "http://localhost:8080/students");
        assert_eq!(client.url_for("students"), "http://localhost:8080/students");

        let nested = HttpResourceClient::new("https://example.edu/api").unwrap();
        assert_eq!(nested.url_for("/grades/7"), "https://example.edu/api/grades/7");
    }

    #[test]
    fn test_absolute_urls_are_used_verbatim() {
        let client = HttpResourceClient::new("http://localhost:8080").unwrap();
        let next = "http://other-host:9000/modules?page=2";
        assert_eq!(client.url_for(next), next);
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let err = HttpResourceClient::new("not a url").unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let err = HttpResourceClient::new("file:///tmp/x").unwrap_err();
        assert!(err.to_string().contains("unsupported scheme 'file'"));
    }
}
