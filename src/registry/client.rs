//! HTTP client shared foundation
//!
//! This module provides a shared HTTP client with:
//! - Configurable timeout and User-Agent
//! - Status mapping into registry errors (404 becomes `PackageNotFound`)
//!
//! Requests are made once; a failed request is reported to the caller.

use crate::error::RegistryError;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

/// Default timeout for HTTP requests (15 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default User-Agent header
pub const DEFAULT_USER_AGENT: &str = concat!("depsync/", env!("CARGO_PKG_VERSION"));

/// HTTP client wrapper
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, RegistryError> {
        Self::with_config(DEFAULT_TIMEOUT, DEFAULT_USER_AGENT)
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(timeout: Duration, user_agent: &str) -> Result<Self, RegistryError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| RegistryError::Client {
                message: e.to_string(),
            })?;

        Ok(Self { client })
    }

    /// Perform a GET request and return the response body as text
    pub async fn get_text(
        &self,
        url: &str,
        package: &str,
        registry: &str,
    ) -> Result<String, RegistryError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await.map_err(|e| {
            let message = if e.is_timeout() {
                "request timed out".to_string()
            } else {
                e.to_string()
            };
            RegistryError::unreachable(package, registry, message)
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RegistryError::package_not_found(package, registry));
        }
        if !status.is_success() {
            return Err(RegistryError::unreachable(
                package,
                registry,
                format!("HTTP {}", status),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| RegistryError::unreachable(package, registry, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        assert!(HttpClient::new().is_ok());
    }

    #[test]
    fn test_client_custom_config() {
        let client = HttpClient::with_config(Duration::from_secs(2), "test-agent/1.0");
        assert!(client.is_ok());
    }

    #[test]
    fn test_default_user_agent() {
        assert!(DEFAULT_USER_AGENT.starts_with("depsync/"));
    }

    #[tokio::test]
    async fn test_unreachable_host() {
        let client = HttpClient::with_config(Duration::from_secs(2), DEFAULT_USER_AGENT).unwrap();
        // Port 9 (discard) is closed on loopback in test environments
        let err = client
            .get_text("http://127.0.0.1:9/ruff/json", "ruff", "PyPI")
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Unreachable { .. }));
    }
}
