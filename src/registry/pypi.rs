//! PyPI JSON API adapter
//!
//! Fetches the latest version of a package from PyPI.
//! API endpoint: https://pypi.org/pypi/{package}/json
//!
//! When the body is not the expected JSON document (mirrors and proxies
//! sometimes answer with plain text), the body is scanned for a version
//! token such as `"version": "1.2.3"` or `ruff (0.14.0)`.

use crate::error::RegistryError;
use crate::registry::{HttpClient, LookupOutcome, RegistryAdapter};
use crate::update::ResolvedVersion;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use tracing::debug;

/// PyPI API base URL
pub const DEFAULT_INDEX_URL: &str = "https://pypi.org/pypi";

static VERSION_FIELD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""version"\s*:\s*"([^"\s]+)""#).unwrap());
static NAME_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*[A-Za-z0-9][A-Za-z0-9._-]*\s*\((\d[^)\s]*)\)").unwrap());

/// PyPI adapter
pub struct PyPIAdapter {
    client: HttpClient,
    index_url: String,
}

/// PyPI package metadata response
#[derive(Debug, Deserialize)]
struct PyPIResponse {
    info: PackageInfo,
    /// Files of the latest release
    #[serde(default)]
    urls: Vec<ReleaseFile>,
}

#[derive(Debug, Deserialize)]
struct PackageInfo {
    name: Option<String>,
    version: String,
    summary: Option<String>,
}

/// Release file information
#[derive(Debug, Deserialize)]
struct ReleaseFile {
    /// Upload time for the release file
    upload_time_iso_8601: Option<String>,
}

impl PyPIAdapter {
    /// Create a new PyPI adapter against the public index
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            index_url: DEFAULT_INDEX_URL.to_string(),
        }
    }

    /// Use a different index base URL (a mirror exposing the same JSON API)
    pub fn with_index_url(mut self, index_url: impl Into<String>) -> Self {
        self.index_url = index_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Build the URL for a package
    fn build_url(&self, package: &str) -> String {
        format!("{}/{}/json", self.index_url, package)
    }
}

#[async_trait]
impl RegistryAdapter for PyPIAdapter {
    fn registry_name(&self) -> &'static str {
        "PyPI"
    }

    async fn lookup(&self, package: &str) -> LookupOutcome {
        let url = self.build_url(package);
        match self
            .client
            .get_text(&url, package, self.registry_name())
            .await
        {
            Ok(body) => parse_latest(package, &body),
            Err(RegistryError::PackageNotFound { .. }) => LookupOutcome::NotFound,
            Err(e) => LookupOutcome::Unreachable(e.to_string()),
        }
    }
}

/// Extract the latest version from a registry response body
pub fn parse_latest(package: &str, body: &str) -> LookupOutcome {
    match serde_json::from_str::<PyPIResponse>(body) {
        Ok(response) if !response.info.version.trim().is_empty() => {
            let released_at = response
                .urls
                .iter()
                .filter_map(|file| file.upload_time_iso_8601.as_deref())
                .filter_map(|time| time.parse::<DateTime<Utc>>().ok())
                .min();

            let mut resolved = ResolvedVersion::new(
                response.info.name.unwrap_or_else(|| package.to_string()),
                response.info.version.trim(),
            );
            if let Some(summary) = response.info.summary.filter(|s| !s.trim().is_empty()) {
                resolved = resolved.with_summary(summary.trim());
            }
            if let Some(released_at) = released_at {
                resolved = resolved.with_released_at(released_at);
            }
            LookupOutcome::Found(resolved)
        }
        Ok(_) => LookupOutcome::Malformed("empty version field".to_string()),
        Err(e) => {
            debug!("{}: response is not PyPI JSON ({}), scanning as text", package, e);
            scan_text(package, body)
        }
    }
}

fn scan_text(package: &str, body: &str) -> LookupOutcome {
    let token = VERSION_FIELD_RE
        .captures(body)
        .or_else(|| NAME_VERSION_RE.captures(body))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());

    match token {
        Some(version) => LookupOutcome::Found(ResolvedVersion::new(package, version)),
        None => LookupOutcome::Malformed("no version found in response".to_string()),
    }
}
