//! Registry adapters for resolving the latest version of a package
//!
//! This module provides:
//! - HTTP client shared foundation
//! - The tagged `LookupOutcome` every lookup produces
//! - PyPI JSON API adapter with a plain-text fallback

mod client;
mod pypi;

pub use client::{HttpClient, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
pub use pypi::{parse_latest, PyPIAdapter, DEFAULT_INDEX_URL};

use crate::error::RegistryError;
use crate::update::ResolvedVersion;
use async_trait::async_trait;
use std::fmt;

/// Result of a single registry lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// The registry reported a latest version
    Found(ResolvedVersion),
    /// The registry has no such package
    NotFound,
    /// The registry answered but no version could be extracted
    Malformed(String),
    /// Network failure, timeout or unexpected status
    Unreachable(String),
}

impl LookupOutcome {
    /// Returns true if a version was found
    pub fn is_found(&self) -> bool {
        matches!(self, LookupOutcome::Found(_))
    }

    /// Convert into a Result for callers that propagate with `?`
    pub fn into_result(
        self,
        package: &str,
        registry: &str,
    ) -> Result<ResolvedVersion, RegistryError> {
        match self {
            LookupOutcome::Found(version) => Ok(version),
            LookupOutcome::NotFound => Err(RegistryError::package_not_found(package, registry)),
            LookupOutcome::Malformed(detail) => {
                Err(RegistryError::invalid_response(package, registry, detail))
            }
            LookupOutcome::Unreachable(detail) => {
                Err(RegistryError::unreachable(package, registry, detail))
            }
        }
    }
}

impl fmt::Display for LookupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupOutcome::Found(version) => write!(f, "found {}", version.version),
            LookupOutcome::NotFound => write!(f, "package not found"),
            LookupOutcome::Malformed(detail) => write!(f, "malformed response: {}", detail),
            LookupOutcome::Unreachable(detail) => write!(f, "registry unreachable: {}", detail),
        }
    }
}

/// Trait for registry adapters
#[async_trait]
pub trait RegistryAdapter: Send + Sync {
    /// Get the registry name
    fn registry_name(&self) -> &'static str;

    /// Look up the latest version of a package by its normalised name
    async fn lookup(&self, package: &str) -> LookupOutcome;
}
