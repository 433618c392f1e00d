//! Application error types using thiserror
//!
//! Error hierarchy:
//! - ManifestError: missing, unreadable, unparseable or unwritable files
//! - RegistryError: package registry lookups
//! - ConfigError: CLI and `[tool.depsync]` configuration
//! - SyncError: failures of a whole synchronization run

use std::path::PathBuf;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Manifest file related errors
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Package registry related errors
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Configuration related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Run-level synchronization errors
    #[error(transparent)]
    Sync(#[from] SyncError),
}

/// Errors related to manifest and requirement file operations
#[derive(Error, Debug)]
pub enum ManifestError {
    /// File does not exist
    #[error("manifest file not found: {path}")]
    NotFound { path: PathBuf },

    /// Failed to read file
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File is not valid structured configuration
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// Failed to write file
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors related to package registry communication
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Registry has no data for the package
    #[error("package '{package}' not found in {registry}")]
    PackageNotFound { package: String, registry: String },

    /// Network failure, timeout or unexpected HTTP status
    #[error("failed to reach {registry} for '{package}': {message}")]
    Unreachable {
        package: String,
        registry: String,
        message: String,
    },

    /// Registry answered in an unexpected shape
    #[error("invalid response from {registry} for '{package}': {message}")]
    InvalidResponse {
        package: String,
        registry: String,
        message: String,
    },

    /// HTTP client could not be constructed
    #[error("failed to create HTTP client: {message}")]
    Client { message: String },
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Writing outside an isolated Python environment without override
    #[error(
        "not running inside an isolated Python environment; \
         activate a virtualenv or pass --allow-global"
    )]
    IsolationRequired,

    /// Index URL is not an http(s) URL
    #[error("invalid index URL '{value}': expected an http:// or https:// URL")]
    InvalidIndexUrl { value: String },

    /// Timeout must be positive
    #[error("invalid timeout '{value}': must be at least one second")]
    InvalidTimeout { value: u64 },

    /// Invalid path
    #[error("invalid path '{path}': {message}")]
    InvalidPath { path: PathBuf, message: String },
}

/// Errors that abort a synchronization run
#[derive(Error, Debug)]
pub enum SyncError {
    /// Manifest or requirement file failure
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Every attempted registry lookup failed
    #[error("none of the {attempted} registry lookups succeeded")]
    NothingResolved { attempted: usize },

    /// Requested package is not declared anywhere
    #[error("'{package}' is not declared in {manifest} or any requirements file")]
    UnknownPackage { package: String, manifest: PathBuf },

    /// pip install failed
    #[error("pip install failed for {package}: {message}")]
    Install { package: String, message: String },
}

impl ManifestError {
    /// Creates a new NotFound error
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        ManifestError::NotFound { path: path.into() }
    }

    /// Creates a new Parse error
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ManifestError::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Maps an IO error from reading, turning `NotFound` into the dedicated variant
    pub fn from_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::not_found(path)
        } else {
            ManifestError::Read { path, source }
        }
    }

    /// Creates a new Write error
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ManifestError::Write {
            path: path.into(),
            source,
        }
    }
}

impl RegistryError {
    /// Creates a new PackageNotFound error
    pub fn package_not_found(package: impl Into<String>, registry: impl Into<String>) -> Self {
        RegistryError::PackageNotFound {
            package: package.into(),
            registry: registry.into(),
        }
    }

    /// Creates a new Unreachable error
    pub fn unreachable(
        package: impl Into<String>,
        registry: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RegistryError::Unreachable {
            package: package.into(),
            registry: registry.into(),
            message: message.into(),
        }
    }

    /// Creates a new InvalidResponse error
    pub fn invalid_response(
        package: impl Into<String>,
        registry: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RegistryError::InvalidResponse {
            package: package.into(),
            registry: registry.into(),
            message: message.into(),
        }
    }
}
