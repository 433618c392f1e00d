//! Run configuration
//!
//! Values are resolved with the precedence: command-line flag, then
//! `[tool.depsync]` in pyproject.toml, then built-in defaults.

use crate::environment::PythonEnvironment;
use crate::error::{AppError, ConfigError};
use crate::manifest::{discover_requirements, read_manifest, Manifest, MANIFEST_FILENAME};
use crate::registry::{DEFAULT_INDEX_URL, DEFAULT_TIMEOUT};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// The `[tool.depsync]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ToolSettings {
    /// Requirements files relative to the manifest directory
    pub requirements: Option<Vec<PathBuf>>,
    /// Packages never upgraded
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Registry base URL
    pub index_url: Option<String>,
    /// Registry request timeout
    pub timeout_secs: Option<u64>,
}

/// Settings given on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Project root directory
    pub path: PathBuf,
    pub manifest: Option<PathBuf>,
    /// Requirements files; non-empty replaces discovery
    pub requirements: Vec<PathBuf>,
    pub index_url: Option<String>,
    pub allow_global: bool,
}

/// Fully resolved configuration for one run
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub project_root: PathBuf,
    pub manifest: PathBuf,
    /// Requirements files processed after the manifest, in order
    pub requirements: Vec<PathBuf>,
    pub index_url: String,
    pub timeout: Duration,
    pub exclude: Vec<String>,
    /// Isolated environment, if one was detected
    pub environment: Option<PythonEnvironment>,
    pub allow_global: bool,
    /// Manifest parsed by `resolve`; read from disk on use when absent
    pub parsed_manifest: Option<Manifest>,
}

impl SyncConfig {
    /// Resolve configuration, reading `[tool.depsync]` from the manifest
    pub fn resolve(overrides: &ConfigOverrides) -> Result<Self, AppError> {
        let root = if overrides.path.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            overrides.path.clone()
        };
        if !root.is_dir() {
            return Err(ConfigError::InvalidPath {
                path: root,
                message: "not a directory".to_string(),
            }
            .into());
        }

        let manifest_path = overrides
            .manifest
            .clone()
            .unwrap_or_else(|| root.join(MANIFEST_FILENAME));
        let manifest = read_manifest(&manifest_path)?;
        let settings = manifest.settings.clone();

        let manifest_dir = manifest_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let requirements = if !overrides.requirements.is_empty() {
            overrides.requirements.clone()
        } else if let Some(files) = settings.requirements {
            files.iter().map(|f| manifest_dir.join(f)).collect()
        } else {
            discover_requirements(&manifest_dir)
        };

        let index_url = overrides
            .index_url
            .clone()
            .or(settings.index_url)
            .unwrap_or_else(|| DEFAULT_INDEX_URL.to_string());
        validate_index_url(&index_url)?;

        let timeout = match settings.timeout_secs {
            Some(0) => return Err(ConfigError::InvalidTimeout { value: 0 }.into()),
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_TIMEOUT,
        };

        let environment = PythonEnvironment::detect(&root);
        debug!(
            "manifest {}, {} requirements file(s), index {}, environment {:?}",
            manifest_path.display(),
            requirements.len(),
            index_url,
            environment.as_ref().map(|e| e.root.display().to_string())
        );

        Ok(Self {
            project_root: root,
            manifest: manifest_path,
            requirements,
            index_url,
            timeout,
            exclude: settings.exclude,
            environment,
            allow_global: overrides.allow_global,
            parsed_manifest: Some(manifest),
        })
    }

    /// Build a configuration directly, without reading any file
    pub fn new(manifest: impl Into<PathBuf>) -> Self {
        let manifest = manifest.into();
        let project_root = manifest
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            project_root,
            manifest,
            requirements: Vec::new(),
            index_url: DEFAULT_INDEX_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            exclude: Vec::new(),
            environment: None,
            allow_global: false,
            parsed_manifest: None,
        }
    }

    /// Set requirements files
    pub fn with_requirements(mut self, requirements: Vec<PathBuf>) -> Self {
        self.requirements = requirements;
        self
    }

    /// Set excluded packages
    pub fn with_exclude(mut self, exclude: Vec<String>) -> Self {
        self.exclude = exclude;
        self
    }

    /// Set the Python environment
    pub fn with_environment(mut self, environment: Option<PythonEnvironment>) -> Self {
        self.environment = environment;
        self
    }

    /// Returns true if an isolated environment was detected
    pub fn is_isolated(&self) -> bool {
        self.environment.is_some()
    }

    /// Fail unless writes are allowed in this environment
    pub fn ensure_isolated(&self) -> Result<(), ConfigError> {
        if self.is_isolated() || self.allow_global {
            Ok(())
        } else {
            Err(ConfigError::IsolationRequired)
        }
    }
}

fn validate_index_url(url: &str) -> Result<(), ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidIndexUrl {
            value: url.to_string(),
        })
    }
}
