//! Python environment detection and installed package metadata
//!
//! An environment counts as isolated when `VIRTUAL_ENV` or `CONDA_PREFIX`
//! is set, or when the project root contains a `.venv` directory.
//! Installed distributions are read from `*.dist-info/METADATA` (and legacy
//! `*.egg-info/PKG-INFO`) files in the environment's site-packages.

use crate::domain::normalize_name;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// How the environment was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentKind {
    /// `VIRTUAL_ENV` is set
    Virtualenv,
    /// `CONDA_PREFIX` is set
    Conda,
    /// `.venv` directory in the project root
    ProjectVenv,
}

impl fmt::Display for EnvironmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvironmentKind::Virtualenv => write!(f, "virtualenv"),
            EnvironmentKind::Conda => write!(f, "conda"),
            EnvironmentKind::ProjectVenv => write!(f, ".venv"),
        }
    }
}

/// An installed distribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledPackage {
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// An isolated Python environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PythonEnvironment {
    pub root: PathBuf,
    pub kind: EnvironmentKind,
}

impl PythonEnvironment {
    pub fn new(root: impl Into<PathBuf>, kind: EnvironmentKind) -> Self {
        Self {
            root: root.into(),
            kind,
        }
    }

    /// Detect the environment from the process environment variables
    pub fn detect(project_root: &Path) -> Option<Self> {
        Self::detect_with(project_root, |key| std::env::var_os(key).map(PathBuf::from))
    }

    /// Detect the environment using a custom variable lookup
    pub fn detect_with(
        project_root: &Path,
        var: impl Fn(&str) -> Option<PathBuf>,
    ) -> Option<Self> {
        let non_empty = |key: &str| var(key).filter(|p| !p.as_os_str().is_empty());

        if let Some(root) = non_empty("VIRTUAL_ENV") {
            return Some(Self::new(root, EnvironmentKind::Virtualenv));
        }
        if let Some(root) = non_empty("CONDA_PREFIX") {
            return Some(Self::new(root, EnvironmentKind::Conda));
        }
        let venv = project_root.join(".venv");
        if venv.is_dir() {
            return Some(Self::new(venv, EnvironmentKind::ProjectVenv));
        }
        None
    }

    /// Path of the environment's Python interpreter
    pub fn python(&self) -> PathBuf {
        let candidates = [
            self.root.join("bin").join("python"),
            self.root.join("bin").join("python3"),
            self.root.join("Scripts").join("python.exe"),
            self.root.join("python.exe"),
        ];
        candidates
            .iter()
            .find(|p| p.exists())
            .cloned()
            .unwrap_or_else(|| {
                if cfg!(windows) {
                    self.root.join("Scripts").join("python.exe")
                } else {
                    self.root.join("bin").join("python")
                }
            })
    }

    /// site-packages directories of this environment
    pub fn site_packages(&self) -> Vec<PathBuf> {
        let mut dirs = Vec::new();

        for lib in ["lib", "lib64"] {
            let Ok(entries) = fs::read_dir(self.root.join(lib)) else {
                continue;
            };
            let mut found: Vec<PathBuf> = entries
                .filter_map(|e| e.ok())
                .filter(|e| e.file_name().to_string_lossy().starts_with("python"))
                .map(|e| e.path().join("site-packages"))
                .filter(|p| p.is_dir())
                .collect();
            found.sort();
            for dir in found {
                if !dirs.contains(&dir) {
                    dirs.push(dir);
                }
            }
        }

        let windows = self.root.join("Lib").join("site-packages");
        if windows.is_dir() && !dirs.contains(&windows) {
            dirs.push(windows);
        }
        dirs
    }

    /// Installed distributions keyed by normalised name
    pub fn installed_packages(&self) -> HashMap<String, InstalledPackage> {
        let mut packages = HashMap::new();
        for dir in self.site_packages() {
            debug!("scanning {}", dir.display());
            packages.extend(scan_site_packages(&dir));
        }
        packages
    }
}

/// Read every distribution's metadata in one site-packages directory
pub fn scan_site_packages(dir: &Path) -> HashMap<String, InstalledPackage> {
    let mut packages = HashMap::new();
    let Ok(entries) = fs::read_dir(dir) else {
        return packages;
    };

    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        let file_name = entry.file_name().to_string_lossy().into_owned();
        let metadata = if file_name.ends_with(".dist-info") {
            path.join("METADATA")
        } else if file_name.ends_with(".egg-info") {
            path.join("PKG-INFO")
        } else {
            continue;
        };

        let Ok(content) = fs::read_to_string(&metadata) else {
            continue;
        };
        if let Some(package) = parse_metadata(&content) {
            packages.insert(normalize_name(&package.name), package);
        }
    }
    packages
}

/// Parse the header block of a core metadata file
pub fn parse_metadata(content: &str) -> Option<InstalledPackage> {
    let mut name = None;
    let mut version = None;
    let mut summary = None;

    for line in content.lines() {
        if line.trim().is_empty() {
            break;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "name" if name.is_none() => name = Some(value.to_string()),
            "version" if version.is_none() => version = Some(value.to_string()),
            "summary" if summary.is_none() && !value.is_empty() && value != "UNKNOWN" => {
                summary = Some(value.to_string())
            }
            _ => {}
        }
    }

    Some(InstalledPackage {
        name: name?,
        version: version?,
        summary,
    })
}
