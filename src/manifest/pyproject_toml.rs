//! pyproject.toml reader for Python projects
//!
//! Handles:
//! - project.dependencies (PEP 621)
//! - project.optional-dependencies (PEP 621)
//! - dependency-groups (PEP 735)
//! - tool.depsync settings
//!
//! Dependency strings are deserialized as `toml::Spanned` values so each one
//! keeps the byte offset, and therefore the line, it was declared on.

use crate::config::ToolSettings;
use crate::domain::{normalize_name, Dependency, Requirement, SourceLocation};
use crate::error::ManifestError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use toml::{Spanned, Value};
use tracing::{debug, warn};

/// Group name used for `[project].dependencies`
pub const MAIN_GROUP: &str = "dependencies";

/// Parsed pyproject.toml
#[derive(Debug, Clone)]
pub struct Manifest {
    /// Path the manifest was read from
    pub path: PathBuf,
    /// `[project].name`, if declared
    pub project_name: Option<String>,
    /// Dependencies in file order, self-references removed
    pub dependencies: Vec<Dependency>,
    /// `[tool.depsync]` table
    pub settings: ToolSettings,
}

/// Array entries keep their position; non-string entries such as
/// `{include-group = "test"}` are dropped later
type SpannedArray = Vec<Spanned<Value>>;

#[derive(Debug, Default, Deserialize)]
struct PyProjectDocument {
    #[serde(default)]
    project: ProjectTable,
    #[serde(default, rename = "dependency-groups")]
    dependency_groups: BTreeMap<String, SpannedArray>,
    #[serde(default)]
    tool: ToolTable,
}

#[derive(Debug, Default, Deserialize)]
struct ProjectTable {
    name: Option<String>,
    #[serde(default)]
    dependencies: SpannedArray,
    #[serde(default, rename = "optional-dependencies")]
    optional_dependencies: BTreeMap<String, SpannedArray>,
}

#[derive(Debug, Default, Deserialize)]
struct ToolTable {
    depsync: Option<Value>,
}

/// Read and parse a pyproject.toml file
pub fn read_manifest(path: &Path) -> Result<Manifest, ManifestError> {
    let content = std::fs::read_to_string(path).map_err(|e| ManifestError::from_read(path, e))?;
    parse_manifest(path, &content)
}

/// Parse pyproject.toml content read from `path`
pub fn parse_manifest(path: &Path, content: &str) -> Result<Manifest, ManifestError> {
    let document: PyProjectDocument = toml::from_str(content)
        .map_err(|e: toml::de::Error| ManifestError::parse(path, e.message()))?;

    let settings = match document.tool.depsync {
        Some(table) => table.try_into::<ToolSettings>().map_err(|e| {
            ManifestError::parse(path, format!("[tool.depsync]: {}", e.message()))
        })?,
        None => ToolSettings::default(),
    };

    let project = document.project;
    let own_name = project.name.as_deref().map(normalize_name);

    let mut declared: Vec<(usize, String, String)> = Vec::new();
    let mut collect = |group: &str, entries: SpannedArray| {
        for entry in entries {
            let offset = entry.span().start;
            if let Value::String(raw) = entry.into_inner() {
                declared.push((offset, group.to_string(), raw));
            }
        }
    };
    collect(MAIN_GROUP, project.dependencies);
    for (group, entries) in project.optional_dependencies {
        collect(&group, entries);
    }
    for (group, entries) in document.dependency_groups {
        collect(&group, entries);
    }
    // Table keys come back sorted; restore declaration order
    declared.sort_by_key(|(offset, _, _)| *offset);

    let mut dependencies = Vec::with_capacity(declared.len());
    for (offset, group, raw) in declared {
        let line = line_of(content, offset);
        let Some(requirement) = Requirement::parse(&raw) else {
            warn!(
                "{}:{}: ignoring unparseable requirement '{}'",
                path.display(),
                line,
                raw
            );
            continue;
        };

        let dependency = Dependency::new(requirement, group, SourceLocation::new(path, line));
        if own_name.as_deref() == Some(dependency.normalized.as_str()) {
            debug!("skipping self-reference {}", dependency.requirement);
            continue;
        }
        dependencies.push(dependency);
    }

    Ok(Manifest {
        path: path.to_path_buf(),
        project_name: project.name,
        dependencies,
        settings,
    })
}

/// 1-based line number of a byte offset
fn line_of(content: &str, offset: usize) -> usize {
    let end = offset.min(content.len());
    content.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count() + 1
}
