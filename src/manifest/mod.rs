//! Dependency file reading and writing
//!
//! This module provides functionality to:
//! - Parse dependencies from pyproject.toml with line locations
//! - Parse dependencies from requirements*.txt files
//! - Discover requirements files next to the manifest
//! - Apply specifier edits back to disk

mod pyproject_toml;
mod requirements_txt;
mod writer;

pub use pyproject_toml::{parse_manifest, read_manifest, Manifest, MAIN_GROUP};
pub use requirements_txt::{
    discover_requirements, parse_requirements, read_requirements, requirement_text,
    split_comment,
};
pub use writer::{write_manifest, LineChange, ManifestWriter, WriteResult};
#[cfg(test)]
pub(crate) use writer::temp_path_for;

/// Default manifest file name
pub const MANIFEST_FILENAME: &str = "pyproject.toml";
