//! Core domain models for depsync
//!
//! This module contains the fundamental types used throughout the application:
//! - PEP 508 requirement parsing and constraint rewriting
//! - Dependency records with their declaration site
//! - Line edits produced by rewriting
//! - Update decision results and run summaries

mod dependency;
mod edit;
mod specifier;
mod summary;
mod update_result;

pub use dependency::{normalize_name, Dependency, SourceLocation};
pub use edit::SpecifierEdit;
pub use specifier::{Clause, Operator, Requirement};
pub use summary::{FileSyncResult, SyncSummary};
pub use update_result::{SkipReason, UpdateResult};
