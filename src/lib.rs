//! depsync - Python dependency constraint synchronizer library
//!
//! This library provides the core functionality for keeping version
//! constraints up to date in:
//! - pyproject.toml (PEP 621 dependencies and PEP 735 dependency groups)
//! - requirements*.txt files

pub mod cli;
pub mod comments;
pub mod config;
pub mod domain;
pub mod environment;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod output;
pub mod package_manager;
pub mod progress;
pub mod registry;
pub mod sync;
pub mod update;
