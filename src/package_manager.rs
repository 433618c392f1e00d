//! pip integration for installing upgraded packages
//!
//! This module provides:
//! - The install command for a single `name==version` upgrade
//! - A runner trait so the synchronizer can be tested without pip

use std::path::Path;
use std::process::{Command, Output};

/// Result of a pip installation
#[derive(Debug, Clone)]
pub struct InstallResult {
    /// Package that was installed
    pub package: String,
    /// The command that was executed
    pub command: String,
    /// Whether the command succeeded
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl InstallResult {
    /// Create a successful install result
    pub fn success(package: &str, command: String, stdout: String, stderr: String) -> Self {
        Self {
            package: package.to_string(),
            command,
            success: true,
            stdout,
            stderr,
        }
    }

    /// Create a failed install result
    pub fn failure(package: &str, command: String, stdout: String, stderr: String) -> Self {
        Self {
            package: package.to_string(),
            command,
            success: false,
            stdout,
            stderr,
        }
    }

    /// Last non-empty line of stderr, for error messages
    pub fn error_summary(&self) -> String {
        self.stderr
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("unknown error")
            .trim()
            .to_string()
    }
}

/// Trait for running package installs
pub trait PackageManagerRunner {
    /// Install `package==version` with the given interpreter
    fn install(&self, python: &Path, package: &str, version: &str, working_dir: &Path)
        -> InstallResult;
}

/// Runner that executes pip through the environment's interpreter
#[derive(Debug, Default)]
pub struct SystemPackageManager;

impl SystemPackageManager {
    pub fn new() -> Self {
        Self
    }

    /// Run a command and capture output
    fn run_command(&self, command: &[String], working_dir: &Path) -> std::io::Result<Output> {
        let Some((program, args)) = command.split_first() else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Empty command",
            ));
        };

        Command::new(program)
            .args(args)
            .current_dir(working_dir)
            .output()
    }
}

/// Build the pip command line for one upgrade
pub fn pip_install_command(python: &Path, package: &str, version: &str) -> Vec<String> {
    vec![
        python.display().to_string(),
        "-m".to_string(),
        "pip".to_string(),
        "install".to_string(),
        "--upgrade".to_string(),
        format!("{}=={}", package, version),
    ]
}

impl PackageManagerRunner for SystemPackageManager {
    fn install(
        &self,
        python: &Path,
        package: &str,
        version: &str,
        working_dir: &Path,
    ) -> InstallResult {
        let command_parts = pip_install_command(python, package, version);
        let command_str = command_parts.join(" ");

        match self.run_command(&command_parts, working_dir) {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout).to_string();
                let stderr = String::from_utf8_lossy(&output.stderr).to_string();

                if output.status.success() {
                    InstallResult::success(package, command_str, stdout, stderr)
                } else {
                    InstallResult::failure(package, command_str, stdout, stderr)
                }
            }
            Err(e) => InstallResult::failure(
                package,
                command_str,
                String::new(),
                format!("Failed to execute command: {}", e),
            ),
        }
    }
}
