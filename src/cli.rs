//! CLI argument parsing module for depsync

use crate::config::ConfigOverrides;
use crate::output::OutputConfig;
use crate::sync::UpgradeRequest;
use clap::{ArgAction, Parser, Subcommand};
use std::io::{self, IsTerminal};
use std::path::PathBuf;

/// Keep Python dependency constraints in step with the latest releases
#[derive(Parser, Debug, Clone)]
#[command(
    name = "depsync",
    version,
    about = "Keep pyproject.toml and requirements*.txt constraints up to date"
)]
pub struct CliArgs {
    /// Project root directory
    #[arg(long, global = true, default_value = ".")]
    pub path: PathBuf,

    /// Manifest to read (default: <path>/pyproject.toml)
    #[arg(long, global = true)]
    pub manifest: Option<PathBuf>,

    /// Requirements file to process (can be specified multiple times; disables discovery)
    #[arg(long = "requirements", global = true, action = ArgAction::Append)]
    pub requirements: Vec<PathBuf>,

    /// Package index base URL (default: https://pypi.org/pypi)
    #[arg(long, global = true)]
    pub index_url: Option<String>,

    // Output options
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Show changes in diff format
    #[arg(long, global = true)]
    pub diff: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable quiet mode - minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Allow writing outside a virtualenv, conda env or .venv
    #[arg(long, global = true)]
    pub allow_global: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List dependencies with installed and latest versions (default)
    Show {
        /// Do not contact the package index
        #[arg(long)]
        offline: bool,
    },

    /// Raise >= and ~= floors to the latest released versions
    Upgrade {
        /// Only upgrade this package
        package: Option<String>,

        /// Use this version instead of asking the index
        #[arg(requires = "package")]
        version: Option<String>,

        /// Show what would change without writing files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Run pip install for every upgraded package
        #[arg(long)]
        install: bool,
    },

    /// Refresh the installed-version comments on dependency lines
    UpdateComments {
        /// Show what would change without writing files
        #[arg(short = 'n', long)]
        dry_run: bool,
    },
}

impl Default for Command {
    fn default() -> Self {
        Command::Show { offline: false }
    }
}

impl Command {
    pub fn is_dry_run(&self) -> bool {
        match self {
            Command::Show { .. } => false,
            Command::Upgrade { dry_run, .. } | Command::UpdateComments { dry_run } => *dry_run,
        }
    }
}

impl CliArgs {
    /// The subcommand to run, `show` when none was given
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or_default()
    }

    /// Settings that override `[tool.depsync]`
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            path: self.path.clone(),
            manifest: self.manifest.clone(),
            requirements: self.requirements.clone(),
            index_url: self.index_url.clone(),
            allow_global: self.allow_global,
        }
    }

    /// Output settings; colors are dropped when stdout is not a terminal
    pub fn output_config(&self) -> OutputConfig {
        let config = OutputConfig::from_cli(
            self.json,
            self.diff,
            self.verbose,
            self.quiet,
            self.command().is_dry_run(),
        );
        if io::stdout().is_terminal() {
            config
        } else {
            config.without_color()
        }
    }

    /// The upgrade request, if the command is `upgrade`
    pub fn upgrade_request(&self) -> Option<UpgradeRequest> {
        match self.command() {
            Command::Upgrade {
                package,
                version,
                dry_run,
                install,
            } => Some(UpgradeRequest {
                package,
                version,
                dry_run,
                install,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{OutputFormat, Verbosity};

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::parse_from(args)
    }

    #[test]
    fn test_default_args() {
        let args = parse(&["depsync"]);
        assert_eq!(args.path, PathBuf::from("."));
        assert!(args.manifest.is_none());
        assert!(args.requirements.is_empty());
        assert!(!args.json);
        assert!(!args.allow_global);
        assert_eq!(args.command(), Command::Show { offline: false });
    }

    #[test]
    fn test_show_offline() {
        let args = parse(&["depsync", "show", "--offline"]);
        assert_eq!(args.command(), Command::Show { offline: true });
        assert!(!args.command().is_dry_run());
    }

    #[test]
    fn test_upgrade_all() {
        let args = parse(&["depsync", "upgrade"]);
        let request = args.upgrade_request().unwrap();
        assert!(request.package.is_none());
        assert!(request.version.is_none());
        assert!(!request.dry_run);
        assert!(!args.command().is_dry_run());
    }

    #[test]
    fn test_upgrade_package_version() {
        let args = parse(&["depsync", "upgrade", "requests", "2.32.3", "--dry-run"]);
        let request = args.upgrade_request().unwrap();
        assert_eq!(request.package.as_deref(), Some("requests"));
        assert_eq!(request.version.as_deref(), Some("2.32.3"));
        assert!(request.dry_run);
        assert!(args.command().is_dry_run());
        assert!(args.output_config().dry_run);
    }

    #[test]
    fn test_upgrade_short_dry_run_and_install() {
        let args = parse(&["depsync", "upgrade", "-n", "--install"]);
        let request = args.upgrade_request().unwrap();
        assert!(request.dry_run);
        assert!(request.install);
    }

    #[test]
    fn test_update_comments() {
        let args = parse(&["depsync", "update-comments", "--dry-run"]);
        assert_eq!(args.command(), Command::UpdateComments { dry_run: true });
        assert!(args.upgrade_request().is_none());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = parse(&[
            "depsync",
            "upgrade",
            "--path",
            "proj",
            "--requirements",
            "a.txt",
            "--requirements",
            "b.txt",
            "--index-url",
            "http://localhost:8080/pypi",
            "--allow-global",
        ]);
        let overrides = args.overrides();
        assert_eq!(overrides.path, PathBuf::from("proj"));
        assert_eq!(
            overrides.requirements,
            vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")]
        );
        assert_eq!(
            overrides.index_url.as_deref(),
            Some("http://localhost:8080/pypi")
        );
        assert!(overrides.allow_global);
    }

    #[test]
    fn test_output_flags() {
        let args = parse(&["depsync", "--json", "-v"]);
        let config = args.output_config();
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.verbosity, Verbosity::Verbose);

        let args = parse(&["depsync", "-q", "--diff", "show"]);
        let config = args.output_config();
        assert_eq!(config.format, OutputFormat::Diff);
        assert_eq!(config.verbosity, Verbosity::Quiet);
    }

    #[test]
    fn test_version_requires_package() {
        assert!(CliArgs::try_parse_from(["depsync", "upgrade", "requests"]).is_ok());
        assert!(CliArgs::try_parse_from(["depsync", "show", "extra"]).is_err());
    }
}
