//! End-to-end tests for the depsync CLI
//!
//! These tests verify:
//! - Dry-run mode leaves files unchanged
//! - The isolation check on real upgrades
//! - CLI produces the expected JSON and diff output
//! - Exit codes are correct for various scenarios
//!
//! Every test runs offline: upgrades use an explicit version, and the
//! index URL points at a closed local port where a failure is expected.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const PYPROJECT: &str = r#"[project]
name = "demo"
version = "0.1.0"
dependencies = [
    "requests>=2.28,<3.0",
    "flask==2.0.1",
]

[dependency-groups]
dev = [
    "ruff>=0.9.0",  # Linter
]
"#;

/// Command for the compiled binary, detached from any outer environment
fn depsync() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_depsync"));
    cmd.env_remove("VIRTUAL_ENV")
        .env_remove("CONDA_PREFIX")
        .env_remove("RUST_LOG");
    cmd
}

/// Create a temporary project with a pyproject.toml
fn create_project(content: &str) -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    fs::write(dir.path().join("pyproject.toml"), content).expect("Failed to write manifest");
    dir
}

fn read_manifest(dir: &TempDir) -> String {
    fs::read_to_string(dir.path().join("pyproject.toml")).expect("Failed to read manifest")
}

/// Install a fake distribution into `<root>/.venv`
fn install_into_venv(root: &Path, name: &str, version: &str, summary: &str) {
    let dist_info = root
        .join(".venv")
        .join("lib")
        .join("python3.12")
        .join("site-packages")
        .join(format!("{}-{}.dist-info", name, version));
    fs::create_dir_all(&dist_info).unwrap();
    fs::write(
        dist_info.join("METADATA"),
        format!(
            "Metadata-Version: 2.1\nName: {}\nVersion: {}\nSummary: {}\n",
            name, version, summary
        ),
    )
    .unwrap();
}

mod general_tests {
    use super::*;

    #[test]
    fn test_version_flag() {
        depsync()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("depsync "));
    }

    #[test]
    fn test_missing_manifest_fails() {
        let dir = tempfile::tempdir().unwrap();
        depsync()
            .args(["--path", dir.path().to_str().unwrap(), "show", "--offline"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Error:"))
            .stderr(predicate::str::contains("pyproject.toml"));
    }

    #[test]
    fn test_invalid_toml_fails() {
        let dir = create_project("[project\ndependencies = [");
        depsync()
            .args(["--path", dir.path().to_str().unwrap(), "show", "--offline"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("failed to parse"));
    }

    #[test]
    fn test_invalid_index_url_fails() {
        let dir = create_project(PYPROJECT);
        depsync()
            .args(["--path", dir.path().to_str().unwrap()])
            .args(["--index-url", "ftp://example.com", "show"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("invalid index URL"));
    }
}

mod show_tests {
    use super::*;

    /// Without a subcommand depsync lists the declared packages
    #[test]
    fn test_show_offline_table() {
        let dir = create_project(PYPROJECT);
        depsync()
            .args(["--path", dir.path().to_str().unwrap(), "show", "--offline"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Package"))
            .stdout(predicate::str::contains("requests"))
            .stdout(predicate::str::contains("ruff"))
            .stdout(predicate::str::contains("3 package(s)"));
    }

    #[test]
    fn test_show_offline_json() {
        let dir = create_project(PYPROJECT);
        let output = depsync()
            .args(["--path", dir.path().to_str().unwrap()])
            .args(["--json", "show", "--offline"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let json: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("Output should be valid JSON");
        assert_eq!(json["offline"], true);
        let packages = json["packages"].as_array().unwrap();
        assert_eq!(packages.len(), 3);
        assert_eq!(packages[0]["name"], "requests");
        assert_eq!(packages[0]["specifier"], ">=2.28,<3.0");
        assert_eq!(packages[2]["group"], "dev");
    }

    #[test]
    fn test_show_reads_installed_versions() {
        let dir = create_project(PYPROJECT);
        install_into_venv(dir.path(), "requests", "2.31.0", "HTTP for Humans.");

        depsync()
            .args(["--path", dir.path().to_str().unwrap(), "show", "--offline"])
            .assert()
            .success()
            .stdout(predicate::str::contains("2.31.0"));
    }

    #[test]
    fn test_show_unreachable_index_fails() {
        let dir = create_project(PYPROJECT);
        depsync()
            .args(["--path", dir.path().to_str().unwrap()])
            .args(["--index-url", "http://127.0.0.1:9", "show"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("none of the"));
    }
}

mod upgrade_tests {
    use super::*;

    /// Dry-run prints the change and leaves the manifest untouched
    #[test]
    fn test_dry_run_leaves_file_unchanged() {
        let dir = create_project(PYPROJECT);
        depsync()
            .args(["--path", dir.path().to_str().unwrap()])
            .args(["upgrade", "requests", "2.32.3", "--dry-run"])
            .assert()
            .success()
            .stdout(predicate::str::contains("2.28 -> 2.32.3"));

        assert_eq!(read_manifest(&dir), PYPROJECT);
    }

    /// Outside a virtualenv a real upgrade is refused
    #[test]
    fn test_upgrade_requires_isolated_environment() {
        let dir = create_project(PYPROJECT);
        depsync()
            .args(["--path", dir.path().to_str().unwrap()])
            .args(["upgrade", "requests", "2.32.3"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("isolated"));

        assert_eq!(read_manifest(&dir), PYPROJECT);
    }

    #[test]
    fn test_allow_global_rewrites_file() {
        let dir = create_project(PYPROJECT);
        depsync()
            .args(["--path", dir.path().to_str().unwrap(), "--allow-global"])
            .args(["upgrade", "requests", "2.32.3"])
            .assert()
            .success();

        assert_eq!(
            read_manifest(&dir),
            PYPROJECT.replace("requests>=2.28,<3.0", "requests>=2.32.3,<3.0")
        );
    }

    #[test]
    fn test_virtual_env_allows_upgrade() {
        let dir = create_project(PYPROJECT);
        let venv = tempfile::tempdir().unwrap();
        depsync()
            .env("VIRTUAL_ENV", venv.path())
            .args(["--path", dir.path().to_str().unwrap()])
            .args(["upgrade", "ruff", "0.15.0"])
            .assert()
            .success();

        assert!(read_manifest(&dir).contains("\"ruff>=0.15.0\",  # Linter"));
    }

    #[test]
    fn test_project_venv_allows_upgrade() {
        let dir = create_project(PYPROJECT);
        fs::create_dir(dir.path().join(".venv")).unwrap();
        depsync()
            .args(["--path", dir.path().to_str().unwrap()])
            .args(["upgrade", "ruff", "0.15.0"])
            .assert()
            .success();

        assert!(read_manifest(&dir).contains("ruff>=0.15.0"));
    }

    /// A pinned package is reported but never rewritten
    #[test]
    fn test_pinned_package_is_kept() {
        let dir = create_project(PYPROJECT);
        depsync()
            .args(["--path", dir.path().to_str().unwrap(), "--allow-global"])
            .args(["upgrade", "flask", "3.0.0"])
            .assert()
            .success();

        assert_eq!(read_manifest(&dir), PYPROJECT);
    }

    #[test]
    fn test_unknown_package_fails() {
        let dir = create_project(PYPROJECT);
        depsync()
            .args(["--path", dir.path().to_str().unwrap()])
            .args(["upgrade", "numpy", "2.0.0", "--dry-run"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("'numpy' is not declared"));
    }

    #[test]
    fn test_unreachable_index_fails() {
        let dir = create_project(PYPROJECT);
        depsync()
            .args(["--path", dir.path().to_str().unwrap()])
            .args(["--index-url", "http://127.0.0.1:9", "upgrade", "--dry-run"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("none of the 2 registry lookups"));
    }

    #[test]
    fn test_requirements_file_is_updated() {
        let dir = create_project(PYPROJECT);
        let requirements = dir.path().join("requirements-docs.txt");
        fs::write(&requirements, "mkdocs~=1.6\nrequests>=2.28\n").unwrap();

        depsync()
            .args(["--path", dir.path().to_str().unwrap(), "--allow-global"])
            .args(["upgrade", "requests", "2.32.3"])
            .assert()
            .success();

        assert_eq!(
            fs::read_to_string(&requirements).unwrap(),
            "mkdocs~=1.6\nrequests>=2.32.3\n"
        );
    }
}

mod output_format_tests {
    use super::*;

    #[test]
    fn test_diff_output() {
        let dir = create_project(PYPROJECT);
        depsync()
            .args(["--path", dir.path().to_str().unwrap(), "--diff"])
            .args(["upgrade", "requests", "2.32.3", "--dry-run"])
            .assert()
            .success()
            .stdout(predicate::str::contains("+++ b/"))
            .stdout(predicate::str::contains("-    \"requests>=2.28,<3.0\","))
            .stdout(predicate::str::contains("+    \"requests>=2.32.3,<3.0\","));
    }

    #[test]
    fn test_json_upgrade_output() {
        let dir = create_project(PYPROJECT);
        let output = depsync()
            .args(["--path", dir.path().to_str().unwrap(), "--json"])
            .args(["upgrade", "requests", "2.32.3", "--dry-run"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["dry_run"], true);
        assert_eq!(json["summary"]["updates"], 1);
        assert_eq!(json["summary"]["lookups_attempted"], 0);
        let update = &json["files"][0]["updates"][0];
        assert_eq!(update["name"], "requests");
        assert_eq!(update["from"], "2.28");
        assert_eq!(update["to"], "2.32.3");
    }

    #[test]
    fn test_quiet_output() {
        let dir = create_project(PYPROJECT);
        depsync()
            .args(["--path", dir.path().to_str().unwrap(), "-q"])
            .args(["upgrade", "requests", "2.32.3", "--dry-run"])
            .assert()
            .success()
            .stdout(predicate::str::contains("1 updated"));
    }
}

mod comment_tests {
    use super::*;

    #[test]
    fn test_update_comments_dry_run() {
        let dir = create_project(PYPROJECT);
        install_into_venv(dir.path(), "requests", "2.31.0", "HTTP for Humans.");
        install_into_venv(dir.path(), "ruff", "0.15.0", "An extremely fast Python linter");

        depsync()
            .args(["--path", dir.path().to_str().unwrap()])
            .args(["update-comments", "--dry-run"])
            .assert()
            .success()
            .stdout(predicate::str::contains("# HTTP for Humans (v2.31.0)"))
            .stdout(predicate::str::contains("# Linter (v0.15.0)"));

        assert_eq!(read_manifest(&dir), PYPROJECT);
    }

    #[test]
    fn test_update_comments_writes() {
        let dir = create_project(PYPROJECT);
        install_into_venv(dir.path(), "ruff", "0.15.0", "An extremely fast Python linter");

        depsync()
            .args(["--path", dir.path().to_str().unwrap(), "update-comments"])
            .assert()
            .success();

        assert!(read_manifest(&dir).contains("    \"ruff>=0.9.0\",  # Linter (v0.15.0)\n"));
    }
}
