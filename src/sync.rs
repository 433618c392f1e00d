//! Synchronization driver for the `show`, `upgrade` and `update-comments` commands
//!
//! This module provides:
//! - Workflow coordination: read → resolve → judge → rewrite → write
//! - A per-run lookup cache keyed by normalised package name
//! - Dry-run mode support
//! - Partial continuation when individual lookups fail

use crate::comments::{annotate_line, clean_summary};
use crate::config::SyncConfig;
use crate::domain::{
    Dependency, FileSyncResult, SourceLocation, SpecifierEdit, SyncSummary, UpdateResult,
};
use crate::environment::InstalledPackage;
use crate::error::{AppError, ManifestError, SyncError};
use crate::manifest::{read_manifest, read_requirements, ManifestWriter, WriteResult};
use crate::package_manager::{InstallResult, PackageManagerRunner, SystemPackageManager};
use crate::progress::Progress;
use crate::registry::{HttpClient, LookupOutcome, PyPIAdapter, RegistryAdapter, DEFAULT_USER_AGENT};
use crate::update::{ResolvedVersion, UpdateFilter, UpdateJudge};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What the `upgrade` command was asked to do
#[derive(Debug, Clone, Default)]
pub struct UpgradeRequest {
    /// Restrict the run to this package
    pub package: Option<String>,
    /// Use this version instead of asking the registry
    pub version: Option<String>,
    pub dry_run: bool,
    /// Run pip for each applied update
    pub install: bool,
}

impl UpgradeRequest {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Default::default()
        }
    }

    /// Select a single package
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    /// Set an explicit target version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_install(mut self, install: bool) -> Self {
        self.install = install;
        self
    }
}

/// Result of an upgrade run
#[derive(Debug)]
pub struct SyncReport {
    pub summary: SyncSummary,
    /// One entry per file that had edits to apply
    pub writes: Vec<WriteResult>,
    /// pip runs, in update order
    pub installs: Vec<InstallResult>,
    /// Comment refresh performed after installing
    pub comments: Option<CommentReport>,
}

/// One line of the `show` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShowRow {
    pub name: String,
    pub group: String,
    /// Version specifier as written, empty when unconstrained
    pub specifier: String,
    pub installed: Option<String>,
    pub latest: Option<String>,
    pub upgradable: bool,
    /// Why `latest` is missing when a lookup was made
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub location: SourceLocation,
}

/// Result of the `show` command
#[derive(Debug, Clone)]
pub struct ShowReport {
    pub rows: Vec<ShowRow>,
    pub offline: bool,
    /// Root of the environment installed versions came from
    pub environment: Option<PathBuf>,
}

impl ShowReport {
    pub fn upgradable(&self) -> impl Iterator<Item = &ShowRow> {
        self.rows.iter().filter(|r| r.upgradable)
    }
}

/// Result of the `update-comments` command
#[derive(Debug)]
pub struct CommentReport {
    /// Whole-line edits in file order
    pub edits: Vec<SpecifierEdit>,
    pub writes: Vec<WriteResult>,
    pub dry_run: bool,
}

impl CommentReport {
    pub fn has_changes(&self) -> bool {
        !self.edits.is_empty()
    }
}

/// Lookups made during one run, cached by normalised name
struct Resolver<'a> {
    registry: &'a dyn RegistryAdapter,
    cache: HashMap<String, LookupOutcome>,
    attempted: usize,
    failed: usize,
}

impl<'a> Resolver<'a> {
    fn new(registry: &'a dyn RegistryAdapter) -> Self {
        Self {
            registry,
            cache: HashMap::new(),
            attempted: 0,
            failed: 0,
        }
    }

    async fn lookup(&mut self, package: &str) -> LookupOutcome {
        if let Some(outcome) = self.cache.get(package) {
            debug!("{}: cached ({})", package, outcome);
            return outcome.clone();
        }

        let outcome = self.registry.lookup(package).await;
        debug!("{}: {}", package, outcome);
        self.attempted += 1;
        if !outcome.is_found() {
            self.failed += 1;
        }
        self.cache.insert(package.to_string(), outcome.clone());
        outcome
    }

    fn nothing_resolved(&self) -> bool {
        self.attempted > 0 && self.failed == self.attempted
    }
}

/// Driver for every command that reads dependency files
pub struct Synchronizer {
    registry: Box<dyn RegistryAdapter>,
    installer: Box<dyn PackageManagerRunner>,
    show_progress: bool,
}

impl Synchronizer {
    /// Create a synchronizer talking to the configured index
    pub fn new(config: &SyncConfig) -> Result<Self, AppError> {
        let client = HttpClient::with_config(config.timeout, DEFAULT_USER_AGENT)?;
        let adapter = PyPIAdapter::new(client).with_index_url(&config.index_url);
        Ok(Self::with_registry(Box::new(adapter)))
    }

    /// Create a synchronizer with a custom registry (for testing)
    pub fn with_registry(registry: Box<dyn RegistryAdapter>) -> Self {
        Self {
            registry,
            installer: Box::new(SystemPackageManager::new()),
            show_progress: false,
        }
    }

    /// Replace the pip runner
    pub fn with_installer(mut self, installer: Box<dyn PackageManagerRunner>) -> Self {
        self.installer = installer;
        self
    }

    /// Draw a progress bar on stderr during lookups
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Bump `>=`/`~=` floors to the latest versions and write the files
    pub async fn upgrade(
        &self,
        config: &SyncConfig,
        request: &UpgradeRequest,
    ) -> Result<SyncReport, SyncError> {
        let mut progress = Progress::new(self.show_progress);
        let mut summary = SyncSummary::new(request.dry_run);

        progress.spinner("Reading dependency files...");
        let files = load_files(config)?;
        progress.finish_and_clear();

        let mut filter = UpdateFilter::new().with_exclude(&config.exclude);
        if let Some(package) = &request.package {
            filter = filter.with_only(package);
            let selected = filter.only.as_deref().unwrap_or_default();
            let declared = files
                .iter()
                .flat_map(|(_, deps)| deps)
                .any(|dep| dep.normalized == selected);
            if !declared {
                return Err(SyncError::UnknownPackage {
                    package: package.clone(),
                    manifest: config.manifest.clone(),
                });
            }
        }
        let judge = UpdateJudge::new(filter);

        let total: usize = files.iter().map(|(_, deps)| deps.len()).sum();
        progress.start(total as u64, "Resolving");

        let mut resolver = Resolver::new(self.registry.as_ref());
        for (path, dependencies) in files {
            let mut file_result = FileSyncResult::new(&path);

            for dep in dependencies {
                progress.set_message(&dep.name);

                if let Some(reason) = judge.should_skip(&dep) {
                    file_result.add_result(UpdateResult::skip(dep, reason));
                    progress.inc();
                    continue;
                }

                let latest = match &request.version {
                    Some(version) => ResolvedVersion::new(&dep.normalized, version),
                    None => match resolver.lookup(&dep.normalized).await {
                        LookupOutcome::Found(latest) => latest,
                        failure => {
                            warn!("skipping {} ({}): {}", dep.name, dep.location, failure);
                            file_result.add_result(UpdateResult::skip_lookup_failed(
                                dep,
                                failure.to_string(),
                            ));
                            progress.inc();
                            continue;
                        }
                    },
                };

                file_result.add_result(judge.judge(&dep, &latest));
                progress.inc();
            }

            summary.add_file(file_result);
        }
        progress.finish_and_clear();

        summary.lookups_attempted = resolver.attempted;
        summary.lookups_failed = resolver.failed;
        if summary.nothing_resolved() {
            return Err(SyncError::NothingResolved {
                attempted: summary.lookups_attempted,
            });
        }

        let writer = ManifestWriter::new(request.dry_run);
        let mut writes = Vec::new();
        for file in summary.files.iter_mut() {
            if !file.has_updates() {
                continue;
            }
            let edits = file.results.iter().filter_map(UpdateResult::edit);
            let result = match writer.apply(&file.path, edits) {
                Ok(result) => result,
                Err(e) => {
                    if !writes.is_empty() {
                        warn!("{} file(s) already written before the failure", writes.len());
                    }
                    return Err(e.into());
                }
            };
            for error in &result.errors {
                warn!("{}", error);
            }
            file.written = result.file_modified;
            writes.push(result);
        }

        let mut report = SyncReport {
            summary,
            writes,
            installs: Vec::new(),
            comments: None,
        };

        if request.install && !request.dry_run && report.summary.has_changes() {
            report.installs = self.install_updates(config, &report.summary)?;
            report.comments = Some(self.update_comments(config, false)?);
        }

        Ok(report)
    }

    /// Install every updated package, stopping at the first failure
    fn install_updates(
        &self,
        config: &SyncConfig,
        summary: &SyncSummary,
    ) -> Result<Vec<InstallResult>, SyncError> {
        let python = config
            .environment
            .as_ref()
            .map(|env| env.python())
            .unwrap_or_else(|| PathBuf::from("python3"));

        let mut installed = HashSet::new();
        let mut results = Vec::new();
        for update in summary.all_updates() {
            let UpdateResult::Update {
                dependency,
                new_version,
                ..
            } = update
            else {
                continue;
            };
            if !installed.insert(dependency.normalized.clone()) {
                continue;
            }

            let result = self.installer.install(
                &python,
                &dependency.name,
                new_version,
                &config.project_root,
            );
            if !result.success {
                return Err(SyncError::Install {
                    package: dependency.name.clone(),
                    message: result.error_summary(),
                });
            }
            info!("installed {}=={}", dependency.name, new_version);
            results.push(result);
        }
        Ok(results)
    }

    /// List each declared package with its installed and latest versions
    pub async fn show(&self, config: &SyncConfig, offline: bool) -> Result<ShowReport, SyncError> {
        let files = load_files(config)?;
        let installed = installed_packages(config);
        let judge = UpdateJudge::new(UpdateFilter::new().with_exclude(&config.exclude));

        let mut seen = HashSet::new();
        let dependencies: Vec<Dependency> = files
            .into_iter()
            .flat_map(|(_, deps)| deps)
            .filter(|dep| seen.insert(dep.normalized.clone()))
            .collect();

        let mut progress = Progress::new(self.show_progress && !offline);
        progress.start(dependencies.len() as u64, "Resolving");

        let mut resolver = Resolver::new(self.registry.as_ref());
        let mut rows = Vec::with_capacity(dependencies.len());
        for dep in dependencies {
            progress.set_message(&dep.name);

            let (latest, error) = if offline {
                (None, None)
            } else {
                match resolver.lookup(&dep.normalized).await {
                    LookupOutcome::Found(latest) => (Some(latest), None),
                    failure => {
                        warn!("{}: {}", dep.name, failure);
                        (None, Some(failure.to_string()))
                    }
                }
            };
            let upgradable = latest
                .as_ref()
                .is_some_and(|latest| judge.judge(&dep, latest).is_update());

            rows.push(ShowRow {
                name: dep.name.clone(),
                group: dep.group.clone(),
                specifier: dep.requirement.specifier().to_string(),
                installed: installed.get(&dep.normalized).map(|p| p.version.clone()),
                latest: latest.map(|l| l.version),
                upgradable,
                error,
                location: dep.location,
            });
            progress.inc();
        }
        progress.finish_and_clear();

        if resolver.nothing_resolved() {
            return Err(SyncError::NothingResolved {
                attempted: resolver.attempted,
            });
        }

        Ok(ShowReport {
            rows,
            offline,
            environment: config.environment.as_ref().map(|env| env.root.clone()),
        })
    }

    /// Refresh the `(vX.Y.Z)` comments from installed metadata
    pub fn update_comments(
        &self,
        config: &SyncConfig,
        dry_run: bool,
    ) -> Result<CommentReport, SyncError> {
        let files = load_files(config)?;
        let installed = installed_packages(config);
        if installed.is_empty() {
            warn!("no installed packages found; comments left unchanged");
        }

        let writer = ManifestWriter::new(dry_run);
        let mut edits = Vec::new();
        let mut writes = Vec::new();
        for (path, dependencies) in files {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| ManifestError::from_read(&path, e))?;
            let file_edits = comment_edits(&path, &content, &dependencies, &installed);
            if file_edits.is_empty() {
                continue;
            }

            writes.push(writer.apply(&path, &file_edits)?);
            edits.extend(file_edits);
        }

        Ok(CommentReport {
            edits,
            writes,
            dry_run,
        })
    }
}

/// Whole-line edits refreshing the comment of every installed dependency
fn comment_edits(
    path: &Path,
    content: &str,
    dependencies: &[Dependency],
    installed: &HashMap<String, InstalledPackage>,
) -> Vec<SpecifierEdit> {
    let lines: Vec<&str> = content.lines().collect();
    let mut per_line: HashMap<usize, usize> = HashMap::new();
    for dep in dependencies {
        *per_line.entry(dep.location.line).or_default() += 1;
    }

    let mut edits = Vec::new();
    for dep in dependencies {
        if per_line.get(&dep.location.line) != Some(&1) {
            continue;
        }
        let Some(package) = installed.get(&dep.normalized) else {
            continue;
        };
        let Some(line) = dep.location.line.checked_sub(1).and_then(|i| lines.get(i)) else {
            continue;
        };

        let summary = clean_summary(&dep.name, package.summary.as_deref());
        let updated = annotate_line(line, &package.version, &summary);
        if updated != *line {
            edits.push(SpecifierEdit::new(path, dep.location.line, *line, updated));
        }
    }
    edits
}

/// Manifest dependencies followed by each requirements file's
fn load_files(config: &SyncConfig) -> Result<Vec<(PathBuf, Vec<Dependency>)>, ManifestError> {
    let manifest = match &config.parsed_manifest {
        Some(manifest) => manifest.clone(),
        None => read_manifest(&config.manifest)?,
    };
    let mut files = vec![(manifest.path, manifest.dependencies)];
    for path in &config.requirements {
        files.push((path.clone(), read_requirements(path)?));
    }
    Ok(files)
}

fn installed_packages(config: &SyncConfig) -> HashMap<String, InstalledPackage> {
    match &config.environment {
        Some(env) => env.installed_packages(),
        None => {
            debug!("no environment detected; installed versions unavailable");
            HashMap::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigOverrides;
    use crate::domain::SkipReason;
    use crate::environment::{EnvironmentKind, PythonEnvironment};
    use async_trait::async_trait;
    use std::fs;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Registry answering from a fixed table
    struct StubRegistry {
        versions: HashMap<String, String>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl StubRegistry {
        fn new(versions: &[(&str, &str)]) -> Self {
            Self {
                versions: versions
                    .iter()
                    .map(|(n, v)| (n.to_string(), v.to_string()))
                    .collect(),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl RegistryAdapter for StubRegistry {
        fn registry_name(&self) -> &'static str {
            "stub"
        }

        async fn lookup(&self, package: &str) -> LookupOutcome {
            self.calls.lock().unwrap().push(package.to_string());
            match self.versions.get(package) {
                Some(v) if v == "unreachable" => LookupOutcome::Unreachable("timed out".into()),
                Some(v) => LookupOutcome::Found(ResolvedVersion::new(package, v)),
                None => LookupOutcome::NotFound,
            }
        }
    }

    struct RecordingInstaller {
        calls: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl PackageManagerRunner for RecordingInstaller {
        fn install(
            &self,
            _python: &Path,
            package: &str,
            version: &str,
            _dir: &Path,
        ) -> InstallResult {
            let spec = format!("{}=={}", package, version);
            self.calls.lock().unwrap().push(spec.clone());
            if self.fail {
                InstallResult::failure(package, spec, String::new(), "ERROR: no match".into())
            } else {
                InstallResult::success(package, spec, String::new(), String::new())
            }
        }
    }

    const PYPROJECT: &str = r#"[project]
name = "demo"
dependencies = [
    "requests>=2.28,<3.0",
    "flask==2.0.1",
    "mkdocs~=1.6",
]

[project.optional-dependencies]
dev = [
    "ruff>=0.9.0",  # Linter
]
"#;

    fn project(pyproject: &str, requirements: Option<&str>) -> (TempDir, SyncConfig) {
        let dir = TempDir::new().unwrap();
        let manifest = dir.path().join("pyproject.toml");
        fs::write(&manifest, pyproject).unwrap();
        let mut reqs = Vec::new();
        if let Some(content) = requirements {
            let path = dir.path().join("requirements.txt");
            fs::write(&path, content).unwrap();
            reqs.push(path);
        }
        let config = SyncConfig::new(manifest).with_requirements(reqs);
        (dir, config)
    }

    fn synchronizer(versions: &[(&str, &str)]) -> Synchronizer {
        Synchronizer::with_registry(Box::new(StubRegistry::new(versions)))
    }

    fn read(dir: &TempDir, name: &str) -> String {
        fs::read_to_string(dir.path().join(name)).unwrap()
    }

    #[tokio::test]
    async fn test_upgrade_rewrites_floors() {
        let (dir, config) = project(PYPROJECT, Some("ruff>=0.9.0\npytest\n"));
        let sync = synchronizer(&[
            ("requests", "2.31.0"),
            ("flask", "3.0.0"),
            ("mkdocs", "1.6.1"),
            ("ruff", "0.15.0"),
        ]);

        let report = sync.upgrade(&config, &UpgradeRequest::new(false)).await.unwrap();

        assert_eq!(report.summary.total_updates(), 4);
        assert_eq!(report.summary.files_written(), 2);
        let pyproject = read(&dir, "pyproject.toml");
        assert!(pyproject.contains("\"requests>=2.31.0,<3.0\","));
        assert!(pyproject.contains("\"flask==2.0.1\","));
        assert!(pyproject.contains("\"mkdocs~=1.6.1\","));
        assert!(pyproject.contains("\"ruff>=0.15.0\",  # Linter"));
        assert_eq!(read(&dir, "requirements.txt"), "ruff>=0.15.0\npytest\n");
    }

    #[tokio::test]
    async fn test_upgrade_dry_run_leaves_files() {
        let (dir, config) = project(PYPROJECT, None);
        let sync = synchronizer(&[
            ("requests", "2.31.0"),
            ("mkdocs", "1.6.1"),
            ("ruff", "0.15.0"),
        ]);

        let report = sync.upgrade(&config, &UpgradeRequest::new(true)).await.unwrap();

        assert!(report.summary.dry_run);
        assert_eq!(report.summary.total_updates(), 3);
        assert_eq!(report.summary.files_written(), 0);
        assert_eq!(report.writes.len(), 1);
        assert_eq!(report.writes[0].changes.len(), 3);
        assert_eq!(read(&dir, "pyproject.toml"), PYPROJECT);
    }

    #[tokio::test]
    async fn test_upgrade_partial_lookup_failure() {
        let (dir, config) = project(PYPROJECT, None);
        let sync = synchronizer(&[("requests", "2.31.0"), ("mkdocs", "unreachable")]);

        let report = sync.upgrade(&config, &UpgradeRequest::new(false)).await.unwrap();

        assert_eq!(report.summary.lookups_attempted, 3);
        assert_eq!(report.summary.lookups_failed, 2);
        assert_eq!(report.summary.total_updates(), 1);
        let failures: Vec<_> = report
            .summary
            .all_skips()
            .filter(|r| r.is_failure())
            .map(|r| r.package_name().to_string())
            .collect();
        assert_eq!(failures, vec!["mkdocs", "ruff"]);
        assert!(read(&dir, "pyproject.toml").contains("requests>=2.31.0,<3.0"));
    }

    #[tokio::test]
    async fn test_upgrade_nothing_resolved() {
        let (dir, config) = project(PYPROJECT, None);
        let sync = synchronizer(&[]);

        let err = sync.upgrade(&config, &UpgradeRequest::new(false)).await.unwrap_err();

        assert!(matches!(err, SyncError::NothingResolved { attempted: 3 }));
        assert_eq!(read(&dir, "pyproject.toml"), PYPROJECT);
    }

    #[tokio::test]
    async fn test_upgrade_no_lookups_is_not_a_failure() {
        let (_dir, config) = project("[project]\ndependencies = [\"flask==2.0.1\"]\n", None);
        let report = synchronizer(&[])
            .upgrade(&config, &UpgradeRequest::new(false))
            .await
            .unwrap();
        assert_eq!(report.summary.lookups_attempted, 0);
        assert!(!report.summary.has_changes());
    }

    #[tokio::test]
    async fn test_upgrade_unknown_package() {
        let (_dir, config) = project(PYPROJECT, None);
        let err = synchronizer(&[])
            .upgrade(&config, &UpgradeRequest::new(true).with_package("numpy"))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::UnknownPackage { ref package, .. } if package == "numpy"));
    }

    #[tokio::test]
    async fn test_upgrade_explicit_version_skips_registry() {
        let (dir, config) = project(PYPROJECT, None);
        let registry = StubRegistry::new(&[]);
        let calls = Arc::clone(&registry.calls);
        let sync = Synchronizer::with_registry(Box::new(registry));

        let request = UpgradeRequest::new(false)
            .with_package("Requests")
            .with_version("2.32.3");
        let report = sync.upgrade(&config, &request).await.unwrap();

        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(report.summary.total_updates(), 1);
        let skipped_other = report
            .summary
            .all_skips()
            .filter(|r| matches!(r, UpdateResult::Skip { reason: SkipReason::NotSelected, .. }))
            .count();
        assert_eq!(skipped_other, 3);
        assert!(read(&dir, "pyproject.toml").contains("requests>=2.32.3,<3.0"));
    }

    #[tokio::test]
    async fn test_upgrade_caches_lookups_and_skips_pins() {
        let (_dir, config) = project(PYPROJECT, Some("ruff>=0.8\nflask==2.0.1\n"));
        let registry = StubRegistry::new(&[
            ("requests", "2.31.0"),
            ("mkdocs", "1.6.1"),
            ("ruff", "0.15.0"),
        ]);
        let calls = Arc::clone(&registry.calls);
        let sync = Synchronizer::with_registry(Box::new(registry));

        let report = sync.upgrade(&config, &UpgradeRequest::new(true)).await.unwrap();

        assert_eq!(*calls.lock().unwrap(), vec!["requests", "mkdocs", "ruff"]);
        assert_eq!(report.summary.lookups_attempted, 3);
        assert_eq!(report.summary.total_updates(), 4);
    }

    #[tokio::test]
    async fn test_upgrade_respects_exclude() {
        let (_dir, config) = project(PYPROJECT, None);
        let config = config.with_exclude(vec!["Requests".to_string()]);
        let report = synchronizer(&[("mkdocs", "1.6.1"), ("ruff", "0.15.0")])
            .upgrade(&config, &UpgradeRequest::new(true))
            .await
            .unwrap();
        let excluded = report
            .summary
            .all_skips()
            .find(|r| r.package_name() == "requests")
            .unwrap();
        assert!(matches!(excluded, UpdateResult::Skip { reason: SkipReason::Excluded, .. }));
    }

    #[tokio::test]
    async fn test_upgrade_missing_requirements_file_is_fatal() {
        let (dir, config) = project(PYPROJECT, None);
        let config = config.with_requirements(vec![dir.path().join("missing.txt")]);
        let err = synchronizer(&[])
            .upgrade(&config, &UpgradeRequest::new(true))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Manifest(ManifestError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_upgrade_write_failure_keeps_earlier_files() {
        let (dir, config) = project(PYPROJECT, Some("ruff>=0.9.0\n"));
        let requirements = dir.path().join("requirements.txt");
        // A directory in the temp file's place makes the second write fail
        fs::create_dir(crate::manifest::temp_path_for(&requirements)).unwrap();

        let err = synchronizer(&[("requests", "2.31.0"), ("ruff", "0.15.0")])
            .upgrade(&config, &UpgradeRequest::new(false))
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Manifest(ManifestError::Write { .. })));
        let pyproject = read(&dir, "pyproject.toml");
        assert!(pyproject.contains("\"requests>=2.31.0,<3.0\","));
        assert!(pyproject.contains("\"ruff>=0.15.0\",  # Linter"));
        assert_eq!(read(&dir, "requirements.txt"), "ruff>=0.9.0\n");
    }

    #[tokio::test]
    async fn test_upgrade_install_runs_pip_per_update() {
        let (_dir, config) = project(PYPROJECT, Some("ruff>=0.9.0\n"));
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sync = synchronizer(&[
            ("requests", "2.31.0"),
            ("ruff", "0.15.0"),
            ("mkdocs", "1.6"),
        ])
            .with_installer(Box::new(RecordingInstaller {
                calls: Arc::clone(&calls),
                fail: false,
            }));

        let request = UpgradeRequest::new(false).with_install(true);
        let report = sync.upgrade(&config, &request).await.unwrap();

        assert_eq!(
            *calls.lock().unwrap(),
            vec!["requests==2.31.0", "ruff==0.15.0"]
        );
        assert_eq!(report.installs.len(), 2);
        assert!(report.comments.is_some());
    }

    #[tokio::test]
    async fn test_upgrade_install_failure() {
        let (_dir, config) = project(PYPROJECT, None);
        let sync = synchronizer(&[("requests", "2.31.0")]).with_installer(Box::new(
            RecordingInstaller {
                calls: Arc::new(Mutex::new(Vec::new())),
                fail: true,
            },
        ));

        let request = UpgradeRequest::new(false).with_install(true);
        let err = sync.upgrade(&config, &request).await.unwrap_err();
        assert!(matches!(err, SyncError::Install { ref package, .. } if package == "requests"));
    }

    #[tokio::test]
    async fn test_show_unique_rows() {
        let (_dir, config) = project(PYPROJECT, Some("Requests>=2.0\nclick>=8.0\n"));
        let report = synchronizer(&[
            ("requests", "2.31.0"),
            ("flask", "3.0.0"),
            ("mkdocs", "1.6.0"),
            ("ruff", "0.15.0"),
        ])
        .show(&config, false)
        .await
        .unwrap();

        let names: Vec<_> = report.rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["requests", "flask", "mkdocs", "ruff", "click"]);
        assert_eq!(report.rows[0].specifier, ">=2.28,<3.0");
        assert_eq!(report.rows[0].latest.as_deref(), Some("2.31.0"));
        assert!(report.rows[0].upgradable);
        assert!(!report.rows[1].upgradable);
        assert!(!report.rows[2].upgradable);
        assert!(report.rows[4].latest.is_none());
        assert!(report.rows[4].error.is_some());
        assert_eq!(report.upgradable().count(), 2);
    }

    #[tokio::test]
    async fn test_show_offline_makes_no_lookups() {
        let (_dir, config) = project(PYPROJECT, None);
        let registry = StubRegistry::new(&[]);
        let calls = Arc::clone(&registry.calls);
        let report = Synchronizer::with_registry(Box::new(registry))
            .show(&config, true)
            .await
            .unwrap();

        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(report.rows.len(), 4);
        assert!(report.rows.iter().all(|r| r.latest.is_none() && !r.upgradable));
    }

    #[tokio::test]
    async fn test_show_reuses_resolved_manifest() {
        let (dir, _) = project(PYPROJECT, None);
        let config = SyncConfig::resolve(&ConfigOverrides {
            path: dir.path().to_path_buf(),
            ..Default::default()
        })
        .unwrap();
        fs::remove_file(dir.path().join("pyproject.toml")).unwrap();

        let report = synchronizer(&[]).show(&config, true).await.unwrap();
        assert_eq!(report.rows.len(), 4);
    }

    #[tokio::test]
    async fn test_show_nothing_resolved() {
        let (_dir, config) = project(PYPROJECT, None);
        let err = synchronizer(&[]).show(&config, false).await.unwrap_err();
        assert!(matches!(err, SyncError::NothingResolved { attempted: 4 }));
    }

    fn environment_with(dir: &TempDir, dists: &[(&str, &str, Option<&str>)]) -> PythonEnvironment {
        let root = dir.path().join(".venv");
        let site = root.join("lib").join("python3.12").join("site-packages");
        for (name, version, summary) in dists {
            let dist = site.join(format!("{}-{}.dist-info", name, version));
            fs::create_dir_all(&dist).unwrap();
            let mut metadata = format!("Name: {}\nVersion: {}\n", name, version);
            if let Some(summary) = summary {
                metadata.push_str(&format!("Summary: {}\n", summary));
            }
            fs::write(dist.join("METADATA"), metadata).unwrap();
        }
        PythonEnvironment::new(root, EnvironmentKind::ProjectVenv)
    }

    #[test]
    fn test_update_comments() {
        let (dir, config) = project(PYPROJECT, Some("mkdocs~=1.6  # Docs 1.5\nrequests>=2.28\n"));
        let env = environment_with(
            &dir,
            &[
                ("ruff", "0.15.0", Some("An extremely fast Python linter.")),
                ("mkdocs", "1.6.1", None),
                ("requests", "2.31.0", Some("requests: Python HTTP for Humans.")),
            ],
        );
        let config = config.with_environment(Some(env));

        let report = synchronizer(&[]).update_comments(&config, false).unwrap();

        assert!(report.has_changes());
        let pyproject = read(&dir, "pyproject.toml");
        assert!(pyproject.contains("\"requests>=2.28,<3.0\",  # Python HTTP for Humans (v2.31.0)"));
        assert!(pyproject.contains("\"mkdocs~=1.6\",  # Mkdocs (v1.6.1)"));
        assert!(pyproject.contains("\"ruff>=0.9.0\",  # Linter (v0.15.0)"));
        assert!(pyproject.contains("\"flask==2.0.1\",\n"));
        assert_eq!(
            read(&dir, "requirements.txt"),
            "mkdocs~=1.6  # Docs v1.6.1\nrequests>=2.28  # Python HTTP for Humans (v2.31.0)\n"
        );
    }

    #[test]
    fn test_update_comments_dry_run_and_idempotent() {
        let (dir, config) = project(PYPROJECT, None);
        let env = environment_with(&dir, &[("ruff", "0.15.0", None)]);
        let config = config.with_environment(Some(env));
        let sync = synchronizer(&[]);

        let preview = sync.update_comments(&config, true).unwrap();
        assert_eq!(preview.edits.len(), 1);
        assert_eq!(read(&dir, "pyproject.toml"), PYPROJECT);

        sync.update_comments(&config, false).unwrap();
        let again = sync.update_comments(&config, false).unwrap();
        assert!(!again.has_changes());
    }

    #[test]
    fn test_comment_edits_skip_shared_lines() {
        let content = "[project]\ndependencies = [\"ruff>=0.9\", \"mypy>=1.0\"]\n";
        let path = Path::new("pyproject.toml");
        let manifest = crate::manifest::parse_manifest(path, content).unwrap();
        let installed = HashMap::from([(
            "ruff".to_string(),
            InstalledPackage {
                name: "ruff".to_string(),
                version: "0.15.0".to_string(),
                summary: None,
            },
        )]);

        assert!(comment_edits(path, content, &manifest.dependencies, &installed).is_empty());
    }
}
