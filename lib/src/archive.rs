use git2::Repository;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::amend;
use crate::error::{CellarError, Result};
use crate::history::HistoryWalker;
use crate::manifest::PackageSpec;
use crate::transitions::Transitions;
use crate::version::Version;

/// Outcome of one package's walk.
#[derive(Debug, Clone, Serialize)]
pub struct PackageReport {
    pub package: String,
    /// The latest version found — still the live upstream definition,
    /// excluded from archival.
    pub live: Option<Version>,
    /// Versions archived this run, newest first.
    pub archived: Vec<Version>,
    /// Versions the retention policy turned down.
    pub rejected: Vec<Version>,
    /// Versions whose header rewrite no-opped; nothing was written.
    pub amend_failures: Vec<AmendFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AmendFailure {
    pub version: Version,
    pub message: String,
}

/// Per-package result of a multi-package run.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PackageOutcome {
    Completed(PackageReport),
    Failed { package: String, error: String },
}

/// Everything a run produced, one outcome per package in input order.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub packages: Vec<PackageOutcome>,
}

impl RunReport {
    /// True when every package completed and every amendment took.
    pub fn success(&self) -> bool {
        self.packages.iter().all(|outcome| match outcome {
            PackageOutcome::Completed(report) => report.amend_failures.is_empty(),
            PackageOutcome::Failed { .. } => false,
        })
    }
}

/// Drives the archival pipeline: history walk → version transitions →
/// retention → amendment → artifact write.
///
/// Holds the one read-only repository handle shared by every package in
/// a run. Re-running against unchanged history regenerates byte-identical
/// artifacts; files for versions no longer reachable are left untouched.
///
/// ## Examples
///
/// ```no_run
/// use cellar_lib::{Archiver, Manifest};
/// use std::path::Path;
///
/// let manifest = Manifest::builtin().unwrap();
/// let archiver = Archiver::open(&manifest.repo, &manifest.formulae_dir).unwrap();
/// let report = archiver.run(&manifest.packages);
/// assert!(report.success());
/// ```
pub struct Archiver {
    repo: Repository,
    formulae_dir: PathBuf,
}

impl Archiver {
    /// Opens the upstream checkout and remembers the output directory.
    pub fn open(repo_path: &Path, formulae_dir: impl Into<PathBuf>) -> Result<Self> {
        let repo = Repository::open(repo_path)?;
        Ok(Self {
            repo,
            formulae_dir: formulae_dir.into(),
        })
    }

    /// Archives each package in turn. Packages are independent: one
    /// package's fatal error is recorded and the next still runs.
    pub fn run(&self, specs: &[PackageSpec]) -> RunReport {
        let packages = specs
            .iter()
            .map(|spec| match self.archive_package(spec) {
                Ok(report) => PackageOutcome::Completed(report),
                Err(e) => {
                    error!(package = %spec.name, error = %e, "archival aborted");
                    PackageOutcome::Failed {
                        package: spec.name.clone(),
                        error: e.to_string(),
                    }
                }
            })
            .collect();
        RunReport { packages }
    }

    /// Walks one package's history and writes an artifact for every
    /// retained version.
    ///
    /// The first distinct version is the live one and is skipped
    /// unconditionally. Extraction and backend failures abort the walk;
    /// an amendment no-op is recorded and the walk continues, since the
    /// remaining older versions are unaffected by one stale header.
    pub fn archive_package(&self, spec: &PackageSpec) -> Result<PackageReport> {
        info!(package = %spec.name, path = %spec.tracked_path.display(), "walking history");

        let walker = HistoryWalker::new(&self.repo, &spec.tracked_path);
        let transitions = Transitions::new(walker.walk()?, &spec.extractor, &spec.name);

        let mut report = PackageReport {
            package: spec.name.clone(),
            live: None,
            archived: Vec::new(),
            rejected: Vec::new(),
            amend_failures: Vec::new(),
        };
        let mut seen: HashSet<Version> = HashSet::new();

        for entry in transitions {
            let (version, revision) = entry?;
            debug!(package = %spec.name, version = %version, commit = %revision.commit, "version transition");

            // a revert can resurface a version from earlier in the walk;
            // the first-encountered content stands
            if !seen.insert(version.clone()) {
                continue;
            }

            if report.live.is_none() {
                report.live = Some(version);
                continue;
            }

            if !spec.retention.accepts(&version) {
                debug!(package = %spec.name, version = %version, "rejected by retention policy");
                report.rejected.push(version);
                continue;
            }

            match amend::amend(&revision.content, &spec.name, &version) {
                Ok(amended) => {
                    self.write_artifact(spec, &version, &amended)?;
                    report.archived.push(version);
                }
                Err(e) => {
                    error!(package = %spec.name, version = %version, "formula header rewrite was a no-op");
                    report.amend_failures.push(AmendFailure {
                        version,
                        message: e.to_string(),
                    });
                }
            }
        }

        if report.live.is_none() {
            return Err(CellarError::PathNeverTracked(spec.tracked_path.clone()));
        }

        info!(
            package = %spec.name,
            archived = report.archived.len(),
            rejected = report.rejected.len(),
            "archival complete"
        );
        Ok(report)
    }

    fn write_artifact(&self, spec: &PackageSpec, version: &Version, content: &str) -> Result<()> {
        fs::create_dir_all(&self.formulae_dir)?;
        let path = self.formulae_dir.join(spec.artifact_name(version));
        fs::write(&path, content)?;
        info!(artifact = %path.display(), "wrote archived formula");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retention::RetentionPolicy;
    use tempfile::TempDir;

    fn commit_file(repo: &Repository, workdir: &Path, path: &str, content: &str, message: &str) {
        let full = workdir.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&full, content).unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(Path::new(path)).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();

        let sig = git2::Signature::now("Test", "test@example.com").unwrap();
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap();
    }

    fn formula(class: &str, package: &str, version: &str) -> String {
        format!(
            "class {class} < Formula\n  desc \"search engine\"\n  url \"https://artifacts.example.org/downloads/{package}-{version}.tar.gz\"\nend\n"
        )
    }

    fn es_formula(version: &str) -> String {
        formula("Elasticsearch", "elasticsearch", version)
    }

    struct Fixture {
        upstream: TempDir,
        out: TempDir,
    }

    impl Fixture {
        fn new(versions: &[&str]) -> Self {
            let upstream = TempDir::new().unwrap();
            let repo = Repository::init(upstream.path()).unwrap();
            for version in versions {
                commit_file(
                    &repo,
                    upstream.path(),
                    "Formula/elasticsearch.rb",
                    &es_formula(version),
                    &format!("elasticsearch {version}"),
                );
            }
            Self {
                upstream,
                out: TempDir::new().unwrap(),
            }
        }

        fn archiver(&self) -> Archiver {
            Archiver::open(self.upstream.path(), self.out.path()).unwrap()
        }

        fn spec(&self) -> PackageSpec {
            PackageSpec::new("elasticsearch").unwrap()
        }

        fn artifact(&self, version: &str) -> PathBuf {
            self.out.path().join(format!("elasticsearch@{version}.rb"))
        }
    }

    fn names(versions: &[Version]) -> Vec<&str> {
        versions.iter().map(Version::as_str).collect()
    }

    #[test]
    fn test_live_version_is_never_archived() {
        // committed oldest to newest; the walk sees 2.0.0 first
        let fx = Fixture::new(&["1.0.0", "1.1.0", "2.0.0"]);
        let report = fx.archiver().archive_package(&fx.spec()).unwrap();

        assert_eq!(report.live.as_ref().unwrap().as_str(), "2.0.0");
        assert_eq!(names(&report.archived), ["1.1.0", "1.0.0"]);
        assert!(!fx.artifact("2.0.0").exists());
        assert!(fx.artifact("1.1.0").exists());
        assert!(fx.artifact("1.0.0").exists());
    }

    #[test]
    fn test_duplicate_recommit_collapses() {
        let fx = Fixture::new(&["5.1.2"]);
        let repo = Repository::open(fx.upstream.path()).unwrap();
        commit_file(
            &repo,
            fx.upstream.path(),
            "Formula/elasticsearch.rb",
            &es_formula("5.6.1"),
            "elasticsearch 5.6.1",
        );
        // re-commit of the same version with cosmetic changes
        commit_file(
            &repo,
            fx.upstream.path(),
            "Formula/elasticsearch.rb",
            &es_formula("5.6.1").replace("search engine", "distributed search engine"),
            "reword desc",
        );

        let report = fx.archiver().archive_package(&fx.spec()).unwrap();
        assert_eq!(report.live.as_ref().unwrap().as_str(), "5.6.1");
        assert_eq!(names(&report.archived), ["5.1.2"]);
        assert!(fx.artifact("5.1.2").exists());
        assert!(!fx.artifact("5.6.1").exists());
    }

    #[test]
    fn test_retention_floor_scenario() {
        let fx = Fixture::new(&["1.5.1", "1.5.2", "2.0.0"]);
        let spec = fx
            .spec()
            .retention(RetentionPolicy::MinimumVersion("1.5.2".parse().unwrap()));

        let report = fx.archiver().archive_package(&spec).unwrap();
        assert_eq!(report.live.as_ref().unwrap().as_str(), "2.0.0");
        assert_eq!(names(&report.archived), ["1.5.2"]);
        assert_eq!(names(&report.rejected), ["1.5.1"]);
        assert!(fx.artifact("1.5.2").exists());
        assert!(!fx.artifact("1.5.1").exists());
    }

    #[test]
    fn test_archived_artifact_is_amended() {
        let fx = Fixture::new(&["1.5.2", "2.0.0"]);
        fx.archiver().archive_package(&fx.spec()).unwrap();

        let text = fs::read_to_string(fx.artifact("1.5.2")).unwrap();
        assert!(text.starts_with("class ElasticsearchAT152 < Formula\n  keg_only :versioned_formula\n"));
        assert!(text.contains("elasticsearch-1.5.2.tar.gz"));
    }

    #[test]
    fn test_rerun_is_byte_identical() {
        let fx = Fixture::new(&["1.0.0", "1.1.0", "2.0.0"]);
        let archiver = fx.archiver();
        let spec = fx.spec();

        archiver.archive_package(&spec).unwrap();
        let first = fs::read(fx.artifact("1.0.0")).unwrap();
        archiver.archive_package(&spec).unwrap();
        let second = fs::read(fx.artifact("1.0.0")).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_revert_resurfaces_version_only_once() {
        // 2.0.0 shipped, rolled back to 1.9.0, then shipped again: the
        // walk sees 2.0.0, 1.9.0, 2.0.0, 1.9.0 — each version once
        let fx = Fixture::new(&["1.9.0", "2.0.0", "1.9.0", "2.0.0"]);
        let report = fx.archiver().archive_package(&fx.spec()).unwrap();

        assert_eq!(report.live.as_ref().unwrap().as_str(), "2.0.0");
        assert_eq!(names(&report.archived), ["1.9.0"]);
    }

    #[test]
    fn test_extraction_failure_aborts_and_names_the_commit() {
        let fx = Fixture::new(&["1.0.0"]);
        let repo = Repository::open(fx.upstream.path()).unwrap();
        commit_file(
            &repo,
            fx.upstream.path(),
            "Formula/elasticsearch.rb",
            "class Elasticsearch < Formula\n  # no url yet\nend\n",
            "strip url",
        );
        let head = repo.head().unwrap().peel_to_commit().unwrap().id().to_string();

        let err = fx.archiver().archive_package(&fx.spec()).unwrap_err();
        match err {
            CellarError::VersionNotFound { package, commit } => {
                assert_eq!(package, "elasticsearch");
                assert_eq!(commit, head);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_amend_noop_is_recorded_and_walk_continues() {
        let fx = Fixture::new(&["1.0.0"]);
        let repo = Repository::open(fx.upstream.path()).unwrap();
        // historical revision with a drifted header the amender cannot find
        commit_file(
            &repo,
            fx.upstream.path(),
            "Formula/elasticsearch.rb",
            &formula("ElasticSearch", "elasticsearch", "1.1.0"),
            "odd header era",
        );
        commit_file(
            &repo,
            fx.upstream.path(),
            "Formula/elasticsearch.rb",
            &es_formula("2.0.0"),
            "elasticsearch 2.0.0",
        );

        let report = fx.archiver().archive_package(&fx.spec()).unwrap();
        assert_eq!(report.amend_failures.len(), 1);
        assert_eq!(report.amend_failures[0].version.as_str(), "1.1.0");
        // the older version behind the stale header is still archived
        assert_eq!(names(&report.archived), ["1.0.0"]);
        assert!(!fx.artifact("1.1.0").exists());

        let run = RunReport {
            packages: vec![PackageOutcome::Completed(report)],
        };
        assert!(!run.success());
    }

    #[test]
    fn test_never_tracked_path_is_a_backend_error() {
        let fx = Fixture::new(&["1.0.0"]);
        let spec = fx.spec().tracked_path("Formula/missing.rb");
        let err = fx.archiver().archive_package(&spec).unwrap_err();
        assert!(matches!(err, CellarError::PathNeverTracked(_)));
    }

    #[test]
    fn test_run_isolates_package_failures() {
        let fx = Fixture::new(&["1.0.0", "2.0.0"]);
        let good = fx.spec();
        let bad = fx.spec().tracked_path("Formula/missing.rb");

        let report = fx.archiver().run(&[bad, good]);
        assert_eq!(report.packages.len(), 2);
        assert!(matches!(report.packages[0], PackageOutcome::Failed { .. }));
        assert!(matches!(report.packages[1], PackageOutcome::Completed(_)));
        assert!(!report.success());
    }

    #[test]
    fn test_single_version_history_archives_nothing() {
        let fx = Fixture::new(&["1.0.0"]);
        let report = fx.archiver().archive_package(&fx.spec()).unwrap();
        assert_eq!(report.live.as_ref().unwrap().as_str(), "1.0.0");
        assert!(report.archived.is_empty());
    }
}
