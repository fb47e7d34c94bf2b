use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CellarError, Result};
use crate::extract::{VersionExtractor, VersionMatcher};
use crate::retention::RetentionPolicy;
use crate::version::Version;

/// One tracked package: everything the orchestrator needs to archive it.
///
/// Customization is composition, not subclassing: the descriptor carries
/// the ordered matcher list and the retention predicate as data, and the
/// same generic orchestrator drives every package.
#[derive(Debug, Clone)]
pub struct PackageSpec {
    /// Display name, also the stem of every artifact (`name@version`).
    pub name: String,
    /// Path of the definition file inside the upstream checkout.
    pub tracked_path: PathBuf,
    pub extractor: VersionExtractor,
    pub retention: RetentionPolicy,
}

impl PackageSpec {
    /// A spec with the conventional tap layout (`Formula/<name>.rb`), the
    /// default era matchers, and no retention floor.
    pub fn new(name: &str) -> Result<Self> {
        Ok(Self {
            name: name.to_string(),
            tracked_path: PathBuf::from(format!("Formula/{name}.rb")),
            extractor: VersionExtractor::for_package(name)?,
            retention: RetentionPolicy::KeepAll,
        })
    }

    pub fn tracked_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.tracked_path = path.into();
        self
    }

    pub fn extractor(mut self, extractor: VersionExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    /// Artifact file name for a retained version: `name@version`, keeping
    /// the tracked path's extension (`elasticsearch@5.6.1.rb`).
    pub fn artifact_name(&self, version: &Version) -> String {
        match self.tracked_path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) => format!("{}@{}.{}", self.name, version, ext),
            None => format!("{}@{}", self.name, version),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawManifest {
    repo: Option<PathBuf>,
    formulae_dir: Option<PathBuf>,
    #[serde(default, rename = "package")]
    packages: Vec<RawPackage>,
}

#[derive(Debug, Deserialize)]
struct RawPackage {
    name: String,
    path: Option<PathBuf>,
    min_version: Option<String>,
    #[serde(default)]
    matchers: Vec<RawMatcher>,
}

#[derive(Debug, Deserialize)]
struct RawMatcher {
    pattern: String,
    #[serde(default = "default_group")]
    group: usize,
}

fn default_group() -> usize {
    1
}

/// The configuration surface of a run: where the upstream checkout lives,
/// where artifacts go, and the tracked package set.
///
/// ## Examples
///
/// A manifest file looks like:
///
/// ```toml
/// repo = "vendor/homebrew-core"
/// formulae_dir = "Formula"
///
/// [[package]]
/// name = "elasticsearch"
/// min_version = "1.5.2"
///
/// [[package]]
/// name = "kibana"
/// matchers = [{ pattern = 'tag: "v([0-9.]+)"', group = 1 }]
/// ```
#[derive(Debug, Clone)]
pub struct Manifest {
    pub repo: PathBuf,
    pub formulae_dir: PathBuf,
    pub packages: Vec<PackageSpec>,
}

impl Manifest {
    /// Loads and validates a TOML manifest, compiling custom matchers and
    /// parsing retention floors.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let raw: RawManifest =
            toml::from_str(&text).map_err(|e| CellarError::Manifest(e.to_string()))?;

        if raw.packages.is_empty() {
            return Err(CellarError::Manifest(format!(
                "{} declares no packages",
                path.display()
            )));
        }

        let mut packages = Vec::with_capacity(raw.packages.len());
        for pkg in raw.packages {
            let mut spec = PackageSpec::new(&pkg.name)?;
            if let Some(tracked) = pkg.path {
                spec = spec.tracked_path(tracked);
            }
            if !pkg.matchers.is_empty() {
                let mut matchers = Vec::with_capacity(pkg.matchers.len());
                for m in &pkg.matchers {
                    matchers.push(VersionMatcher::new(&m.pattern, m.group)?);
                }
                spec = spec.extractor(VersionExtractor::new(matchers));
            }
            if let Some(floor) = pkg.min_version {
                spec = spec.retention(RetentionPolicy::MinimumVersion(floor.parse()?));
            }
            packages.push(spec);
        }

        Ok(Self {
            repo: raw.repo.unwrap_or_else(|| PathBuf::from("vendor/homebrew-core")),
            formulae_dir: raw.formulae_dir.unwrap_or_else(|| PathBuf::from("Formula")),
            packages,
        })
    }

    /// The package set the tool has always tracked.
    pub fn builtin() -> Result<Self> {
        // releases before 1.5.2 are signed with now-deprecated sha1
        // signatures and cannot be verified on install
        let elasticsearch = PackageSpec::new("elasticsearch")?
            .retention(RetentionPolicy::MinimumVersion("1.5.2".parse()?));
        let kibana = PackageSpec::new("kibana")?;

        Ok(Self {
            repo: PathBuf::from("vendor/homebrew-core"),
            formulae_dir: PathBuf::from("Formula"),
            packages: vec![elasticsearch, kibana],
        })
    }

    /// Restricts the package set to the given names.
    ///
    /// ## Errors
    ///
    /// Fails when a name is not in the manifest, so a typo surfaces
    /// instead of silently archiving nothing.
    pub fn select(&self, names: &[String]) -> Result<Vec<PackageSpec>> {
        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            let spec = self
                .packages
                .iter()
                .find(|pkg| &pkg.name == name)
                .ok_or_else(|| CellarError::Manifest(format!("unknown package {name:?}")))?;
            selected.push(spec.clone());
        }
        Ok(selected)
    }
}
