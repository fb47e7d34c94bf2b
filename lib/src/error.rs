use std::path::PathBuf;

/// Error types for the Cellar library.
///
/// Covers the three fatal conditions of an archival run — extraction
/// failure, a no-op amendment, and backend failure — plus manifest and IO
/// problems. Every variant carries enough context (package, version,
/// commit) to diagnose which part of the history drifted.
#[derive(Debug, thiserror::Error)]
pub enum CellarError {
    /// IO error during an artifact write or manifest read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Git backend failure: the repository could not produce a log or
    /// content for the tracked path. Never retried.
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    /// The history walk finished without a single commit touching the
    /// tracked path.
    #[error("no commit in history ever touched {0}")]
    PathNeverTracked(PathBuf),

    /// No matcher in the ordered fallback list matched a revision's
    /// content. Indicates the tracked file's shape has drifted past what
    /// the configured patterns expect.
    #[error("could not extract a version for {package} from commit {commit}")]
    VersionNotFound { package: String, commit: String },

    /// The header rewrite left the formula text unchanged, meaning the
    /// un-versioned declaration the heuristic looks for was not found.
    #[error("amending {package}@{version} left the formula unchanged")]
    AmendUnchanged { package: String, version: String },

    /// A token that should be dotted numeric is not.
    #[error("invalid version token: {0:?}")]
    InvalidVersion(String),

    /// A configured matcher pattern failed to compile.
    #[error("invalid matcher pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The package manifest could not be parsed or referenced an unknown
    /// package.
    #[error("manifest error: {0}")]
    Manifest(String),
}

/// Convenience Result type for Cellar operations.
pub type Result<T> = std::result::Result<T, CellarError>;
