//! Cellar mines the commit history of a Homebrew-style tap checkout and
//! archives every distinct historical release a formula ever described.
//!
//! The upstream tap is forward-only: it keeps just the current definition
//! of each package. Cellar walks the commits that touched a formula,
//! extracts the release version each revision described, collapses
//! consecutive revisions of the same release, applies a retention policy,
//! and writes each retained release back out as a renamed, pinned
//! `name@version` formula — so old releases stay installable after the
//! upstream has moved on.
//!
//! The pipeline per package: [`HistoryWalker`] → [`Transitions`] →
//! [`RetentionPolicy`] → [`amend`] → artifact write, driven by
//! [`Archiver`]. The very latest version found is always the live
//! upstream definition and is never archived.

pub mod amend;
pub mod archive;
pub mod error;
pub mod extract;
pub mod history;
pub mod manifest;
pub mod retention;
pub mod transitions;
pub mod version;

pub use archive::{AmendFailure, Archiver, PackageOutcome, PackageReport, RunReport};
pub use error::{CellarError, Result};
pub use extract::{VersionExtractor, VersionMatcher};
pub use history::{HistoryWalker, Revision};
pub use manifest::{Manifest, PackageSpec};
pub use retention::RetentionPolicy;
pub use transitions::Transitions;
pub use version::Version;
