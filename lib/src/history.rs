use git2::{Commit, Oid, Repository, Sort};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// One historical state of the tracked file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    /// Full commit SHA, used for content identity and error reporting.
    pub commit: String,
    /// Raw text of the tracked file at that commit.
    pub content: String,
}

/// Enumerates the commits that touched a single path, newest first.
///
/// A commit "touches" the path when the blob at the path differs from the
/// first parent's (or the path first appears there). The walk is lazy and
/// restartable: calling [`HistoryWalker::walk`] again re-reads the same
/// history with no side effects.
///
/// ## Examples
///
/// ```no_run
/// use cellar_lib::HistoryWalker;
/// use git2::Repository;
///
/// let repo = Repository::open("vendor/homebrew-core").unwrap();
/// let walker = HistoryWalker::new(&repo, "Formula/elasticsearch.rb");
/// for revision in walker.walk().unwrap() {
///     let revision = revision.unwrap();
///     println!("{}: {} bytes", revision.commit, revision.content.len());
/// }
/// ```
pub struct HistoryWalker<'repo> {
    repo: &'repo Repository,
    path: PathBuf,
}

impl<'repo> HistoryWalker<'repo> {
    pub fn new(repo: &'repo Repository, path: impl Into<PathBuf>) -> Self {
        Self {
            repo,
            path: path.into(),
        }
    }

    /// Starts a newest-to-oldest walk from HEAD.
    ///
    /// ## Errors
    ///
    /// Fails when the repository has no HEAD to walk from; per-commit
    /// backend failures surface as `Err` items during iteration.
    pub fn walk(&self) -> Result<HistoryWalk<'repo>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.push_head()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        Ok(HistoryWalk {
            repo: self.repo,
            path: self.path.clone(),
            revwalk,
        })
    }
}

/// Lazy iterator over the revisions of one path, newest first.
pub struct HistoryWalk<'repo> {
    repo: &'repo Repository,
    path: PathBuf,
    revwalk: git2::Revwalk<'repo>,
}

impl HistoryWalk<'_> {
    fn blob_at(&self, commit: &Commit<'_>, path: &Path) -> Option<Oid> {
        let tree = commit.tree().ok()?;
        let entry = tree.get_path(path).ok()?;
        Some(entry.id())
    }

    fn revision_if_touched(&self, oid: Oid) -> Result<Option<Revision>> {
        let commit = self.repo.find_commit(oid)?;

        let Some(blob_id) = self.blob_at(&commit, &self.path) else {
            return Ok(None);
        };

        // judged against the first parent only, matching default git-log
        // history simplification
        let parent_blob = commit
            .parent(0)
            .ok()
            .and_then(|parent| self.blob_at(&parent, &self.path));
        if parent_blob == Some(blob_id) {
            return Ok(None);
        }

        let blob = self.repo.find_blob(blob_id)?;
        let content = String::from_utf8_lossy(blob.content()).into_owned();

        Ok(Some(Revision {
            commit: oid.to_string(),
            content,
        }))
    }
}

impl Iterator for HistoryWalk<'_> {
    type Item = Result<Revision>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let oid = match self.revwalk.next()? {
                Ok(oid) => oid,
                Err(e) => return Some(Err(e.into())),
            };
            match self.revision_if_touched(oid) {
                Ok(Some(revision)) => return Some(Ok(revision)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
