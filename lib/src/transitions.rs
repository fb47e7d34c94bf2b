use crate::error::{CellarError, Result};
use crate::extract::VersionExtractor;
use crate::history::Revision;
use crate::version::Version;

/// Collapses a newest-first revision stream into version transitions.
///
/// A sequential fold with an explicit `last_seen` accumulator: each
/// revision's version is extracted, and the pair surfaces only when the
/// version differs (string inequality) from the previous one. Consecutive
/// duplicates never surface; non-adjacent recurrences of a version are
/// not this adaptor's concern and are yielded again.
///
/// Generic over the revision source, so the fold unit-tests without a
/// git backend behind it.
pub struct Transitions<'a, I> {
    revisions: I,
    extractor: &'a VersionExtractor,
    package: &'a str,
    last_seen: Option<Version>,
}

impl<'a, I> Transitions<'a, I>
where
    I: Iterator<Item = Result<Revision>>,
{
    pub fn new(revisions: I, extractor: &'a VersionExtractor, package: &'a str) -> Self {
        Self {
            revisions,
            extractor,
            package,
            last_seen: None,
        }
    }
}

impl<I> Iterator for Transitions<'_, I>
where
    I: Iterator<Item = Result<Revision>>,
{
    type Item = Result<(Version, Revision)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let revision = match self.revisions.next()? {
                Ok(revision) => revision,
                Err(e) => return Some(Err(e)),
            };

            let Some(version) = self.extractor.extract(&revision.content) else {
                return Some(Err(CellarError::VersionNotFound {
                    package: self.package.to_string(),
                    commit: revision.commit,
                }));
            };

            if self.last_seen.as_ref() == Some(&version) {
                continue;
            }
            self.last_seen = Some(version.clone());
            return Some(Ok((version, revision)));
        }
    }
}
