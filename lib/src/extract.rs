use regex::Regex;

use crate::error::{CellarError, Result};
use crate::version::Version;

/// One era of version encoding: a pattern plus the capture group that
/// holds the version token.
///
/// Stateless and reusable across revisions. A capture that is empty or
/// not dotted numeric counts as a non-match, so a sloppy pattern falls
/// through to the next matcher instead of producing a garbage token.
#[derive(Debug, Clone)]
pub struct VersionMatcher {
    regex: Regex,
    group: usize,
}

impl VersionMatcher {
    /// Compiles a matcher from a pattern and a capture-group index.
    pub fn new(pattern: &str, group: usize) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|source| CellarError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { regex, group })
    }

    fn capture(&self, content: &str) -> Option<Version> {
        let caps = self.regex.captures(content)?;
        let raw = caps.get(self.group)?.as_str().trim_end_matches('.');
        raw.parse().ok()
    }
}

/// Extracts a release version from one revision of a formula.
///
/// Holds an ordered list of matchers tried in sequence; the first
/// successful capture wins. Different historical eras of a formula encode
/// the version differently (embedded in the download URL for one stretch
/// of history, in a source tag reference for another), and the ordered
/// fallback lets a single extractor serve the whole history without
/// per-era branching.
///
/// ## Examples
///
/// ```
/// use cellar_lib::VersionExtractor;
///
/// let extractor = VersionExtractor::for_package("elasticsearch").unwrap();
/// let content = r#"  url "https://example.org/dl/elasticsearch-5.6.1.tar.gz""#;
/// assert_eq!(extractor.extract(content).unwrap().as_str(), "5.6.1");
/// ```
#[derive(Debug, Clone)]
pub struct VersionExtractor {
    matchers: Vec<VersionMatcher>,
}

impl VersionExtractor {
    /// Builds an extractor from an explicit ordered matcher list.
    pub fn new(matchers: Vec<VersionMatcher>) -> Self {
        Self { matchers }
    }

    /// The default era list for a formula name: a versioned download URL
    /// first, then modern and legacy source-tag references.
    pub fn for_package(name: &str) -> Result<Self> {
        let name = regex::escape(name);
        let matchers = vec![
            VersionMatcher::new(
                &format!(r#"url\s+['"]https?://[^'"]*{name}-([0-9]+(?:\.[0-9]+)+)"#),
                1,
            )?,
            VersionMatcher::new(r#"tag:\s*['"]v?([0-9]+(?:\.[0-9]+)+)['"]"#, 1)?,
            VersionMatcher::new(r#":tag\s*=>\s*['"]v?([0-9]+(?:\.[0-9]+)+)['"]"#, 1)?,
        ];
        Ok(Self::new(matchers))
    }

    /// Tries each matcher in order against the content; returns the first
    /// captured version, or `None` when no matcher succeeds.
    pub fn extract(&self, content: &str) -> Option<Version> {
        self.matchers.iter().find_map(|m| m.capture(content))
    }
}
