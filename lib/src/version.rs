use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::CellarError;

/// A dotted numeric release identifier as captured from formula text,
/// e.g. `"5.6.1"`.
///
/// Equality and hashing are plain string equality — two tokens are the
/// same version iff their text is identical, with no normalization. The
/// retention floor instead uses [`Version::numeric_cmp`], which compares
/// component-wise; that comparison is deliberately not exposed as `Ord`,
/// since `"1.5"` and `"1.5.0"` compare numerically equal while being
/// distinct tokens.
///
/// ## Examples
///
/// ```
/// use cellar_lib::Version;
/// use std::cmp::Ordering;
///
/// let a: Version = "1.10.0".parse().unwrap();
/// let b: Version = "1.9.9".parse().unwrap();
/// assert_eq!(a.numeric_cmp(&b), Ordering::Greater);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
    /// The token exactly as captured.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The token with dots removed, for embedding in a class identifier
    /// (`"5.6.1"` → `"561"`).
    pub fn digits(&self) -> String {
        self.0.replace('.', "")
    }

    fn components(&self) -> impl Iterator<Item = u64> + '_ {
        self.0.split('.').map(|seg| seg.parse().unwrap_or(u64::MAX))
    }

    /// Component-wise numeric comparison. Shorter tokens are padded with
    /// zero segments, so `"1.5"` and `"1.5.0"` compare equal. Never
    /// lexical: `"1.10.0"` is greater than `"1.9.9"`.
    pub fn numeric_cmp(&self, other: &Version) -> Ordering {
        let mut a = self.components();
        let mut b = other.components();
        loop {
            match (a.next(), b.next()) {
                (None, None) => return Ordering::Equal,
                (x, y) => match x.unwrap_or(0).cmp(&y.unwrap_or(0)) {
                    Ordering::Equal => continue,
                    ord => return ord,
                },
            }
        }
    }
}

impl FromStr for Version {
    type Err = CellarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let dotted_numeric = !s.is_empty()
            && s.split('.')
                .all(|seg| !seg.is_empty() && seg.bytes().all(|b| b.is_ascii_digit()));

        if dotted_numeric {
            Ok(Version(s.to_string()))
        } else {
            Err(CellarError::InvalidVersion(s.to_string()))
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
