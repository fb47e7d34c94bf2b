use std::cmp::Ordering;

use crate::version::Version;

/// Decides whether a historical version is eligible for archival.
///
/// A pure predicate over the version token, invoked once per candidate.
/// The floor compares component-wise numerically, never lexically, so a
/// floor of `1.5.2` rejects `1.5.1` and accepts `1.10.0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetentionPolicy {
    /// Archive every historical version.
    KeepAll,
    /// Archive only versions at or above the floor.
    MinimumVersion(Version),
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::KeepAll
    }
}

impl RetentionPolicy {
    pub fn accepts(&self, version: &Version) -> bool {
        match self {
            Self::KeepAll => true,
            Self::MinimumVersion(floor) => version.numeric_cmp(floor) != Ordering::Less,
        }
    }
}
