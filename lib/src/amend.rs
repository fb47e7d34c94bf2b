use crate::error::{CellarError, Result};
use crate::version::Version;

/// Declaration identifier for a formula name: word segments capitalized
/// and concatenated (`"elastic-search"` → `"ElasticSearch"`).
pub fn class_name(package: &str) -> String {
    package
        .split(['-', '_', ' '])
        .filter(|seg| !seg.is_empty())
        .map(capitalize)
        .collect()
}

/// The identifier of the pinned variant: class name suffixed with `AT`
/// and the version digits (`elasticsearch` + `5.6.1` →
/// `ElasticsearchAT561`).
pub fn versioned_class_name(package: &str, version: &Version) -> String {
    format!("{}AT{}", class_name(package), version.digits())
}

/// Rewrites a historical formula into its pinned `name@version` form.
///
/// Replaces the first occurrence of the un-versioned declaration header
/// with the versioned identifier and a `keg_only :versioned_formula`
/// directive marking the artifact as pinned. The formula grammar is
/// opaque by design; this is a single textual substitution with a hard
/// postcondition.
///
/// ## Errors
///
/// Returns [`CellarError::AmendUnchanged`] when the substitution was a
/// no-op, meaning the header text the heuristic expects has drifted.
pub fn amend(content: &str, package: &str, version: &Version) -> Result<String> {
    let unversioned = format!("class {} < Formula\n", class_name(package));
    let versioned = format!(
        "class {} < Formula\n  keg_only :versioned_formula\n",
        versioned_class_name(package, version),
    );

    let amended = content.replacen(&unversioned, &versioned, 1);
    if amended == content {
        return Err(CellarError::AmendUnchanged {
            package: package.to_string(),
            version: version.to_string(),
        });
    }
    Ok(amended)
}

fn capitalize(seg: &str) -> String {
    let mut chars = seg.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
