use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;
use semver::Version;

use crate::error::ParseError;

/// `major.minor` with no patch, followed by an optional prerelease or build suffix
static MISSING_PATCH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+\.\d+)([-+].*)?$").unwrap());

/// Parse a published version string into a semver::Version, normalizing a missing patch.
///
/// Only the dotted numeric portion is inspected: when it has exactly one dot a `.0`
/// patch is inserted before any prerelease or build suffix. Anything else is parsed
/// as-is and rejected if it is not valid semver.
///
/// Examples:
/// - "3.3+8d42667" -> Version(3, 3, 0, build: 8d42667)
/// - "3.3-rc.1" -> Version(3, 3, 0, pre: rc.1)
/// - "1.2.3" -> Version(1, 2, 3)
/// - "3" -> ParseError
pub fn normalize_version(version: &str) -> Result<Version, ParseError> {
    let normalized = match MISSING_PATCH_RE.captures(version) {
        Some(caps) => format!(
            "{}.0{}",
            &caps[1],
            caps.get(2).map_or("", |suffix| suffix.as_str())
        ),
        None => version.to_string(),
    };

    Version::parse(&normalized).map_err(|_| ParseError::InvalidVersion(version.to_string()))
}

/// Semver precedence: major, minor, patch, then prerelease. Build metadata is ignored.
pub fn precedence(a: &Version, b: &Version) -> Ordering {
    a.major
        .cmp(&b.major)
        .then(a.minor.cmp(&b.minor))
        .then(a.patch.cmp(&b.patch))
        .then_with(|| a.pre.cmp(&b.pre))
}

/// Total order over versions: precedence first, build metadata as the final tie-break.
///
/// Two builds of the same release that differ only in metadata are never equal,
/// so sorting a catalog is deterministic.
pub fn compare_versions(a: &Version, b: &Version) -> Ordering {
    precedence(a, b).then_with(|| a.build.cmp(&b.build))
}
