//! Best-match selection over a catalog

use tracing::debug;

use crate::catalog::types::{Catalog, Package};
use crate::error::ResolveError;
use crate::version::{VersionSpec, compare_versions, normalize_version};

/// Select the highest version of `name` satisfying `range`.
///
/// Candidates are ranked by semantic version with build metadata as the final
/// tie-break; revisions are never consulted, so callers that need the newest
/// re-publication must deduplicate first. `*` is matched like any other range.
///
/// # Returns
/// * `Ok(&Package)` - The best match
/// * `Err(ResolveError::NotFound)` - No package matches
/// * `Err(ResolveError::Parse)` - The range or a candidate's version is malformed
pub fn select_best<'a>(
    catalog: &'a Catalog,
    name: &str,
    range: &str,
    include_prerelease: bool,
) -> Result<&'a Package, ResolveError> {
    let spec = VersionSpec::parse(range)?;

    let mut matches = Vec::new();
    for package in catalog.iter().filter(|p| p.name == name) {
        let version = normalize_version(&package.version)?;
        if spec.satisfies(&version, include_prerelease) {
            matches.push((version, package));
        }
    }

    // Stable sort, highest first
    matches.sort_by(|(a, _), (b, _)| compare_versions(b, a));

    debug!(
        "{} candidates of {} match '{}' (prereleases: {})",
        matches.len(),
        name,
        spec,
        include_prerelease
    );

    matches
        .into_iter()
        .next()
        .map(|(_, package)| package)
        .ok_or_else(|| ResolveError::NotFound {
            name: name.to_string(),
            range: range.to_string(),
        })
}
