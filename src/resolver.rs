//! Package resolution: fetch, normalize, deduplicate, select

use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info};
use url::Url;

use crate::catalog::{Package, TieBreak, dedupe_with, normalize, select_best};
use crate::error::ResolveError;
use crate::index::IndexFetcher;
use crate::platform::{Architecture, IndexKey, Platform};

/// Range matching every version
const ANY_VERSION: &str = "*";

/// What the caller asked to install
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestedVersion {
    /// Latest stable release
    Stable,
    /// Latest build from the nightly index
    Nightly,
    /// Highest release satisfying a semver range
    Range(String),
}

impl RequestedVersion {
    pub fn parse(requested: &str) -> Self {
        match requested.trim() {
            "" | "stable" => RequestedVersion::Stable,
            "nightly" => RequestedVersion::Nightly,
            range => RequestedVersion::Range(range.to_string()),
        }
    }
}

impl fmt::Display for RequestedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestedVersion::Stable => f.write_str("stable"),
            RequestedVersion::Nightly => f.write_str("nightly"),
            RequestedVersion::Range(range) => f.write_str(range),
        }
    }
}

/// Everything resolution needs besides the request itself
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverConfig {
    pub package_root: Url,
    pub architecture: Architecture,
    pub platform: Platform,
    /// Whether range requests may select prereleases
    pub include_prerelease: bool,
    /// Whether the stable channel may select prereleases
    pub stable_prereleases: bool,
    pub tie_break: TieBreak,
}

impl ResolverConfig {
    fn index_key(&self, nightly: bool) -> IndexKey {
        IndexKey {
            architecture: self.architecture,
            platform: self.platform,
            nightly,
        }
    }
}

pub struct PackageResolver {
    fetcher: Arc<dyn IndexFetcher>,
    config: ResolverConfig,
}

impl PackageResolver {
    pub fn new(fetcher: Arc<dyn IndexFetcher>, config: ResolverConfig) -> Self {
        Self { fetcher, config }
    }

    /// Resolve `requested` for `name` against the published index.
    ///
    /// Each call works on its own fetched snapshot. Errors are returned as-is;
    /// nothing falls back to another channel or index.
    pub async fn resolve(
        &self,
        name: &str,
        requested: &RequestedVersion,
    ) -> Result<Package, ResolveError> {
        let (nightly, range, include_prerelease) = match requested {
            RequestedVersion::Stable => (false, ANY_VERSION, self.config.stable_prereleases),
            RequestedVersion::Nightly => (true, ANY_VERSION, true),
            RequestedVersion::Range(range) => {
                (false, range.as_str(), self.config.include_prerelease)
            }
        };

        let key = self.config.index_key(nightly);
        info!("Resolving {}@{} from index {}", name, requested, key);

        let index = self.fetcher.fetch_index(&key).await?;
        let catalog = normalize(
            index.packages,
            &self.config.package_root,
            self.config.architecture,
            Some(name),
        )?;
        let catalog = dedupe_with(catalog, self.config.tie_break);

        let package = select_best(&catalog, name, range, include_prerelease).map_err(
            |e| match e {
                // Report the caller's request, not the internal `*`
                ResolveError::NotFound { name, .. } => ResolveError::NotFound {
                    name,
                    range: requested.to_string(),
                },
                other => other,
            },
        )?;

        debug!(
            "Selected {} {} (revision {})",
            package.name, package.version, package.revision
        );
        info!("Resolved {}@{} to {}", name, requested, package.version);

        Ok(package.clone())
    }

    /// Resolve several requests concurrently; results keep request order
    pub async fn resolve_many(
        &self,
        requests: &[(&str, &str)],
    ) -> Vec<Result<Package, ResolveError>> {
        let futures = requests.iter().map(|(name, requested)| async move {
            let requested = RequestedVersion::parse(requested);
            self.resolve(name, &requested).await
        });

        join_all(futures).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IndexError;
    use crate::index::fetcher::MockIndexFetcher;
    use crate::index::types::{RawIndex, RawPackage};
    use rstest::rstest;
    use serde_json::json;

    fn raw(name: &str, version: &str, revision: &str) -> RawPackage {
        RawPackage {
            name: Some(json!(name)),
            version: Some(json!(version)),
            revision: Some(json!(revision)),
            install_ref: Some(json!(format!(
                "/archive/x86_64-unknown-linux-musl/{name}-{version}"
            ))),
            architecture: None,
        }
    }

    fn stable_index() -> RawIndex {
        RawIndex {
            packages: vec![
                raw("edgedb-cli", "1.0.0-rc.2+eea8ba1", "202111111827"),
                raw("edgedb-cli", "1.0.0+5724c50", "202202100030"),
                raw("edgedb-cli", "3.5.0+907ff37", "202309122051"),
                raw("edgedb-cli", "3.5.0+907ff37", "202309122053"),
                raw("edgedb-server-3", "3.4+4fc6d86", "202309271921"),
            ],
        }
    }

    fn config() -> ResolverConfig {
        ResolverConfig {
            package_root: Url::parse("https://packages.edgedb.com").unwrap(),
            architecture: Architecture::X86_64,
            platform: Platform::LinuxMusl,
            include_prerelease: true,
            stable_prereleases: false,
            tie_break: TieBreak::KeepFirst,
        }
    }

    fn resolver_with(index: RawIndex, nightly: bool) -> PackageResolver {
        let mut fetcher = MockIndexFetcher::new();
        fetcher
            .expect_fetch_index()
            .withf(move |key| key.nightly == nightly)
            .returning(move |_| Ok(index.clone()));
        PackageResolver::new(Arc::new(fetcher), config())
    }

    #[rstest]
    #[case("", RequestedVersion::Stable)]
    #[case("stable", RequestedVersion::Stable)]
    #[case(" nightly ", RequestedVersion::Nightly)]
    #[case("^3", RequestedVersion::Range("^3".to_string()))]
    #[case(">=3.2.0 <=3.4.0", RequestedVersion::Range(">=3.2.0 <=3.4.0".to_string()))]
    fn requested_version_parse(#[case] input: &str, #[case] expected: RequestedVersion) {
        assert_eq!(RequestedVersion::parse(input), expected);
    }

    #[tokio::test]
    async fn resolve_stable_picks_latest_revision_of_highest_release() {
        let resolver = resolver_with(stable_index(), false);

        let package = resolver
            .resolve("edgedb-cli", &RequestedVersion::Stable)
            .await
            .unwrap();

        assert_eq!(package.version, "3.5.0+907ff37");
        assert_eq!(package.revision, 202309122053);
        assert_eq!(
            package.download_url,
            "https://packages.edgedb.com/archive/x86_64-unknown-linux-musl/edgedb-cli-3.5.0+907ff37"
        );
    }

    #[tokio::test]
    async fn resolve_range_selects_prerelease() {
        let resolver = resolver_with(stable_index(), false);

        let package = resolver
            .resolve(
                "edgedb-cli",
                &RequestedVersion::Range("1.0.0-rc.2".to_string()),
            )
            .await
            .unwrap();

        assert_eq!(package.version, "1.0.0-rc.2+eea8ba1");
    }

    #[tokio::test]
    async fn resolve_stable_skips_prereleases() {
        let index = RawIndex {
            packages: vec![
                raw("edgedb-cli", "3.5.0+907ff37", "1"),
                raw("edgedb-cli", "4.0.0-rc.1+abc", "2"),
            ],
        };
        let resolver = resolver_with(index, false);

        let package = resolver
            .resolve("edgedb-cli", &RequestedVersion::Stable)
            .await
            .unwrap();

        assert_eq!(package.version, "3.5.0+907ff37");
    }

    #[tokio::test]
    async fn resolve_nightly_uses_nightly_index_and_prereleases() {
        let index = RawIndex {
            packages: vec![
                raw("edgedb-cli", "3.5.0+907ff37", "1"),
                raw("edgedb-cli", "4.0.0-dev.1+abc", "2"),
            ],
        };
        let resolver = resolver_with(index, true);

        let package = resolver
            .resolve("edgedb-cli", &RequestedVersion::Nightly)
            .await
            .unwrap();

        assert_eq!(package.version, "4.0.0-dev.1+abc");
    }

    #[tokio::test]
    async fn resolve_not_found_names_requested_channel() {
        let resolver = resolver_with(stable_index(), false);

        let result = resolver
            .resolve("edgedb-server-9", &RequestedVersion::Stable)
            .await;

        match result {
            Err(ResolveError::NotFound { name, range }) => {
                assert_eq!(name, "edgedb-server-9");
                assert_eq!(range, "stable");
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn resolve_propagates_fetch_error() {
        let mut fetcher = MockIndexFetcher::new();
        fetcher
            .expect_fetch_index()
            .times(1)
            .returning(|_| Err(IndexError::NotFound("missing.json".to_string())));
        let resolver = PackageResolver::new(Arc::new(fetcher), config());

        let result = resolver
            .resolve("edgedb-cli", &RequestedVersion::Stable)
            .await;

        assert!(matches!(
            result,
            Err(ResolveError::Index(IndexError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn resolve_requests_configured_index_key() {
        let mut fetcher = MockIndexFetcher::new();
        fetcher
            .expect_fetch_index()
            .withf(|key| key.to_string() == "aarch64-apple-darwin")
            .times(1)
            .returning(|_| Ok(RawIndex::default()));
        let config = ResolverConfig {
            architecture: Architecture::Aarch64,
            platform: Platform::AppleDarwin,
            ..config()
        };
        let resolver = PackageResolver::new(Arc::new(fetcher), config);

        let result = resolver
            .resolve("edgedb-cli", &RequestedVersion::Stable)
            .await;

        assert!(matches!(result, Err(ResolveError::NotFound { .. })));
    }

    #[tokio::test]
    async fn resolve_many_keeps_request_order_and_independent_results() {
        let mut fetcher = MockIndexFetcher::new();
        fetcher
            .expect_fetch_index()
            .times(3)
            .returning(|_| Ok(stable_index()));
        let resolver = PackageResolver::new(Arc::new(fetcher), config());

        let results = resolver
            .resolve_many(&[
                ("edgedb-cli", "^1"),
                ("edgedb-server-9", "stable"),
                ("edgedb-server-3", ""),
            ])
            .await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().version, "1.0.0+5724c50");
        assert!(matches!(results[1], Err(ResolveError::NotFound { .. })));
        assert_eq!(results[2].as_ref().unwrap().version, "3.4+4fc6d86");
    }
}
