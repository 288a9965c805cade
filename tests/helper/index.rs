//! Package index test utilities

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use url::Url;

use setup_edgedb::catalog::TieBreak;
use setup_edgedb::error::IndexError;
use setup_edgedb::index::{IndexFetcher, RawIndex, RawPackage};
use setup_edgedb::platform::{Architecture, IndexKey, Platform};
use setup_edgedb::resolver::{PackageResolver, ResolverConfig};

/// Serves canned index documents keyed by `{arch}-{platform}[.nightly]`
#[derive(Default)]
pub struct MockIndexFetcher {
    indexes: HashMap<String, RawIndex>,
}

impl MockIndexFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_index(mut self, key: &str, packages: Vec<RawPackage>) -> Self {
        self.indexes
            .insert(key.to_string(), RawIndex { packages });
        self
    }
}

#[async_trait]
impl IndexFetcher for MockIndexFetcher {
    async fn fetch_index(&self, key: &IndexKey) -> Result<RawIndex, IndexError> {
        let key = key.to_string();
        match self.indexes.get(&key) {
            Some(index) => Ok(index.clone()),
            None => Err(IndexError::NotFound(format!("{key}.json"))),
        }
    }
}

/// An index record laid out the way the package server publishes them
pub fn record(name: &str, version: &str, revision: &str) -> RawPackage {
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

/// Snapshot of the published x86_64 musl index
pub fn published_index() -> Vec<RawPackage> {
    vec![
        record("edgedb-cli", "1.0.0+5724c50", "202202100030"),
        record("edgedb-cli", "1.0.0-rc.2+eea8ba1", "202111111827"),
        record("edgedb-cli", "1.0.0-rc.3+b13dfe9", "202111301914"),
        record("edgedb-cli", "1.0.0-rc.6+5626317", "202201191751"),
        record("edgedb-cli", "1.1.0+96c3d69", "202202222341"),
        record("edgedb-cli", "1.1.1+5bb8bad", "202203171920"),
        record("edgedb-cli", "1.1.2+58eb29e", "202204240642"),
        record("edgedb-cli", "1.2.0+cc78a3d", "202207132102"),
        record("edgedb-cli", "1.2.1+7ae7e10", "202207142033"),
        record("edgedb-cli", "1.2.2+2874715", "202207191809"),
        record("edgedb-cli", "1.2.3+d637394", "202207251735"),
        record("edgedb-cli", "2.0.0+62ada3f", "202207272022"),
        record("edgedb-cli", "2.3.1+ef99779", "202302211915"),
        record("edgedb-cli", "3.0.0+8b024db", "202305171711"),
        record("edgedb-cli", "3.4.0+160d07d", "202307070213"),
        record("edgedb-cli", "3.5.0+907ff37", "202309122051"),
        record("edgedb-server-3", "3.3+8d42667", "202309062039"),
        record("edgedb-server-3", "3.4+4fc6d86", "202309271921"),
    ]
}

pub fn test_config() -> ResolverConfig {
    ResolverConfig {
        package_root: Url::parse("https://packages.edgedb.com").unwrap(),
        architecture: Architecture::X86_64,
        platform: Platform::LinuxMusl,
        include_prerelease: true,
        stable_prereleases: false,
        tie_break: TieBreak::KeepFirst,
    }
}

/// Create a resolver for the x86_64 musl host backed by `fetcher`
pub fn create_test_resolver(fetcher: MockIndexFetcher) -> PackageResolver {
    PackageResolver::new(Arc::new(fetcher), test_config())
}
