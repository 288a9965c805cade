//! HTTP implementation of the index fetcher

use std::time::Duration;

use tracing::{debug, warn};
use url::Url;

use crate::config::{FETCH_TIMEOUT_MS, USER_AGENT};
use crate::error::IndexError;
use crate::index::fetcher::IndexFetcher;
use crate::index::types::RawIndex;
use crate::platform::IndexKey;

/// Directory under the package root holding the JSON indexes
const INDEX_DIR: &str = "archive/.jsonindexes";

/// Builds `{root}/archive/.jsonindexes/{key}.json`
pub fn index_url(package_root: &Url, key: &IndexKey) -> String {
    format!(
        "{}/{}/{}.json",
        package_root.as_str().trim_end_matches('/'),
        INDEX_DIR,
        key
    )
}

/// Index fetcher backed by the package server
pub struct HttpIndexFetcher {
    client: reqwest::Client,
    package_root: Url,
}

impl HttpIndexFetcher {
    /// Creates a fetcher for indexes published under `package_root`
    pub fn new(package_root: Url) -> Result<Self, IndexError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_millis(FETCH_TIMEOUT_MS))
            .build()?;

        Ok(Self {
            client,
            package_root,
        })
    }
}

#[async_trait::async_trait]
impl IndexFetcher for HttpIndexFetcher {
    async fn fetch_index(&self, key: &IndexKey) -> Result<RawIndex, IndexError> {
        let url = index_url(&self.package_root, key);
        debug!("Fetching package index {}", url);

        let response = self.client.get(&url).send().await?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(IndexError::NotFound(url));
        }

        if !status.is_success() {
            warn!("Package server returned status {}: {}", status, url);
            return Err(IndexError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        let index: RawIndex = response.json().await.map_err(|e| {
            warn!("Failed to parse package index {}: {}", url, e);
            IndexError::InvalidResponse(e.to_string())
        })?;

        debug!("Fetched {} index records from {}", index.packages.len(), url);

        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::types::RawPackage;
    use crate::platform::{Architecture, Platform};
    use mockito::Server;
    use rstest::rstest;
    use serde_json::json;

    fn musl_key(nightly: bool) -> IndexKey {
        IndexKey {
            architecture: Architecture::X86_64,
            platform: Platform::LinuxMusl,
            nightly,
        }
    }

    #[rstest]
    #[case(
        "https://packages.edgedb.com",
        false,
        "https://packages.edgedb.com/archive/.jsonindexes/x86_64-unknown-linux-musl.json"
    )]
    #[case(
        "https://packages.edgedb.com/",
        true,
        "https://packages.edgedb.com/archive/.jsonindexes/x86_64-unknown-linux-musl.nightly.json"
    )]
    #[case(
        "https://mirror.example.com/edgedb/",
        false,
        "https://mirror.example.com/edgedb/archive/.jsonindexes/x86_64-unknown-linux-musl.json"
    )]
    fn index_url_joins_root_and_key(
        #[case] root: &str,
        #[case] nightly: bool,
        #[case] expected: &str,
    ) {
        let root = Url::parse(root).unwrap();
        assert_eq!(index_url(&root, &musl_key(nightly)), expected);
    }

    #[tokio::test]
    async fn fetch_index_returns_published_records() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock(
                "GET",
                "/archive/.jsonindexes/x86_64-unknown-linux-musl.json",
            )
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "packages": [
                        {
                            "name": "edgedb-cli",
                            "version": "3.5.0+907ff37",
                            "revision": "202309122051",
                            "installref": "/path"
                        }
                    ]
                }"#,
            )
            .create_async()
            .await;

        let fetcher = HttpIndexFetcher::new(Url::parse(&server.url()).unwrap()).unwrap();
        let result = fetcher.fetch_index(&musl_key(false)).await.unwrap();

        mock.assert_async().await;
        assert_eq!(
            result.packages,
            vec![RawPackage {
                name: Some(json!("edgedb-cli")),
                version: Some(json!("3.5.0+907ff37")),
                revision: Some(json!("202309122051")),
                install_ref: Some(json!("/path")),
                architecture: None,
            }]
        );
    }

    #[tokio::test]
    async fn fetch_index_requests_nightly_document() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock(
                "GET",
                "/archive/.jsonindexes/x86_64-unknown-linux-musl.nightly.json",
            )
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"packages": []}"#)
            .create_async()
            .await;

        let fetcher = HttpIndexFetcher::new(Url::parse(&server.url()).unwrap()).unwrap();
        let result = fetcher.fetch_index(&musl_key(true)).await.unwrap();

        mock.assert_async().await;
        assert!(result.packages.is_empty());
    }

    #[tokio::test]
    async fn fetch_index_returns_not_found_for_missing_index() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock(
                "GET",
                "/archive/.jsonindexes/x86_64-unknown-linux-musl.json",
            )
            .with_status(404)
            .create_async()
            .await;

        let fetcher = HttpIndexFetcher::new(Url::parse(&server.url()).unwrap()).unwrap();
        let result = fetcher.fetch_index(&musl_key(false)).await;

        mock.assert_async().await;
        assert!(matches!(result, Err(IndexError::NotFound(url)) if url.ends_with("x86_64-unknown-linux-musl.json")));
    }

    #[tokio::test]
    async fn fetch_index_returns_invalid_response_for_server_error() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock(
                "GET",
                "/archive/.jsonindexes/x86_64-unknown-linux-musl.json",
            )
            .with_status(503)
            .create_async()
            .await;

        let fetcher = HttpIndexFetcher::new(Url::parse(&server.url()).unwrap()).unwrap();
        let result = fetcher.fetch_index(&musl_key(false)).await;

        mock.assert_async().await;
        assert!(matches!(result, Err(IndexError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn fetch_index_returns_invalid_response_for_malformed_body() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock(
                "GET",
                "/archive/.jsonindexes/x86_64-unknown-linux-musl.json",
            )
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"versions": {}}"#)
            .create_async()
            .await;

        let fetcher = HttpIndexFetcher::new(Url::parse(&server.url()).unwrap()).unwrap();
        let result = fetcher.fetch_index(&musl_key(false)).await;

        mock.assert_async().await;
        assert!(matches!(result, Err(IndexError::InvalidResponse(_))));
    }
}
