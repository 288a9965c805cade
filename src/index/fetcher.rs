//! Fetcher trait for retrieving a package index document

#[cfg(test)]
use mockall::automock;

use crate::error::IndexError;
use crate::index::types::RawIndex;
use crate::platform::IndexKey;

/// Trait for fetching the raw package index for an architecture/platform/channel
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait IndexFetcher: Send + Sync {
    /// Fetches the complete index document named by `key`
    ///
    /// # Returns
    /// * `Ok(RawIndex)` - Every published record, unfiltered and undeduplicated
    /// * `Err(IndexError)` - If the fetch fails or the body is not an index
    async fn fetch_index(&self, key: &IndexKey) -> Result<RawIndex, IndexError>;
}
