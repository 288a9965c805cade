//! Package index retrieval
//!
//! - [`types`]: raw wire records as published
//! - [`fetcher`]: trait for retrieving an index document
//! - [`http`]: reqwest-backed fetcher for the package server

pub mod fetcher;
pub mod http;
pub mod types;

pub use fetcher::IndexFetcher;
pub use http::{HttpIndexFetcher, index_url};
pub use types::{RawIndex, RawPackage};
