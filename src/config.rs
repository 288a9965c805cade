use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

use crate::catalog::TieBreak;
use crate::error::{ConfigError, ResolveError};
use crate::platform::{Architecture, Platform, detect_host};
use crate::resolver::ResolverConfig;

// =============================================================================
// Package server constants
// =============================================================================

/// Root URL the package indexes and artifacts are published under
pub const DEFAULT_PACKAGE_ROOT: &str = "https://packages.edgedb.com";

/// Package installed when the caller names none
pub const CLI_PACKAGE: &str = "edgedb-cli";

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("setup-edgedb/", env!("CARGO_PKG_VERSION"));

// =============================================================================
// Time-related constants
// =============================================================================

/// Timeout for fetch and download operations in milliseconds (30 seconds)
pub const FETCH_TIMEOUT_MS: u64 = 30_000;

/// Setup configuration, usually loaded from a JSON file and then
/// overridden by command-line flags
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SetupConfig {
    pub package_root: String,
    /// Host architecture name; detected when unset
    pub architecture: Option<String>,
    /// Host OS name or index platform tag; detected when unset
    pub platform: Option<String>,
    /// `musl` or `gnu`, Linux only
    pub libc: Option<String>,
    /// Whether range requests may select prereleases
    pub include_prerelease: bool,
    /// Whether the `stable` channel may select prereleases
    pub stable_prereleases: bool,
    pub tie_break: TieBreak,
    pub cache_dir: Option<PathBuf>,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            package_root: DEFAULT_PACKAGE_ROOT.to_string(),
            architecture: None,
            platform: None,
            libc: None,
            include_prerelease: true,
            stable_prereleases: false,
            tie_break: TieBreak::default(),
            cache_dir: None,
        }
    }
}

impl SetupConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Build the resolver configuration, detecting the host for any
    /// architecture or platform left unset.
    pub fn resolver_config(&self) -> Result<ResolverConfig, ResolveError> {
        let package_root =
            Url::parse(&self.package_root).map_err(|source| ResolveError::InvalidUrl {
                url: self.package_root.clone(),
                source,
            })?;

        let libc = self.libc.as_deref();
        let (architecture, platform) = match (&self.architecture, &self.platform) {
            (Some(arch), Some(os)) => (Architecture::from_host(arch)?, Platform::from_host(os, libc)?),
            (arch, os) => {
                let (host_arch, host_platform) = detect_host(libc)?;
                (
                    arch.as_deref()
                        .map(Architecture::from_host)
                        .transpose()?
                        .unwrap_or(host_arch),
                    os.as_deref()
                        .map(|os| Platform::from_host(os, libc))
                        .transpose()?
                        .unwrap_or(host_platform),
                )
            }
        };

        Ok(ResolverConfig {
            package_root,
            architecture,
            platform,
            include_prerelease: self.include_prerelease,
            stable_prereleases: self.stable_prereleases,
            tie_break: self.tie_break,
        })
    }

    /// Tool cache root, `data_dir()/tool-cache` unless configured
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| data_dir().join("tool-cache"))
    }
}

/// Returns the path to the data directory for setup-edgedb.
/// Uses $XDG_DATA_HOME/setup-edgedb if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/setup-edgedb,
/// or ./setup-edgedb if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("setup-edgedb.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("setup-edgedb")
}
