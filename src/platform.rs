//! Architecture and platform tags used to locate a package index

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ResolveError;

/// CPU architecture of a published build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Architecture {
    #[serde(rename = "x86_64")]
    X86_64,
    #[serde(rename = "aarch64")]
    Aarch64,
}

impl Architecture {
    /// Returns the tag used in index file names
    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::X86_64 => "x86_64",
            Architecture::Aarch64 => "aarch64",
        }
    }

    /// Map a host CPU name (Rust, Node or Debian spelling) onto an index architecture
    pub fn from_host(arch: &str) -> Result<Self, ResolveError> {
        match arch {
            "x86_64" | "x64" | "amd64" => Ok(Architecture::X86_64),
            "aarch64" | "arm64" => Ok(Architecture::Aarch64),
            other => Err(ResolveError::UnsupportedArchitecture(other.to_string())),
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Architecture {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x86_64" => Ok(Architecture::X86_64),
            "aarch64" => Ok(Architecture::Aarch64),
            _ => Err(()),
        }
    }
}

/// Operating system and libc combination of a published build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "unknown-linux-musl")]
    LinuxMusl,
    #[serde(rename = "unknown-linux-gnu")]
    LinuxGnu,
    #[serde(rename = "apple-darwin")]
    AppleDarwin,
}

impl Platform {
    /// Returns the tag used in index file names
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::LinuxMusl => "unknown-linux-musl",
            Platform::LinuxGnu => "unknown-linux-gnu",
            Platform::AppleDarwin => "apple-darwin",
        }
    }

    /// Map a host OS name and optional libc onto an index platform.
    ///
    /// Linux defaults to musl builds since they run on any distribution.
    /// Literal index tags (`unknown-linux-gnu`) are accepted as well.
    pub fn from_host(os: &str, libc: Option<&str>) -> Result<Self, ResolveError> {
        if let Ok(platform) = os.parse::<Platform>() {
            return Ok(platform);
        }

        match (os, libc) {
            ("linux", None | Some("musl")) => Ok(Platform::LinuxMusl),
            ("linux", Some("gnu")) => Ok(Platform::LinuxGnu),
            ("linux", Some(other)) => Err(ResolveError::UnsupportedPlatform(format!(
                "linux with {other} libc"
            ))),
            ("macos" | "darwin", _) => Ok(Platform::AppleDarwin),
            (other, _) => Err(ResolveError::UnsupportedPlatform(other.to_string())),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unknown-linux-musl" => Ok(Platform::LinuxMusl),
            "unknown-linux-gnu" => Ok(Platform::LinuxGnu),
            "apple-darwin" => Ok(Platform::AppleDarwin),
            _ => Err(()),
        }
    }
}

/// Identifies one index document: `{arch}-{platform}[.nightly]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexKey {
    pub architecture: Architecture,
    pub platform: Platform,
    pub nightly: bool,
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.architecture, self.platform)?;
        if self.nightly {
            f.write_str(".nightly")?;
        }
        Ok(())
    }
}

/// Derive the index architecture and platform of the running host.
///
/// Only the command-line layer calls this; resolution itself always receives
/// both values explicitly.
pub fn detect_host(libc: Option<&str>) -> Result<(Architecture, Platform), ResolveError> {
    let architecture = Architecture::from_host(std::env::consts::ARCH)?;
    let platform = Platform::from_host(std::env::consts::OS, libc)?;
    Ok((architecture, platform))
}
