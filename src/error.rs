use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Invalid version: '{0}'")]
    InvalidVersion(String),

    #[error("Invalid version range '{range}': {reason}")]
    InvalidRange { range: String, reason: String },
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Package index not found: {0}")]
    NotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Index entry #{position} is missing required field '{field}'")]
    MissingField { position: usize, field: &'static str },

    #[error("Index entry #{position} field '{field}' is not a string: {found}")]
    InvalidField {
        position: usize,
        field: &'static str,
        found: String,
    },

    #[error("Index entry #{position} has non-numeric revision '{revision}'")]
    InvalidRevision { position: usize, revision: String },

    #[error("Index entry #{position} has unknown architecture '{architecture}'")]
    UnknownArchitecture {
        position: usize,
        architecture: String,
    },
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("no published version of '{name}' matches requested version '{range}'")]
    NotFound { name: String, range: String },

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Unsupported architecture: {0}")]
    UnsupportedArchitecture(String),

    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("Download failed: {0}")]
    Download(#[from] reqwest::Error),

    #[error("Download of {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Json(#[from] serde_json::Error),
}
