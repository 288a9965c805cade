//! Converts raw index records into catalog packages

use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::catalog::types::{Catalog, Package};
use crate::error::{IndexError, ResolveError};
use crate::index::types::RawPackage;
use crate::platform::Architecture;

/// An index record with every required field present and typed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub name: String,
    pub version: String,
    pub revision: u64,
    pub architecture: Option<Architecture>,
    pub install_ref: String,
}

/// Validate a raw record; `position` is its index in the document, for error messages
pub fn validate(raw: RawPackage, position: usize) -> Result<IndexEntry, IndexError> {
    let name = required_str(raw.name, position, "name")?;
    let version = required_str(raw.version, position, "version")?;
    let install_ref = required_str(raw.install_ref, position, "installref")?;

    // Revisions are timestamps of varying length; compare them as integers only
    let revision = match raw.revision {
        Some(Value::Number(number)) => {
            number.as_u64().ok_or_else(|| IndexError::InvalidRevision {
                position,
                revision: number.to_string(),
            })?
        }
        Some(Value::String(text)) => {
            text.parse::<u64>()
                .map_err(|_| IndexError::InvalidRevision {
                    position,
                    revision: text,
                })?
        }
        Some(other) => {
            return Err(IndexError::InvalidRevision {
                position,
                revision: other.to_string(),
            });
        }
        None => {
            return Err(IndexError::MissingField {
                position,
                field: "revision",
            });
        }
    };

    let architecture = match raw.architecture {
        None => None,
        Some(Value::String(tag)) => Some(tag.parse::<Architecture>().map_err(|_| {
            IndexError::UnknownArchitecture {
                position,
                architecture: tag,
            }
        })?),
        Some(other) => {
            return Err(IndexError::UnknownArchitecture {
                position,
                architecture: other.to_string(),
            });
        }
    };

    Ok(IndexEntry {
        name,
        version,
        revision,
        architecture,
        install_ref,
    })
}

fn required_str(
    value: Option<Value>,
    position: usize,
    field: &'static str,
) -> Result<String, IndexError> {
    match value {
        Some(Value::String(text)) if !text.is_empty() => Ok(text),
        None | Some(Value::String(_)) => Err(IndexError::MissingField { position, field }),
        Some(other) => Err(IndexError::InvalidField {
            position,
            field,
            found: other.to_string(),
        }),
    }
}

/// Normalize raw index records into a catalog.
///
/// Records whose name differs from `name_filter` are dropped before validation.
/// `download_url` is `install_ref` joined against `package_root`; absolute
/// references pass through unchanged. Records without an architecture inherit
/// `index_architecture`, the architecture the index was published for.
pub fn normalize(
    entries: impl IntoIterator<Item = RawPackage>,
    package_root: &Url,
    index_architecture: Architecture,
    name_filter: Option<&str>,
) -> Result<Catalog, ResolveError> {
    let mut packages = Vec::new();

    for (position, raw) in entries.into_iter().enumerate() {
        if let Some(name) = name_filter
            && raw.name_str() != Some(name)
        {
            continue;
        }

        let entry = validate(raw, position)?;
        let download_url = package_root
            .join(&entry.install_ref)
            .map_err(|source| ResolveError::InvalidUrl {
                url: entry.install_ref.clone(),
                source,
            })?;

        packages.push(Package {
            name: entry.name,
            version: entry.version,
            revision: entry.revision,
            architecture: entry.architecture.unwrap_or(index_architecture),
            install_ref: entry.install_ref,
            download_url: download_url.into(),
        });
    }

    debug!(
        "Normalized {} packages (filter: {})",
        packages.len(),
        name_filter.unwrap_or("none")
    );

    Ok(Catalog::new(packages))
}
