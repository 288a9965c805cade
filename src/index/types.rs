//! Wire format of the published package index

use serde::Deserialize;
use serde_json::Value;

/// Index document: `{ "packages": [...] }`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawIndex {
    pub packages: Vec<RawPackage>,
}

/// One index record exactly as published.
///
/// Fields are kept as untyped JSON so that a record with unexpected types only
/// fails when it is validated, which happens after filtering by name. Any
/// non-object record reads as an empty one; `null` reads as absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub struct RawPackage {
    pub name: Option<Value>,
    pub version: Option<Value>,
    /// Usually a digit string, occasionally a bare number
    pub revision: Option<Value>,
    pub install_ref: Option<Value>,
    /// Only present in some index variants
    pub architecture: Option<Value>,
}

impl RawPackage {
    /// The record's name, if it is a string
    pub fn name_str(&self) -> Option<&str> {
        self.name.as_ref().and_then(Value::as_str)
    }
}

impl From<Value> for RawPackage {
    fn from(value: Value) -> Self {
        let Value::Object(mut fields) = value else {
            return Self::default();
        };
        let mut take = |key: &str| fields.remove(key).filter(|v| !v.is_null());

        Self {
            name: take("name"),
            version: take("version"),
            revision: take("revision"),
            install_ref: take("installref"),
            architecture: take("architecture"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn raw_index_deserializes_published_shape() {
        let index: RawIndex = serde_json::from_value(json!({
            "packages": [
                {
                    "basename": "edgedb-cli",
                    "name": "edgedb-cli",
                    "version": "3.5.0+907ff37",
                    "revision": "202309122051",
                    "architecture": "x86_64",
                    "installref": "/archive/x86_64-unknown-linux-musl/edgedb-cli-3.5.0+907ff37"
                },
                {
                    "name": "edgedb-server-3",
                    "version": "3.3+8d42667",
                    "revision": 202309062039u64,
                    "installref": null
                }
            ]
        }))
        .unwrap();

        assert_eq!(index.packages.len(), 2);
        assert_eq!(
            index.packages[0],
            RawPackage {
                name: Some(json!("edgedb-cli")),
                version: Some(json!("3.5.0+907ff37")),
                revision: Some(json!("202309122051")),
                install_ref: Some(json!(
                    "/archive/x86_64-unknown-linux-musl/edgedb-cli-3.5.0+907ff37"
                )),
                architecture: Some(json!("x86_64")),
            }
        );
        assert_eq!(index.packages[1].revision, Some(json!(202309062039u64)));
        assert_eq!(index.packages[1].install_ref, None);
    }

    #[test]
    fn raw_index_tolerates_records_with_unexpected_types() {
        let index: RawIndex = serde_json::from_value(json!({
            "packages": [
                {
                    "name": "edgedb-cli",
                    "version": "3.5.0+907ff37",
                    "revision": "202309122051",
                    "installref": "/cli"
                },
                {
                    "name": "edgedb-server-3",
                    "version": 3.3,
                    "revision": 202309062039.0,
                    "installref": ["/server"]
                },
                42
            ]
        }))
        .unwrap();

        assert_eq!(index.packages.len(), 3);
        assert_eq!(index.packages[0].name_str(), Some("edgedb-cli"));
        assert_eq!(index.packages[1].version, Some(json!(3.3)));
        assert_eq!(index.packages[2], RawPackage::default());
    }

    #[test]
    fn raw_index_requires_packages_array() {
        let result = serde_json::from_value::<RawIndex>(json!({ "entries": [] }));
        assert!(result.is_err());
    }
}
