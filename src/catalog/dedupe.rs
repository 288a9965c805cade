//! Collapses re-published builds down to the newest revision

use std::cmp::Ordering;

use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::Deserialize;
use tracing::debug;

use crate::catalog::types::{Catalog, Package};

/// Which build survives when two share a name, version and revision
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TieBreak {
    /// Keep the build listed first in the index
    #[default]
    KeepFirst,
    /// Keep the build listed last in the index
    KeepLast,
}

/// Deduplicate with the default [`TieBreak::KeepFirst`] policy
pub fn dedupe(catalog: Catalog) -> Catalog {
    dedupe_with(catalog, TieBreak::default())
}

/// Keep one package per `name-version` key, the one with the highest revision.
///
/// Keys are plain string concatenations, so versions that are semantically equal
/// but spelled differently (`3.3` and `3.3.0`) stay separate. Output keeps the
/// order in which each key first appeared.
pub fn dedupe_with(catalog: Catalog, tie_break: TieBreak) -> Catalog {
    let total = catalog.len();
    let mut latest: IndexMap<String, Package> = IndexMap::with_capacity(total);

    for package in catalog {
        let key = format!("{}-{}", package.name, package.version);
        match latest.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(package);
            }
            Entry::Occupied(mut slot) => {
                let replace = match package.revision.cmp(&slot.get().revision) {
                    Ordering::Greater => true,
                    Ordering::Less => false,
                    Ordering::Equal => tie_break == TieBreak::KeepLast,
                };
                if replace {
                    slot.insert(package);
                }
            }
        }
    }

    debug!(
        "Deduplicated {} packages down to {} revisions",
        total,
        latest.len()
    );

    latest.into_values().collect()
}
