//! Semantic version range matching
//!
//! Supports the node-style range grammar used by the package index:
//! - `1.2.3`, `=1.2.3` - exact match (build metadata ignored)
//! - `^1.2.3` - compatible with version (>=1.2.3 <2.0.0)
//! - `~1.2.3`, `~>1.2.3` - approximately equivalent (>=1.2.3 <1.3.0)
//! - `>=1.2.3`, `>1.2.3`, `<=1.2.3`, `<1.2.3` - comparison operators
//! - `1.2.x`, `1.x`, `1.2`, `1`, `*` - wildcards and partial versions
//! - `latest`, `any` - aliases for `*`
//! - `1.0.0 - 2.0.0` - hyphen ranges
//! - `>=1.0.0 <2.0.0` - space-separated AND
//! - `^1.0.0 || ^2.0.0` - OR
//!
//! Every range term is lowered into plain comparators before matching, so
//! wildcards, partial versions and shorthands all share one matching path.

use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use semver::{Prerelease, Version};

use crate::error::ParseError;
use crate::version::semver::precedence;

/// `-0`, the lowest possible prerelease of a version
static PRERELEASE_FLOOR: LazyLock<Prerelease> = LazyLock::new(|| Prerelease::new("0").unwrap());

const BARE_OPERATORS: &[&str] = &[">=", "<=", ">", "<", "=", "^", "~>", "~"];

/// A parsed version range expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSpec {
    raw: String,
    /// OR of comparator sets; each set is an AND of range terms
    sets: Vec<Vec<VersionRange>>,
}

impl VersionSpec {
    /// Parse a version range expression
    pub fn parse(spec: &str) -> Result<Self, ParseError> {
        let sets = spec
            .split("||")
            .map(Self::parse_and_or_single)
            .collect::<Result<Vec<_>, String>>()
            .map_err(|reason| ParseError::InvalidRange {
                range: spec.to_string(),
                reason,
            })?;

        Ok(Self {
            raw: spec.to_string(),
            sets,
        })
    }

    /// Parse one comparator set: a hyphen range, or space-separated terms
    fn parse_and_or_single(set: &str) -> Result<Vec<VersionRange>, String> {
        let set = set.trim();
        if set.is_empty() {
            // An empty set is `*`
            return Ok(vec![VersionRange::XRange(Partial::ANY)]);
        }

        if let Some((from, to)) = set.split_once(" - ") {
            return Ok(vec![VersionRange::Hyphen {
                from: Partial::parse(from.trim())?,
                to: Partial::parse(to.trim())?,
            }]);
        }

        Self::split_and_parts(set)
            .iter()
            .map(|part| VersionRange::parse(part))
            .collect()
    }

    /// Split a set into AND parts, re-attaching operators written apart from
    /// their version (`>= 1.2.3`)
    fn split_and_parts(set: &str) -> Vec<String> {
        let mut parts = Vec::new();
        let mut pending_operator: Option<&str> = None;

        for token in set.split_whitespace() {
            if BARE_OPERATORS.contains(&token) {
                if let Some(previous) = pending_operator.replace(token) {
                    parts.push(previous.to_string());
                }
                continue;
            }

            match pending_operator.take() {
                Some(operator) => parts.push(format!("{operator}{token}")),
                None => parts.push(token.to_string()),
            }
        }

        if let Some(operator) = pending_operator {
            parts.push(operator.to_string());
        }

        parts
    }

    /// Check if a version satisfies this range
    ///
    /// With `include_prerelease` false, a prerelease version only matches a set
    /// that explicitly names a prerelease of the same `major.minor.patch`.
    pub fn satisfies(&self, version: &Version, include_prerelease: bool) -> bool {
        self.sets.iter().any(|set| {
            let comparators: Vec<Comparator> = set
                .iter()
                .flat_map(|range| range.lower(include_prerelease))
                .collect();
            set_satisfies(&comparators, version, include_prerelease)
        })
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn set_satisfies(comparators: &[Comparator], version: &Version, include_prerelease: bool) -> bool {
    if !comparators.iter().all(|c| c.matches(version)) {
        return false;
    }

    if version.pre.is_empty() || include_prerelease {
        return true;
    }

    comparators.iter().any(|c| {
        !c.version.pre.is_empty()
            && c.version.major == version.major
            && c.version.minor == version.minor
            && c.version.patch == version.patch
    })
}

/// A version with optional (wildcard) components, as written inside a range
#[derive(Debug, Clone, PartialEq, Eq)]
struct Partial {
    major: Option<u64>,
    minor: Option<u64>,
    patch: Option<u64>,
    pre: Prerelease,
}

impl Partial {
    const ANY: Self = Self {
        major: None,
        minor: None,
        patch: None,
        pre: Prerelease::EMPTY,
    };

    fn parse(input: &str) -> Result<Self, String> {
        let input = input.strip_prefix(['v', 'V']).unwrap_or(input);
        // Build metadata never takes part in range matching
        let input = input.split_once('+').map_or(input, |(version, _)| version);
        let (core, pre) = match input.split_once('-') {
            Some((core, pre)) => (core, Some(pre)),
            None => (input, None),
        };

        if core.is_empty() {
            return Err("missing version".to_string());
        }

        let parts: Vec<&str> = core.split('.').collect();
        if parts.len() > 3 {
            return Err(format!("'{input}' has more than three components"));
        }

        let mut components = [None; 3];
        for (slot, part) in components.iter_mut().zip(&parts) {
            if matches!(*part, "x" | "X" | "*") {
                break;
            }
            let value = part
                .parse::<u64>()
                .map_err(|_| format!("invalid version component '{part}'"))?;
            *slot = Some(value);
        }
        let [major, minor, patch] = components;

        let pre = match pre {
            Some("") => return Err(format!("'{input}' has an empty prerelease")),
            Some(pre) if patch.is_none() => {
                return Err(format!(
                    "prerelease '{pre}' requires a full major.minor.patch version"
                ));
            }
            Some(pre) => {
                Prerelease::new(pre).map_err(|e| format!("invalid prerelease '{pre}': {e}"))?
            }
            None => Prerelease::EMPTY,
        };

        Ok(Self {
            major,
            minor,
            patch,
            pre,
        })
    }
}

/// Represents a single parsed range term
#[derive(Debug, Clone, PartialEq, Eq)]
enum VersionRange {
    /// Exact or partial version: `1.2.3`, `1.2`, `1.x`, `*`
    XRange(Partial),
    /// Caret range: ^1.2.3 means >=1.2.3 <2.0.0 (or special cases for 0.x)
    Caret(Partial),
    /// Tilde range: ~1.2.3 means >=1.2.3 <1.3.0
    Tilde(Partial),
    Gt(Partial),
    Gte(Partial),
    Lt(Partial),
    Lte(Partial),
    /// Hyphen range: 1.0.0 - 2.0.0 means >=1.0.0 <=2.0.0
    Hyphen { from: Partial, to: Partial },
}

impl VersionRange {
    fn parse(spec: &str) -> Result<Self, String> {
        let spec = spec.trim();
        if matches!(spec, "latest" | "any") {
            return Ok(VersionRange::XRange(Partial::ANY));
        }

        let (make, rest): (fn(Partial) -> Self, &str) = if let Some(rest) = spec.strip_prefix(">=")
        {
            (VersionRange::Gte, rest)
        } else if let Some(rest) = spec.strip_prefix("<=") {
            (VersionRange::Lte, rest)
        } else if let Some(rest) = spec.strip_prefix('>') {
            (VersionRange::Gt, rest)
        } else if let Some(rest) = spec.strip_prefix('<') {
            (VersionRange::Lt, rest)
        } else if let Some(rest) = spec.strip_prefix('^') {
            (VersionRange::Caret, rest)
        } else if let Some(rest) = spec.strip_prefix("~>") {
            (VersionRange::Tilde, rest)
        } else if let Some(rest) = spec.strip_prefix('~') {
            (VersionRange::Tilde, rest)
        } else if let Some(rest) = spec.strip_prefix('=') {
            (VersionRange::XRange, rest)
        } else {
            (VersionRange::XRange, spec)
        };

        let rest = rest.trim();
        if rest.is_empty() {
            return Err(format!("operator '{spec}' is missing a version"));
        }

        Partial::parse(rest).map(make)
    }

    /// Lower this term into plain comparators
    ///
    /// An empty list matches every version. Partial lower bounds get a `-0`
    /// prerelease floor when prereleases are included; exclusive upper bounds
    /// always do, so `^1` never admits `2.0.0-rc.1`.
    fn lower(&self, include_prerelease: bool) -> Vec<Comparator> {
        let floor = if include_prerelease {
            PRERELEASE_FLOOR.clone()
        } else {
            Prerelease::EMPTY
        };
        let any = || {
            if include_prerelease {
                vec![Comparator::new(Op::Gte, 0, 0, 0, PRERELEASE_FLOOR.clone())]
            } else {
                Vec::new()
            }
        };
        let nothing = || vec![Comparator::new(Op::Lt, 0, 0, 0, PRERELEASE_FLOOR.clone())];
        let upper = |major, minor, patch| Comparator::new(Op::Lt, major, minor, patch, PRERELEASE_FLOOR.clone());

        match self {
            VersionRange::XRange(p) => match (p.major, p.minor, p.patch) {
                (None, _, _) => any(),
                (Some(major), None, _) => vec![
                    Comparator::new(Op::Gte, major, 0, 0, floor),
                    upper(major.saturating_add(1), 0, 0),
                ],
                (Some(major), Some(minor), None) => vec![
                    Comparator::new(Op::Gte, major, minor, 0, floor),
                    upper(major, minor.saturating_add(1), 0),
                ],
                (Some(major), Some(minor), Some(patch)) => {
                    vec![Comparator::new(Op::Eq, major, minor, patch, p.pre.clone())]
                }
            },
            VersionRange::Caret(p) => match (p.major, p.minor, p.patch) {
                (None, _, _) => any(),
                (Some(major), None, _) => vec![
                    Comparator::new(Op::Gte, major, 0, 0, floor),
                    upper(major.saturating_add(1), 0, 0),
                ],
                (Some(0), Some(minor), None) => vec![
                    Comparator::new(Op::Gte, 0, minor, 0, floor),
                    upper(0, minor.saturating_add(1), 0),
                ],
                (Some(major), Some(minor), None) => vec![
                    Comparator::new(Op::Gte, major, minor, 0, floor),
                    upper(major.saturating_add(1), 0, 0),
                ],
                (Some(major), Some(minor), Some(patch)) => {
                    let pre = if p.pre.is_empty() { floor } else { p.pre.clone() };
                    // ^1.2.3 -> <2.0.0, ^0.2.3 -> <0.3.0, ^0.0.3 -> <0.0.4
                    let bound = match (major, minor) {
                        (0, 0) => upper(0, 0, patch.saturating_add(1)),
                        (0, _) => upper(0, minor.saturating_add(1), 0),
                        _ => upper(major.saturating_add(1), 0, 0),
                    };
                    vec![Comparator::new(Op::Gte, major, minor, patch, pre), bound]
                }
            },
            VersionRange::Tilde(p) => match (p.major, p.minor, p.patch) {
                (None, _, _) => any(),
                (Some(major), None, _) => vec![
                    Comparator::new(Op::Gte, major, 0, 0, floor),
                    upper(major.saturating_add(1), 0, 0),
                ],
                (Some(major), Some(minor), None) => vec![
                    Comparator::new(Op::Gte, major, minor, 0, floor),
                    upper(major, minor.saturating_add(1), 0),
                ],
                (Some(major), Some(minor), Some(patch)) => vec![
                    Comparator::new(Op::Gte, major, minor, patch, p.pre.clone()),
                    upper(major, minor.saturating_add(1), 0),
                ],
            },
            VersionRange::Gt(p) => match (p.major, p.minor, p.patch) {
                (None, _, _) => nothing(),
                (Some(major), None, _) => {
                    vec![Comparator::new(Op::Gte, major.saturating_add(1), 0, 0, floor)]
                }
                (Some(major), Some(minor), None) => {
                    vec![Comparator::new(Op::Gte, major, minor.saturating_add(1), 0, floor)]
                }
                (Some(major), Some(minor), Some(patch)) => {
                    vec![Comparator::new(Op::Gt, major, minor, patch, p.pre.clone())]
                }
            },
            VersionRange::Gte(p) => match (p.major, p.minor, p.patch) {
                (None, _, _) => any(),
                (Some(major), minor, None) => {
                    vec![Comparator::new(Op::Gte, major, minor.unwrap_or(0), 0, floor)]
                }
                (Some(major), minor, Some(patch)) => vec![Comparator::new(
                    Op::Gte,
                    major,
                    minor.unwrap_or(0),
                    patch,
                    p.pre.clone(),
                )],
            },
            VersionRange::Lt(p) => match (p.major, p.minor, p.patch) {
                (None, _, _) => nothing(),
                (Some(major), minor, None) => vec![upper(major, minor.unwrap_or(0), 0)],
                (Some(major), minor, Some(patch)) => vec![Comparator::new(
                    Op::Lt,
                    major,
                    minor.unwrap_or(0),
                    patch,
                    p.pre.clone(),
                )],
            },
            VersionRange::Lte(p) => match (p.major, p.minor, p.patch) {
                (None, _, _) => any(),
                (Some(major), None, _) => vec![upper(major.saturating_add(1), 0, 0)],
                (Some(major), Some(minor), None) => {
                    vec![upper(major, minor.saturating_add(1), 0)]
                }
                (Some(major), Some(minor), Some(patch)) => {
                    vec![Comparator::new(Op::Lte, major, minor, patch, p.pre.clone())]
                }
            },
            VersionRange::Hyphen { from, to } => {
                let mut comparators = match (from.major, from.minor, from.patch) {
                    (None, _, _) => Vec::new(),
                    (Some(major), minor, None) => {
                        vec![Comparator::new(Op::Gte, major, minor.unwrap_or(0), 0, floor)]
                    }
                    (Some(major), minor, Some(patch)) => vec![Comparator::new(
                        Op::Gte,
                        major,
                        minor.unwrap_or(0),
                        patch,
                        from.pre.clone(),
                    )],
                };
                match (to.major, to.minor, to.patch) {
                    (None, _, _) => {}
                    (Some(major), None, _) => comparators.push(upper(major.saturating_add(1), 0, 0)),
                    (Some(major), Some(minor), None) => {
                        comparators.push(upper(major, minor.saturating_add(1), 0))
                    }
                    (Some(major), Some(minor), Some(patch)) => comparators.push(Comparator::new(
                        Op::Lte,
                        major,
                        minor,
                        patch,
                        to.pre.clone(),
                    )),
                }
                if comparators.is_empty() { any() } else { comparators }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Comparator {
    op: Op,
    version: Version,
}

impl Comparator {
    fn new(op: Op, major: u64, minor: u64, patch: u64, pre: Prerelease) -> Self {
        let mut version = Version::new(major, minor, patch);
        version.pre = pre;
        Self { op, version }
    }

    fn matches(&self, version: &Version) -> bool {
        let ordering = precedence(version, &self.version);
        match self.op {
            Op::Eq => ordering == Ordering::Equal,
            Op::Gt => ordering == Ordering::Greater,
            Op::Gte => ordering != Ordering::Less,
            Op::Lt => ordering == Ordering::Less,
            Op::Lte => ordering != Ordering::Greater,
        }
    }
}
