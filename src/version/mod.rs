//! Version comparison layer
//!
//! Parses published version strings, orders them, and matches them against
//! range expressions.
//!
//! # Modules
//!
//! - [`semver`]: patch normalization, precedence and the build-aware total order
//! - [`range`]: range expression parsing and satisfaction

pub mod range;
pub mod semver;

pub use self::range::VersionSpec;
pub use self::semver::{compare_versions, normalize_version, precedence};
