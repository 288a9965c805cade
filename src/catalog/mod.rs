pub mod dedupe;
pub mod normalize;
pub mod select;
pub mod types;

pub use dedupe::{TieBreak, dedupe, dedupe_with};
pub use normalize::{IndexEntry, normalize, validate};
pub use select::select_best;
pub use types::{Catalog, Package};
