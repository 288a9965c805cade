mod index;

#[allow(unused_imports)]
pub use index::*;
