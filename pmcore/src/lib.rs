#![doc = include_str!("../README.md")]

mod error;
pub mod format;
pub mod matching;
mod proteoform;

pub use error::PathwayError;
pub use proteoform::{Proteoform, Ptm, strip_isoform};

/// A subset of the types and traits that are envisioned to be used the most, importing this is a good starting point for working with the crate
pub mod prelude {
    pub use crate::PathwayError;
    pub use crate::format::ProteoformFormat;
    pub use crate::matching::{MatchType, coordinate_matches};
    pub use crate::proteoform::{Proteoform, Ptm};
}
