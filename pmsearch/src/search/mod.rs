//! Resolve input identifiers to reactions and pathways.

mod engine;
mod result;
mod settings;

pub use engine::SearchContext;
pub use result::{EntitySets, PathwayHits, SearchRecord, SearchResult};
pub use settings::SearchSettings;
