#![doc = include_str!("../README.md")]

pub mod graph;
mod helper_functions;
pub mod input;
pub mod ora;
pub mod peptide;
pub mod report;
pub mod search;

pub use graph::{
    ChromosomeCache, ChromosomeData, ChromosomeSource, DirectoryChromosomes, ReferenceGraph,
    Snapshot, StaticChromosomes,
};

/// A subset of the types and traits that are envisioned to be used the most, importing this is a good starting point for working with the crate
pub mod prelude {
    pub use crate::graph::{ChromosomeCache, DirectoryChromosomes, ReferenceGraph, Snapshot};
    pub use crate::input::InputType;
    pub use crate::ora::{PathwayStatistics, analyse};
    pub use crate::peptide::{FastaPeptideMapper, PeptideMapper};
    pub use crate::search::{SearchContext, SearchResult, SearchSettings};
}
