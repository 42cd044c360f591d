//! The [`PathwayError`] kind which makes it easy for downstream users of the error type to match on the exact error.

use context_error::ErrorKind;
use serde::{Deserialize, Serialize};

/// The kind of an error or warning generated anywhere in a matching run.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum PathwayError {
    /// An input row that is empty after trimming, the row is skipped
    EmptyRow,
    /// An input row that does not follow the syntax of its input type, the row is skipped
    InvalidRow,
    /// A proteoform without accession was handed to the matcher
    #[default]
    InvalidInput,
    /// A proteoform in one of the textual notations could not be parsed
    InvalidProteoform,
    /// The reference graph snapshot could not be found or opened
    SnapshotMissing,
    /// The reference graph snapshot is not internally consistent
    SnapshotCorrupt,
    /// A per chromosome map could not be read
    ChromosomeCorrupt,
    /// The population size needed for the enrichment analysis is zero
    PopulationUnavailable,
    /// A probability or ratio ended up outside of its domain
    NumericDomain,
    /// A search needed a collaborator (chromosome maps, peptide mapper) that was not given
    MissingCollaborator,
    /// Reading input or writing output failed
    Io,
    /// The settings for a run could not be read
    InvalidSettings,
}

impl PathwayError {
    /// Check if this kind only skips a row instead of stopping the run
    pub const fn is_warning(self) -> bool {
        matches!(self, Self::EmptyRow | Self::InvalidRow)
    }
}

impl ErrorKind for PathwayError {
    type Settings = ();
    fn descriptor(&self) -> &'static str {
        if self.is_warning() { "warning" } else { "error" }
    }
    fn ignored(&self, _settings: Self::Settings) -> bool {
        false
    }
    fn is_error(&self, _settings: Self::Settings) -> bool {
        !self.is_warning()
    }
}
