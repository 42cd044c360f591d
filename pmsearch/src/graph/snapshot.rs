//! The serialised form of the reference graph.

use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufReader, BufWriter, Read},
    path::Path,
};

use context_error::{BoxedError, Context, CreateError};
use pmcore::PathwayError;
use serde::{Deserialize, Serialize};

use crate::helper_functions::{check_extension, open_file};

/// A reaction as stored in a snapshot
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ReactionRecord {
    /// The stable identifier
    pub id: String,
    /// The display name
    pub name: String,
}

/// A pathway as stored in a snapshot
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct PathwayRecord {
    /// The stable identifier
    pub id: String,
    /// The display name
    pub name: String,
    /// The number of entities (proteins or proteoforms) that participate in this pathway
    pub entities_total: usize,
    /// The number of reactions in this pathway
    pub reactions_total: usize,
    /// The stable identifiers of the top level pathways this pathway is a part of
    #[serde(default)]
    pub top_level_pathways: Vec<String>,
}

/// A reference proteoform together with the reactions it participates in
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ProteoformRecord {
    /// The proteoform in the `SIMPLE` notation
    pub proteoform: String,
    /// The stable identifiers of the reactions
    pub reactions: Vec<String>,
}

/// A snapshot of the reference graph: all relations keyed by the textual identifiers. Use
/// [`crate::ReferenceGraph::from_snapshot`] to validate it and build the indexed graph.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(default)]
pub struct Snapshot {
    /// All reactions
    pub reactions: Vec<ReactionRecord>,
    /// All pathways
    pub pathways: Vec<PathwayRecord>,
    /// Reaction stable id to the pathways it is contained in
    pub reaction_pathways: BTreeMap<String, Vec<String>>,
    /// Gene name to protein accessions
    pub genes: BTreeMap<String, Vec<String>>,
    /// Ensembl identifier to protein accessions
    pub ensembl: BTreeMap<String, Vec<String>>,
    /// Protein accession to the reactions it participates in
    pub protein_reactions: BTreeMap<String, Vec<String>>,
    /// All reference proteoforms
    pub proteoforms: Vec<ProteoformRecord>,
    /// The size of the protein universe
    pub protein_population: usize,
    /// The size of the proteoform universe
    pub proteoform_population: usize,
}

impl Snapshot {
    /// Open a snapshot file. Files with a `.bin` extension are read as binary cache (see
    /// [`Self::write_cache`]), all other files are read as JSON, optionally gzip compressed
    /// (`.gz` extension).
    /// # Errors
    /// If the file does not exist or cannot be opened ([`PathwayError::SnapshotMissing`]) or if
    /// the content is not a valid snapshot ([`PathwayError::SnapshotCorrupt`]).
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BoxedError<'static, PathwayError>> {
        let path = path.as_ref();
        let snapshot = if check_extension(path, "bin") {
            let file = File::open(path).map_err(|e| {
                BoxedError::new(
                    PathwayError::SnapshotMissing,
                    "Reference graph cache could not be opened",
                    e.to_string(),
                    Context::none().source(path.to_string_lossy()).to_owned(),
                )
            })?;
            let mut reader = BufReader::new(file);
            bincode::serde::decode_from_std_read(&mut reader, bincode::config::standard())
                .map_err(|e| {
                    BoxedError::new(
                        PathwayError::SnapshotCorrupt,
                        "Reference graph cache could not be parsed",
                        e.to_string(),
                        Context::none().source(path.to_string_lossy()).to_owned(),
                    )
                })?
        } else {
            Self::from_reader(open_file(path, PathwayError::SnapshotMissing)?).map_err(|e| {
                e.replace_context(Context::none().source(path.to_string_lossy()).to_owned())
            })?
        };
        tracing::debug!(
            path = %path.display(),
            reactions = snapshot.reactions.len(),
            pathways = snapshot.pathways.len(),
            proteoforms = snapshot.proteoforms.len(),
            "loaded reference graph snapshot"
        );
        Ok(snapshot)
    }

    /// Read a snapshot in JSON from the given reader.
    /// # Errors
    /// If the content is not a valid snapshot.
    pub fn from_reader(reader: impl Read) -> Result<Self, BoxedError<'static, PathwayError>> {
        serde_json::from_reader(reader).map_err(|e| {
            BoxedError::new(
                PathwayError::SnapshotCorrupt,
                "Reference graph could not be parsed",
                e.to_string(),
                Context::none(),
            )
        })
    }

    /// Read a snapshot in JSON from a string.
    /// # Errors
    /// If the content is not a valid snapshot.
    pub fn from_json(text: &str) -> Result<Self, BoxedError<'static, PathwayError>> {
        Self::from_reader(text.as_bytes())
    }

    /// Store this snapshot as a binary cache at the given location, which loads considerably
    /// faster than the JSON file.
    /// # Errors
    /// If the file could not be written to.
    pub fn write_cache(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<(), BoxedError<'static, PathwayError>> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| {
            BoxedError::new(
                PathwayError::Io,
                "Reference graph cache could not be created",
                e.to_string(),
                Context::none().source(path.to_string_lossy()).to_owned(),
            )
        })?;
        let mut writer = BufWriter::new(file);
        bincode::serde::encode_into_std_write(self, &mut writer, bincode::config::standard())
            .map_err(|e| {
                BoxedError::new(
                    PathwayError::Io,
                    "Reference graph cache could not be written",
                    e.to_string(),
                    Context::none().source(path.to_string_lossy()).to_owned(),
                )
            })?;
        tracing::debug!(path = %path.display(), "wrote reference graph cache");
        Ok(())
    }
}
