use std::collections::{BTreeMap, BTreeSet};

use context_error::{BoxedError, StaticErrorContent};
use pmcore::{PathwayError, Proteoform};

use crate::{
    graph::{PathwayIndex, ReactionIndex},
    input::InputType,
};

/// The sets of entities at one level (genes, proteins, and so on) seen in a search
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EntitySets<T: Ord> {
    /// The accepted input identifiers
    pub input: BTreeSet<T>,
    /// The input identifiers that resolved to at least one reference entity
    pub matched: BTreeSet<T>,
    /// The reference entities that reached at least one pathway
    pub hit: BTreeSet<T>,
}

impl<T: Ord> Default for EntitySets<T> {
    fn default() -> Self {
        Self {
            input: BTreeSet::new(),
            matched: BTreeSet::new(),
            hit: BTreeSet::new(),
        }
    }
}

/// The entities and reactions found for a single pathway
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PathwayHits {
    /// Protein accessions, or reference proteoforms in the `SIMPLE` notation for proteoform level searches
    pub entities_found: BTreeSet<String>,
    /// The reactions
    pub reactions_found: BTreeSet<ReactionIndex>,
}

/// A single line of the search table
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SearchRecord {
    /// The formatted identifier columns, see [`InputType::identifier_columns`]
    pub identifiers: Vec<String>,
    /// The reaction
    pub reaction: ReactionIndex,
    /// The pathway containing the reaction
    pub pathway: PathwayIndex,
    /// The top level pathway, only set if the top level pathways were requested
    pub top_level: Option<PathwayIndex>,
}

/// The outcome of a single search
#[derive(Debug)]
pub struct SearchResult {
    /// The input type that was searched
    pub input_type: InputType,
    /// If the records carry their top level pathways
    pub top_level_pathways: bool,
    /// Gene names
    pub genes: EntitySets<String>,
    /// Ensembl identifiers
    pub ensembl: EntitySets<String>,
    /// Protein accessions, without isoform tags for the hits
    pub proteins: EntitySets<String>,
    /// Input and reference proteoforms
    pub proteoforms: EntitySets<Proteoform>,
    /// rsIDs
    pub rsids: EntitySets<String>,
    /// Chromosome and base pair positions
    pub positions: EntitySets<(String, u64)>,
    /// Peptides, modified peptides are stored as `SEQUENCE;MOD:SITE`
    pub peptides: EntitySets<String>,
    /// All reactions that were hit
    pub hit_reactions: BTreeSet<ReactionIndex>,
    /// The found entities and reactions per pathway
    pub pathways: BTreeMap<PathwayIndex, PathwayHits>,
    /// The records of the search table, in input row order
    pub records: Vec<SearchRecord>,
    /// The warnings and row level errors, every diagnostic skipped a row
    pub diagnostics: Vec<BoxedError<'static, PathwayError>>,
    /// The number of rows that were skipped
    pub skipped: usize,
}

impl SearchResult {
    /// Create an empty result for the given input type
    pub fn new(input_type: InputType) -> Self {
        Self {
            input_type,
            top_level_pathways: false,
            genes: EntitySets::default(),
            ensembl: EntitySets::default(),
            proteins: EntitySets::default(),
            proteoforms: EntitySets::default(),
            rsids: EntitySets::default(),
            positions: EntitySets::default(),
            peptides: EntitySets::default(),
            hit_reactions: BTreeSet::new(),
            pathways: BTreeMap::new(),
            records: Vec::new(),
            diagnostics: Vec::new(),
            skipped: 0,
        }
    }

    /// If this search counted proteoforms instead of proteins
    pub const fn proteoform_level(&self) -> bool {
        self.input_type.is_proteoform_level()
    }

    /// The number of hit entities at the counted level, the sample size of the enrichment analysis
    pub fn hit_entities(&self) -> usize {
        if self.proteoform_level() {
            self.proteoforms.hit.len()
        } else {
            self.proteins.hit.len()
        }
    }

    /// The diagnostics that are only warnings
    pub fn warnings(&self) -> impl Iterator<Item = &BoxedError<'static, PathwayError>> {
        self.diagnostics.iter().filter(|d| d.get_kind().is_warning())
    }

    /// The diagnostics that are row level errors
    pub fn errors(&self) -> impl Iterator<Item = &BoxedError<'static, PathwayError>> {
        self.diagnostics.iter().filter(|d| !d.get_kind().is_warning())
    }

    /// Record a diagnostic for a skipped row
    pub(crate) fn skip(&mut self, diagnostic: BoxedError<'static, PathwayError>) {
        tracing::warn!(
            kind = ?diagnostic.get_kind(),
            "{}",
            diagnostic.get_short_description()
        );
        self.skipped += 1;
        self.diagnostics.push(diagnostic);
    }
}
