use std::collections::HashMap;

use context_error::{BoxedError, Context, CreateError, StaticErrorContent};
use itertools::Itertools;
use pmcore::{PathwayError, Proteoform, format::ProteoformFormat, strip_isoform};
use serde::{Deserialize, Serialize};
use thin_vec::ThinVec;

use crate::graph::Snapshot;

macro_rules! index {
    ($name:ident, $what:literal) => {
        #[doc = concat!("The index of a ", $what, " in a [`ReferenceGraph`]")]
        #[derive(
            Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
        )]
        pub struct $name(usize);

        impl $name {
            /// Get the raw index
            pub const fn index(self) -> usize {
                self.0
            }
        }
    };
}

index!(ReactionIndex, "reaction");
index!(PathwayIndex, "pathway");
index!(ProteoformIndex, "reference proteoform");

/// A reaction, identified by its stable identifier
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Reaction {
    /// The stable identifier
    pub id: String,
    /// The display name
    pub name: String,
}

/// The static part of a pathway
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Pathway {
    /// The stable identifier
    pub id: String,
    /// The display name
    pub name: String,
    /// The number of entities that participate in this pathway
    pub entities_total: usize,
    /// The number of reactions in this pathway
    pub reactions_total: usize,
    /// The top level pathways this pathway is a part of, can be empty
    pub top_level: ThinVec<PathwayIndex>,
}

/// The read only reference network of genes, proteins, proteoforms, reactions, and pathways.
/// Protein accessions are stored without isoform tag.
#[derive(Clone, Debug, Default)]
pub struct ReferenceGraph {
    reactions: Vec<Reaction>,
    pathways: Vec<Pathway>,
    reaction_pathways: Vec<ThinVec<PathwayIndex>>,
    genes: HashMap<String, ThinVec<String>>,
    ensembl: HashMap<String, ThinVec<String>>,
    protein_reactions: HashMap<String, ThinVec<ReactionIndex>>,
    proteoforms: Vec<Proteoform>,
    proteoform_reactions: Vec<ThinVec<ReactionIndex>>,
    protein_proteoforms: HashMap<String, ThinVec<ProteoformIndex>>,
    protein_population: usize,
    proteoform_population: usize,
}

fn corrupt(short: &'static str, long: String) -> BoxedError<'static, PathwayError> {
    BoxedError::new(PathwayError::SnapshotCorrupt, short, long, Context::none())
}

/// Resolve all identifiers to indices, keeping the first occurrence of every index
fn resolve<I: Copy + Eq + std::hash::Hash>(
    ids: &[String],
    lookup: &HashMap<&str, I>,
    what: &str,
    from: &str,
) -> Result<ThinVec<I>, BoxedError<'static, PathwayError>> {
    ids.iter()
        .map(|id| {
            lookup.get(id.as_str()).copied().ok_or_else(|| {
                corrupt(
                    "Unknown identifier in reference graph",
                    format!("The {what} '{id}' referenced from '{from}' is not defined"),
                )
            })
        })
        .process_results(|iter| iter.unique().collect())
}

/// Strip the isoform tags from all accessions and merge the duplicates
fn protein_list(accessions: &[String]) -> ThinVec<String> {
    accessions
        .iter()
        .map(|a| strip_isoform(a.trim()).to_string())
        .unique()
        .collect()
}

impl ReferenceGraph {
    /// Validate a snapshot and build the indexed graph from it.
    /// # Errors
    /// If any relation references an unknown reaction or pathway, if any identifier is
    /// defined twice, or if any of the reference proteoforms cannot be parsed.
    pub fn from_snapshot(snapshot: &Snapshot) -> Result<Self, BoxedError<'static, PathwayError>> {
        let mut reaction_lookup = HashMap::with_capacity(snapshot.reactions.len());
        for (index, reaction) in snapshot.reactions.iter().enumerate() {
            if reaction_lookup
                .insert(reaction.id.as_str(), ReactionIndex(index))
                .is_some()
            {
                return Err(corrupt(
                    "Duplicate reaction",
                    format!("The reaction '{}' is defined more than once", reaction.id),
                ));
            }
        }
        let mut pathway_lookup = HashMap::with_capacity(snapshot.pathways.len());
        for (index, pathway) in snapshot.pathways.iter().enumerate() {
            if pathway_lookup
                .insert(pathway.id.as_str(), PathwayIndex(index))
                .is_some()
            {
                return Err(corrupt(
                    "Duplicate pathway",
                    format!("The pathway '{}' is defined more than once", pathway.id),
                ));
            }
        }

        let pathways = snapshot
            .pathways
            .iter()
            .map(|p| {
                Ok(Pathway {
                    id: p.id.clone(),
                    name: p.name.clone(),
                    entities_total: p.entities_total,
                    reactions_total: p.reactions_total,
                    top_level: resolve(&p.top_level_pathways, &pathway_lookup, "pathway", &p.id)?,
                })
            })
            .collect::<Result<Vec<_>, BoxedError<'static, PathwayError>>>()?;

        let mut reaction_pathways = vec![ThinVec::new(); snapshot.reactions.len()];
        for (reaction, pathways) in &snapshot.reaction_pathways {
            let index = reaction_lookup.get(reaction.as_str()).ok_or_else(|| {
                corrupt(
                    "Unknown identifier in reference graph",
                    format!("The reaction '{reaction}' has pathways but is not defined"),
                )
            })?;
            reaction_pathways[index.0] = resolve(pathways, &pathway_lookup, "pathway", reaction)?;
        }

        let mut protein_reactions: HashMap<String, ThinVec<ReactionIndex>> = HashMap::new();
        for (protein, reactions) in &snapshot.protein_reactions {
            let entry = protein_reactions
                .entry(strip_isoform(protein.trim()).to_string())
                .or_default();
            for reaction in resolve(reactions, &reaction_lookup, "reaction", protein)? {
                if !entry.contains(&reaction) {
                    entry.push(reaction);
                }
            }
        }

        let mut proteoforms = Vec::with_capacity(snapshot.proteoforms.len());
        let mut proteoform_reactions = Vec::with_capacity(snapshot.proteoforms.len());
        let mut protein_proteoforms: HashMap<String, ThinVec<ProteoformIndex>> = HashMap::new();
        for (index, record) in snapshot.proteoforms.iter().enumerate() {
            let proteoform = ProteoformFormat::Simple
                .parse_line(&record.proteoform, Some(index as u32))
                .map_err(|e| {
                    BoxedError::new(
                        PathwayError::SnapshotCorrupt,
                        "Invalid reference proteoform",
                        format!(
                            "The reference proteoform at index {index} could not be parsed: {}",
                            e.get_long_description()
                        ),
                        Context::show(record.proteoform.clone()),
                    )
                })?;
            proteoform_reactions.push(resolve(
                &record.reactions,
                &reaction_lookup,
                "reaction",
                &record.proteoform,
            )?);
            protein_proteoforms
                .entry(proteoform.accession().to_string())
                .or_default()
                .push(ProteoformIndex(index));
            proteoforms.push(proteoform);
        }

        Ok(Self {
            reactions: snapshot
                .reactions
                .iter()
                .map(|r| Reaction {
                    id: r.id.clone(),
                    name: r.name.clone(),
                })
                .collect(),
            pathways,
            reaction_pathways,
            genes: snapshot
                .genes
                .iter()
                .map(|(gene, proteins)| (gene.trim().to_string(), protein_list(proteins)))
                .collect(),
            ensembl: snapshot
                .ensembl
                .iter()
                .map(|(id, proteins)| (id.trim().to_string(), protein_list(proteins)))
                .collect(),
            protein_reactions,
            proteoforms,
            proteoform_reactions,
            protein_proteoforms,
            protein_population: snapshot.protein_population,
            proteoform_population: snapshot.proteoform_population,
        })
    }

    /// Get a reaction
    pub fn reaction(&self, index: ReactionIndex) -> &Reaction {
        &self.reactions[index.0]
    }

    /// Get a pathway
    pub fn pathway(&self, index: PathwayIndex) -> &Pathway {
        &self.pathways[index.0]
    }

    /// Find a pathway by its stable identifier
    pub fn find_pathway(&self, id: &str) -> Option<PathwayIndex> {
        self.pathways
            .iter()
            .position(|p| p.id == id)
            .map(PathwayIndex)
    }

    /// Find a reaction by its stable identifier
    pub fn find_reaction(&self, id: &str) -> Option<ReactionIndex> {
        self.reactions
            .iter()
            .position(|r| r.id == id)
            .map(ReactionIndex)
    }

    /// The number of reactions
    pub fn number_of_reactions(&self) -> usize {
        self.reactions.len()
    }

    /// The number of pathways
    pub fn number_of_pathways(&self) -> usize {
        self.pathways.len()
    }

    /// The pathways a reaction is contained in
    pub fn pathways_of(&self, reaction: ReactionIndex) -> &[PathwayIndex] {
        &self.reaction_pathways[reaction.0]
    }

    /// The proteins (without isoform tag) encoded by a gene
    pub fn proteins_of_gene(&self, gene: &str) -> &[String] {
        self.genes.get(gene).map_or(&[][..], |p| p.as_slice())
    }

    /// The proteins (without isoform tag) linked to an Ensembl identifier
    pub fn proteins_of_ensembl(&self, id: &str) -> &[String] {
        self.ensembl.get(id).map_or(&[][..], |p| p.as_slice())
    }

    /// The reactions a protein participates in, the isoform tag is ignored
    pub fn reactions_of_protein(&self, accession: &str) -> &[ReactionIndex] {
        self.protein_reactions
            .get(strip_isoform(accession))
            .map_or(&[][..], |r| r.as_slice())
    }

    /// Check if a protein (ignoring the isoform tag) is known in this graph
    pub fn contains_protein(&self, accession: &str) -> bool {
        let accession = strip_isoform(accession);
        self.protein_reactions.contains_key(accession)
            || self.protein_proteoforms.contains_key(accession)
    }

    /// Get a reference proteoform
    pub fn proteoform(&self, index: ProteoformIndex) -> &Proteoform {
        &self.proteoforms[index.0]
    }

    /// All reference proteoforms of a protein, the isoform tag is ignored
    pub fn proteoforms_of_protein(
        &self,
        accession: &str,
    ) -> impl Iterator<Item = (ProteoformIndex, &Proteoform)> + '_ {
        self.protein_proteoforms
            .get(strip_isoform(accession))
            .map_or(&[][..], |p| p.as_slice())
            .iter()
            .map(|i| (*i, &self.proteoforms[i.0]))
    }

    /// The reactions a reference proteoform participates in
    pub fn reactions_of_proteoform(&self, proteoform: ProteoformIndex) -> &[ReactionIndex] {
        &self.proteoform_reactions[proteoform.0]
    }

    /// The size of the protein universe
    pub const fn protein_population(&self) -> usize {
        self.protein_population
    }

    /// The size of the proteoform universe
    pub const fn proteoform_population(&self) -> usize {
        self.proteoform_population
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    fn snapshot() -> Snapshot {
        Snapshot::from_json(
            r#"{
            "reactions": [{"id": "R1", "name": "Reaction one"}, {"id": "R2", "name": "Reaction two"}],
            "pathways": [
                {"id": "PW1", "name": "Pathway one", "entities_total": 2, "reactions_total": 2, "top_level_pathways": ["TOP"]},
                {"id": "TOP", "name": "Top", "entities_total": 5, "reactions_total": 4}
            ],
            "reaction_pathways": {"R1": ["PW1", "TOP", "PW1"], "R2": ["PW1"]},
            "genes": {"GENE1": ["P1-2", "P1"]},
            "protein_reactions": {"P1": ["R1"], "P1-2": ["R2", "R1"]},
            "proteoforms": [{"proteoform": "P2;00046:3", "reactions": ["R2"]}],
            "protein_population": 100,
            "proteoform_population": 120
        }"#,
        )
        .unwrap()
    }

    #[test]
    fn build() {
        let graph = ReferenceGraph::from_snapshot(&snapshot()).unwrap();
        assert_eq!(graph.number_of_reactions(), 2);
        assert_eq!(graph.number_of_pathways(), 2);
        let r1 = graph.find_reaction("R1").unwrap();
        let pw1 = graph.find_pathway("PW1").unwrap();
        let top = graph.find_pathway("TOP").unwrap();
        assert_eq!(graph.pathways_of(r1), &[pw1, top]);
        assert_eq!(graph.pathway(pw1).top_level.as_slice(), &[top]);
        assert_eq!(graph.proteins_of_gene("GENE1"), &["P1".to_string()]);
        assert!(graph.proteins_of_gene("GENE2").is_empty());
        assert_eq!(graph.reactions_of_protein("P1-3").len(), 2);
        assert!(graph.contains_protein("P2"));
        assert!(!graph.contains_protein("P3"));
        let (index, proteoform) = graph.proteoforms_of_protein("P2-1").next().unwrap();
        assert_eq!(proteoform.to_string(), "P2;00046:3");
        assert_eq!(graph.reactions_of_proteoform(index).len(), 1);
        assert_eq!(graph.protein_population(), 100);
        assert_eq!(graph.proteoform_population(), 120);
    }

    #[test]
    fn corrupt_snapshots() {
        let mut unknown_reaction = snapshot();
        unknown_reaction
            .protein_reactions
            .insert("P3".to_string(), vec!["R3".to_string()]);
        let mut unknown_pathway = snapshot();
        unknown_pathway
            .reaction_pathways
            .insert("R2".to_string(), vec!["PW9".to_string()]);
        let mut unknown_top_level = snapshot();
        unknown_top_level.pathways[1].top_level_pathways = vec!["PW9".to_string()];
        let mut invalid_proteoform = snapshot();
        invalid_proteoform.proteoforms[0].proteoform = "P2;00046".to_string();
        let mut duplicate = snapshot();
        duplicate.reactions.push(duplicate.reactions[0].clone());
        for snapshot in [
            unknown_reaction,
            unknown_pathway,
            unknown_top_level,
            invalid_proteoform,
            duplicate,
        ] {
            let error = ReferenceGraph::from_snapshot(&snapshot).unwrap_err();
            assert!(matches!(error.get_kind(), PathwayError::SnapshotCorrupt));
        }
    }
}
