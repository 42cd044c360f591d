use context_error::{BoxedError, Context, CreateError};
use indexmap::{IndexMap, IndexSet};
use pmcore::{PathwayError, Proteoform, Ptm, matching, strip_isoform};

use crate::{
    graph::{ChromosomeCache, ProteoformIndex, ReactionIndex, ReferenceGraph},
    input::{Identifier, InputType},
    peptide::PeptideMapper,
    search::{PathwayHits, SearchRecord, SearchResult, SearchSettings},
};

/// Everything needed to run searches: the reference graph, the settings, and the optional
/// collaborators for variant and peptide input.
#[derive(Debug)]
pub struct SearchContext<'a> {
    graph: &'a ReferenceGraph,
    settings: SearchSettings,
    chromosomes: Option<ChromosomeCache>,
    peptides: Option<&'a dyn PeptideMapper>,
}

impl<'a> SearchContext<'a> {
    /// Create a context without chromosome maps or peptide mapper
    pub const fn new(graph: &'a ReferenceGraph, settings: SearchSettings) -> Self {
        Self {
            graph,
            settings,
            chromosomes: None,
            peptides: None,
        }
    }

    /// Use the given chromosome maps for `RSID`, `CHRBP`, and `VCF` input
    #[must_use]
    pub fn with_chromosomes(mut self, chromosomes: ChromosomeCache) -> Self {
        self.chromosomes = Some(chromosomes);
        self
    }

    /// Use the given peptide mapper for `PEPTIDE` and `MODIFIED_PEPTIDE` input
    #[must_use]
    pub fn with_peptide_mapper(mut self, mapper: &'a dyn PeptideMapper) -> Self {
        self.peptides = Some(mapper);
        self
    }

    /// The settings
    pub const fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// The reference graph
    pub const fn graph(&self) -> &'a ReferenceGraph {
        self.graph
    }

    /// The chromosome maps, if given
    pub const fn chromosomes(&self) -> Option<&ChromosomeCache> {
        self.chromosomes.as_ref()
    }

    /// Search all rows of an input file. Rows that cannot be parsed are skipped with a warning,
    /// rows that break the precondition of the matching engine are skipped with an error. Both
    /// are collected in [`SearchResult::diagnostics`].
    /// # Errors
    /// If a needed collaborator was not given or if the chromosome maps could not be loaded.
    pub fn search<S: AsRef<str>>(
        &mut self,
        rows: impl IntoIterator<Item = S>,
    ) -> Result<SearchResult, BoxedError<'static, PathwayError>> {
        let input_type = self.settings.input_type;
        let mut result = SearchResult::new(input_type);
        result.top_level_pathways = self.settings.top_level_pathways;
        let mut identifiers = Vec::new();
        for (line_index, row) in rows.into_iter().enumerate() {
            match input_type.parse_row(
                row.as_ref(),
                line_index,
                self.settings.proteoform_format,
            ) {
                Ok(Some(identifier)) => identifiers.push((line_index, identifier)),
                Ok(None) => (),
                Err(warning) => result.skip(warning),
            }
        }

        match input_type {
            InputType::Gene | InputType::Ensembl | InputType::Uniprot => {
                for (_, identifier) in &identifiers {
                    self.search_protein_identifier(&mut result, identifier);
                }
            }
            InputType::Rsid => self.search_rsids(&mut result, &identifiers)?,
            InputType::ChrBp | InputType::Vcf => self.search_positions(&mut result, &identifiers)?,
            InputType::Peptide => self.search_peptides(&mut result, &identifiers)?,
            InputType::Proteoform => {
                for (line_index, identifier) in identifiers {
                    if let Identifier::Proteoform(proteoform) = identifier {
                        self.search_proteoform(&mut result, &proteoform, line_index);
                    }
                }
            }
            InputType::ModifiedPeptide => self.search_modified_peptides(&mut result, &identifiers)?,
        }

        tracing::info!(
            input_type = %input_type,
            records = result.records.len(),
            pathways = result.pathways.len(),
            reactions = result.hit_reactions.len(),
            skipped = result.skipped,
            "search finished"
        );
        Ok(result)
    }

    fn search_protein_identifier(&self, result: &mut SearchResult, identifier: &Identifier) {
        match identifier {
            Identifier::Gene(gene) => {
                result.genes.input.insert(gene.clone());
                let proteins = self.graph.proteins_of_gene(gene);
                if !proteins.is_empty() {
                    result.genes.matched.insert(gene.clone());
                }
                if self.commit_proteins(result, &[gene.clone()], proteins.iter()) {
                    result.genes.hit.insert(gene.clone());
                }
            }
            Identifier::Ensembl(id) => {
                result.ensembl.input.insert(id.clone());
                let proteins = self.graph.proteins_of_ensembl(id);
                if !proteins.is_empty() {
                    result.ensembl.matched.insert(id.clone());
                }
                if self.commit_proteins(result, &[id.clone()], proteins.iter()) {
                    result.ensembl.hit.insert(id.clone());
                }
            }
            Identifier::Uniprot(accession) => {
                self.commit_proteins(result, &[], std::iter::once(accession));
            }
            _ => (),
        }
    }

    fn search_rsids(
        &mut self,
        result: &mut SearchResult,
        identifiers: &[(usize, Identifier)],
    ) -> Result<(), BoxedError<'static, PathwayError>> {
        let rsids: Vec<&str> = identifiers
            .iter()
            .filter_map(|(_, i)| match i {
                Identifier::Rsid(rsid) => Some(rsid.as_str()),
                _ => None,
            })
            .collect();
        let cache = self.chromosome_cache(InputType::Rsid)?;
        // Every chromosome is loaded only once, the rows are emitted in input order afterwards
        let mut resolved: Vec<IndexSet<String>> = vec![IndexSet::new(); rsids.len()];
        for chromosome in cache.chromosomes() {
            let data = cache.swap(chromosome)?;
            for (rsid, proteins) in rsids.iter().zip(resolved.iter_mut()) {
                proteins.extend(data.proteins_of_rsid(rsid).iter().cloned());
            }
        }
        for (rsid, proteins) in rsids.into_iter().zip(resolved) {
            result.rsids.input.insert(rsid.to_string());
            if !proteins.is_empty() {
                result.rsids.matched.insert(rsid.to_string());
            }
            if self.commit_proteins(result, &[rsid.to_string()], proteins.iter()) {
                result.rsids.hit.insert(rsid.to_string());
            }
        }
        Ok(())
    }

    fn search_positions(
        &mut self,
        result: &mut SearchResult,
        identifiers: &[(usize, Identifier)],
    ) -> Result<(), BoxedError<'static, PathwayError>> {
        let input_type = self.settings.input_type;
        for (_, identifier) in identifiers {
            let Identifier::Position {
                chromosome,
                base_pair,
            } = identifier
            else {
                continue;
            };
            let proteins = self
                .chromosome_cache(input_type)?
                .swap(chromosome)?
                .proteins_at(*base_pair)
                .to_vec();
            let key = (chromosome.clone(), *base_pair);
            result.positions.input.insert(key.clone());
            if !proteins.is_empty() {
                result.positions.matched.insert(key.clone());
            }
            if self.commit_proteins(
                result,
                &[chromosome.clone(), base_pair.to_string()],
                proteins.iter(),
            ) {
                result.positions.hit.insert(key);
            }
        }
        Ok(())
    }

    fn search_peptides(
        &self,
        result: &mut SearchResult,
        identifiers: &[(usize, Identifier)],
    ) -> Result<(), BoxedError<'static, PathwayError>> {
        let mapper = self.peptide_mapper(InputType::Peptide)?;
        let peptides: IndexSet<&str> = identifiers
            .iter()
            .filter_map(|(_, i)| match i {
                Identifier::Peptide(sequence) => Some(sequence.as_str()),
                _ => None,
            })
            .collect();
        // All peptides are mapped first, the proteins are searched in first seen order
        let mut proteins: IndexMap<String, Vec<&str>> = IndexMap::new();
        for peptide in peptides {
            result.peptides.input.insert(peptide.to_string());
            let mapped = mapper.map_peptide(peptide);
            if !mapped.is_empty() {
                result.peptides.matched.insert(peptide.to_string());
            }
            for (protein, _) in mapped {
                proteins.entry(protein).or_default().push(peptide);
            }
        }
        for (protein, peptides) in proteins {
            if self.commit_proteins(result, &[], std::iter::once(&protein)) {
                result
                    .peptides
                    .hit
                    .extend(peptides.into_iter().map(str::to_string));
            }
        }
        Ok(())
    }

    fn search_modified_peptides(
        &self,
        result: &mut SearchResult,
        identifiers: &[(usize, Identifier)],
    ) -> Result<(), BoxedError<'static, PathwayError>> {
        let mapper = self.peptide_mapper(InputType::ModifiedPeptide)?;
        // Unique peptides with the row they were first seen on
        let mut peptides: IndexMap<(&str, &[Ptm]), usize> = IndexMap::new();
        for (line_index, identifier) in identifiers {
            if let Identifier::ModifiedPeptide { sequence, ptms } = identifier {
                peptides
                    .entry((sequence.as_str(), ptms.as_slice()))
                    .or_insert(*line_index);
            }
        }
        let mut proteoforms: IndexMap<Proteoform, (usize, Vec<String>)> = IndexMap::new();
        for ((sequence, ptms), line_index) in peptides {
            let key = format!("{sequence};{}", itertools::join(ptms, ","));
            result.peptides.input.insert(key.clone());
            let mapped = mapper.map_peptide(sequence);
            if !mapped.is_empty() {
                result.peptides.matched.insert(key.clone());
            }
            for (protein, offset) in mapped {
                let proteoform = Proteoform::new(protein)
                    .with_ptms(ptms.iter().map(|p| p.shifted(offset as i64)));
                proteoforms
                    .entry(proteoform)
                    .or_insert_with(|| (line_index, Vec::new()))
                    .1
                    .push(key.clone());
            }
        }
        for (proteoform, (line_index, peptides)) in proteoforms {
            if self.search_proteoform(result, &proteoform, line_index) {
                result.peptides.hit.extend(peptides);
            }
        }
        Ok(())
    }

    /// Match a single input proteoform and commit the matches. If the matching engine refuses
    /// the proteoform nothing is committed and the row is recorded as skipped. Returns if any
    /// pathway was reached.
    fn search_proteoform(
        &self,
        result: &mut SearchResult,
        proteoform: &Proteoform,
        line_index: usize,
    ) -> bool {
        let match_type = self.settings.matching;
        let margin = self.settings.margin;
        let matches = matching::validate(proteoform).and_then(|()| {
            self.graph
                .proteoforms_of_protein(proteoform.accession())
                .filter_map(|(index, reference)| {
                    match_type
                        .matches(proteoform, reference, margin)
                        .map(|matched| matched.then_some(index))
                        .transpose()
                })
                .collect::<Result<Vec<ProteoformIndex>, _>>()
        });
        let matches = match matches {
            Ok(matches) => matches,
            Err(error) => {
                result.skip(error.replace_context(
                    Context::show(proteoform.to_string()).line_index(line_index as u32),
                ));
                return false;
            }
        };

        result.proteoforms.input.insert(proteoform.clone());
        if !matches.is_empty() {
            result.proteoforms.matched.insert(proteoform.clone());
        }
        let format = self.settings.proteoform_format;
        let input = format.display(proteoform).to_string();
        let mut any = false;
        for index in matches {
            let reference = self.graph.proteoform(index);
            let identifiers = [
                input.clone(),
                format.display(reference).to_string(),
                reference.accession().to_string(),
            ];
            if self.commit(
                result,
                &identifiers,
                &reference.to_string(),
                self.graph.reactions_of_proteoform(index),
            ) {
                result.proteoforms.hit.insert(reference.clone());
                result.proteins.hit.insert(reference.accession().to_string());
                any = true;
            }
        }
        any
    }

    /// Commit all given proteins, the identifiers are the columns preceding the accession.
    /// Returns if any pathway was reached.
    fn commit_proteins<'p>(
        &self,
        result: &mut SearchResult,
        identifiers: &[String],
        proteins: impl Iterator<Item = &'p String>,
    ) -> bool {
        let mut any = false;
        for protein in proteins {
            let accession = strip_isoform(protein);
            result.proteins.input.insert(accession.to_string());
            let reactions = self.graph.reactions_of_protein(accession);
            if self.graph.contains_protein(accession) {
                result.proteins.matched.insert(accession.to_string());
            }
            let mut columns = identifiers.to_vec();
            columns.push(accession.to_string());
            if self.commit(result, &columns, accession, reactions) {
                result.proteins.hit.insert(accession.to_string());
                any = true;
            }
        }
        any
    }

    /// Add the records and pathway hits for one resolved entity. Returns if any pathway was reached.
    fn commit(
        &self,
        result: &mut SearchResult,
        identifiers: &[String],
        entity: &str,
        reactions: &[ReactionIndex],
    ) -> bool {
        let mut any = false;
        for reaction in reactions {
            for pathway in self.graph.pathways_of(*reaction) {
                any = true;
                result.hit_reactions.insert(*reaction);
                let hits: &mut PathwayHits = result.pathways.entry(*pathway).or_default();
                hits.entities_found.insert(entity.to_string());
                hits.reactions_found.insert(*reaction);
                let top_level = &self.graph.pathway(*pathway).top_level;
                let top_levels: Vec<Option<_>> = if self.settings.top_level_pathways {
                    if top_level.is_empty() {
                        vec![Some(*pathway)]
                    } else {
                        top_level.iter().copied().map(Some).collect()
                    }
                } else {
                    vec![None]
                };
                for top_level in top_levels {
                    result.records.push(SearchRecord {
                        identifiers: identifiers.to_vec(),
                        reaction: *reaction,
                        pathway: *pathway,
                        top_level,
                    });
                }
            }
        }
        any
    }

    fn chromosome_cache(
        &mut self,
        input_type: InputType,
    ) -> Result<&mut ChromosomeCache, BoxedError<'static, PathwayError>> {
        self.chromosomes.as_mut().ok_or_else(|| {
            missing(
                input_type,
                "Chromosome maps are needed to resolve genetic variants, but none were given",
            )
        })
    }

    fn peptide_mapper(
        &self,
        input_type: InputType,
    ) -> Result<&'a dyn PeptideMapper, BoxedError<'static, PathwayError>> {
        self.peptides.ok_or_else(|| {
            missing(
                input_type,
                "A peptide mapper (protein sequence database) is needed to resolve peptides, but none was given",
            )
        })
    }
}

fn missing(input_type: InputType, long: &'static str) -> BoxedError<'static, PathwayError> {
    BoxedError::new(
        PathwayError::MissingCollaborator,
        "Missing reference data",
        long,
        Context::show(format!("Input type {input_type}")),
    )
}
