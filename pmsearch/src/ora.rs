//! Over-representation analysis of the pathways found in a search.

use context_error::{BoxedError, Context, CreateError};
use ordered_float::OrderedFloat;
use pmcore::PathwayError;
use probability::distribution::{Binomial, Discrete};

use crate::{
    graph::{PathwayIndex, ReferenceGraph},
    search::SearchResult,
};

/// The p-value below which a pathway is considered significantly enriched
pub const SIGNIFICANCE: f64 = 0.05;

/// The enrichment statistics for a single pathway
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathwayStatistics {
    /// The pathway
    pub pathway: PathwayIndex,
    /// The number of entities of the pathway that were hit
    pub entities_found: usize,
    /// The total number of entities in the pathway
    pub entities_total: usize,
    /// `entities_found / entities_total`
    pub entities_ratio: f64,
    /// The probability of finding at least this many entities by chance
    pub p_value: f64,
    /// The Benjamini-Hochberg false discovery rate
    pub entities_fdr: f64,
    /// The number of reactions of the pathway that were hit
    pub reactions_found: usize,
    /// The total number of reactions in the pathway
    pub reactions_total: usize,
    /// `reactions_found / reactions_total`
    pub reactions_ratio: f64,
}

impl PathwayStatistics {
    /// If the p-value is below [`SIGNIFICANCE`]
    pub fn significant(&self) -> bool {
        self.p_value < SIGNIFICANCE
    }
}

/// Calculate the enrichment of every pathway that was hit in the search. The statistics are
/// sorted on p-value, then pathway name, then pathway stable identifier.
/// # Errors
/// * [`PathwayError::PopulationUnavailable`] if pathways were hit but the graph has no population
///   size for the level of the search.
/// * [`PathwayError::NumericDomain`] if a pathway has entities or reactions found but a total of
///   zero, or if it is bigger than the population.
pub fn analyse(
    graph: &ReferenceGraph,
    result: &SearchResult,
) -> Result<Vec<PathwayStatistics>, BoxedError<'static, PathwayError>> {
    if result.pathways.is_empty() {
        return Ok(Vec::new());
    }
    let (population, level) = if result.proteoform_level() {
        (graph.proteoform_population(), "proteoform")
    } else {
        (graph.protein_population(), "protein")
    };
    if population == 0 {
        return Err(BoxedError::new(
            PathwayError::PopulationUnavailable,
            "Missing population size",
            format!("The reference graph does not contain the size of the {level} population"),
            Context::none(),
        ));
    }
    let sample = result.hit_entities();

    let mut statistics = Vec::with_capacity(result.pathways.len());
    for (index, hits) in &result.pathways {
        let pathway = graph.pathway(*index);
        let domain = |long: String| {
            BoxedError::new(
                PathwayError::NumericDomain,
                "Invalid pathway statistics",
                long,
                Context::show(pathway.id.clone()),
            )
        };
        let entities_found = hits.entities_found.len();
        let reactions_found = hits.reactions_found.len();
        if pathway.entities_total == 0 || pathway.reactions_total == 0 {
            return Err(domain(format!(
                "The pathway '{}' has {entities_found} entities and {reactions_found} reactions found, but totals of {} and {}",
                pathway.name, pathway.entities_total, pathway.reactions_total
            )));
        }
        let probability = pathway.entities_total as f64 / population as f64;
        if !(0.0..=1.0).contains(&probability) {
            return Err(domain(format!(
                "The pathway '{}' has {} entities which is more than the {level} population of {population}",
                pathway.name, pathway.entities_total
            )));
        }
        statistics.push(PathwayStatistics {
            pathway: *index,
            entities_found,
            entities_total: pathway.entities_total,
            entities_ratio: entities_found as f64 / pathway.entities_total as f64,
            p_value: binomial_p_value(entities_found, sample, probability),
            entities_fdr: 0.0,
            reactions_found,
            reactions_total: pathway.reactions_total,
            reactions_ratio: reactions_found as f64 / pathway.reactions_total as f64,
        });
    }

    statistics.sort_by_key(|s| {
        let pathway = graph.pathway(s.pathway);
        (
            OrderedFloat(s.p_value),
            pathway.name.as_str(),
            pathway.id.as_str(),
        )
    });
    let p_values: Vec<f64> = statistics.iter().map(|s| s.p_value).collect();
    for (s, fdr) in statistics.iter_mut().zip(benjamini_hochberg(&p_values)) {
        s.entities_fdr = fdr;
    }

    tracing::info!(
        pathways = statistics.len(),
        significant = statistics.iter().filter(|s| s.significant()).count(),
        sample,
        population,
        "finished enrichment analysis"
    );
    Ok(statistics)
}

/// The probability of at least `k` successes in `n` trials with success probability `p`, so
/// `1 - CDF(k - 1; n, p)`. The shorter tail of the mass function is summed, and the outcome is
/// clamped to `[0, 1]`.
pub fn binomial_p_value(k: usize, n: usize, p: f64) -> f64 {
    if k == 0 {
        return 1.0;
    }
    if k > n || p.is_nan() || p <= 0.0 {
        return 0.0;
    }
    if p >= 1.0 {
        return 1.0;
    }
    let binomial = Binomial::new(n, p);
    let tail = if k > n / 2 {
        (k..=n).map(|x| binomial.mass(x)).sum::<f64>()
    } else {
        1.0 - (0..k).map(|x| binomial.mass(x)).sum::<f64>()
    };
    tail.clamp(0.0, 1.0)
}

/// The false discovery rates for p-values sorted in ascending order. The number of tests `m` is
/// the count of leading p-values below [`SIGNIFICANCE`], the FDR at rank `r` (1 based) is
/// `p * m / r`.
pub fn benjamini_hochberg(sorted_p_values: &[f64]) -> Vec<f64> {
    let m = sorted_p_values
        .iter()
        .take_while(|p| **p < SIGNIFICANCE)
        .count() as f64;
    sorted_p_values
        .iter()
        .enumerate()
        .map(|(rank, p)| p * m / (rank + 1) as f64)
        .collect()
}
