//! Run complete searches against the reference graph in `tests/data`

use std::path::PathBuf;

use context_error::StaticErrorContent;
use pmcore::{PathwayError, format::ProteoformFormat, matching::MatchType};
use pmsearch::{
    graph::{PathwayRecord, ReactionRecord},
    prelude::*,
    report::{write_analysis_table, write_search_table},
};

fn data(file: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(file)
}

fn graph() -> ReferenceGraph {
    ReferenceGraph::from_snapshot(&Snapshot::open(data("reference.json")).unwrap()).unwrap()
}

fn tables(graph: &ReferenceGraph, settings: SearchSettings, rows: &[&str]) -> (String, String) {
    let result = SearchContext::new(graph, settings).search(rows).unwrap();
    let statistics = analyse(graph, &result).unwrap();
    let mut search = Vec::new();
    write_search_table(&mut search, graph, &result).unwrap();
    let mut analysis = Vec::new();
    write_analysis_table(&mut analysis, graph, &result, &statistics).unwrap();
    (
        String::from_utf8(search).unwrap(),
        String::from_utf8(analysis).unwrap(),
    )
}

#[test]
fn single_protein() {
    let graph = graph();
    let result = SearchContext::new(&graph, SearchSettings::new(InputType::Uniprot))
        .search(["P01308"])
        .unwrap();
    assert_eq!(
        result.proteins.hit.iter().collect::<Vec<_>>(),
        vec!["P01308"]
    );
    assert_eq!(result.pathways.len(), 1);
    let (pathway, hits) = result.pathways.iter().next().unwrap();
    assert_eq!(graph.pathway(*pathway).id, "R-HSA-74752");
    assert_eq!(
        hits.entities_found.iter().collect::<Vec<_>>(),
        vec!["P01308"]
    );

    let statistics = analyse(&graph, &result).unwrap();
    assert_eq!(statistics.len(), 1);
    assert!((statistics[0].entities_ratio - 0.5).abs() < f64::EPSILON);
    assert!((statistics[0].reactions_ratio - 1.0).abs() < f64::EPSILON);
}

#[test]
fn genes_and_isoforms() {
    let graph = graph();
    let result = SearchContext::new(&graph, SearchSettings::new(InputType::Gene))
        .search(["INSR", "INS", "NOTAGENE"])
        .unwrap();
    assert_eq!(result.genes.input.len(), 3);
    assert_eq!(result.genes.matched.len(), 2);
    assert_eq!(result.genes.hit.len(), 2);
    assert!(result.proteins.hit.contains("P06213"));
    assert!(!result.proteins.hit.contains("P06213-1"));
    assert_eq!(
        result.records[0].identifiers,
        vec!["INSR".to_string(), "P06213".to_string()]
    );
    assert_eq!(result.records.len(), 2);
}

#[test]
fn row_warnings() {
    let graph = graph();
    let result = SearchContext::new(&graph, SearchSettings::new(InputType::Gene))
        .search(["\u{feff}INS", "", "  ", "IN S"])
        .unwrap();
    assert_eq!(result.skipped, 3);
    assert_eq!(result.warnings().count(), 3);
    assert_eq!(result.errors().count(), 0);
    assert_eq!(
        result
            .diagnostics
            .iter()
            .filter(|d| d.get_kind() == &PathwayError::EmptyRow)
            .count(),
        2
    );
    assert!(result.genes.hit.contains("INS"));
}

#[test]
fn top_level_pathways() {
    let graph = graph();
    let settings = SearchSettings {
        top_level_pathways: true,
        ..SearchSettings::new(InputType::Gene)
    };
    let (search, _) = tables(&graph, settings, &["INSR", "GCG"]);
    let lines = search.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].ends_with("TOP_LEVEL_PATHWAY_STID\tTOP_LEVEL_PATHWAY_DISPLAY_NAME"));
    assert!(lines[1].ends_with("R-HSA-162582\tSignal Transduction"));
    assert!(lines[2].ends_with("R-HSA-1430728\tMetabolism"));
    // Without top level pathways the pathway itself is repeated
    assert!(lines[3].starts_with("GCG\tP01275\t"));
    assert!(lines[3].ends_with(
        "R-HSA-163359\tGlucagon signaling in metabolic regulation\tR-HSA-163359\tGlucagon signaling in metabolic regulation"
    ));
}

#[test]
fn proteoforms() {
    let graph = graph();
    let settings = SearchSettings {
        matching: MatchType::Superset,
        ..SearchSettings::new(InputType::Proteoform)
    };
    let result = SearchContext::new(&graph, settings)
        .search([
            "P06213;00048:1185,00048:1189",
            "P01308;00798:31",
            "P01308;00798:31,00798:43",
            "P01308;1-2;3;4;5",
        ])
        .unwrap();
    assert_eq!(result.skipped, 1);
    assert_eq!(result.proteoforms.input.len(), 3);
    assert_eq!(result.proteoforms.matched.len(), 2);
    assert_eq!(result.proteoforms.hit.len(), 3);
    assert_eq!(result.hit_entities(), 3);
    assert_eq!(result.records.len(), 3);

    let strict = SearchSettings {
        matching: MatchType::Strict,
        ..settings
    };
    let result = SearchContext::new(&graph, strict)
        .search(["P06213;00048:1185,00048:1189"])
        .unwrap();
    assert_eq!(result.records.len(), 1);
    assert_eq!(
        result.records[0].identifiers,
        vec![
            "P06213;00048:1185,00048:1189".to_string(),
            "P06213;00048:1185,00048:1189".to_string(),
            "P06213".to_string()
        ]
    );

    let pro_forma = SearchSettings {
        proteoform_format: ProteoformFormat::ProForma,
        ..strict
    };
    let result = SearchContext::new(&graph, pro_forma)
        .search(["UniProtKB:P01308, 25-110, Cys-31, MOD:00798|Cys-43, MOD:00798"])
        .unwrap();
    assert_eq!(result.skipped, 0);
    assert_eq!(result.records.len(), 1);
    assert!(result.records[0].identifiers[0].starts_with("UniProtKB:P01308"));
}

#[test]
fn variants() {
    let graph = graph();
    let chromosomes = || ChromosomeCache::new(DirectoryChromosomes::new(data("chromosomes")));
    let mut context = SearchContext::new(&graph, SearchSettings::new(InputType::Rsid))
        .with_chromosomes(chromosomes());
    let result = context.search(["rs2229429", "rs689", "rs1"]).unwrap();
    assert_eq!(result.rsids.input.len(), 3);
    assert_eq!(result.rsids.hit.len(), 2);
    assert_eq!(result.records[0].identifiers[0], "rs2229429");
    assert_eq!(result.records[1].identifiers[0], "rs689");

    let mut context = SearchContext::new(&graph, SearchSettings::new(InputType::ChrBp))
        .with_chromosomes(chromosomes());
    let result = context
        .search(["chr11:2160994", "19 7117234", "chr11:1"])
        .unwrap();
    assert_eq!(result.positions.input.len(), 3);
    assert_eq!(result.positions.hit.len(), 2);
    assert!(result.proteins.hit.contains("P01308"));
    assert!(result.proteins.hit.contains("P06213"));
    assert_eq!(context.chromosomes().unwrap().current(), Some("11"));
}

#[test]
fn peptides() {
    let graph = graph();
    let mapper = FastaPeptideMapper::from_file(data("proteins.fasta")).unwrap();
    let result = SearchContext::new(&graph, SearchSettings::new(InputType::Peptide))
        .with_peptide_mapper(&mapper)
        .search(["GFFYTPK", "hsqgtftsdysk", "GFFYTPK", "WWWWWW"])
        .unwrap();
    assert_eq!(result.peptides.input.len(), 3);
    assert_eq!(result.peptides.matched.len(), 2);
    assert_eq!(result.peptides.hit.len(), 2);
    assert_eq!(
        result.proteins.hit.iter().collect::<Vec<_>>(),
        vec!["P01275", "P01308"]
    );
    assert_eq!(result.records.len(), 2);
}

#[test]
fn idempotent_tables() {
    let graph = graph();
    let settings = SearchSettings {
        top_level_pathways: true,
        ..SearchSettings::new(InputType::Gene)
    };
    let rows = ["INS", "INSR", "GCG", "INS", "UNKNOWN"];
    let first = tables(&graph, settings, &rows);
    let second = tables(&graph, settings, &rows);
    assert_eq!(first, second);
    assert_eq!(first.1.lines().count(), 4);
}

#[test]
fn binomial_enrichment() {
    let pathway = |id: &str| PathwayRecord {
        id: id.to_string(),
        name: id.to_string(),
        entities_total: 100,
        reactions_total: 1,
        top_level_pathways: Vec::new(),
    };
    let reaction = |id: &str| ReactionRecord {
        id: id.to_string(),
        name: id.to_string(),
    };
    let proteins = (1..=20).map(|i| format!("P{i:05}")).collect::<Vec<_>>();
    let graph = ReferenceGraph::from_snapshot(&Snapshot {
        reactions: vec![reaction("R-A"), reaction("R-B")],
        pathways: vec![pathway("PW-A"), pathway("PW-B")],
        reaction_pathways: [
            ("R-A".to_string(), vec!["PW-A".to_string()]),
            ("R-B".to_string(), vec!["PW-B".to_string()]),
        ]
        .into(),
        protein_reactions: proteins
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let reaction = if i < 5 { "R-A" } else { "R-B" };
                (p.clone(), vec![reaction.to_string()])
            })
            .collect(),
        protein_population: 1000,
        ..Snapshot::default()
    })
    .unwrap();
    let result = SearchContext::new(&graph, SearchSettings::new(InputType::Uniprot))
        .search(&proteins)
        .unwrap();
    assert_eq!(result.hit_entities(), 20);
    let statistics = analyse(&graph, &result).unwrap();
    assert_eq!(graph.pathway(statistics[0].pathway).id, "PW-B");
    let a = statistics[1];
    assert_eq!(graph.pathway(a.pathway).id, "PW-A");
    assert_eq!(a.entities_found, 5);
    assert!((a.p_value - 0.043_174_495_284_462_93).abs() < 1e-10);
    assert!(a.significant());
    // Both are significant so m = 2, PW-A has rank 2
    assert!((a.entities_fdr - a.p_value).abs() < 1e-15);
}

#[test]
fn missing_population() {
    let mut snapshot = Snapshot::open(data("reference.json")).unwrap();
    snapshot.protein_population = 0;
    let graph = ReferenceGraph::from_snapshot(&snapshot).unwrap();
    let result = SearchContext::new(&graph, SearchSettings::new(InputType::Gene))
        .search(["INS"])
        .unwrap();
    assert_eq!(
        analyse(&graph, &result).unwrap_err().get_kind(),
        &PathwayError::PopulationUnavailable
    );
}
