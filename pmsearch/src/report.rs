//! Write the search and analysis tables as tab separated files.

use std::io::Write;

use context_error::{BoxedError, Context, CreateError};
use itertools::Itertools;
use pmcore::PathwayError;

use crate::{
    graph::ReferenceGraph,
    ora::PathwayStatistics,
    search::SearchResult,
};

/// The columns of the analysis table
pub const ANALYSIS_COLUMNS: [&str; 13] = [
    "Pathway StId",
    "Pathway Name",
    "# Entities Found",
    "# Entities Total",
    "Entities Ratio",
    "Entities P-Value",
    "Significant (p < 0.05)",
    "Entities FDR",
    "# Reactions Found",
    "# Reactions Total",
    "Reactions Ratio",
    "Submitted Entities Found",
    "Mapped Reactions Found",
];

const REACTION_COLUMNS: [&str; 4] = [
    "REACTION_STID",
    "REACTION_DISPLAY_NAME",
    "PATHWAY_STID",
    "PATHWAY_DISPLAY_NAME",
];

const TOP_LEVEL_COLUMNS: [&str; 2] = ["TOP_LEVEL_PATHWAY_STID", "TOP_LEVEL_PATHWAY_DISPLAY_NAME"];

fn io_error(error: &std::io::Error, table: &str) -> BoxedError<'static, PathwayError> {
    BoxedError::new(
        PathwayError::Io,
        "Could not write report",
        format!("Writing the {table} table failed: {error}"),
        Context::none(),
    )
}

/// Write the search table, one line per record, in the order the records were found. The
/// top level pathway columns are present if the search collected top level pathways.
/// # Errors
/// If the writer fails.
pub fn write_search_table(
    writer: impl Write,
    graph: &ReferenceGraph,
    result: &SearchResult,
) -> Result<(), BoxedError<'static, PathwayError>> {
    search_table(writer, graph, result).map_err(|e| io_error(&e, "search"))
}

fn search_table(
    mut writer: impl Write,
    graph: &ReferenceGraph,
    result: &SearchResult,
) -> std::io::Result<()> {
    let top_level: &[&str] = if result.top_level_pathways {
        &TOP_LEVEL_COLUMNS
    } else {
        &[]
    };
    writeln!(
        writer,
        "{}",
        result
            .input_type
            .identifier_columns()
            .iter()
            .chain(REACTION_COLUMNS.iter())
            .chain(top_level)
            .join("\t")
    )?;
    for record in &result.records {
        let reaction = graph.reaction(record.reaction);
        let pathway = graph.pathway(record.pathway);
        write!(
            writer,
            "{}\t{}\t{}\t{}\t{}",
            record.identifiers.iter().join("\t"),
            reaction.id,
            reaction.name,
            pathway.id,
            pathway.name
        )?;
        if result.top_level_pathways {
            let top = graph.pathway(record.top_level.unwrap_or(record.pathway));
            write!(writer, "\t{}\t{}", top.id, top.name)?;
        }
        writeln!(writer)?;
    }
    writer.flush()
}

/// Write the analysis table, one line per pathway in the order of the given statistics.
/// # Errors
/// If the writer fails.
pub fn write_analysis_table(
    writer: impl Write,
    graph: &ReferenceGraph,
    result: &SearchResult,
    statistics: &[PathwayStatistics],
) -> Result<(), BoxedError<'static, PathwayError>> {
    analysis_table(writer, graph, result, statistics).map_err(|e| io_error(&e, "analysis"))
}

fn analysis_table(
    mut writer: impl Write,
    graph: &ReferenceGraph,
    result: &SearchResult,
    statistics: &[PathwayStatistics],
) -> std::io::Result<()> {
    writeln!(writer, "{}", ANALYSIS_COLUMNS.join("\t"))?;
    for s in statistics {
        let pathway = graph.pathway(s.pathway);
        let (entities, reactions) = result
            .pathways
            .get(&s.pathway)
            .map(|hits| {
                (
                    hits.entities_found.iter().join(";"),
                    hits.reactions_found
                        .iter()
                        .map(|r| &graph.reaction(*r).id)
                        .join(";"),
                )
            })
            .unwrap_or_default();
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{entities}\t{reactions}",
            pathway.id,
            pathway.name,
            s.entities_found,
            s.entities_total,
            s.entities_ratio,
            s.p_value,
            if s.significant() { "Yes" } else { "No" },
            s.entities_fdr,
            s.reactions_found,
            s.reactions_total,
            s.reactions_ratio,
        )?;
    }
    writer.flush()
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;
    use crate::{
        graph::{PathwayRecord, ReactionRecord, Snapshot},
        input::InputType,
        search::{SearchContext, SearchSettings},
    };

    fn graph() -> ReferenceGraph {
        ReferenceGraph::from_snapshot(&Snapshot {
            reactions: vec![ReactionRecord {
                id: "R-HSA-1".to_string(),
                name: "Binding".to_string(),
            }],
            pathways: vec![
                PathwayRecord {
                    id: "R-HSA-10".to_string(),
                    name: "Signalling".to_string(),
                    entities_total: 2,
                    reactions_total: 1,
                    top_level_pathways: vec!["R-HSA-100".to_string()],
                },
                PathwayRecord {
                    id: "R-HSA-100".to_string(),
                    name: "Top".to_string(),
                    entities_total: 4,
                    reactions_total: 1,
                    top_level_pathways: Vec::new(),
                },
            ],
            reaction_pathways: [("R-HSA-1".to_string(), vec!["R-HSA-10".to_string()])].into(),
            genes: [("INS".to_string(), vec!["P00001".to_string()])].into(),
            protein_reactions: [("P00001".to_string(), vec!["R-HSA-1".to_string()])].into(),
            protein_population: 10,
            ..Snapshot::default()
        })
        .unwrap()
    }

    fn table(settings: SearchSettings) -> String {
        let graph = graph();
        let result = SearchContext::new(&graph, settings)
            .search(["INS"])
            .unwrap();
        let mut buffer = Vec::new();
        write_search_table(&mut buffer, &graph, &result).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn search_records() {
        let settings = SearchSettings::new(InputType::Gene);
        assert_eq!(
            table(settings),
            "GENE\tUNIPROT\tREACTION_STID\tREACTION_DISPLAY_NAME\tPATHWAY_STID\tPATHWAY_DISPLAY_NAME\n\
             INS\tP00001\tR-HSA-1\tBinding\tR-HSA-10\tSignalling\n"
        );
        let settings = SearchSettings {
            top_level_pathways: true,
            ..settings
        };
        assert_eq!(
            table(settings),
            "GENE\tUNIPROT\tREACTION_STID\tREACTION_DISPLAY_NAME\tPATHWAY_STID\tPATHWAY_DISPLAY_NAME\tTOP_LEVEL_PATHWAY_STID\tTOP_LEVEL_PATHWAY_DISPLAY_NAME\n\
             INS\tP00001\tR-HSA-1\tBinding\tR-HSA-10\tSignalling\tR-HSA-100\tTop\n"
        );
    }

    #[test]
    fn columns_follow_the_search() {
        let graph = graph();
        let settings = SearchSettings {
            top_level_pathways: true,
            ..SearchSettings::new(InputType::Gene)
        };
        let mut context = SearchContext::new(&graph, settings);
        let with_top_level = context.search(["INS"]).unwrap();
        let without_top_level = SearchContext::new(&graph, SearchSettings::new(InputType::Gene))
            .search(["INS"])
            .unwrap();
        assert!(with_top_level.top_level_pathways);
        assert!(!without_top_level.top_level_pathways);
        for (result, columns) in [(&with_top_level, 8), (&without_top_level, 6)] {
            let mut buffer = Vec::new();
            write_search_table(&mut buffer, &graph, result).unwrap();
            let text = String::from_utf8(buffer).unwrap();
            assert!(text.lines().all(|line| line.split('\t').count() == columns));
        }
    }

    #[test]
    fn analysis_records() {
        let graph = graph();
        let result = SearchContext::new(&graph, SearchSettings::new(InputType::Gene))
            .search(["INS"])
            .unwrap();
        let statistics = crate::ora::analyse(&graph, &result).unwrap();
        let mut buffer = Vec::new();
        write_analysis_table(&mut buffer, &graph, &result, &statistics).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].split('\t').count(), ANALYSIS_COLUMNS.len());
        let fields = lines[1].split('\t').collect::<Vec<_>>();
        assert_eq!(fields[..5], ["R-HSA-10", "Signalling", "1", "2", "0.5"]);
        let p_value: f64 = fields[5].parse().unwrap();
        assert!((p_value - 0.2).abs() < 1e-12);
        assert_eq!(fields[6..], ["No", "0", "1", "1", "1", "P00001", "R-HSA-1"]);
    }
}
