//! Search identifiers in a pathway network and find the over-represented pathways

use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
    process::ExitCode,
    str::FromStr,
};

use clap::Parser;
use context_error::{BoxedError, Context, CreateError, StaticErrorContent};
use directories::ProjectDirs;
use pmcore::{PathwayError, format::ProteoformFormat, matching::MatchType};
use pmsearch::{
    ChromosomeCache, DirectoryChromosomes, ReferenceGraph, Snapshot,
    input::{InputType, read_rows},
    ora::analyse,
    peptide::FastaPeptideMapper,
    report::{write_analysis_table, write_search_table},
    search::{SearchContext, SearchSettings},
};
use tracing_subscriber::EnvFilter;

/// The command line interface arguments
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// The kind of identifiers in the input file (GENE, ENSEMBL, UNIPROT, PROTEOFORM, RSID,
    /// CHRBP, VCF, PEPTIDE, MODIFIED_PEPTIDE), can be left out if given in the settings file
    #[arg(short = 't', long, value_parser = parse::<InputType>)]
    input_type: Option<InputType>,
    /// The input file, one identifier per line
    #[arg(short, long)]
    input: PathBuf,
    /// The directory to write `search.tsv` and `analysis.tsv` into
    #[arg(short, long)]
    output: PathBuf,
    /// The reference graph, JSON (optionally gzip compressed) or a binary cache (`.bin`),
    /// defaults to `reference.json.gz` in the data directory of the application
    #[arg(short, long)]
    graph: Option<PathBuf>,
    /// The directory with the per chromosome variant maps, needed for RSID, CHRBP, and VCF input
    #[arg(short, long)]
    chromosomes: Option<PathBuf>,
    /// The protein sequences, needed for PEPTIDE and MODIFIED_PEPTIDE input
    #[arg(short, long)]
    fasta: Option<PathBuf>,
    /// The policy to match input proteoforms to reference proteoforms
    #[arg(short, long, value_parser = parse::<MatchType>)]
    matching: Option<MatchType>,
    /// The maximal distance between matching proteoform coordinates
    #[arg(long)]
    margin: Option<u64>,
    /// The notation of the proteoforms in the input and the search table (SIMPLE, PRO_FORMA)
    #[arg(long, value_parser = parse::<ProteoformFormat>)]
    proteoform_format: Option<ProteoformFormat>,
    /// Add the top level pathways to every line of the search table
    #[arg(long)]
    top_level_pathways: bool,
    /// A JSON file with the search settings, the other arguments override these settings
    #[arg(short, long)]
    settings: Option<PathBuf>,
    /// Store the reference graph as binary cache at this location, which loads faster next time
    #[arg(long)]
    write_cache: Option<PathBuf>,
}

fn parse<T: FromStr<Err = BoxedError<'static, PathwayError>>>(value: &str) -> Result<T, String> {
    value
        .parse()
        .map_err(|e: BoxedError<'static, PathwayError>| e.get_long_description().to_string())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Cli) -> Result<(), BoxedError<'static, PathwayError>> {
    let settings = settings(args)?;
    let graph_path = match &args.graph {
        Some(path) => path.clone(),
        None => default_graph()?,
    };
    tracing::info!(graph = %graph_path.display(), "loading reference graph");
    let snapshot = Snapshot::open(&graph_path)?;
    if let Some(cache) = &args.write_cache {
        snapshot.write_cache(cache)?;
    }
    let graph = ReferenceGraph::from_snapshot(&snapshot)?;
    drop(snapshot);

    let mapper = args
        .fasta
        .as_ref()
        .map(FastaPeptideMapper::from_file)
        .transpose()?;
    let mut context = SearchContext::new(&graph, settings);
    if let Some(directory) = &args.chromosomes {
        context = context.with_chromosomes(ChromosomeCache::new(DirectoryChromosomes::new(
            directory,
        )));
    }
    if let Some(mapper) = &mapper {
        context = context.with_peptide_mapper(mapper);
    }

    let rows = read_rows(&args.input)?;
    let result = context.search(&rows)?;
    let statistics = analyse(&graph, &result)?;

    std::fs::create_dir_all(&args.output).map_err(|e| {
        BoxedError::new(
            PathwayError::Io,
            "Could not create output directory",
            e.to_string(),
            Context::default()
                .source(args.output.to_string_lossy())
                .to_owned(),
        )
    })?;
    write_search_table(create(&args.output.join("search.tsv"))?, &graph, &result)?;
    write_analysis_table(
        create(&args.output.join("analysis.tsv"))?,
        &graph,
        &result,
        &statistics,
    )?;

    for diagnostic in result.errors().chain(result.warnings()) {
        println!("{diagnostic}");
    }
    println!(
        "Searched {} rows, {} were skipped. Found {} pathways, {} of them significant.",
        rows.len(),
        result.skipped,
        statistics.len(),
        statistics.iter().filter(|s| s.significant()).count()
    );
    Ok(())
}

/// The settings from the settings file (if given) overridden by the arguments
fn settings(args: &Cli) -> Result<SearchSettings, BoxedError<'static, PathwayError>> {
    let mut settings = match &args.settings {
        Some(path) => SearchSettings::from_file(path)?,
        None => {
            let input_type = args.input_type.ok_or_else(|| {
                BoxedError::new(
                    PathwayError::InvalidSettings,
                    "Missing input type",
                    "Give the input type with --input-type or in a settings file",
                    Context::none(),
                )
            })?;
            SearchSettings::new(input_type)
        }
    };
    if let Some(input_type) = args.input_type {
        settings.input_type = input_type;
    }
    if let Some(matching) = args.matching {
        settings.matching = matching;
    }
    if let Some(margin) = args.margin {
        settings.margin = margin;
    }
    if let Some(format) = args.proteoform_format {
        settings.proteoform_format = format;
    }
    settings.top_level_pathways |= args.top_level_pathways;
    Ok(settings)
}

fn default_graph() -> Result<PathBuf, BoxedError<'static, PathwayError>> {
    ProjectDirs::from("org", "reactome", "PathwayMatcher")
        .map(|dirs| dirs.data_dir().join("reference.json.gz"))
        .ok_or_else(|| {
            BoxedError::new(
                PathwayError::SnapshotMissing,
                "No reference graph",
                "The data directory of the application could not be determined, give the reference graph with --graph",
                Context::none(),
            )
        })
}

fn create(path: &Path) -> Result<BufWriter<File>, BoxedError<'static, PathwayError>> {
    File::create(path).map(BufWriter::new).map_err(|e| {
        BoxedError::new(
            PathwayError::Io,
            "Could not create output file",
            e.to_string(),
            Context::default().source(path.to_string_lossy()).to_owned(),
        )
    })
}
