//! The input categories and the parsing of input rows.

use std::{io::BufRead, path::Path, sync::LazyLock};

use context_error::{BoxedError, Context, CreateError, StaticErrorContent};
use itertools::Itertools;
use pmcore::{PathwayError, Proteoform, Ptm, format::{ProteoformFormat, parse_ptm_list}};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    graph::normalise_chromosome,
    helper_functions::{open_file, strip_bom},
};

/// The kind of identifiers in an input file, every row of the file contains one identifier.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InputType {
    /// Gene names, `INS`
    Gene,
    /// Ensembl identifiers, `ENSG00000254647`
    Ensembl,
    /// UniProt accessions, optionally with isoform, `P01308-1`
    #[default]
    Uniprot,
    /// Proteoforms in the configured notation
    Proteoform,
    /// Variant identifiers, `rs1234`
    Rsid,
    /// Chromosome and base pair, `chr1:12345`
    #[serde(rename = "CHRBP")]
    ChrBp,
    /// Lines of a VCF file, the first two columns are chromosome and position
    Vcf,
    /// Amino acid sequences
    Peptide,
    /// Amino acid sequences with modifications, `PEPTIDE;00046:3`
    ModifiedPeptide,
}

static GENE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._@/-]*$").unwrap());
static ENSEMBL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ENS[A-Z]*[EGPT]\d{11}(\.\d+)?$").unwrap());
static UNIPROT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^([OPQ][0-9][A-Z0-9]{3}[0-9]|[A-NR-Z][0-9]([A-Z][A-Z0-9]{2}[0-9]){1,2})(-\d+)?$",
    )
    .unwrap()
});
static RSID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^rs\d+$").unwrap());
static CHRBP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[Cc][Hh][Rr])?([0-9]{1,2}|[XxYy]|[Mm][Tt]?)(?::|\s+)(\d+)$").unwrap()
});
static PEPTIDE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ACDEFGHIKLMNPQRSTVWYUO]+$").unwrap());

impl InputType {
    /// All input types
    pub const ALL: [Self; 9] = [
        Self::Gene,
        Self::Ensembl,
        Self::Uniprot,
        Self::Proteoform,
        Self::Rsid,
        Self::ChrBp,
        Self::Vcf,
        Self::Peptide,
        Self::ModifiedPeptide,
    ];

    /// The name as used in settings and on the command line
    pub const fn name(self) -> &'static str {
        match self {
            Self::Gene => "GENE",
            Self::Ensembl => "ENSEMBL",
            Self::Uniprot => "UNIPROT",
            Self::Proteoform => "PROTEOFORM",
            Self::Rsid => "RSID",
            Self::ChrBp => "CHRBP",
            Self::Vcf => "VCF",
            Self::Peptide => "PEPTIDE",
            Self::ModifiedPeptide => "MODIFIED_PEPTIDE",
        }
    }

    /// If the search for this input type is done on proteoforms instead of proteins
    pub const fn is_proteoform_level(self) -> bool {
        matches!(self, Self::Proteoform | Self::ModifiedPeptide)
    }

    /// The columns identifying the matched entity in the search table, these come before the
    /// reaction and pathway columns
    pub const fn identifier_columns(self) -> &'static [&'static str] {
        match self {
            Self::Gene => &["GENE", "UNIPROT"],
            Self::Ensembl => &["ENSEMBL", "UNIPROT"],
            Self::Uniprot | Self::Peptide => &["UNIPROT"],
            Self::Proteoform | Self::ModifiedPeptide => {
                &["PROTEOFORM", "REFERENCE_PROTEOFORM", "UNIPROT"]
            }
            Self::Rsid => &["RSID", "UNIPROT"],
            Self::ChrBp | Self::Vcf => &["CHROMOSOME", "BASE_PAIR", "UNIPROT"],
        }
    }

    /// Parse a single input row. The line index is only used for the error messages.
    ///
    /// Returns `Ok(None)` for rows that are ignored without a warning (VCF header lines).
    /// # Errors
    /// An [`PathwayError::EmptyRow`] or [`PathwayError::InvalidRow`] warning if the row is
    /// empty or does not follow the syntax of this input type. In both cases the row should be
    /// skipped.
    pub fn parse_row(
        self,
        row: &str,
        line_index: usize,
        format: ProteoformFormat,
    ) -> Result<Option<Identifier>, BoxedError<'static, PathwayError>> {
        let line = strip_bom(row).trim();
        if line.is_empty() {
            return Err(BoxedError::new(
                PathwayError::EmptyRow,
                "Empty row",
                "This row is empty and is skipped",
                Context::none().line_index(line_index as u32),
            ));
        }
        let invalid = |long: String| {
            BoxedError::new(
                PathwayError::InvalidRow,
                "Invalid row",
                long,
                Context::full_line(line_index as u32, line).to_owned(),
            )
        };
        let syntax = || {
            invalid(format!(
                "This row is not a valid {} identifier and is skipped",
                self.name()
            ))
        };
        Ok(Some(match self {
            Self::Gene if GENE.is_match(line) => Identifier::Gene(line.to_string()),
            Self::Ensembl if ENSEMBL.is_match(line) => Identifier::Ensembl(line.to_string()),
            Self::Uniprot if UNIPROT.is_match(line) => Identifier::Uniprot(line.to_string()),
            Self::Rsid if RSID.is_match(line) => Identifier::Rsid(line.to_string()),
            Self::ChrBp => {
                let captures = CHRBP.captures(line).ok_or_else(syntax)?;
                position(&captures[1], &captures[2]).ok_or_else(syntax)?
            }
            Self::Vcf => {
                if line.starts_with('#') {
                    return Ok(None);
                }
                let mut columns = line.split_whitespace();
                match (columns.next(), columns.next()) {
                    (Some(chromosome), Some(base_pair)) => {
                        position(chromosome, base_pair).ok_or_else(syntax)?
                    }
                    _ => return Err(syntax()),
                }
            }
            Self::Peptide => {
                let sequence = line.to_ascii_uppercase();
                if !PEPTIDE.is_match(&sequence) {
                    return Err(syntax());
                }
                Identifier::Peptide(sequence)
            }
            Self::ModifiedPeptide => {
                let (sequence, ptms) = line.split_once(';').unwrap_or((line, ""));
                let sequence = sequence.trim().to_ascii_uppercase();
                if !PEPTIDE.is_match(&sequence) {
                    return Err(syntax());
                }
                let mut ptms = parse_ptm_list(ptms).map_err(|e| {
                    invalid(format!(
                        "The modifications of this peptide are invalid: {}",
                        e.get_long_description()
                    ))
                })?;
                ptms.sort();
                if let Some(ptm) = ptms.iter().find(|p| {
                    p.site
                        .is_some_and(|s| s < 1 || s > sequence.len() as i64)
                }) {
                    return Err(invalid(format!(
                        "The modification {ptm} is placed outside of the peptide, sites are counted from 1"
                    )));
                }
                Identifier::ModifiedPeptide { sequence, ptms }
            }
            Self::Proteoform => Identifier::Proteoform(
                format
                    .parse_line(line, Some(line_index as u32))
                    .map_err(|e| invalid(e.get_long_description().to_string()))?,
            ),
            Self::Gene | Self::Ensembl | Self::Uniprot | Self::Rsid => return Err(syntax()),
        }))
    }
}

/// Parse a chromosome and base pair
fn position(chromosome: &str, base_pair: &str) -> Option<Identifier> {
    Some(Identifier::Position {
        chromosome: normalise_chromosome(chromosome)?.to_string(),
        base_pair: base_pair.parse().ok()?,
    })
}

impl std::fmt::Display for InputType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for InputType {
    type Err = BoxedError<'static, PathwayError>;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_ascii_uppercase().replace('-', "_");
        let normalised = match normalised.as_str() {
            "CHR_BP" => "CHRBP",
            "UNIPROTKB" | "PROTEIN" => "UNIPROT",
            "GENES" => "GENE",
            other => other,
        };
        Self::ALL
            .into_iter()
            .find(|t| t.name() == normalised)
            .ok_or_else(|| {
                BoxedError::new(
                    PathwayError::InvalidSettings,
                    "Unknown input type",
                    format!("Use one of: {}", Self::ALL.map(Self::name).join(", ")),
                    Context::show(s.to_string()),
                )
            })
    }
}

/// A single parsed input identifier
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Identifier {
    /// A gene name
    Gene(String),
    /// An Ensembl identifier
    Ensembl(String),
    /// A UniProt accession, possibly with isoform tag
    Uniprot(String),
    /// A proteoform
    Proteoform(Proteoform),
    /// A rsID
    Rsid(String),
    /// A genomic position, from `CHRBP` or `VCF` input
    Position {
        /// The normalised chromosome
        chromosome: String,
        /// The base pair
        base_pair: u64,
    },
    /// A peptide sequence
    Peptide(String),
    /// A peptide sequence with modifications, the sites are counted from 1 on the peptide
    ModifiedPeptide {
        /// The upper case sequence
        sequence: String,
        /// The modifications, sorted
        ptms: Vec<Ptm>,
    },
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gene(s)
            | Self::Ensembl(s)
            | Self::Uniprot(s)
            | Self::Rsid(s)
            | Self::Peptide(s) => write!(f, "{s}"),
            Self::Proteoform(p) => write!(f, "{p}"),
            Self::Position {
                chromosome,
                base_pair,
            } => write!(f, "{chromosome}:{base_pair}"),
            Self::ModifiedPeptide { sequence, ptms } => {
                write!(f, "{sequence};{}", ptms.iter().join(","))
            }
        }
    }
}

/// Read all rows of an input file, gzip compressed if the extension is `.gz`. The rows are
/// returned as is, see [`InputType::parse_row`] for their interpretation.
/// # Errors
/// If the file could not be opened or read.
pub fn read_rows(path: impl AsRef<Path>) -> Result<Vec<String>, BoxedError<'static, PathwayError>> {
    let path = path.as_ref();
    open_file(path, PathwayError::Io)?
        .lines()
        .enumerate()
        .map(|(line_index, line)| {
            line.map_err(|e| {
                BoxedError::new(
                    PathwayError::Io,
                    "Could not read input",
                    e.to_string(),
                    Context::default()
                        .source(path.to_string_lossy())
                        .line_index(line_index as u32)
                        .to_owned(),
                )
            })
        })
        .collect()
}
