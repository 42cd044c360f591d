//! Textual notations for proteoforms.
//!
//! * `SIMPLE`: `P01308-1;00798:31,00798:43`, optionally with a range `P01308-1;25-110;00798:31`
//! * `PRO_FORMA` (Protein Ontology notation): `UniProtKB:P01308-1, 25-110, Cys-31, MOD:00798|Cys-43, MOD:00798`
//!
//! Unknown coordinates are written as `null`, when parsing `?` and `-1` are also accepted.

use context_error::{BoxedError, Context, CreateError};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{PathwayError, Proteoform, Ptm};

/// A textual notation for proteoforms
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProteoformFormat {
    /// `ACCESSION;[START-END;]MOD:SITE,MOD:SITE`
    #[default]
    Simple,
    /// `UniProtKB:ACCESSION, START-END, Res-SITE, MOD:ID|Res-SITE, MOD:ID`
    ProForma,
}

const UNIPROT_PREFIX: &str = "UniProtKB:";
const MOD_PREFIX: &str = "MOD:";

impl ProteoformFormat {
    /// All formats
    pub const ALL: [Self; 2] = [Self::Simple, Self::ProForma];

    /// The name as used in settings and on the command line
    pub const fn name(self) -> &'static str {
        match self {
            Self::Simple => "SIMPLE",
            Self::ProForma => "PRO_FORMA",
        }
    }

    /// Parse a proteoform in this notation.
    /// # Errors
    /// If the text is not a valid proteoform in this notation.
    pub fn parse(self, text: &str) -> Result<Proteoform, BoxedError<'static, PathwayError>> {
        self.parse_line(text, None)
    }

    /// Parse a proteoform in this notation where the text is the full line at the given line
    /// index, used to give better error messages.
    /// # Errors
    /// If the text is not a valid proteoform in this notation.
    pub fn parse_line(
        self,
        text: &str,
        line_index: Option<u32>,
    ) -> Result<Proteoform, BoxedError<'static, PathwayError>> {
        let parser = Parser { text, line_index };
        match self {
            Self::Simple => parser.simple(),
            Self::ProForma => parser.pro_forma(),
        }
    }

    /// Display a proteoform in this notation
    pub const fn display(self, proteoform: &Proteoform) -> Notation<'_> {
        Notation {
            format: self,
            proteoform,
        }
    }
}

impl std::fmt::Display for ProteoformFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ProteoformFormat {
    type Err = BoxedError<'static, PathwayError>;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_ascii_uppercase().replace('-', "_");
        match normalised.as_str() {
            "SIMPLE" => Ok(Self::Simple),
            "PRO_FORMA" | "PROFORMA" | "PRO" => Ok(Self::ProForma),
            _ => Err(BoxedError::new(
                PathwayError::InvalidSettings,
                "Unknown proteoform format",
                "Use one of: SIMPLE, PRO_FORMA",
                Context::show(s.to_string()),
            )),
        }
    }
}

/// A proteoform displayed in a specific notation, see [`ProteoformFormat::display`]
#[derive(Clone, Copy, Debug)]
pub struct Notation<'a> {
    format: ProteoformFormat,
    proteoform: &'a Proteoform,
}

struct Coordinate(Option<i64>);

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(c) => write!(f, "{c}"),
            None => write!(f, "null"),
        }
    }
}

impl std::fmt::Display for Notation<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let p = self.proteoform;
        match self.format {
            ProteoformFormat::Simple => {
                write!(f, "{};", p.isoform_accession())?;
                if p.start().is_some() || p.end().is_some() {
                    write!(f, "{}-{};", Coordinate(p.start()), Coordinate(p.end()))?;
                }
                write!(f, "{}", p.ptms().iter().join(","))
            }
            ProteoformFormat::ProForma => {
                write!(
                    f,
                    "{UNIPROT_PREFIX}{}, {}-{}",
                    p.isoform_accession(),
                    Coordinate(p.start()),
                    Coordinate(p.end())
                )?;
                if !p.ptms().is_empty() {
                    write!(
                        f,
                        ", {}",
                        p.ptms()
                            .iter()
                            .map(|ptm| format!(
                                "Xaa-{}, {MOD_PREFIX}{}",
                                Coordinate(ptm.site),
                                ptm.modification
                            ))
                            .join("|")
                    )?;
                }
                Ok(())
            }
        }
    }
}

/// Proteoforms display in the `SIMPLE` notation
impl std::fmt::Display for Proteoform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", ProteoformFormat::Simple.display(self))
    }
}

/// Parse a comma separated list of `MOD:SITE` modifications, as used in the `SIMPLE` notation
/// and for modified peptides.
/// # Errors
/// If any of the modifications is not valid.
pub fn parse_ptm_list(text: &str) -> Result<Vec<Ptm>, BoxedError<'static, PathwayError>> {
    Parser {
        text,
        line_index: None,
    }
    .ptm_list(text)
}

struct Parser<'a> {
    text: &'a str,
    line_index: Option<u32>,
}

impl<'a> Parser<'a> {
    /// Generate an error pointing at the given part of the full text
    fn error(
        &self,
        part: &str,
        short: &'static str,
        long: impl Into<String>,
    ) -> BoxedError<'static, PathwayError> {
        let context = if self.text.is_empty() {
            Context::none()
        } else {
            let offset = part
                .as_ptr()
                .addr()
                .saturating_sub(self.text.as_ptr().addr())
                .min(self.text.len() - 1);
            let length = part.len().clamp(1, self.text.len() - offset);
            Context::line(self.line_index, self.text, offset, length)
        };
        BoxedError::new(
            PathwayError::InvalidProteoform,
            short,
            long.into(),
            context.to_owned(),
        )
    }

    fn accession(&self, part: &'a str) -> Result<&'a str, BoxedError<'static, PathwayError>> {
        let part = part.trim();
        if part.is_empty() {
            Err(self.error(part, "Missing accession", "A proteoform needs a protein accession"))
        } else if let Some(c) = part
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        {
            Err(self.error(
                part,
                "Invalid accession",
                format!("The character '{c}' is not allowed in an accession"),
            ))
        } else {
            Ok(part)
        }
    }

    fn coordinate(&self, part: &str) -> Result<Option<i64>, BoxedError<'static, PathwayError>> {
        let part = part.trim();
        match part {
            "null" | "NULL" | "?" | "-1" => Ok(None),
            _ => part
                .parse::<i64>()
                .ok()
                .filter(|c| *c >= 0)
                .map(Some)
                .ok_or_else(|| {
                    self.error(
                        part,
                        "Invalid coordinate",
                        "A coordinate has to be a positive number or 'null' when unknown",
                    )
                }),
        }
    }

    fn range(
        &self,
        part: &str,
    ) -> Result<(Option<i64>, Option<i64>), BoxedError<'static, PathwayError>> {
        let trimmed = part.trim();
        let (start, end) = trimmed.split_once('-').ok_or_else(|| {
            self.error(trimmed, "Invalid range", "A range has to be written as 'START-END'")
        })?;
        Ok((self.coordinate(start)?, self.coordinate(end)?))
    }

    fn modification(&self, part: &str) -> Result<String, BoxedError<'static, PathwayError>> {
        let part = part.trim();
        if part.is_empty() || part.contains(char::is_whitespace) {
            Err(self.error(
                part,
                "Invalid modification",
                "A modification type cannot be empty or contain whitespace",
            ))
        } else {
            Ok(part.to_string())
        }
    }

    fn ptm_list(&self, part: &str) -> Result<Vec<Ptm>, BoxedError<'static, PathwayError>> {
        if part.trim().is_empty() {
            return Ok(Vec::new());
        }
        part.split(',')
            .map(|ptm| {
                let (modification, site) = ptm.split_once(':').ok_or_else(|| {
                    self.error(
                        ptm,
                        "Invalid modification",
                        "A modification has to be written as 'MOD:SITE', use 'null' for an unknown site",
                    )
                })?;
                Ok(Ptm::new(self.modification(modification)?, self.coordinate(site)?))
            })
            .collect()
    }

    fn simple(&self) -> Result<Proteoform, BoxedError<'static, PathwayError>> {
        let mut parts = self.text.split(';');
        let accession = parts.next().unwrap_or_default();
        let (range, ptms) = match (parts.next(), parts.next()) {
            (None, _) => (None, ""),
            (Some(ptms), None) => (None, ptms),
            (Some(range), Some(ptms)) => (Some(range), ptms),
        };
        if let Some(extra) = parts.next() {
            return Err(self.error(
                extra,
                "Invalid proteoform",
                "A proteoform in the SIMPLE notation has at most three ';' separated parts",
            ));
        }
        let (start, end) = range.map_or(Ok((None, None)), |r| self.range(r))?;
        Ok(Proteoform::new(self.accession(accession)?)
            .with_range(start, end)
            .with_ptms(self.ptm_list(ptms)?))
    }

    fn pro_forma(&self) -> Result<Proteoform, BoxedError<'static, PathwayError>> {
        let text = self.text.trim_start();
        let Some(rest) = text.strip_prefix(UNIPROT_PREFIX) else {
            return Err(self.error(
                text.get(..UNIPROT_PREFIX.len()).unwrap_or(text),
                "Invalid proteoform",
                format!("A proteoform in the PRO_FORMA notation starts with '{UNIPROT_PREFIX}'"),
            ));
        };
        let (accession, rest) = rest.split_once(',').unwrap_or((rest, ""));
        let mut proteoform = Proteoform::new(self.accession(accession)?);
        if rest.trim().is_empty() {
            return Ok(proteoform);
        }
        let (range, ptms) = rest.split_once(',').unwrap_or((rest, ""));
        let (start, end) = self.range(range)?;
        proteoform = proteoform.with_range(start, end);
        if ptms.trim().is_empty() {
            return Ok(proteoform);
        }
        let ptms = ptms
            .split('|')
            .map(|ptm| {
                let (location, modification) = ptm.split_once(',').ok_or_else(|| {
                    self.error(
                        ptm,
                        "Invalid modification",
                        "A modification has to be written as 'Res-SITE, MOD:ID'",
                    )
                })?;
                let (residue, site) = location.split_once('-').ok_or_else(|| {
                    self.error(
                        location,
                        "Invalid modification site",
                        "A modification site has to be written as 'Res-SITE', for example 'Ser-22'",
                    )
                })?;
                if !residue.trim().chars().all(|c| c.is_ascii_alphabetic()) {
                    return Err(self.error(
                        residue,
                        "Invalid residue",
                        "A residue has to be written as its three letter code",
                    ));
                }
                let modification = modification.trim();
                let id = modification.strip_prefix(MOD_PREFIX).ok_or_else(|| {
                    self.error(
                        modification,
                        "Invalid modification",
                        format!("A modification has to be prefixed with '{MOD_PREFIX}'"),
                    )
                })?;
                Ok(Ptm::new(self.modification(id)?, self.coordinate(site)?))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(proteoform.with_ptms(ptms))
    }
}
