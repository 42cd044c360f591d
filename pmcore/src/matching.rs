//! Decide if an input proteoform matches a reference proteoform.

use context_error::{BoxedError, Context, CreateError};
use serde::{Deserialize, Serialize};

use crate::{PathwayError, Proteoform, Ptm};

/// The policy used to decide if an input proteoform matches a reference proteoform.
///
/// All policies require the isoform accessions to be identical. The `*NoTypes` variants only
/// look at the site when searching for a modification that is not an exact copy.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchType {
    /// Only the isoform accession has to be identical
    Accession,
    /// Identical modifications, every modification in both has to be found in the other
    Strict,
    /// Every input modification has to be found in the reference
    Subset,
    /// [`Self::Subset`] without checking the modification type
    SubsetNoTypes,
    /// Every reference modification has to be found in the input
    #[default]
    Superset,
    /// [`Self::Superset`] without checking the modification type
    SupersetNoTypes,
    /// At least one reference modification has to be found in the input
    One,
    /// [`Self::One`] without checking the modification type
    OneNoTypes,
}

impl MatchType {
    /// All match types
    pub const ALL: [Self; 8] = [
        Self::Accession,
        Self::Strict,
        Self::Subset,
        Self::SubsetNoTypes,
        Self::Superset,
        Self::SupersetNoTypes,
        Self::One,
        Self::OneNoTypes,
    ];

    /// The name as used in settings and on the command line
    pub const fn name(self) -> &'static str {
        match self {
            Self::Accession => "ACCESSION",
            Self::Strict => "STRICT",
            Self::Subset => "SUBSET",
            Self::SubsetNoTypes => "SUBSET_NO_TYPES",
            Self::Superset => "SUPERSET",
            Self::SupersetNoTypes => "SUPERSET_NO_TYPES",
            Self::One => "ONE",
            Self::OneNoTypes => "ONE_NO_TYPES",
        }
    }

    /// If the flexible search for a modification requires identical modification types
    pub const fn enforces_types(self) -> bool {
        !matches!(
            self,
            Self::SubsetNoTypes | Self::SupersetNoTypes | Self::OneNoTypes
        )
    }

    /// Check if the input proteoform matches the reference proteoform according to this policy.
    /// The margin is the maximal allowed distance between two coordinates (range ends or sites).
    /// # Errors
    /// If either proteoform does not have an accession. This is a broken precondition and not a mismatch.
    pub fn matches(
        self,
        input: &Proteoform,
        reference: &Proteoform,
        margin: u64,
    ) -> Result<bool, BoxedError<'static, PathwayError>> {
        validate(input)?;
        validate(reference)?;
        if input.isoform_accession() != reference.isoform_accession() {
            return Ok(false);
        }
        let types = self.enforces_types();
        let range = || {
            coordinate_matches(input.start(), reference.start(), margin)
                && coordinate_matches(input.end(), reference.end(), margin)
        };
        Ok(match self {
            Self::Accession => true,
            Self::Strict => {
                input.ptms().len() == reference.ptms().len()
                    && reference.ptms().iter().all(|p| input.ptms().contains(p))
                    && input.ptms().iter().all(|p| reference.ptms().contains(p))
            }
            Self::Subset | Self::SubsetNoTypes => {
                range()
                    && input
                        .ptms()
                        .iter()
                        .all(|p| contains_ptm(reference.ptms(), p, margin, types))
            }
            Self::Superset | Self::SupersetNoTypes => {
                range()
                    && reference
                        .ptms()
                        .iter()
                        .all(|p| contains_ptm(input.ptms(), p, margin, types))
            }
            Self::One | Self::OneNoTypes => {
                range()
                    && (reference.ptms().is_empty()
                        || reference
                            .ptms()
                            .iter()
                            .any(|p| contains_ptm(input.ptms(), p, margin, types)))
            }
        })
    }
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for MatchType {
    type Err = BoxedError<'static, PathwayError>;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|m| m.name() == normalised)
            .ok_or_else(|| {
                BoxedError::new(
                    PathwayError::InvalidSettings,
                    "Unknown matching type",
                    format!(
                        "Use one of: {}",
                        Self::ALL.map(Self::name).join(", ")
                    ),
                    Context::show(s.to_string()),
                )
            })
    }
}

/// Check that a proteoform can be matched at all, it needs an accession.
/// # Errors
/// If the proteoform does not have an accession.
pub fn validate(proteoform: &Proteoform) -> Result<(), BoxedError<'static, PathwayError>> {
    if proteoform.has_accession() {
        Ok(())
    } else {
        Err(BoxedError::new(
            PathwayError::InvalidInput,
            "Proteoform without accession",
            "This proteoform does not have an accession so it cannot be matched",
            Context::show(proteoform.to_string()),
        ))
    }
}

/// Check if two coordinates match. An unknown coordinate on either side matches anything,
/// otherwise the coordinates can be at most `margin` apart.
pub const fn coordinate_matches(a: Option<i64>, b: Option<i64>, margin: u64) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a == b || a.abs_diff(b) <= margin,
        _ => true,
    }
}

/// Find the modification in the pool, first as an exact copy, then allowing the site to be
/// within the margin (and if types are not enforced any modification type).
fn contains_ptm(pool: &[Ptm], ptm: &Ptm, margin: u64, types: bool) -> bool {
    pool.contains(ptm)
        || pool.iter().any(|candidate| {
            (!types || candidate.modification == ptm.modification)
                && coordinate_matches(candidate.site, ptm.site, margin)
        })
}
