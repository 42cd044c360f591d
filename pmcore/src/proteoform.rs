use std::{
    cmp::Ordering,
    hash::{Hash, Hasher},
};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thin_vec::ThinVec;

/// A single post translational modification: the modification type (a PSI-MOD identifier
/// like `00046`) and the site it is placed on, if known.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Ptm {
    /// The modification type
    pub modification: String,
    /// The 1 based site on the protein, `None` if unknown
    pub site: Option<i64>,
}

impl Ptm {
    /// Create a new modification
    pub fn new(modification: impl Into<String>, site: Option<i64>) -> Self {
        Self {
            modification: modification.into(),
            site,
        }
    }

    /// Get this modification with its site shifted by the given offset, an unknown site stays unknown
    #[must_use]
    pub fn shifted(&self, offset: i64) -> Self {
        Self {
            modification: self.modification.clone(),
            site: self.site.map(|s| s + offset),
        }
    }
}

impl std::fmt::Display for Ptm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.site {
            Some(site) => write!(f, "{}:{site}", self.modification),
            None => write!(f, "{}:null", self.modification),
        }
    }
}

/// A specific form of a protein: the (isoform) accession, an optional subsequence range and
/// the list of modifications.
///
/// Equality is defined as: identical isoform accession, start, and end, an identical number
/// of modifications, and every modification of one found in the other. Note that this is not
/// multiset equality, `[A, A, B]` and `[A, B, B]` are considered equal.
#[derive(Clone, Debug)]
pub struct Proteoform {
    accession: String,
    isoform: String,
    start: Option<i64>,
    end: Option<i64>,
    ptms: ThinVec<Ptm>,
}

/// Strip a trailing isoform tag (`-<digits>`) from an accession.
pub fn strip_isoform(accession: &str) -> &str {
    match accession.rsplit_once('-') {
        Some((base, tag))
            if !base.is_empty() && !tag.is_empty() && tag.bytes().all(|b| b.is_ascii_digit()) =>
        {
            base
        }
        _ => accession,
    }
}

impl Proteoform {
    /// Create a proteoform without range or modifications for the given (isoform) accession.
    pub fn new(isoform_accession: impl Into<String>) -> Self {
        let isoform = isoform_accession.into();
        Self {
            accession: strip_isoform(&isoform).to_string(),
            isoform,
            start: None,
            end: None,
            ptms: ThinVec::new(),
        }
    }

    /// Set the subsequence range
    #[must_use]
    pub const fn with_range(mut self, start: Option<i64>, end: Option<i64>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// Add all given modifications
    #[must_use]
    pub fn with_ptms(mut self, ptms: impl IntoIterator<Item = Ptm>) -> Self {
        self.ptms.extend(ptms);
        self.ptms.sort();
        self
    }

    /// Add a modification, the modifications are kept sorted
    pub fn add_ptm(&mut self, ptm: Ptm) {
        self.ptms.push(ptm);
        self.ptms.sort();
    }

    /// The base accession, without isoform tag
    pub fn accession(&self) -> &str {
        &self.accession
    }

    /// The accession including the isoform tag if present
    pub fn isoform_accession(&self) -> &str {
        &self.isoform
    }

    /// Check that there is an accession at all
    pub fn has_accession(&self) -> bool {
        !self.isoform.is_empty()
    }

    /// The start of the subsequence range
    pub const fn start(&self) -> Option<i64> {
        self.start
    }

    /// The end of the subsequence range
    pub const fn end(&self) -> Option<i64> {
        self.end
    }

    /// All modifications, sorted
    pub fn ptms(&self) -> &[Ptm] {
        &self.ptms
    }
}

impl PartialEq for Proteoform {
    fn eq(&self, other: &Self) -> bool {
        self.isoform == other.isoform
            && self.start == other.start
            && self.end == other.end
            && self.ptms.len() == other.ptms.len()
            && self.ptms.iter().all(|p| other.ptms.contains(p))
            && other.ptms.iter().all(|p| self.ptms.contains(p))
    }
}

impl Eq for Proteoform {}

impl Hash for Proteoform {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.isoform.hash(state);
        self.start.hash(state);
        self.end.hash(state);
        self.ptms.len().hash(state);
        // Equal proteoforms share the set of distinct modifications, not the multiplicities
        for ptm in self.ptms.iter().dedup() {
            ptm.hash(state);
        }
    }
}

impl PartialOrd for Proteoform {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Proteoform {
    /// Orders on the same key as equality and hashing: the distinct modifications, not their
    /// multiplicities.
    fn cmp(&self, other: &Self) -> Ordering {
        self.accession
            .cmp(&other.accession)
            .then_with(|| self.isoform.cmp(&other.isoform))
            .then_with(|| self.start.cmp(&other.start))
            .then_with(|| self.end.cmp(&other.end))
            .then_with(|| self.ptms.len().cmp(&other.ptms.len()))
            .then_with(|| self.ptms.iter().dedup().cmp(other.ptms.iter().dedup()))
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn isoform_stripping() {
        assert_eq!(strip_isoform("P01308-1"), "P01308");
        assert_eq!(strip_isoform("P01308"), "P01308");
        assert_eq!(strip_isoform("P01308-"), "P01308-");
        assert_eq!(strip_isoform("-12"), "-12");
        assert_eq!(strip_isoform("A0A-B1"), "A0A-B1");
        let proteoform = Proteoform::new("Q9Y6K9-12");
        assert_eq!(proteoform.accession(), "Q9Y6K9");
        assert_eq!(proteoform.isoform_accession(), "Q9Y6K9-12");
    }

    #[test]
    fn ptms_stay_sorted() {
        let mut proteoform = Proteoform::new("P01308");
        proteoform.add_ptm(Ptm::new("00798", Some(43)));
        proteoform.add_ptm(Ptm::new("00046", Some(50)));
        proteoform.add_ptm(Ptm::new("00798", Some(31)));
        proteoform.add_ptm(Ptm::new("00046", None));
        assert_eq!(
            proteoform.ptms(),
            &[
                Ptm::new("00046", None),
                Ptm::new("00046", Some(50)),
                Ptm::new("00798", Some(31)),
                Ptm::new("00798", Some(43)),
            ]
        );
    }

    #[test]
    fn equality() {
        let a = Proteoform::new("P1")
            .with_range(Some(1), Some(10))
            .with_ptms([Ptm::new("00046", Some(3)), Ptm::new("00047", Some(5))]);
        let b = Proteoform::new("P1")
            .with_range(Some(1), Some(10))
            .with_ptms([Ptm::new("00047", Some(5)), Ptm::new("00046", Some(3))]);
        assert_eq!(a, b);
        assert_ne!(a, b.clone().with_range(Some(2), Some(10)));
        assert_ne!(a, Proteoform::new("P1-2").with_range(Some(1), Some(10)));
        assert_ne!(
            a,
            b.clone().with_ptms([Ptm::new("00046", Some(3))]),
            "differing sizes are never equal"
        );
    }

    #[test]
    fn equality_is_containment() {
        // Same size and mutual containment, but different multiplicities
        let a = Proteoform::new("P1").with_ptms([
            Ptm::new("00046", Some(3)),
            Ptm::new("00046", Some(3)),
            Ptm::new("00047", Some(5)),
        ]);
        let b = Proteoform::new("P1").with_ptms([
            Ptm::new("00046", Some(3)),
            Ptm::new("00047", Some(5)),
            Ptm::new("00047", Some(5)),
        ]);
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);
        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn ordering() {
        let mut list = vec![
            Proteoform::new("P2"),
            Proteoform::new("P1").with_ptms([Ptm::new("00046", Some(3))]),
            Proteoform::new("P1").with_range(Some(5), None),
            Proteoform::new("P1"),
        ];
        list.sort();
        assert_eq!(list[0], Proteoform::new("P1"));
        assert_eq!(
            list[1],
            Proteoform::new("P1").with_ptms([Ptm::new("00046", Some(3))])
        );
        assert_eq!(list[2], Proteoform::new("P1").with_range(Some(5), None));
        assert_eq!(list[3], Proteoform::new("P2"));
    }

    #[test]
    fn ordering_agrees_with_equality() {
        let ptm = |modification: &str, site| Ptm::new(modification, Some(site));
        let a = Proteoform::new("P1").with_ptms([ptm("A", 3), ptm("A", 3), ptm("B", 5)]);
        let b = Proteoform::new("P1").with_ptms([ptm("A", 3), ptm("B", 5), ptm("B", 5)]);
        let c = Proteoform::new("P1").with_ptms([ptm("A", 3), ptm("A", 3), ptm("C", 1)]);
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);
        assert_eq!(a.cmp(&c), b.cmp(&c));
        let forward: std::collections::BTreeSet<_> =
            [a.clone(), c.clone(), b.clone()].into_iter().collect();
        let backward: std::collections::BTreeSet<_> = [b, c, a].into_iter().collect();
        assert_eq!(forward.len(), 2);
        assert_eq!(backward.len(), 2);
    }
}
