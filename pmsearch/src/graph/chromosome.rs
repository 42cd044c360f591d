use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
};

use context_error::{BoxedError, Context, CreateError};
use pmcore::PathwayError;
use serde::{Deserialize, Serialize};

use crate::helper_functions::open_file;

/// All human chromosomes, in the order they are scanned
pub const CHROMOSOMES: [&str; 25] = [
    "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12", "13", "14", "15", "16", "17",
    "18", "19", "20", "21", "22", "X", "Y", "MT",
];

/// Normalise a chromosome name: optional `chr` prefix removed, upper case, `M` is `MT`.
/// Returns `None` if this is not a known chromosome.
pub fn normalise_chromosome(name: &str) -> Option<&'static str> {
    let name = name.trim();
    let name = match (name.get(..3), name.get(3..)) {
        (Some(prefix), Some(rest)) if !rest.is_empty() && prefix.eq_ignore_ascii_case("chr") => {
            rest
        }
        _ => name,
    };
    if name.eq_ignore_ascii_case("M") {
        return Some("MT");
    }
    let name = name.trim_start_matches('0');
    CHROMOSOMES
        .into_iter()
        .find(|c| c.eq_ignore_ascii_case(name))
}

/// The variant maps of a single chromosome: rsIDs and base pair positions to the proteins encoded
/// at that locus.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct ChromosomeData {
    /// rsID to protein accessions
    pub rsids: HashMap<String, Vec<String>>,
    /// Base pair position to protein accessions
    pub base_pairs: HashMap<u64, Vec<String>>,
}

impl ChromosomeData {
    /// The proteins for a rsID
    pub fn proteins_of_rsid(&self, rsid: &str) -> &[String] {
        self.rsids.get(rsid).map_or(&[][..], Vec::as_slice)
    }

    /// The proteins at a base pair position
    pub fn proteins_at(&self, base_pair: u64) -> &[String] {
        self.base_pairs.get(&base_pair).map_or(&[][..], Vec::as_slice)
    }
}

/// A source of per chromosome variant maps
pub trait ChromosomeSource: std::fmt::Debug {
    /// The chromosomes that can be loaded, in scanning order
    fn chromosomes(&self) -> Vec<&'static str> {
        CHROMOSOMES.to_vec()
    }

    /// Load the maps for the given (normalised) chromosome, an unknown chromosome is empty.
    /// # Errors
    /// If the maps exist but could not be read.
    fn load(&self, chromosome: &str) -> Result<ChromosomeData, BoxedError<'static, PathwayError>>;
}

/// Chromosome maps stored as `chr<NAME>.json` or `chr<NAME>.json.gz` in a directory
#[derive(Clone, Debug)]
pub struct DirectoryChromosomes {
    directory: PathBuf,
}

impl DirectoryChromosomes {
    /// Use the given directory
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// The directory the maps are read from
    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl ChromosomeSource for DirectoryChromosomes {
    fn load(&self, chromosome: &str) -> Result<ChromosomeData, BoxedError<'static, PathwayError>> {
        let plain = self.directory.join(format!("chr{chromosome}.json"));
        let compressed = self.directory.join(format!("chr{chromosome}.json.gz"));
        let path = if plain.exists() {
            plain
        } else if compressed.exists() {
            compressed
        } else {
            return Ok(ChromosomeData::default());
        };
        let reader = open_file(&path, PathwayError::ChromosomeCorrupt)?;
        serde_json::from_reader(reader).map_err(|e| {
            BoxedError::new(
                PathwayError::ChromosomeCorrupt,
                "Chromosome map could not be parsed",
                e.to_string(),
                Context::default().source(path.to_string_lossy()).to_owned(),
            )
        })
    }
}

/// Chromosome maps kept in memory
#[derive(Clone, Debug, Default)]
pub struct StaticChromosomes {
    maps: BTreeMap<String, ChromosomeData>,
}

impl StaticChromosomes {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the maps for a chromosome, the name is normalised if it is a known chromosome
    #[must_use]
    pub fn with(mut self, chromosome: &str, data: ChromosomeData) -> Self {
        let name = normalise_chromosome(chromosome)
            .map_or_else(|| chromosome.to_string(), str::to_string);
        self.maps.insert(name, data);
        self
    }
}

impl ChromosomeSource for StaticChromosomes {
    fn load(&self, chromosome: &str) -> Result<ChromosomeData, BoxedError<'static, PathwayError>> {
        Ok(self.maps.get(chromosome).cloned().unwrap_or_default())
    }
}

/// Holds the maps of at most one chromosome at a time, loading another chromosome replaces the
/// current one.
#[derive(Debug)]
pub struct ChromosomeCache {
    source: Box<dyn ChromosomeSource>,
    loaded: Option<(String, ChromosomeData)>,
    loads: usize,
}

impl ChromosomeCache {
    /// Create a cache around the given source, nothing is loaded yet
    pub fn new(source: impl ChromosomeSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            loaded: None,
            loads: 0,
        }
    }

    /// The chromosomes of the underlying source
    pub fn chromosomes(&self) -> Vec<&'static str> {
        self.source.chromosomes()
    }

    /// The currently loaded chromosome
    pub fn current(&self) -> Option<&str> {
        self.loaded.as_ref().map(|(name, _)| name.as_str())
    }

    /// The number of times a chromosome was loaded from the source
    pub const fn loads(&self) -> usize {
        self.loads
    }

    /// Make sure the given chromosome is loaded and return its maps. If another chromosome was
    /// loaded it is dropped first.
    /// # Errors
    /// If the maps could not be loaded from the source.
    pub fn swap(
        &mut self,
        chromosome: &str,
    ) -> Result<&ChromosomeData, BoxedError<'static, PathwayError>> {
        let entry = match self.loaded.take() {
            Some(entry) if entry.0 == chromosome => entry,
            previous => {
                // Release the old maps before loading the new ones
                drop(previous);
                let data = self.source.load(chromosome)?;
                tracing::debug!(
                    chromosome,
                    rsids = data.rsids.len(),
                    base_pairs = data.base_pairs.len(),
                    "loaded chromosome maps"
                );
                self.loads += 1;
                (chromosome.to_string(), data)
            }
        };
        Ok(&self.loaded.insert(entry).1)
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use context_error::StaticErrorContent;

    use super::*;

    fn data(rsid: &str, base_pair: u64, protein: &str) -> ChromosomeData {
        ChromosomeData {
            rsids: [(rsid.to_string(), vec![protein.to_string()])].into(),
            base_pairs: [(base_pair, vec![protein.to_string()])].into(),
        }
    }

    #[test]
    fn chromosome_names() {
        assert_eq!(normalise_chromosome("chr1"), Some("1"));
        assert_eq!(normalise_chromosome("CHRx"), Some("X"));
        assert_eq!(normalise_chromosome("22"), Some("22"));
        assert_eq!(normalise_chromosome("chrM"), Some("MT"));
        assert_eq!(normalise_chromosome("mt"), Some("MT"));
        assert_eq!(normalise_chromosome("01"), Some("1"));
        assert_eq!(normalise_chromosome("23"), None);
        assert_eq!(normalise_chromosome("chr"), None);
        assert_eq!(normalise_chromosome(""), None);
    }

    #[test]
    fn parse_maps() {
        let data: ChromosomeData = serde_json::from_str(
            r#"{"rsids": {"rs1": ["P1"]}, "base_pairs": {"12345": ["P1", "P2"]}}"#,
        )
        .unwrap();
        assert_eq!(data.proteins_of_rsid("rs1"), &["P1".to_string()]);
        assert_eq!(data.proteins_at(12345).len(), 2);
        assert!(data.proteins_at(1).is_empty());
        let empty: ChromosomeData = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, ChromosomeData::default());
    }

    #[test]
    fn swap_keeps_one() {
        let source = StaticChromosomes::new()
            .with("chr1", data("rs1", 100, "P1"))
            .with("2", data("rs2", 200, "P2"));
        let mut cache = ChromosomeCache::new(source);
        assert_eq!(cache.current(), None);
        assert_eq!(cache.swap("1").unwrap().proteins_at(100), &["P1".to_string()]);
        assert_eq!(cache.swap("1").unwrap().proteins_at(100), &["P1".to_string()]);
        assert_eq!(cache.loads(), 1);
        assert!(cache.swap("2").unwrap().proteins_at(100).is_empty());
        assert_eq!(cache.current(), Some("2"));
        assert_eq!(cache.loads(), 2);
        assert!(cache.swap("X").unwrap().rsids.is_empty());
        assert_eq!(cache.loads(), 3);
    }

    #[test]
    fn directory() {
        let directory =
            std::env::temp_dir().join(format!("pmsearch-chromosomes-{}", std::process::id()));
        std::fs::create_dir_all(&directory).unwrap();
        std::fs::write(directory.join("chr1.json"), r#"{"rsids": {"rs1": ["P1"]}}"#).unwrap();
        std::fs::write(directory.join("chr2.json"), "not json").unwrap();
        crate::helper_functions::write_gz(
            &directory.join("chrX.json.gz"),
            r#"{"base_pairs": {"500": ["P9"]}}"#,
        );
        let source = DirectoryChromosomes::new(&directory);
        let one = source.load("1");
        let two = source.load("2");
        let three = source.load("3");
        let x = source.load("X");
        let mut cache = ChromosomeCache::new(source);
        let failed = cache.swap("2").is_err();
        let current = cache.current().map(str::to_string);
        std::fs::remove_dir_all(&directory).unwrap();
        assert_eq!(one.unwrap().proteins_of_rsid("rs1"), &["P1".to_string()]);
        assert!(matches!(
            two.unwrap_err().get_kind(),
            PathwayError::ChromosomeCorrupt
        ));
        assert_eq!(three.unwrap(), ChromosomeData::default());
        assert_eq!(x.unwrap().proteins_at(500), &["P9".to_string()]);
        // A failed load leaves nothing loaded
        assert!(failed);
        assert_eq!(current, None);
    }
}
