//! Map peptide sequences to the proteins that contain them.

use std::{collections::HashMap, io::BufRead, path::Path};

use context_error::{BoxedError, Context, CreateError};
use itertools::Itertools;
use pmcore::PathwayError;

use crate::helper_functions::open_file;

/// Maps peptides to the proteins containing them
pub trait PeptideMapper: std::fmt::Debug {
    /// Find all occurrences of the peptide, as `(protein accession, offset)` where the offset is
    /// the 0 based start of the peptide in the protein. The result is sorted.
    fn map_peptide(&self, sequence: &str) -> Vec<(String, usize)>;
}

/// The length of the indexed k-mers, shorter peptides are found with a full scan
const KMER: usize = 5;

/// A peptide mapper for the protein sequences of a FASTA file
#[derive(Clone, Debug, Default)]
pub struct FastaPeptideMapper {
    proteins: Vec<(String, Vec<u8>)>,
    index: HashMap<[u8; KMER], Vec<(u32, u32)>>,
}

impl FastaPeptideMapper {
    /// Build a mapper from accession and sequence pairs
    pub fn from_proteins(proteins: impl IntoIterator<Item = (String, String)>) -> Self {
        let proteins = proteins
            .into_iter()
            .map(|(accession, sequence)| (accession, sequence.to_ascii_uppercase().into_bytes()))
            .collect_vec();
        let mut index: HashMap<[u8; KMER], Vec<(u32, u32)>> = HashMap::new();
        for (protein, (_, sequence)) in proteins.iter().enumerate() {
            for (offset, window) in sequence.windows(KMER).enumerate() {
                if let Ok(kmer) = <[u8; KMER]>::try_from(window) {
                    index
                        .entry(kmer)
                        .or_default()
                        .push((protein as u32, offset as u32));
                }
            }
        }
        Self { proteins, index }
    }

    /// Parse a FASTA file, gzip compressed if the extension is `.gz`.
    /// # Errors
    /// If the file could not be opened or is not a valid FASTA file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, BoxedError<'static, PathwayError>> {
        let path = path.as_ref();
        Self::from_reader(open_file(path, PathwayError::Io)?, Some(path))
    }

    /// Parse a FASTA file from a reader. The accession is taken from the `db|ACCESSION|NAME`
    /// header format, for other headers the first word is used.
    /// # Errors
    /// If the reader fails or if the content is not a valid FASTA file.
    pub fn from_reader(
        reader: impl BufRead,
        path: Option<&Path>,
    ) -> Result<Self, BoxedError<'static, PathwayError>> {
        let source = || {
            path.map_or_else(Context::none, |p| {
                Context::default().source(p.to_string_lossy()).to_owned()
            })
        };
        let mut proteins = Vec::new();
        let mut current: Option<(String, String)> = None;
        for (line_index, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| {
                BoxedError::new(
                    PathwayError::Io,
                    "Failed reading fasta file",
                    format!("Error occurred while reading line {}: {e}", line_index + 1),
                    source(),
                )
            })?;
            if let Some(header) = line.strip_prefix('>') {
                if let Some(protein) = current.take() {
                    proteins.push(protein);
                }
                current = Some((header_accession(header).to_string(), String::new()));
            } else if let Some((_, sequence)) = &mut current {
                for (i, c) in line.char_indices() {
                    if c.is_ascii_alphabetic() {
                        sequence.push(c.to_ascii_uppercase());
                    } else if !(c.is_ascii_whitespace() || c == '*') {
                        return Err(BoxedError::new(
                            PathwayError::Io,
                            "Failed reading fasta file",
                            "Character is not an amino acid",
                            Context::line(Some(line_index as u32), &line, i, c.len_utf8())
                                .to_owned(),
                        ));
                    }
                }
            } else if !line.trim().is_empty() {
                return Err(BoxedError::new(
                    PathwayError::Io,
                    "Failed reading fasta file",
                    "A sequence was found before the first header",
                    Context::full_line(line_index as u32, &line).to_owned(),
                ));
            }
        }
        proteins.extend(current);
        tracing::debug!(proteins = proteins.len(), "read fasta file");
        Ok(Self::from_proteins(proteins))
    }

    /// The number of proteins
    pub fn len(&self) -> usize {
        self.proteins.len()
    }

    /// Check if there are no proteins
    pub fn is_empty(&self) -> bool {
        self.proteins.is_empty()
    }
}

/// Get the accession from a FASTA header (without the leading `>`)
fn header_accession(header: &str) -> &str {
    let first = header.split_whitespace().next().unwrap_or_default();
    let mut parts = first.split('|');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(accession), Some(_)) if !accession.is_empty() => accession,
        _ => first,
    }
}

impl PeptideMapper for FastaPeptideMapper {
    fn map_peptide(&self, sequence: &str) -> Vec<(String, usize)> {
        let peptide = sequence.trim().to_ascii_uppercase().into_bytes();
        if peptide.is_empty() {
            return Vec::new();
        }
        let mut found = if let Some(kmer) = peptide
            .get(..KMER)
            .and_then(|k| <[u8; KMER]>::try_from(k).ok())
        {
            self.index
                .get(&kmer)
                .map_or(&[][..], Vec::as_slice)
                .iter()
                .filter(|(protein, offset)| {
                    self.proteins[*protein as usize]
                        .1
                        .get(*offset as usize..*offset as usize + peptide.len())
                        .is_some_and(|s| s == peptide.as_slice())
                })
                .map(|(protein, offset)| {
                    (self.proteins[*protein as usize].0.clone(), *offset as usize)
                })
                .collect_vec()
        } else {
            self.proteins
                .iter()
                .flat_map(|(accession, protein)| {
                    protein
                        .windows(peptide.len())
                        .positions(|w| w == peptide.as_slice())
                        .map(|offset| (accession.clone(), offset))
                })
                .collect_vec()
        };
        found.sort();
        found.dedup();
        found
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    const FASTA: &str = ">sp|P01308|INS_HUMAN Insulin OS=Homo sapiens
MALWMRLLPLLALLALWGPDPAAAFVNQHLCGSHLVEALYLVCGERGFFYTPKTRREAEDLQVGQVELGGGPGAGSLQPLALEGSLQKRGIVEQCCTSICSLYQLENYCN
>P2 some other protein
PEPTIDEKPEPTIDE
*
>tr|Q1|Q1_HUMAN
AAAAAA
";

    fn mapper() -> FastaPeptideMapper {
        FastaPeptideMapper::from_reader(FASTA.as_bytes(), None).unwrap()
    }

    #[test]
    fn headers() {
        assert_eq!(header_accession("sp|P01308|INS_HUMAN Insulin"), "P01308");
        assert_eq!(header_accession("P2 some other protein"), "P2");
        assert_eq!(header_accession("sp||INS_HUMAN"), "sp||INS_HUMAN");
        assert_eq!(header_accession(""), "");
    }

    #[test]
    fn read() {
        let mapper = mapper();
        assert_eq!(mapper.len(), 3);
        assert!(FastaPeptideMapper::from_reader("PEPTIDE\n>P1\nPEP".as_bytes(), None).is_err());
        assert!(FastaPeptideMapper::from_reader(">P1\nPEP1DE".as_bytes(), None).is_err());
    }

    #[test]
    fn compressed_file() {
        let path = std::env::temp_dir()
            .join(format!("pmsearch-proteins-{}.fasta.gz", std::process::id()));
        crate::helper_functions::write_gz(&path, FASTA);
        let mapper = FastaPeptideMapper::from_file(&path);
        std::fs::remove_file(&path).unwrap();
        let mapper = mapper.unwrap();
        assert_eq!(mapper.len(), 3);
        assert_eq!(
            mapper.map_peptide("GFFYTPK"),
            vec![("P01308".to_string(), 46)]
        );
    }

    #[test]
    fn long_peptides() {
        let mapper = mapper();
        assert_eq!(
            mapper.map_peptide("gfFYTPK"),
            vec![("P01308".to_string(), 46)]
        );
        assert_eq!(
            mapper.map_peptide("PEPTIDE"),
            vec![("P2".to_string(), 0), ("P2".to_string(), 8)]
        );
        assert!(mapper.map_peptide("PEPTIDEX").is_empty());
    }

    #[test]
    fn short_peptides() {
        let mapper = mapper();
        assert_eq!(
            mapper.map_peptide("EKP"),
            vec![("P2".to_string(), 6)]
        );
        assert_eq!(
            mapper.map_peptide("AAAA"),
            vec![
                ("Q1".to_string(), 0),
                ("Q1".to_string(), 1),
                ("Q1".to_string(), 2)
            ]
        );
        assert!(mapper.map_peptide("").is_empty());
    }
}
