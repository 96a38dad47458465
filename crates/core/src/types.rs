use std::fmt;

use serde::Serialize;

/// Structural file formats recognised by extension.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileType {
    Ct,
    Nopct,
    DotBracket,
    Bpseq,
    Gtb,
    HlxTriple,
}

impl FileType {
    pub const ALL: [FileType; 6] = [
        FileType::Ct,
        FileType::Nopct,
        FileType::DotBracket,
        FileType::Bpseq,
        FileType::Gtb,
        FileType::HlxTriple,
    ];

    /// Upper-case tag used in listings and JSON output.
    pub fn tag(self) -> &'static str {
        match self {
            FileType::Ct => "CT",
            FileType::Nopct => "NOPCT",
            FileType::DotBracket => "DOTBRACKET",
            FileType::Bpseq => "BPSEQ",
            FileType::Gtb => "GTB",
            FileType::HlxTriple => "HLXTRIPLE",
        }
    }

    /// Lower-case file extensions mapped to this format.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            FileType::Ct => &["ct"],
            FileType::Nopct => &["nopct"],
            FileType::DotBracket => &["dot", "bracket", "dbn"],
            FileType::Bpseq => &["bpseq"],
            FileType::Gtb => &["gtb"],
            FileType::HlxTriple => &["helix", "hlx"],
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Byte offset just past a record's line (newline included) in the store file.
///
/// Only meaningful against the unchanged file it was read from.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordOffset(pub u64);

/// One parsed line of the store file — fields in alphabetical order
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct StickyRecord {
    pub fingerprint: String,
    pub folder_name: String,
    pub offset: RecordOffset,
}

/// Pair table for a parsed structure
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PairTable {
    /// pairs[i] = j means base i is paired with base j; pairs[i] = i means unpaired
    pub pairs: Vec<usize>,
    pub n_bases: usize,
}

impl PairTable {
    pub fn unpaired(n_bases: usize) -> Self {
        PairTable {
            pairs: (0..n_bases).collect(),
            n_bases,
        }
    }

    pub fn pair_count(&self) -> usize {
        self.pairs
            .iter()
            .enumerate()
            .filter(|&(i, &j)| i < j)
            .count()
    }
}

/// Anything that can hand out the raw sequence of a structure.
pub trait SequenceSource {
    fn sequence_string(&self) -> &[u8];
}

impl SequenceSource for Vec<u8> {
    fn sequence_string(&self) -> &[u8] {
        self
    }
}

impl SequenceSource for String {
    fn sequence_string(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl SequenceSource for &str {
    fn sequence_string(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// Where a suggested folder name came from
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NameSource {
    Sticky,
    Header,
    FileName,
    None,
}

/// A composed folder label — fields in alphabetical order
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Suggestion {
    pub file_type: Option<FileType>,
    pub label: String,
    pub name: Option<String>,
    pub source: NameSource,
}
