use std::fs;
use std::path::Path;

use crate::classify::classify_path;
use crate::error::{Error, Result};
use crate::types::{FileType, PairTable, SequenceSource};

/// A structure file reduced to what the folder naming needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructureFile {
    pub file_type: FileType,
    pub sequence: Vec<u8>,
    pub pairs: PairTable,
}

impl StructureFile {
    /// Read a structure file, picking the format from its extension.
    pub fn read(path: &Path) -> Result<Self> {
        let file_type = classify_path(path).ok_or_else(|| {
            Error::InvalidInput(format!("unknown structure file type: {}", path.display()))
        })?;
        let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
        Self::parse(&String::from_utf8_lossy(&bytes), file_type)
    }

    pub fn parse(text: &str, file_type: FileType) -> Result<Self> {
        let (sequence, pairs) = match file_type {
            FileType::Ct | FileType::Nopct => parse_columns(text, 6, 4)?,
            FileType::Bpseq => parse_columns(text, 3, 2)?,
            FileType::DotBracket => parse_dot_bracket(text)?,
            FileType::Gtb | FileType::HlxTriple => {
                return Err(Error::UnsupportedFormat(file_type))
            }
        };
        if sequence.is_empty() {
            return Err(Error::Parse("no bases found".to_string()));
        }
        Ok(StructureFile {
            file_type,
            sequence,
            pairs,
        })
    }
}

impl SequenceSource for StructureFile {
    fn sequence_string(&self) -> &[u8] {
        &self.sequence
    }
}

/// Tabular formats (CT, BPSEQ): `index base ... pair ...` rows, 1-based,
/// `0` for unpaired. `;` comments and rows that do not fit the shape are skipped.
/// Only the first structure is read when the file holds several (mfold
/// suboptimals): reading stops where the base index restarts at 1.
fn parse_columns(
    text: &str,
    min_fields: usize,
    pair_col: usize,
) -> Result<(Vec<u8>, PairTable)> {
    let mut sequence = Vec::new();
    let mut partners: Vec<usize> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < min_fields {
            continue;
        }
        let (Ok(index), Ok(pair)) = (fields[0].parse::<usize>(), fields[pair_col].parse::<usize>())
        else {
            continue;
        };
        let base = fields[1].as_bytes();
        if base.len() != 1 || !base[0].is_ascii_alphabetic() {
            continue;
        }
        if index == 1 && !sequence.is_empty() {
            break;
        }
        if index != sequence.len() + 1 {
            return Err(Error::Parse(format!(
                "base index {index} out of order (expected {})",
                sequence.len() + 1
            )));
        }
        sequence.push(base[0]);
        partners.push(pair);
    }

    let n_bases = sequence.len();
    let mut pairs = PairTable::unpaired(n_bases);
    for (i, &partner) in partners.iter().enumerate() {
        if partner == 0 {
            continue;
        }
        let j = partner - 1;
        if j >= n_bases || j == i {
            return Err(Error::Parse(format!("base {} has bad partner {partner}", i + 1)));
        }
        pairs.pairs[i] = j;
    }
    for i in 0..n_bases {
        if pairs.pairs[pairs.pairs[i]] != i {
            return Err(Error::Parse(format!("pairing of base {} is not symmetric", i + 1)));
        }
    }
    Ok((sequence, pairs))
}

/// `>` title lines, then the sequence, then an optional dot-bracket line.
fn parse_dot_bracket(text: &str) -> Result<(Vec<u8>, PairTable)> {
    let mut lines = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('>'));

    let sequence = lines
        .next()
        .map(|l| l.as_bytes().to_vec())
        .ok_or_else(|| Error::Parse("missing sequence line".to_string()))?;

    let pairs = match lines.next() {
        // drop a trailing energy annotation, e.g. "((...)) (-1.20)"
        Some(line) => parse_brackets(line.split_whitespace().next().unwrap_or(""))?,
        None => PairTable::unpaired(sequence.len()),
    };
    if pairs.n_bases != sequence.len() {
        return Err(Error::Parse(format!(
            "structure has {} bases but sequence has {}",
            pairs.n_bases,
            sequence.len()
        )));
    }
    Ok((sequence, pairs))
}

/// Opening and closing characters of each bracket kind. Kinds after the
/// first mark pseudoknotted pairs.
const BRACKETS: [(char, char); 4] = [('(', ')'), ('[', ']'), ('{', '}'), ('<', '>')];

/// Parse dot-bracket notation into a pair table.
///
/// Characters: `(` = open pair, `)` = close pair, `.` = unpaired.
/// `[]`, `{}` and `<>` pair independently of `()`.
fn parse_brackets(input: &str) -> Result<PairTable> {
    let mut pairs: Vec<usize> = Vec::new();
    let mut stacks: [Vec<usize>; BRACKETS.len()] = Default::default();

    for (base_idx, ch) in input.chars().enumerate() {
        if ch == '.' {
            pairs.push(base_idx); // self-paired = unpaired
        } else if let Some(kind) = BRACKETS.iter().position(|&(open, _)| open == ch) {
            pairs.push(base_idx); // placeholder
            stacks[kind].push(base_idx);
        } else if let Some(kind) = BRACKETS.iter().position(|&(_, close)| close == ch) {
            let j = stacks[kind]
                .pop()
                .ok_or_else(|| Error::Parse(format!("unmatched {ch} bracket")))?;
            pairs.push(j);
            pairs[j] = base_idx;
        } else {
            return Err(Error::Parse(format!("bad dot-parens character {ch:?}")));
        }
    }

    if let Some(kind) = stacks.iter().position(|s| !s.is_empty()) {
        return Err(Error::Parse(format!("unmatched {} bracket", BRACKETS[kind].0)));
    }

    let n_bases = pairs.len();
    Ok(PairTable { pairs, n_bases })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HAIRPIN_CT: &str = "\
Hairpin example
    9 ENERGY = -1.2 hairpin
    1 G       0    2    9    1
    2 G       1    3    8    2
    3 G       2    4    7    3
    4 A       3    5    0    4
    5 A       4    6    0    5
    6 A       5    7    0    6
    7 C       6    8    3    7
    8 C       7    9    2    8
    9 C       8    0    1    9
";

    #[test]
    fn test_simple_pair() {
        let pt = parse_brackets("()").unwrap();
        assert_eq!(pt.pairs, vec![1, 0]);
        assert_eq!(pt.n_bases, 2);
    }

    #[test]
    fn test_nested() {
        let pt = parse_brackets("(((...)))").unwrap();
        assert_eq!(pt.pairs, vec![8, 7, 6, 3, 4, 5, 2, 1, 0]);
        assert_eq!(pt.pair_count(), 3);
    }

    #[test]
    fn test_unmatched() {
        assert!(parse_brackets("((..)").is_err());
        assert!(parse_brackets("())").is_err());
        assert!(parse_brackets("(x)").is_err());
    }

    #[test]
    fn test_pseudoknot_brackets() {
        let pt = parse_brackets("((..[[..))..]]").unwrap();
        assert_eq!(pt.pairs[0], 9);
        assert_eq!(pt.pairs[4], 13);
        assert_eq!(pt.pairs[5], 12);
        assert_eq!(pt.pair_count(), 4);
        assert!(parse_brackets("(<)>").is_ok());
        assert!(parse_brackets("([)").is_err());
    }

    #[test]
    fn test_ct() {
        let s = StructureFile::parse(HAIRPIN_CT, FileType::Ct).unwrap();
        assert_eq!(s.sequence, b"GGGAAACCC");
        assert_eq!(s.pairs, parse_brackets("(((...)))").unwrap());
    }

    #[test]
    fn test_ct_reads_first_structure_only() {
        let text = format!("{HAIRPIN_CT}{HAIRPIN_CT}");
        let s = StructureFile::parse(&text, FileType::Ct).unwrap();
        assert_eq!(s.sequence, b"GGGAAACCC");
    }

    #[test]
    fn test_ct_index_gap_rejected() {
        let text = "1 G 0 2 0 1\n3 A 1 4 0 3\n";
        assert!(matches!(
            StructureFile::parse(text, FileType::Ct),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_bpseq() {
        let text = ";hairpin\n1 G 5\n2 A 0\n3 A 0\n4 A 0\n5 C 1\n";
        let s = StructureFile::parse(text, FileType::Bpseq).unwrap();
        assert_eq!(s.sequence, b"GAAAC");
        assert_eq!(s.pairs.pairs, vec![4, 1, 2, 3, 0]);
    }

    #[test]
    fn test_bpseq_asymmetric_pair() {
        let text = "1 G 3\n2 A 0\n3 C 0\n";
        assert!(matches!(
            StructureFile::parse(text, FileType::Bpseq),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_dot_bracket() {
        let text = ">hairpin\nGGGAAACCC\n(((...))) (-1.20)\n";
        let s = StructureFile::parse(text, FileType::DotBracket).unwrap();
        assert_eq!(s.sequence_string(), b"GGGAAACCC");
        assert_eq!(s.pairs.pair_count(), 3);
    }

    #[test]
    fn test_dot_bracket_length_mismatch() {
        let text = "GGGAAACCC\n((...))\n";
        assert!(StructureFile::parse(text, FileType::DotBracket).is_err());
    }

    #[test]
    fn test_unsupported() {
        assert!(matches!(
            StructureFile::parse("x", FileType::Gtb),
            Err(Error::UnsupportedFormat(FileType::Gtb))
        ));
    }
}
