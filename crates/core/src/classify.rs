use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::warn;

use crate::types::FileType;

/// Map a file extension (without the dot) to its format, ignoring case.
pub fn classify_extension(ext: &str) -> Option<FileType> {
    let ext = ext.to_ascii_lowercase();
    FileType::ALL
        .into_iter()
        .find(|ty| ty.extensions().contains(&ext.as_str()))
}

/// Classify by the text after the last `.` in the path.
pub fn classify_path(path: &Path) -> Option<FileType> {
    let path = path.to_string_lossy();
    let (_, ext) = path.rsplit_once('.')?;
    classify_extension(ext)
}

/// Leading header/comment lines of a structure file, each followed by a space.
///
/// Rules per format:
/// - CT/NOPCT: lines not starting with whitespace or a digit
/// - BPSEQ: `;` lines, plus the first non-`;` line, which also ends the scan
/// - dot-bracket/GTB/helix: `>` lines
///
/// Comment markers are dropped. A blank line always ends the scan. Unreadable
/// files give an empty string.
pub fn extract_header_lines(path: &Path, file_type: FileType) -> String {
    match File::open(path) {
        Ok(file) => header_lines(BufReader::new(file), file_type),
        Err(e) => {
            warn!("unable to open file \"{}\": {e}", path.display());
            String::new()
        }
    }
}

enum Scan<'a> {
    Take(&'a str),
    TakeAndStop(&'a str),
    Stop,
}

fn header_lines<R: BufRead>(reader: R, file_type: FileType) -> String {
    let mut header = String::new();
    for line in reader.split(b'\n') {
        let Ok(line) = line else {
            break;
        };
        let line = String::from_utf8_lossy(&line);
        let line = line.strip_suffix('\r').unwrap_or(&line);
        if line.trim().is_empty() {
            break;
        }

        let scan = match file_type {
            FileType::Ct | FileType::Nopct => match line.chars().next() {
                Some(c) if !c.is_whitespace() && !c.is_ascii_digit() => Scan::Take(line),
                _ => Scan::Stop,
            },
            FileType::Bpseq => match line.strip_prefix(';') {
                Some(comment) => Scan::Take(comment.trim_start()),
                None => Scan::TakeAndStop(line),
            },
            FileType::DotBracket | FileType::Gtb | FileType::HlxTriple => {
                match line.strip_prefix('>') {
                    Some(title) => Scan::Take(title.trim_start()),
                    None => Scan::Stop,
                }
            }
        };

        match scan {
            Scan::Take(text) => {
                header.push_str(text);
                header.push(' ');
            }
            Scan::TakeAndStop(text) => {
                header.push_str(text);
                header.push(' ');
                break;
            }
            Scan::Stop => break,
        }
    }
    header
}
