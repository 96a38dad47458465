use std::path::{Path, PathBuf};

use log::warn;

use crate::classify::{classify_path, extract_header_lines};
use crate::store::StickyStore;
use crate::types::{NameSource, SequenceSource, Suggestion};

/// Separator between the numbered prefix and the folder name of a label.
pub const FOLDER_NAME_DIVIDER: &str = " : ";
/// Leading text of every composed label.
pub const LABEL_PREFIX: &str = "No. #";
/// Longest name derived from file header lines.
pub const MAX_SUGGESTED_NAME_LEN: usize = 32;

/// Label counter for one browsing session.
///
/// Counts every composed label; starts at zero and is never persisted.
#[derive(Clone, Debug)]
pub struct NamingSession {
    count: u32,
    divider: String,
}

impl Default for NamingSession {
    fn default() -> Self {
        Self::new()
    }
}

impl NamingSession {
    pub fn new() -> Self {
        Self::with_divider(FOLDER_NAME_DIVIDER)
    }

    pub fn with_divider(divider: impl Into<String>) -> Self {
        NamingSession {
            count: 0,
            divider: divider.into(),
        }
    }

    /// Number of labels composed so far.
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn divider(&self) -> &str {
        &self.divider
    }

    /// Bump the counter and compose `No. #<n><divider><name>`.
    pub fn next_label(&mut self, name: Option<&str>) -> String {
        self.count += 1;
        compose_label(self.count, name, &self.divider)
    }
}

/// Compose a numbered label; the divider is left out when there is no name.
///
/// The counter is rendered like printf `% 2d`: a leading space, width 2.
pub fn compose_label(count: u32, name: Option<&str>, divider: &str) -> String {
    match name.filter(|n| !n.is_empty()) {
        Some(name) => format!("{LABEL_PREFIX} {count}{divider}{name}"),
        None => format!("{LABEL_PREFIX} {count}"),
    }
}

/// Everything after the first `divider`; the whole label when there is none.
pub fn sequence_name_from_label(label: &str, divider: &str) -> String {
    if divider.is_empty() {
        return label.to_string();
    }
    match label.find(divider) {
        Some(pos) => label[pos + divider.len()..].to_string(),
        None => label.to_string(),
    }
}

/// Folder name guessed from header comments, falling back to the file stem.
pub fn suggested_name(header: &str, path: &Path) -> Option<(String, NameSource)> {
    let collapsed = header.split_whitespace().collect::<Vec<_>>().join(" ");
    if !collapsed.is_empty() {
        let name: String = collapsed.chars().take(MAX_SUGGESTED_NAME_LEN).collect();
        return Some((name.trim_end().to_string(), NameSource::Header));
    }
    path.file_stem()
        .map(|s| s.to_string_lossy().trim().to_string())
        .filter(|s| !s.is_empty())
        .map(|s| (s, NameSource::FileName))
}

/// Builds folder labels for structure files: sticky name first, then header
/// and file name hints.
pub struct FolderNameSuggester<'a> {
    store: &'a StickyStore,
    search_dir: PathBuf,
}

impl<'a> FolderNameSuggester<'a> {
    pub fn new(store: &'a StickyStore, search_dir: impl Into<PathBuf>) -> Self {
        FolderNameSuggester {
            store,
            search_dir: search_dir.into(),
        }
    }

    /// Compose the next label for `path` (relative paths resolve against the
    /// search directory). `source` supplies the sequence for the sticky lookup.
    pub fn suggest(
        &self,
        session: &mut NamingSession,
        path: &Path,
        source: Option<&dyn SequenceSource>,
    ) -> Suggestion {
        let file_type = classify_path(path);

        if let Some(name) = source.and_then(|s| self.sticky_name(s.sequence_string())) {
            return Suggestion {
                file_type,
                label: session.next_label(Some(&name)),
                name: Some(name),
                source: NameSource::Sticky,
            };
        }

        let header = file_type
            .map(|ty| extract_header_lines(&self.search_dir.join(path), ty))
            .unwrap_or_default();
        match suggested_name(&header, path) {
            Some((name, source)) => Suggestion {
                file_type,
                label: session.next_label(Some(&name)),
                name: Some(name),
                source,
            },
            None => Suggestion {
                file_type,
                label: session.next_label(None),
                name: None,
                source: NameSource::None,
            },
        }
    }

    fn sticky_name(&self, sequence: &[u8]) -> Option<String> {
        match self.store.lookup(sequence) {
            Ok(name) => name,
            Err(e) => {
                warn!("sticky folder lookup failed: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_label() {
        assert_eq!(compose_label(1, Some("tRNA"), " : "), "No. # 1 : tRNA");
        assert_eq!(compose_label(12, Some("tRNA"), " : "), "No. # 12 : tRNA");
        assert_eq!(compose_label(3, None, " : "), "No. # 3");
        assert_eq!(compose_label(3, Some(""), " : "), "No. # 3");
    }

    #[test]
    fn test_session_counter() {
        let mut session = NamingSession::new();
        assert_eq!(session.next_label(None), "No. # 1");
        assert_eq!(session.next_label(Some("x")), "No. # 2 : x");
        assert_eq!(session.count(), 2);

        // independent sessions do not share a counter
        let mut other = NamingSession::new();
        assert_eq!(other.next_label(None), "No. # 1");
    }

    #[test]
    fn test_name_from_label() {
        let label = compose_label(7, Some("E. coli 16S"), FOLDER_NAME_DIVIDER);
        assert_eq!(
            sequence_name_from_label(&label, FOLDER_NAME_DIVIDER),
            "E. coli 16S"
        );
        assert_eq!(
            sequence_name_from_label("No. # 7", FOLDER_NAME_DIVIDER),
            "No. # 7"
        );
        // only the first divider is consumed
        assert_eq!(sequence_name_from_label("a : b : c", " : "), "b : c");
    }

    #[test]
    fn test_suggested_name() {
        let path = Path::new("dir/ecoli_16S.ct");
        assert_eq!(
            suggested_name("  Escherichia   coli  16S ", path),
            Some(("Escherichia coli 16S".to_string(), NameSource::Header))
        );
        assert_eq!(
            suggested_name("", path),
            Some(("ecoli_16S".to_string(), NameSource::FileName))
        );
        let long = "x".repeat(100);
        let (name, _) = suggested_name(&long, path).unwrap();
        assert_eq!(name.chars().count(), MAX_SUGGESTED_NAME_LEN);
    }
}
