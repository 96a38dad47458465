mod classify;
mod error;
mod hasher;
mod naming;
mod parser;
mod settings;
mod store;
mod types;

pub use classify::{classify_extension, classify_path, extract_header_lines};
pub use error::{Error, Result};
pub use hasher::{Fingerprint, BSHASH_BYTES, FINGERPRINT_LEN};
pub use naming::{
    compose_label, sequence_name_from_label, suggested_name, FolderNameSuggester, NamingSession,
    FOLDER_NAME_DIVIDER, LABEL_PREFIX,
};
pub use parser::StructureFile;
pub use settings::Settings;
pub use store::StickyStore;
pub use types::*;

/// Main entry point for one structure file: the next folder label for `path`,
/// using its sequence for the sticky lookup when the file can be parsed.
pub fn label_structure(
    settings: &Settings,
    session: &mut NamingSession,
    path: &std::path::Path,
) -> Suggestion {
    let store = settings.store();
    let suggester = FolderNameSuggester::new(&store, &settings.search_dir);
    let structure = match StructureFile::read(&settings.resolve_structure_path(path)) {
        Ok(structure) => Some(structure),
        Err(e @ Error::UnsupportedFormat(_)) => {
            log::debug!("no sequence for {}: {e}", path.display());
            None
        }
        Err(e) => {
            log::warn!("no sticky lookup for {}: {e}", path.display());
            None
        }
    };
    suggester.suggest(
        session,
        path,
        structure.as_ref().map(|s| s as &dyn SequenceSource),
    )
}

/// Fingerprint as text, or an empty string for invalid sequences.
pub fn fingerprint_string(sequence: &str) -> String {
    Fingerprint::of(sequence.as_bytes())
        .map(|fp| fp.to_string())
        .unwrap_or_default()
}
