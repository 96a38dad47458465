use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::hasher::BSHASH_BYTES;
use crate::naming::FOLDER_NAME_DIVIDER;
use crate::store::StickyStore;

/// File name of the default store inside the per-user config directory.
pub const DEFAULT_STORE_FILE: &str = "sticky-folders.cfg";

/// Where the sticky store lives and how it is matched.
///
/// Loaded from JSON with `#[serde(default)]`, so any omitted field uses the
/// default value.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Sticky store file (default: `<config dir>/rnaviz/sticky-folders.cfg`)
    pub store_path: PathBuf,
    /// Root for relative structure file paths (default: ".")
    pub search_dir: PathBuf,
    /// Fingerprint bytes compared per record (default: 48)
    pub prefix_bytes: usize,
    /// Label divider (default: " : ")
    pub divider: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            search_dir: PathBuf::from("."),
            prefix_bytes: BSHASH_BYTES,
            divider: FOLDER_NAME_DIVIDER.into(),
        }
    }
}

impl Settings {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json_str(&json)
    }

    /// Resolve a structure file path against the search directory.
    pub fn resolve_structure_path(&self, path: &Path) -> PathBuf {
        self.search_dir.join(path)
    }

    /// Store handle configured from these settings.
    pub fn store(&self) -> StickyStore {
        StickyStore::new(&self.store_path)
            .with_prefix_len(self.prefix_bytes)
            .with_divider(self.divider.clone())
    }
}

fn default_store_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("rnaviz"))
        .unwrap_or_default()
        .join(DEFAULT_STORE_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let s = Settings::from_json_str(r#"{"store_path": "/tmp/names.cfg"}"#).unwrap();
        assert_eq!(s.store_path, PathBuf::from("/tmp/names.cfg"));
        assert_eq!(s.prefix_bytes, BSHASH_BYTES);
        assert_eq!(s.divider, FOLDER_NAME_DIVIDER);
        assert_eq!(s.search_dir, PathBuf::from("."));
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(
            Settings::from_json_str("{"),
            Err(Error::Settings(_))
        ));
    }

    #[test]
    fn test_store_from_settings() {
        let s = Settings {
            prefix_bytes: 80,
            ..Settings::default()
        };
        assert_eq!(s.store().prefix_len(), 80);
        assert!(s.store().path().ends_with(DEFAULT_STORE_FILE));
    }

    #[test]
    fn test_resolve_structure_path() {
        let s = Settings {
            search_dir: PathBuf::from("/data/ct"),
            ..Settings::default()
        };
        assert_eq!(
            s.resolve_structure_path(Path::new("trna.ct")),
            PathBuf::from("/data/ct/trna.ct")
        );
        assert_eq!(
            s.resolve_structure_path(Path::new("/abs/trna.ct")),
            PathBuf::from("/abs/trna.ct")
        );
    }
}
