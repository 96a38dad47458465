//! Flat-file table of sticky folder names.
//!
//! One record per line: `<fingerprint>;"<folder name>"`. Records are matched on
//! a fingerprint prefix, first match wins, and a record is addressed by the byte
//! offset just past its line. Rewrites go through a sibling `.temp` file that is
//! renamed over the store once fully written, so a reader sees either the old or
//! the new file. There is no locking: one writer at a time, and offsets go stale
//! as soon as the file changes.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::hasher::{Fingerprint, BSHASH_BYTES, FINGERPRINT_LEN};
use crate::naming::{sequence_name_from_label, FOLDER_NAME_DIVIDER};
use crate::types::{RecordOffset, StickyRecord};

const TEMP_SUFFIX: &str = ".temp";

/// Handle on a sticky folder store file.
#[derive(Clone, Debug)]
pub struct StickyStore {
    path: PathBuf,
    prefix_len: usize,
    divider: String,
}

impl StickyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        StickyStore {
            path: path.into(),
            prefix_len: BSHASH_BYTES,
            divider: FOLDER_NAME_DIVIDER.to_string(),
        }
    }

    /// Number of fingerprint bytes compared per record (clamped to 1..=80).
    pub fn with_prefix_len(mut self, len: usize) -> Self {
        self.prefix_len = len.clamp(1, FINGERPRINT_LEN);
        self
    }

    /// Separator stripped from numbered labels before a name is stored.
    pub fn with_divider(mut self, divider: impl Into<String>) -> Self {
        self.divider = divider.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn prefix_len(&self) -> usize {
        self.prefix_len
    }

    pub fn temp_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(TEMP_SUFFIX);
        PathBuf::from(name)
    }

    /// Create an empty store file (and its directory) if none exists yet.
    pub fn create_if_missing(&self) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| self.fail(dir, e))?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.fail(&self.path, e))?;
        Ok(())
    }

    /// Offset of the first record whose fingerprint prefix matches `sequence`.
    pub fn find_record_offset(&self, sequence: &[u8]) -> Result<Option<RecordOffset>> {
        self.find_fingerprint_offset(&Fingerprint::of(sequence)?)
    }

    /// Like `find_record_offset`, for a fingerprint that is already computed
    /// (or parsed back from a record key).
    pub fn find_fingerprint_offset(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<RecordOffset>> {
        let prefix = fingerprint.prefix(self.prefix_len);

        let mut lines = RecordLines::new(self.open()?);
        let mut line = Vec::new();
        while let Some(end) = lines.next_line(&mut line).map_err(|e| self.fail(&self.path, e))? {
            if line.starts_with(prefix) {
                debug!("sticky record for {fingerprint} ends at {}", end.0);
                return Ok(Some(end));
            }
        }
        Ok(None)
    }

    /// Folder name of the record whose line ends at `offset`.
    pub fn lookup_folder_name(&self, offset: RecordOffset) -> Result<Option<String>> {
        let mut lines = RecordLines::new(self.open()?);
        let mut line = Vec::new();
        while let Some(end) = lines.next_line(&mut line).map_err(|e| self.fail(&self.path, e))? {
            if end == offset {
                return Ok(quoted_name(&line));
            }
            if end > offset {
                break;
            }
        }
        Ok(None)
    }

    /// Write `folder_name` for `sequence`, replacing the record ending at
    /// `replace`. Without a matching record the entry is appended.
    pub fn upsert(
        &self,
        sequence: &[u8],
        folder_name: &str,
        replace: Option<RecordOffset>,
    ) -> Result<()> {
        self.upsert_with(sequence, folder_name, replace, |path| {
            File::create(path).map(BufWriter::new)
        })
    }

    fn upsert_with<W, F>(
        &self,
        sequence: &[u8],
        folder_name: &str,
        replace: Option<RecordOffset>,
        open_temp: F,
    ) -> Result<()>
    where
        W: StagedWrite,
        F: FnOnce(&Path) -> io::Result<W>,
    {
        let record = self.format_record(sequence, folder_name)?;
        let mut reader = self.open()?;
        let temp_path = self.temp_path();
        let mut out = open_temp(&temp_path).map_err(|e| self.fail(&temp_path, e))?;

        let staged = stream_records(&mut reader, &mut out, &record, replace)
            .and_then(|replaced| out.finish().map(|()| replaced));
        drop(reader);

        let replaced = match staged {
            Ok(replaced) => replaced,
            Err(e) => {
                discard_temp(&temp_path);
                return Err(self.fail(&temp_path, e));
            }
        };
        match (replace, replaced) {
            (Some(offset), false) => {
                warn!(
                    "no record ends at offset {} in \"{}\"; appending",
                    offset.0,
                    self.path.display()
                );
            }
            (_, true) => debug!("replaced sticky record in \"{}\"", self.path.display()),
            (None, false) => debug!("appended sticky record to \"{}\"", self.path.display()),
        }

        fs::rename(&temp_path, &self.path).map_err(|e| {
            discard_temp(&temp_path);
            self.fail(&self.path, e)
        })
    }

    /// Sticky name stored for `sequence`, if any.
    pub fn lookup(&self, sequence: &[u8]) -> Result<Option<String>> {
        match self.find_record_offset(sequence)? {
            Some(offset) => self.lookup_folder_name(offset),
            None => Ok(None),
        }
    }

    /// Store `folder_name` for `sequence`, replacing its current record if present.
    pub fn remember(&self, sequence: &[u8], folder_name: &str) -> Result<()> {
        let offset = self.find_record_offset(sequence)?;
        self.upsert(sequence, folder_name, offset)
    }

    /// All well-formed records in file order.
    pub fn records(&self) -> Result<Vec<StickyRecord>> {
        let mut lines = RecordLines::new(self.open()?);
        let mut line = Vec::new();
        let mut records = Vec::new();
        while let Some(end) = lines.next_line(&mut line).map_err(|e| self.fail(&self.path, e))? {
            let Some(first_quote) = line.iter().position(|&b| b == b'"') else {
                continue;
            };
            let Some(folder_name) = quoted_name(&line) else {
                continue;
            };
            let key = &line[..first_quote];
            let key = key.strip_suffix(b";").unwrap_or(key);
            records.push(StickyRecord {
                fingerprint: String::from_utf8_lossy(key).into_owned(),
                folder_name,
                offset: end,
            });
        }
        Ok(records)
    }

    fn format_record(&self, sequence: &[u8], folder_name: &str) -> Result<Vec<u8>> {
        let name = sequence_name_from_label(folder_name, &self.divider);
        if name.is_empty() {
            return Err(Error::InvalidInput("empty folder name".to_string()));
        }
        if name.contains(['"', '\n', '\r']) {
            return Err(Error::InvalidInput(format!(
                "folder name {name:?} contains a quote or line break"
            )));
        }
        let fingerprint = Fingerprint::of(sequence)?;

        let mut record = Vec::with_capacity(fingerprint.len() + name.len() + 4);
        record.extend_from_slice(fingerprint.as_bytes());
        record.extend_from_slice(b";\"");
        record.extend_from_slice(name.as_bytes());
        record.extend_from_slice(b"\"\n");
        Ok(record)
    }

    fn open(&self) -> Result<BufReader<File>> {
        File::open(&self.path)
            .map(BufReader::new)
            .map_err(|e| self.fail(&self.path, e))
    }

    fn fail(&self, path: &Path, e: io::Error) -> Error {
        warn!("unable to access \"{}\": {e}", path.display());
        Error::io(path, e)
    }
}

/// Remove an abandoned temp file. Returns false if it could not be removed.
fn discard_temp(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => true,
        Err(e) if e.kind() == io::ErrorKind::NotFound => true,
        Err(e) => {
            warn!("unable to remove temp file \"{}\": {e}", path.display());
            false
        }
    }
}

/// Temp-file sink that must be made durable before the rename.
trait StagedWrite: Write {
    fn finish(self) -> io::Result<()>;
}

impl StagedWrite for BufWriter<File> {
    fn finish(self) -> io::Result<()> {
        let file = self.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()
    }
}

/// Line reader that reports the byte offset just past each line.
struct RecordLines<R> {
    reader: R,
    offset: u64,
}

impl<R: BufRead> RecordLines<R> {
    fn new(reader: R) -> Self {
        RecordLines { reader, offset: 0 }
    }

    fn next_line(&mut self, buf: &mut Vec<u8>) -> io::Result<Option<RecordOffset>> {
        buf.clear();
        let n = self.reader.read_until(b'\n', buf)?;
        if n == 0 {
            return Ok(None);
        }
        self.offset += n as u64;
        Ok(Some(RecordOffset(self.offset)))
    }
}

/// Copy every line, swapping in `record` for the line ending at `replace`.
/// Appends `record` when nothing was replaced.
fn stream_records<R: BufRead, W: Write>(
    reader: &mut R,
    out: &mut W,
    record: &[u8],
    replace: Option<RecordOffset>,
) -> io::Result<bool> {
    let mut lines = RecordLines::new(reader);
    let mut line = Vec::new();
    let mut replaced = false;
    let mut terminated = true;

    while let Some(end) = lines.next_line(&mut line)? {
        if !replaced && Some(end) == replace {
            out.write_all(record)?;
            replaced = true;
            terminated = true;
        } else {
            out.write_all(&line)?;
            terminated = line.ends_with(b"\n");
        }
    }
    if !replaced {
        if !terminated {
            out.write_all(b"\n")?;
        }
        out.write_all(record)?;
    }
    Ok(replaced)
}

/// Text between the first and last double quote; `None` if empty or unquoted.
fn quoted_name(line: &[u8]) -> Option<String> {
    let first = line.iter().position(|&b| b == b'"')?;
    let last = line.iter().rposition(|&b| b == b'"')?;
    if last <= first + 1 {
        return None;
    }
    Some(String::from_utf8_lossy(&line[first + 1..last]).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEQ: &[u8] = b"GGGAAACCCUUUGGGAAACCC";

    struct FailAfter {
        inner: BufWriter<File>,
        budget: usize,
    }

    impl Write for FailAfter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.budget == 0 {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            let n = buf.len().min(self.budget);
            self.budget -= n;
            self.inner.write(&buf[..n])
        }

        fn flush(&mut self) -> io::Result<()> {
            self.inner.flush()
        }
    }

    impl StagedWrite for FailAfter {
        fn finish(self) -> io::Result<()> {
            self.inner.finish()
        }
    }

    fn store_with(contents: &str) -> (tempfile::TempDir, StickyStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sticky.cfg");
        fs::write(&path, contents).unwrap();
        (dir, StickyStore::new(path))
    }

    #[test]
    fn test_quoted_name() {
        assert_eq!(quoted_name(b"abc;\"tRNA\"\n").as_deref(), Some("tRNA"));
        assert_eq!(quoted_name(b"abc;\"a \"b\" c\"\n").as_deref(), Some("a \"b\" c"));
        assert_eq!(quoted_name(b"abc;tRNA\n"), None);
        assert_eq!(quoted_name(b"abc;\"tRNA\n"), None);
        assert_eq!(quoted_name(b"abc;\"\"\n"), None);
    }

    #[test]
    fn test_stream_replaces_matching_line() {
        let input = b"one\ntwo\nthree\n";
        let mut out = Vec::new();
        let replaced = stream_records(
            &mut &input[..],
            &mut out,
            b"NEW\n",
            Some(RecordOffset(8)),
        )
        .unwrap();
        assert!(replaced);
        assert_eq!(out, b"one\nNEW\nthree\n");
    }

    #[test]
    fn test_stream_appends_after_unterminated_line() {
        let input = b"one\ntwo";
        let mut out = Vec::new();
        let replaced = stream_records(&mut &input[..], &mut out, b"NEW\n", None).unwrap();
        assert!(!replaced);
        assert_eq!(out, b"one\ntwo\nNEW\n");
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let store = StickyStore::new("/tmp/x/sticky.cfg");
        assert_eq!(store.temp_path(), PathBuf::from("/tmp/x/sticky.cfg.temp"));
    }

    #[test]
    fn test_prefix_len_clamped() {
        assert_eq!(StickyStore::new("s").with_prefix_len(0).prefix_len(), 1);
        assert_eq!(StickyStore::new("s").with_prefix_len(500).prefix_len(), 80);
    }

    #[test]
    fn test_failed_temp_write_keeps_original() {
        let fp = Fingerprint::of(SEQ).unwrap();
        let original = format!("{fp};\"Old name\"\nzzzz;\"Other\"\n");
        let (_dir, store) = store_with(&original);
        let offset = store.find_record_offset(SEQ).unwrap();

        let err = store
            .upsert_with(SEQ, "New name", offset, |path| {
                Ok(FailAfter {
                    inner: BufWriter::new(File::create(path)?),
                    budget: 20,
                })
            })
            .unwrap_err();

        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(fs::read_to_string(store.path()).unwrap(), original);
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn test_discard_temp() {
        let dir = tempfile::tempdir().unwrap();
        let temp = dir.path().join("sticky.cfg.temp");
        fs::write(&temp, "partial").unwrap();
        assert!(discard_temp(&temp));
        assert!(!temp.exists());
        // already gone
        assert!(discard_temp(&temp));
        // a directory cannot be removed as a file
        fs::create_dir(&temp).unwrap();
        assert!(!discard_temp(&temp));
        assert!(temp.exists());
    }

    #[test]
    fn test_label_prefix_stripped_before_storing() {
        let (_dir, store) = store_with("");
        store.upsert(SEQ, "No. # 3 : Yeast tRNA", None).unwrap();
        assert_eq!(store.lookup(SEQ).unwrap().as_deref(), Some("Yeast tRNA"));
    }

    #[test]
    fn test_bad_names_rejected() {
        let (_dir, store) = store_with("");
        assert!(matches!(
            store.upsert(SEQ, "No. # 3 : ", None),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            store.upsert(SEQ, "say \"hi\"", None),
            Err(Error::InvalidInput(_))
        ));
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "");
    }
}
