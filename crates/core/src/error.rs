use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::FileType;

/// Errors raised by the sticky store, the classifiers and the structure readers.
///
/// A missing record is not an error: lookups return `Ok(None)` for that case.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unable to access \"{}\": {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("sequence extraction is not supported for {0} files")]
    UnsupportedFormat(FileType),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("invalid settings: {0}")]
    Settings(#[from] serde_json::Error),
    #[error("unable to render JSON output: {0}")]
    Output(#[source] serde_json::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// OS error code of the underlying I/O failure, if any.
    pub fn os_code(&self) -> Option<i32> {
        match self {
            Error::Io { source, .. } => source.raw_os_error(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
