use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Raw sequence bytes kept at each end of a fingerprint.
pub const EDGE_BYTES: usize = 8;
/// Hex-encoded SHA-256 length.
pub const DIGEST_HEX_LEN: usize = 64;
/// Total fingerprint length.
pub const FINGERPRINT_LEN: usize = EDGE_BYTES + DIGEST_HEX_LEN + EDGE_BYTES;
/// Fingerprint prefix compared during record lookup (first 8 bytes + 40 hex digits).
pub const BSHASH_BYTES: usize = 48;

/// Filler for sequences shorter than `EDGE_BYTES`.
const PAD: u8 = b'_';

/// Content-derived key for a sequence: `first8 + hex(sha256) + last8`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(Vec<u8>);

impl Fingerprint {
    /// Fingerprint a raw sequence.
    ///
    /// Sequences shorter than 8 bytes have their edge windows clamped to the
    /// whole sequence and padded with `_` (prefix on the right, suffix on the
    /// left), so the result is always `FINGERPRINT_LEN` bytes.
    pub fn of(sequence: &[u8]) -> Result<Self> {
        if sequence.is_empty() {
            return Err(Error::InvalidInput("empty sequence".to_string()));
        }
        if let Some(b) = sequence
            .iter()
            .find(|&&b| b == b'\n' || b == b'\r' || b == b'"')
        {
            return Err(Error::InvalidInput(format!(
                "sequence contains reserved byte {:?}",
                *b as char
            )));
        }

        let digest = Sha256::digest(sequence);
        let edge = sequence.len().min(EDGE_BYTES);

        let mut out = Vec::with_capacity(FINGERPRINT_LEN);
        out.extend_from_slice(&sequence[..edge]);
        out.resize(EDGE_BYTES, PAD);
        out.extend_from_slice(format!("{digest:x}").as_bytes());
        out.resize(FINGERPRINT_LEN - edge, PAD);
        out.extend_from_slice(&sequence[sequence.len() - edge..]);
        Ok(Fingerprint(out))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Leading `len` bytes (at most the whole fingerprint).
    pub fn prefix(&self, len: usize) -> &[u8] {
        &self.0[..len.min(self.0.len())]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Parse a record key as printed by `Display` (and listed by the store).
impl FromStr for Fingerprint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != FINGERPRINT_LEN {
            return Err(Error::InvalidInput(format!(
                "fingerprint must be {FINGERPRINT_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let digest = &bytes[EDGE_BYTES..EDGE_BYTES + DIGEST_HEX_LEN];
        if !digest
            .iter()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(b))
        {
            return Err(Error::InvalidInput(format!("fingerprint digest is not hex: {s}")));
        }
        if bytes.iter().any(|&b| b == b'\n' || b == b'\r' || b == b'"') {
            return Err(Error::InvalidInput("fingerprint contains a reserved byte".to_string()));
        }
        Ok(Fingerprint(bytes.to_vec()))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({self})")
    }
}
