//! File fingerprints: modification time, length and content hash

use crate::error::{RosterError, RosterResult};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use std::time::SystemTime;

/// Identity of a file's content at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub modified: SystemTime,
    pub len: u64,
    /// SHA-256 hex digest; `None` on a probe taken without hashing
    pub content_hash: Option<String>,
}

impl Fingerprint {
    /// Fingerprint of bytes already read from a file with the given mtime.
    pub fn from_bytes(modified: SystemTime, bytes: &[u8]) -> Self {
        Self {
            modified,
            len: bytes.len() as u64,
            content_hash: Some(compute_hash(bytes)),
        }
    }

    /// Current fingerprint of the file at `path`. The content is only read
    /// and hashed when `with_hash` is set.
    pub fn probe(path: &Path, with_hash: bool) -> RosterResult<Self> {
        let metadata = fs::metadata(path).map_err(|e| RosterError::file_unavailable(path, e))?;
        let modified = metadata
            .modified()
            .map_err(|e| RosterError::file_unavailable(path, e))?;
        if with_hash {
            let bytes = fs::read(path).map_err(|e| RosterError::file_unavailable(path, e))?;
            return Ok(Self::from_bytes(modified, &bytes));
        }
        Ok(Self {
            modified,
            len: metadata.len(),
            content_hash: None,
        })
    }

    /// Whether `current` describes the same file state as `self`. Hashes are
    /// compared only when both sides carry one.
    pub fn matches(&self, current: &Fingerprint) -> bool {
        if self.modified != current.modified || self.len != current.len {
            return false;
        }
        match (&self.content_hash, &current.content_hash) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }

    /// Short hash prefix for log lines.
    pub fn short_hash(&self) -> &str {
        self.content_hash
            .as_deref()
            .map(|h| &h[..h.len().min(12)])
            .unwrap_or("-")
    }
}

/// Compute SHA256 hash of content
pub fn compute_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
