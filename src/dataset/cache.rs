//! Persisted memoization of expensive dataset builds.
//!
//! A cache is addressed by its file path. Callers pick distinguishing paths
//! for different parameters; an optional fingerprint stored in the artifact
//! turns accidental reuse of a path into an error instead of stale data.
//!
//! # Artifact layout
//!
//! ```text
//! "DRCA" | version: u32 LE | fingerprint: Option<String> | payload | SHA-256 of everything before
//! ```
//!
//! Fingerprint and payload are bincode encoded. Artifacts are replaced
//! atomically, so a reader never observes a partial write from this crate.
//! Concurrent builders targeting one path are not coordinated.

use std::path::{Path, PathBuf};

use bincode::{Decode, Encode};
use sha2::{Digest, Sha256};

use crate::error::{SimilarityError, SimilarityResult};
use crate::io::write_atomic;

const MAGIC: &[u8; 4] = b"DRCA";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 8;
const CHECKSUM_LEN: usize = 32;

fn bincode_config() -> bincode::config::Configuration {
    bincode::config::standard()
}

/// Cache file for one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetCache {
    path: PathBuf,
    fingerprint: Option<String>,
}

impl DatasetCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            fingerprint: None,
        }
    }

    /// Requires artifacts at this path to carry `key`.
    pub fn with_fingerprint(mut self, key: impl Into<String>) -> Self {
        self.fingerprint = Some(key.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Loads the artifact, or runs `builder` and persists its result when absent.
    ///
    /// A present but unreadable artifact is an error; `builder` is not run.
    pub fn get_or_build<T, F>(&self, builder: F) -> SimilarityResult<T>
    where
        T: Encode + Decode<()>,
        F: FnOnce() -> SimilarityResult<T>,
    {
        if let Some(value) = self.load()? {
            tracing::info!("Loaded cached dataset from {}", self.path.display());
            return Ok(value);
        }

        tracing::info!("No cache at {}, building", self.path.display());
        let value = builder()?;
        self.store(&value)?;
        Ok(value)
    }

    /// Reads the artifact; `None` when the file does not exist.
    pub fn load<T: Decode<()>>(&self) -> SimilarityResult<Option<T>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SimilarityError::FileRead {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        if bytes.len() < HEADER_LEN + CHECKSUM_LEN {
            return Err(SimilarityError::PartialCacheArtifact {
                path: self.path.clone(),
            });
        }
        if &bytes[..4] != MAGIC {
            return Err(self.corrupted("not a cache artifact"));
        }

        let mut version = [0u8; 4];
        version.copy_from_slice(&bytes[4..HEADER_LEN]);
        let version = u32::from_le_bytes(version);
        if version != FORMAT_VERSION {
            return Err(self.corrupted(format!("unsupported format version {version}")));
        }

        let (body, footer) = bytes.split_at(bytes.len() - CHECKSUM_LEN);
        if Sha256::digest(body).as_slice() != footer {
            return Err(self.corrupted("checksum mismatch"));
        }

        let content = &body[HEADER_LEN..];
        let (stored, consumed): (Option<String>, usize) =
            bincode::decode_from_slice(content, bincode_config())
                .map_err(|e| self.corrupted(format!("fingerprint: {e}")))?;

        if let Some(expected) = &self.fingerprint {
            if stored.as_deref() != Some(expected.as_str()) {
                return Err(SimilarityError::CacheKeyMismatch {
                    path: self.path.clone(),
                    expected: expected.clone(),
                    found: stored.unwrap_or_else(|| "<none>".to_string()),
                });
            }
        }

        let payload = &content[consumed..];
        let (value, read): (T, usize) = bincode::decode_from_slice(payload, bincode_config())
            .map_err(|e| self.corrupted(format!("payload: {e}")))?;
        if read != payload.len() {
            return Err(self.corrupted(format!(
                "{} trailing bytes after payload",
                payload.len() - read
            )));
        }

        Ok(Some(value))
    }

    /// Writes `value` as a new artifact, replacing any previous one.
    pub fn store<T: Encode>(&self, value: &T) -> SimilarityResult<()> {
        let serialization = |e: bincode::error::EncodeError| SimilarityError::Serialization {
            reason: e.to_string(),
        };

        let mut bytes = Vec::new();
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        bytes.extend(bincode::encode_to_vec(&self.fingerprint, bincode_config()).map_err(serialization)?);
        bytes.extend(bincode::encode_to_vec(value, bincode_config()).map_err(serialization)?);
        let checksum = Sha256::digest(&bytes);
        bytes.extend_from_slice(&checksum);

        write_atomic(&self.path, &bytes)?;
        tracing::debug!("Cached {} bytes at {}", bytes.len(), self.path.display());
        Ok(())
    }

    fn corrupted(&self, reason: impl Into<String>) -> SimilarityError {
        SimilarityError::CacheCorrupted {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }
}

/// Path-keyed [`DatasetCache::get_or_build`] without a fingerprint.
pub fn get_or_build<T, F>(path: &Path, builder: F) -> SimilarityResult<T>
where
    T: Encode + Decode<()>,
    F: FnOnce() -> SimilarityResult<T>,
{
    DatasetCache::new(path).get_or_build(builder)
}
