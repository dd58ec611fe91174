//! Error types for similarity indexing and relation extraction
//!
//! This module provides one structured error type using thiserror. Every
//! variant belongs to exactly one [`ErrorKind`] so callers (and the CLI exit
//! code mapping) can react to the class of failure instead of the variant.

use std::path::PathBuf;
use thiserror::Error;

use crate::vector::{ClusteringError, VectorError};

/// Broad class of a [`SimilarityError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Inconsistent inputs or settings
    Config,
    /// Operation attempted in the wrong lifecycle state
    State,
    /// Lookup of an unknown document or section
    NotFound,
    /// Reading or writing files and artifacts
    Io,
}

/// Main error type for index, extraction, and dataset operations
#[derive(Error, Debug)]
pub enum SimilarityError {
    /// Configuration errors
    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("Vector dimension mismatch for document '{id}': expected {expected}, got {actual}")]
    DimensionMismatch {
        id: String,
        expected: usize,
        actual: usize,
    },

    #[error("Empty input: {what} contains no documents")]
    EmptyInput { what: String },

    #[error("Unknown transformation policy '{name}'. Only 'truncate' or 'avg' are allowed")]
    UnknownPolicy { name: String },

    #[error("Document '{id}' has no counterpart in the {index} index")]
    MissingCounterpart { id: String, index: String },

    #[error("Document '{id}' was added twice")]
    DuplicateDocument { id: String },

    #[error("Cache '{path}' was built for key '{found}', but '{expected}' was requested")]
    CacheKeyMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    /// State errors
    #[error("Similarity index has not been built. Call build() before querying")]
    IndexNotBuilt,

    #[error("Cache artifact '{path}' is incomplete, it was probably left by an interrupted build")]
    PartialCacheArtifact { path: PathBuf },

    /// Lookup errors
    #[error("Document '{id}' not found")]
    DocumentNotFound { id: String },

    #[error("Section {section} of document '{id}' not found")]
    SectionNotFound { id: String, section: usize },

    /// File system errors
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed file '{path}': {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("Cache artifact '{path}' is corrupted: {reason}")]
    CacheCorrupted { path: PathBuf, reason: String },

    #[error("Serialization failed: {reason}")]
    Serialization { reason: String },
}

impl SimilarityError {
    /// Shorthand for a [`SimilarityError::Config`] with a formatted reason.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// The taxonomy class this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config { .. }
            | Self::DimensionMismatch { .. }
            | Self::EmptyInput { .. }
            | Self::UnknownPolicy { .. }
            | Self::MissingCounterpart { .. }
            | Self::DuplicateDocument { .. }
            | Self::CacheKeyMismatch { .. } => ErrorKind::Config,
            Self::IndexNotBuilt | Self::PartialCacheArtifact { .. } => ErrorKind::State,
            Self::DocumentNotFound { .. } | Self::SectionNotFound { .. } => ErrorKind::NotFound,
            Self::FileRead { .. }
            | Self::FileWrite { .. }
            | Self::Malformed { .. }
            | Self::CacheCorrupted { .. }
            | Self::Serialization { .. } => ErrorKind::Io,
        }
    }

    /// Get a stable status code for this error type.
    pub fn status_code(&self) -> &'static str {
        match self {
            Self::Config { .. } => "CONFIG_ERROR",
            Self::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            Self::EmptyInput { .. } => "EMPTY_INPUT",
            Self::UnknownPolicy { .. } => "UNKNOWN_POLICY",
            Self::MissingCounterpart { .. } => "MISSING_COUNTERPART",
            Self::DuplicateDocument { .. } => "DUPLICATE_DOCUMENT",
            Self::CacheKeyMismatch { .. } => "CACHE_KEY_MISMATCH",
            Self::IndexNotBuilt => "INDEX_NOT_BUILT",
            Self::PartialCacheArtifact { .. } => "PARTIAL_CACHE_ARTIFACT",
            Self::DocumentNotFound { .. } => "DOCUMENT_NOT_FOUND",
            Self::SectionNotFound { .. } => "SECTION_NOT_FOUND",
            Self::FileRead { .. } => "FILE_READ_ERROR",
            Self::FileWrite { .. } => "FILE_WRITE_ERROR",
            Self::Malformed { .. } => "MALFORMED_FILE",
            Self::CacheCorrupted { .. } => "CACHE_CORRUPTED",
            Self::Serialization { .. } => "SERIALIZATION_ERROR",
        }
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::DimensionMismatch { .. } => vec![
                "Ensure all document vectors were produced by the same embedding model",
                "Regenerate the vector file if sections were encoded with another model",
            ],
            Self::MissingCounterpart { .. } => vec![
                "Check that the corpus and the vector file belong together",
                "Rebuild the vector file after changing the corpus",
            ],
            Self::EmptyInput { .. } => vec!["Check the corpus directory and vector file paths"],
            Self::UnknownPolicy { .. } => vec!["Use --transformation truncate or --transformation avg"],
            Self::CacheKeyMismatch { .. } => vec![
                "Choose a cache path that encodes N, the policy and the corpus",
                "Delete the cache file if the old artifact is no longer needed",
            ],
            Self::PartialCacheArtifact { .. } | Self::CacheCorrupted { .. } => vec![
                "Delete the cache file and run the command again to rebuild it",
                "Check for disk errors or filesystem corruption",
            ],
            Self::FileRead { .. } => vec![
                "Check that the file exists and you have read permissions",
                "Ensure the file is not locked by another process",
            ],
            Self::FileWrite { .. } => vec![
                "Check disk space and write permissions of the output directory",
            ],
            _ => vec![],
        }
    }
}

impl From<VectorError> for SimilarityError {
    fn from(error: VectorError) -> Self {
        match error {
            VectorError::DimensionMismatch { expected, actual } => Self::DimensionMismatch {
                id: "<query>".to_string(),
                expected,
                actual,
            },
            other => Self::config(other.to_string()),
        }
    }
}

impl From<ClusteringError> for SimilarityError {
    fn from(error: ClusteringError) -> Self {
        Self::config(format!("Index construction failed: {error}"))
    }
}

/// Result type alias for similarity operations
pub type SimilarityResult<T> = Result<T, SimilarityError>;
