//! Type-safe wrappers and core types for the similarity index.
//!
//! Positions, clusters and dimensions are newtypes so that an index
//! position can never be confused with a cluster number or a length.

use std::num::NonZeroU32;
use thiserror::Error;

/// Similarity score derived from a distance.
///
/// Not clamped: ANN similarities are `1 - distance` and can be negative
/// for near-opposite vectors.
pub type Similarity = f32;

/// Dense position of a document inside a built index, in `[0, n)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position(u32);

impl Position {
    /// Creates a new `Position`.
    #[must_use]
    pub const fn new(position: u32) -> Self {
        Self(position)
    }

    /// Returns the underlying u32 value.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Returns the position as a slice index.
    #[must_use]
    pub const fn as_index(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Type-safe wrapper for cluster IDs in the inverted-file index.
///
/// Clusters are identified by non-zero IDs to prevent confusion
/// with uninitialized or error states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClusterId(NonZeroU32);

impl ClusterId {
    /// Creates a new `ClusterId` from a non-zero u32.
    ///
    /// Returns `None` if the provided ID is zero.
    #[must_use]
    pub fn new(id: u32) -> Option<Self> {
        NonZeroU32::new(id).map(Self)
    }

    /// Creates the cluster id for a zero-based centroid slot.
    #[must_use]
    pub fn from_slot(slot: usize) -> Self {
        Self(NonZeroU32::MIN.saturating_add(slot as u32))
    }

    /// Returns the underlying u32 value.
    #[must_use]
    pub fn get(&self) -> u32 {
        self.0.get()
    }

    /// Returns the zero-based centroid slot.
    #[must_use]
    pub fn slot(&self) -> usize {
        (self.0.get() - 1) as usize
    }
}

/// Type-safe wrapper for vector dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorDimension(usize);

impl VectorDimension {
    /// Creates a new `VectorDimension` with validation.
    ///
    /// Returns an error if the dimension is zero.
    pub fn new(dim: usize) -> Result<Self, VectorError> {
        if dim == 0 {
            return Err(VectorError::InvalidDimension {
                dimension: 0,
                reason: "Vector dimension cannot be zero",
            });
        }
        Ok(Self(dim))
    }

    /// Returns the underlying dimension value.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }

    /// Validates that a vector has the expected dimension.
    pub fn validate_vector(&self, vector: &[f32]) -> Result<(), VectorError> {
        if vector.len() != self.0 {
            return Err(VectorError::DimensionMismatch {
                expected: self.0,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

/// Errors that can occur during vector operations.
#[derive(Error, Debug)]
pub enum VectorError {
    #[error(
        "Vector dimension mismatch: expected {expected}, got {actual}\nSuggestion: Ensure all vectors use the same embedding model"
    )]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid vector dimension: {dimension}\nReason: {reason}")]
    InvalidDimension {
        dimension: usize,
        reason: &'static str,
    },

    #[error("Invalid metric '{0}'\nSuggestion: Use 'angular' or 'cosine'")]
    InvalidMetric(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_id_slots() {
        let id = ClusterId::from_slot(0);
        assert_eq!(id.get(), 1);
        assert_eq!(id.slot(), 0);

        let id = ClusterId::from_slot(41);
        assert_eq!(id.get(), 42);
        assert_eq!(id.slot(), 41);

        assert!(ClusterId::new(0).is_none());
    }

    #[test]
    fn test_position_ordering() {
        let a = Position::new(0);
        let b = Position::new(7);
        assert!(a < b);
        assert_eq!(b.as_index(), 7);
        assert_eq!(b.to_string(), "7");
    }

    #[test]
    fn test_vector_dimension() {
        let dim = VectorDimension::new(384).unwrap();
        assert_eq!(dim.get(), 384);

        assert!(VectorDimension::new(0).is_err());

        assert!(dim.validate_vector(&vec![0.1; 384]).is_ok());
        assert!(matches!(
            dim.validate_vector(&vec![0.1; 100]),
            Err(VectorError::DimensionMismatch {
                expected: 384,
                actual: 100
            })
        ));
    }
}
