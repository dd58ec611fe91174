//! Distance metrics and their conversion to similarities.
//!
//! Two similarity definitions coexist:
//! - ANN results use `1 - distance`, unclamped, where distance comes from [`Metric`].
//! - Exact spot checks use `1 / (1 + cosine_distance)`, always in `(0, 1]`
//!   for non-degenerate vectors.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::vector::types::{Similarity, VectorError};

/// Epsilon for floating-point comparisons.
pub(crate) const EPSILON: f32 = 1e-10;

/// Distance metric used by the similarity index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// `sqrt(2 - 2cos)`: the Euclidean distance of the unit-normalized vectors.
    #[default]
    Angular,
    /// `1 - cos`
    Cosine,
}

impl Metric {
    /// Distance between two vectors under this metric, in `[0, 2]`.
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        let cos = cosine_similarity(a, b);
        self.distance_from_cosine(cos)
    }

    /// Distance for an already computed cosine similarity.
    pub fn distance_from_cosine(&self, cos: f32) -> f32 {
        match self {
            Metric::Angular => (2.0 - 2.0 * cos).max(0.0).sqrt(),
            Metric::Cosine => 1.0 - cos,
        }
    }

    /// Converts an index distance into a similarity (`1 - distance`).
    #[must_use]
    pub fn similarity(&self, distance: f32) -> Similarity {
        1.0 - distance
    }

    /// Lowercase name as used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Angular => "angular",
            Metric::Cosine => "cosine",
        }
    }
}

impl FromStr for Metric {
    type Err = VectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "angular" => Ok(Metric::Angular),
            "cosine" => Ok(Metric::Cosine),
            _ => Err(VectorError::InvalidMetric(s.to_string())),
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Computes cosine similarity between two vectors.
///
/// # Returns
/// * Cosine similarity in range [-1, 1], where 1 is most similar. A zero
///   vector has similarity 0 to everything.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "Vectors must have same dimension");

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}

/// Cosine distance `1 - cos`, in `[0, 2]`.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}

/// Exact pairwise similarity `1 / (1 + cosine_distance)`.
pub fn exact_similarity(a: &[f32], b: &[f32]) -> Similarity {
    1.0 / (1.0 + cosine_distance(a, b))
}

/// Normalizes a vector in-place to unit length.
///
/// Vectors with a norm below epsilon are left as-is.
pub fn normalize_vector(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > EPSILON {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

/// Creates a normalized copy of a vector.
pub fn normalize_vector_copy(vector: &[f32]) -> Vec<f32> {
    let mut normalized = vector.to_vec();
    normalize_vector(&mut normalized);
    normalized
}
