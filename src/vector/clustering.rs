//! Spherical K-means clustering for the inverted-file similarity index.
//!
//! Cosine similarity is the assignment metric and K-means++ picks the
//! initial centroids. All randomness is drawn from a caller supplied RNG
//! so that an index built twice from the same seed is identical.
//!
//! # Algorithm Details
//! - Distance metric: Cosine similarity (not Euclidean)
//! - Initialization: K-means++
//! - Max iterations: 100
//! - Convergence tolerance: 1e-4

use rand::Rng;
use thiserror::Error;

use crate::vector::distance::{EPSILON, cosine_similarity, normalize_vector, normalize_vector_copy};
use crate::vector::types::ClusterId;

/// Maximum number of iterations for K-means clustering.
const MAX_ITERATIONS: usize = 100;

/// Convergence tolerance for centroid updates.
const CONVERGENCE_TOLERANCE: f32 = 1e-4;

/// Result of K-means clustering operation.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansResult {
    /// Cluster centroids, unit length.
    pub centroids: Vec<Vec<f32>>,

    /// Cluster assignment for each input vector.
    pub assignments: Vec<ClusterId>,

    /// Number of iterations until convergence.
    pub iterations: usize,
}

/// Errors that can occur during clustering operations.
#[derive(Error, Debug)]
pub enum ClusteringError {
    #[error("Empty vector set provided for clustering")]
    EmptyVectorSet,

    #[error("Invalid cluster count: {0}\nSuggestion: Use k between 1 and the number of vectors")]
    InvalidClusterCount(usize),

    #[error(
        "Dimension mismatch in vectors\nSuggestion: Ensure all vectors come from the same embedding model"
    )]
    DimensionMismatch,
}

/// Performs K-means clustering on a set of vectors using cosine similarity.
///
/// # Arguments
/// * `vectors` - Input vectors to cluster (must be non-empty and same dimension)
/// * `k` - Number of clusters (must be >= 1 and <= number of vectors)
/// * `rng` - Source of randomness for K-means++ seeding and empty-cluster repair
///
/// Coincident inputs can yield fewer than `k` centroids; `assignments` only
/// ever refer to centroids that exist.
pub fn kmeans_clustering<R: Rng>(
    vectors: &[Vec<f32>],
    k: usize,
    rng: &mut R,
) -> Result<KMeansResult, ClusteringError> {
    if vectors.is_empty() {
        return Err(ClusteringError::EmptyVectorSet);
    }

    if k == 0 || k > vectors.len() {
        return Err(ClusteringError::InvalidClusterCount(k));
    }

    let dimension = vectors[0].len();
    if vectors.iter().any(|v| v.len() != dimension) {
        return Err(ClusteringError::DimensionMismatch);
    }

    let mut centroids = initialize_centroids_kmeans_plus_plus(vectors, k, rng);
    let mut assignments = vec![ClusterId::from_slot(0); vectors.len()];
    let mut iterations = 0;

    loop {
        iterations += 1;

        let centroid_refs: Vec<&[f32]> = centroids.iter().map(|c| c.as_slice()).collect();
        let new_assignments: Vec<ClusterId> = vectors
            .iter()
            .map(|vector| assign_to_nearest_centroid(vector, &centroid_refs))
            .collect();

        let converged = new_assignments == assignments && iterations > 1;
        assignments = new_assignments;

        if converged || iterations >= MAX_ITERATIONS {
            break;
        }

        let new_centroids = update_centroids(vectors, &assignments, centroids.len(), rng);
        let centroid_movement = calculate_centroid_movement(&centroids, &new_centroids);
        centroids = new_centroids;

        if centroid_movement < CONVERGENCE_TOLERANCE {
            // Re-assign against the final centroids so lists match them.
            let centroid_refs: Vec<&[f32]> = centroids.iter().map(|c| c.as_slice()).collect();
            assignments = vectors
                .iter()
                .map(|vector| assign_to_nearest_centroid(vector, &centroid_refs))
                .collect();
            break;
        }
    }

    if iterations >= MAX_ITERATIONS {
        tracing::warn!("K-means did not fully converge after {MAX_ITERATIONS} iterations");
    }

    Ok(KMeansResult {
        centroids,
        assignments,
        iterations,
    })
}

/// Assigns a vector to the nearest centroid based on cosine similarity.
///
/// Ties go to the lowest centroid slot.
pub fn assign_to_nearest_centroid(vector: &[f32], centroids: &[&[f32]]) -> ClusterId {
    let mut best_similarity = f32::NEG_INFINITY;
    let mut best_cluster = 0;

    for (i, centroid) in centroids.iter().enumerate() {
        let similarity = cosine_similarity(vector, centroid);
        if similarity > best_similarity {
            best_similarity = similarity;
            best_cluster = i;
        }
    }

    ClusterId::from_slot(best_cluster)
}

/// Updates centroids as the normalized mean of their assigned vectors.
fn update_centroids<R: Rng>(
    vectors: &[Vec<f32>],
    assignments: &[ClusterId],
    k: usize,
    rng: &mut R,
) -> Vec<Vec<f32>> {
    let dimension = vectors[0].len();
    let mut new_centroids = vec![vec![0.0; dimension]; k];
    let mut cluster_sizes = vec![0usize; k];

    for (vector, cluster_id) in vectors.iter().zip(assignments.iter()) {
        let cluster_idx = cluster_id.slot();

        for (i, &value) in vector.iter().enumerate() {
            new_centroids[cluster_idx][i] += value;
        }
        cluster_sizes[cluster_idx] += 1;
    }

    for (centroid, &size) in new_centroids.iter_mut().zip(cluster_sizes.iter()) {
        if size == 0 {
            // Empty cluster: reseed from a random input vector
            let random_idx = rng.random_range(0..vectors.len());
            *centroid = normalize_vector_copy(&vectors[random_idx]);
        } else {
            for value in centroid.iter_mut() {
                *value /= size as f32;
            }
            normalize_vector(centroid);
        }
    }

    new_centroids
}

/// Initializes centroids using the K-means++ algorithm.
///
/// Stops early when every remaining vector coincides with a chosen
/// centroid, so the result may hold fewer than `k` centroids.
fn initialize_centroids_kmeans_plus_plus<R: Rng>(
    vectors: &[Vec<f32>],
    k: usize,
    rng: &mut R,
) -> Vec<Vec<f32>> {
    let mut centroids = Vec::with_capacity(k);

    let first_idx = rng.random_range(0..vectors.len());
    centroids.push(normalize_vector_copy(&vectors[first_idx]));

    for _ in 1..k {
        let mut distances = vec![0.0f32; vectors.len()];
        let mut total_distance = 0.0f32;

        for (i, vector) in vectors.iter().enumerate() {
            let mut min_distance = f32::MAX;

            for centroid in &centroids {
                let distance = 1.0 - cosine_similarity(vector, centroid);
                min_distance = min_distance.min(distance);
            }

            // Squared distance drives the K-means++ probability distribution
            distances[i] = min_distance.max(0.0) * min_distance.max(0.0);
            total_distance += distances[i];
        }

        if total_distance < EPSILON {
            break;
        }

        let mut cumulative = 0.0;
        let target = rng.random::<f32>() * total_distance;
        let mut chosen = vectors.len() - 1;

        for (i, &distance) in distances.iter().enumerate() {
            cumulative += distance;
            if distance > 0.0 && cumulative >= target {
                chosen = i;
                break;
            }
        }

        centroids.push(normalize_vector_copy(&vectors[chosen]));
    }

    centroids
}

/// Calculates the mean cosine movement of centroids between iterations.
fn calculate_centroid_movement(old: &[Vec<f32>], new: &[Vec<f32>]) -> f32 {
    old.iter()
        .zip(new.iter())
        .map(|(old_c, new_c)| 1.0 - cosine_similarity(old_c, new_c))
        .sum::<f32>()
        / old.len() as f32
}
