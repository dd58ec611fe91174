//! Vector storage and approximate similarity search.
//!
//! Documents are held in a [`VectorStore`] and searched through a
//! [`SimilarityIndex`]. The index is an IVF-flat structure: K-means
//! partitions the unit-normalized vectors into inverted lists and queries
//! scan the lists closest to the query first.
//!
//! # Architecture
//! - `store`: documents and their section vectors, in insertion order
//! - `reader`: JSON Lines vector files
//! - `clustering`: seeded spherical K-means
//! - `index`: build and query
//! - `distance`: metrics and distance to similarity conversion

mod clustering;
mod distance;
mod index;
mod reader;
mod store;
mod types;

// Re-export core types for public API
pub use clustering::{ClusteringError, KMeansResult, assign_to_nearest_centroid, kmeans_clustering};
pub use distance::{
    Metric, cosine_distance, cosine_similarity, exact_similarity, normalize_vector,
    normalize_vector_copy,
};
pub use index::{Neighbor, SimilarityIndex};
pub use reader::{read_vector_file, write_vector_file};
pub use store::{DocumentVector, DocumentVectorSource, SectionVector, VectorStore};
pub use types::{ClusterId, Position, Similarity, VectorDimension, VectorError};
