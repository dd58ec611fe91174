//! Approximate nearest-neighbor index over document vectors.
//!
//! The index is an inverted file (IVF-flat): unit-normalized vectors are
//! grouped by spherical K-means and every document is listed under its
//! nearest centroid. A query ranks the centroids and scans their lists in
//! that order until the search breadth is exhausted.
//!
//! # Search breadth
//! `search_k` is the minimum number of candidates examined, mirroring the
//! classic "search_k" knob of tree based ANN libraries. Callers that drop
//! results afterwards (self-exclusion, thresholds) over-fetch with
//! `search_k_multiplier * (k + 1)`.

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::IndexConfig;
use crate::error::{SimilarityError, SimilarityResult};
use crate::vector::clustering::kmeans_clustering;
use crate::vector::distance::{Metric, exact_similarity, normalize_vector_copy};
use crate::vector::store::VectorStore;
use crate::vector::types::{Position, Similarity};

/// Upper bound for the automatically chosen cluster count.
const MAX_CLUSTERS: usize = 256;

/// One raw result of [`SimilarityIndex::nearest`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: Position,
    pub similarity: Similarity,
}

#[derive(Debug)]
struct BuiltIndex {
    store: VectorStore,
    normalized: Vec<Vec<f32>>,
    centroids: Vec<Vec<f32>>,
    lists: Vec<Vec<Position>>,
}

/// Similarity index with a position <-> id mapping fixed at build time.
#[derive(Debug)]
pub struct SimilarityIndex {
    config: IndexConfig,
    built: Option<BuiltIndex>,
}

impl SimilarityIndex {
    /// Creates an unbuilt index. Every query fails until [`build`](Self::build).
    pub fn new(config: IndexConfig) -> Self {
        Self {
            config,
            built: None,
        }
    }

    /// Creates and builds an index in one step.
    pub fn from_store(store: VectorStore, config: IndexConfig) -> SimilarityResult<Self> {
        let mut index = Self::new(config);
        index.build(store)?;
        Ok(index)
    }

    /// Builds the index from a store snapshot.
    ///
    /// Positions follow the store's insertion order. Building again replaces
    /// the previous contents.
    pub fn build(&mut self, store: VectorStore) -> SimilarityResult<()> {
        if store.is_empty() {
            return Err(SimilarityError::EmptyInput {
                what: "vector store".to_string(),
            });
        }

        let Some(dimension) = store.dimension() else {
            return Err(SimilarityError::config("vector store has no dimension"));
        };
        for document in &store {
            if document.vector.len() != dimension.get() {
                return Err(SimilarityError::DimensionMismatch {
                    id: document.id.clone(),
                    expected: dimension.get(),
                    actual: document.vector.len(),
                });
            }
        }

        let normalized: Vec<Vec<f32>> = store
            .iter()
            .map(|document| normalize_vector_copy(&document.vector))
            .collect();

        let n = normalized.len();
        let k = self
            .config
            .clusters
            .unwrap_or_else(|| (n as f32).sqrt().ceil() as usize)
            .clamp(1, MAX_CLUSTERS)
            .min(n);

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let clustering = kmeans_clustering(&normalized, k, &mut rng)?;

        let mut lists = vec![Vec::new(); clustering.centroids.len()];
        for (position, cluster) in clustering.assignments.iter().enumerate() {
            lists[cluster.slot()].push(Position::new(position as u32));
        }

        tracing::info!(
            "Built similarity index over {n} documents ({} clusters, {} iterations, metric {})",
            clustering.centroids.len(),
            clustering.iterations,
            self.config.metric
        );

        self.built = Some(BuiltIndex {
            store,
            normalized,
            centroids: clustering.centroids,
            lists,
        });
        Ok(())
    }

    fn built(&self) -> SimilarityResult<&BuiltIndex> {
        self.built.as_ref().ok_or(SimilarityError::IndexNotBuilt)
    }

    /// Checks if [`build`](Self::build) has completed.
    pub fn is_built(&self) -> bool {
        self.built.is_some()
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn metric(&self) -> Metric {
        self.config.metric
    }

    /// The store snapshot taken at build time.
    pub fn store(&self) -> SimilarityResult<&VectorStore> {
        Ok(&self.built()?.store)
    }

    /// Number of indexed documents, 0 before build.
    pub fn len(&self) -> usize {
        self.built.as_ref().map_or(0, |b| b.store.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of inverted lists, 0 before build.
    pub fn cluster_count(&self) -> usize {
        self.built.as_ref().map_or(0, |b| b.centroids.len())
    }

    /// Position assigned to a document id.
    pub fn position_of(&self, id: &str) -> Option<Position> {
        self.built
            .as_ref()?
            .store
            .index_of(id)
            .map(|i| Position::new(i as u32))
    }

    /// Document id at a position.
    pub fn id_at(&self, position: Position) -> Option<&str> {
        self.built
            .as_ref()?
            .store
            .at(position.as_index())
            .map(|d| d.id.as_str())
    }

    /// Search breadth used when `n` neighbors are requested.
    pub fn search_k_for(&self, n: usize) -> usize {
        n.saturating_mul(self.config.search_k_multiplier.max(1))
    }

    /// Raw ANN lookup: up to `n` neighbors, most similar first.
    ///
    /// At least `max(search_k, n)` candidates (bounded by the index size) are
    /// examined and at least `min_probe` lists visited. Equal distances are
    /// ordered by position.
    pub fn nearest(
        &self,
        vector: &[f32],
        n: usize,
        search_k: usize,
    ) -> SimilarityResult<Vec<Neighbor>> {
        let built = self.built()?;
        if let Some(dimension) = built.store.dimension() {
            dimension.validate_vector(vector)?;
        }
        if n == 0 {
            return Ok(Vec::new());
        }

        let total = built.store.len();
        let n = n.min(total);
        let query = normalize_vector_copy(vector);

        let mut ranked: Vec<(usize, f32)> = built
            .centroids
            .iter()
            .enumerate()
            .map(|(slot, centroid)| (slot, dot(&query, centroid)))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        let budget = search_k.max(n).min(total);
        let min_probe = self.config.min_probe.max(1);
        let metric = self.config.metric;

        let mut candidates: Vec<(f32, Position)> = Vec::with_capacity(budget);
        let mut probed = 0;
        for (slot, _) in ranked {
            if probed >= min_probe && candidates.len() >= budget {
                break;
            }
            probed += 1;
            for &position in &built.lists[slot] {
                let cos = dot(&query, &built.normalized[position.as_index()]);
                candidates.push((metric.distance_from_cosine(cos), position));
            }
        }

        tracing::trace!(
            "Probed {probed}/{} lists, {} candidates for n={n}",
            built.lists.len(),
            candidates.len()
        );

        candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        candidates.truncate(n);

        Ok(candidates
            .into_iter()
            .map(|(distance, position)| Neighbor {
                position,
                similarity: metric.similarity(distance),
            })
            .collect())
    }

    /// Up to `k` most similar documents to a vector, as `(id, similarity)`.
    pub fn query(&self, vector: &[f32], k: usize) -> SimilarityResult<Vec<(String, Similarity)>> {
        let requested = k.saturating_add(1);
        let neighbors = self.nearest(vector, requested, self.search_k_for(requested))?;
        self.resolve(neighbors.into_iter().take(k))
    }

    /// Up to `k` documents most similar to an indexed document, excluding itself.
    pub fn query_document(&self, id: &str, k: usize) -> SimilarityResult<Vec<(String, Similarity)>> {
        let built = self.built()?;
        let document = built.store.get(id)?;
        let own = self.position_of(id);

        let requested = k.saturating_add(1);
        let neighbors = self.nearest(&document.vector, requested, self.search_k_for(requested))?;
        self.resolve(
            neighbors
                .into_iter()
                .filter(|neighbor| Some(neighbor.position) != own)
                .take(k),
        )
    }

    /// Exact similarity `1 / (1 + cosine_distance)` of two indexed documents.
    ///
    /// Bypasses the approximate structure; meant for spot checks.
    pub fn cosine_similarity(&self, id1: &str, id2: &str) -> SimilarityResult<Similarity> {
        let store = &self.built()?.store;
        let a = store.get(id1)?;
        let b = store.get(id2)?;
        Ok(exact_similarity(&a.vector, &b.vector))
    }

    fn resolve(
        &self,
        neighbors: impl Iterator<Item = Neighbor>,
    ) -> SimilarityResult<Vec<(String, Similarity)>> {
        neighbors
            .map(|neighbor| {
                self.id_at(neighbor.position)
                    .map(|id| (id.to_string(), neighbor.similarity))
                    .ok_or_else(|| SimilarityError::MissingCounterpart {
                        id: format!("position {}", neighbor.position),
                        index: "queried".to_string(),
                    })
            })
            .collect()
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
