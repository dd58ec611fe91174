//! Bulk relation discovery over a similarity index.
//!
//! Every document of the primary index is used as a query against a target
//! index (the primary itself, or a second corpus). Neighbors are kept in the
//! order the index returns them while they pass the threshold, up to the
//! per-document cap.

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;

use crate::config::ExtractionConfig;
use crate::corpus::DocumentPair;
use crate::error::{SimilarityError, SimilarityResult};
use crate::relation::store::{RelationMetadata, RelationStore};
use crate::vector::{DocumentVector, Position, Similarity, SimilarityIndex};

/// Threshold and cap applied while extracting relations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractionParams {
    /// Minimum similarity of a kept relation
    pub similarity_threshold: Similarity,
    pub max_relations_per_document: usize,
    /// Query source documents on the rayon pool
    pub parallel: bool,
    /// Dedicated pool size; the global pool is used when `None`
    pub threads: Option<usize>,
}

impl ExtractionParams {
    pub fn new(similarity_threshold: Similarity, max_relations_per_document: usize) -> Self {
        Self {
            similarity_threshold,
            max_relations_per_document,
            parallel: false,
            threads: None,
        }
    }

    /// Builds parameters from an integer percentage (0-100).
    pub fn from_percent(percent: u32, max_relations_per_document: usize) -> SimilarityResult<Self> {
        if percent > 100 {
            return Err(SimilarityError::config(format!(
                "Similarity threshold must be between 0 and 100, got {percent}"
            )));
        }
        Ok(Self::new(percent as f32 / 100.0, max_relations_per_document))
    }

    pub fn from_settings(config: &ExtractionConfig) -> SimilarityResult<Self> {
        let params = Self::from_percent(config.similarity_threshold, config.max_relations_per_document)?
            .with_parallel(config.parallel);
        Ok(if config.parallel {
            params.with_threads(config.parallel_threads)
        } else {
            params
        })
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads.max(1));
        self
    }
}

/// Explicit allow-list of `(src, dest)` pairs for restricted extraction.
#[derive(Debug, Clone, Default)]
pub struct AllowedPairs {
    pairs: Vec<(String, String)>,
    by_source: HashMap<String, HashSet<String>>,
}

impl AllowedPairs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow-list of every corpus pair, whatever its label.
    pub fn from_document_pairs(pairs: &[DocumentPair]) -> Self {
        pairs
            .iter()
            .map(|pair| (pair.src.clone(), pair.dest.clone()))
            .collect()
    }

    pub fn insert(&mut self, src: impl Into<String>, dest: impl Into<String>) {
        let (src, dest) = (src.into(), dest.into());
        if self.by_source.entry(src.clone()).or_default().insert(dest.clone()) {
            self.pairs.push((src, dest));
        }
    }

    pub fn contains(&self, src: &str, dest: &str) -> bool {
        self.by_source
            .get(src)
            .is_some_and(|dests| dests.contains(dest))
    }

    pub fn has_source(&self, src: &str) -> bool {
        self.by_source.contains_key(src)
    }

    /// Pairs in insertion order, without duplicates.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(s, d)| (s.as_str(), d.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<S: Into<String>, D: Into<String>> FromIterator<(S, D)> for AllowedPairs {
    fn from_iter<I: IntoIterator<Item = (S, D)>>(iter: I) -> Self {
        let mut allowed = Self::new();
        for (src, dest) in iter {
            allowed.insert(src, dest);
        }
        allowed
    }
}

/// Drives index queries for every source document.
#[derive(Debug, Clone)]
pub struct RelationExtractor {
    params: ExtractionParams,
}

struct Target<'a> {
    index: &'a SimilarityIndex,
    same_corpus: bool,
}

impl RelationExtractor {
    pub fn new(params: ExtractionParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ExtractionParams {
        &self.params
    }

    /// Extracts relations from every document of `index`.
    ///
    /// Without `second` the index is compared to itself and a document
    /// never relates to its own position. With `restrict` only allow-listed
    /// pairs are kept and sources without any allowed pair are skipped.
    pub fn extract(
        &self,
        index: &SimilarityIndex,
        second: Option<&SimilarityIndex>,
        restrict: Option<&AllowedPairs>,
    ) -> SimilarityResult<RelationStore> {
        let store = index.store()?;
        let target = Target {
            index: second.unwrap_or(index),
            same_corpus: second.is_none(),
        };
        // Fails early if the target was never built
        target.index.store()?;

        if let Some(allowed) = restrict {
            for (src, dest) in allowed.iter() {
                if index.position_of(src).is_none() {
                    return Err(SimilarityError::MissingCounterpart {
                        id: src.to_string(),
                        index: "source".to_string(),
                    });
                }
                if target.index.position_of(dest).is_none() {
                    return Err(SimilarityError::MissingCounterpart {
                        id: dest.to_string(),
                        index: "target".to_string(),
                    });
                }
            }
        }

        let documents = store.documents();
        let per_source: Vec<(&str, Vec<(String, Similarity)>)> = if self.params.parallel {
            let run = || {
                documents
                    .par_iter()
                    .map(|document| {
                        self.relations_for(index, &target, document, restrict)
                            .map(|found| (document.id.as_str(), found))
                    })
                    .collect::<SimilarityResult<Vec<_>>>()
            };
            match self.params.threads {
                Some(threads) => rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| SimilarityError::config(format!("Cannot start worker pool: {e}")))?
                    .install(run)?,
                None => run()?,
            }
        } else {
            documents
                .iter()
                .map(|document| {
                    self.relations_for(index, &target, document, restrict)
                        .map(|found| (document.id.as_str(), found))
                })
                .collect::<SimilarityResult<Vec<_>>>()?
        };

        let mut relations = RelationStore::new();
        for (src, found) in per_source {
            for (dest, similarity) in found {
                relations.add(src, &dest, similarity);
            }
        }

        relations.set_metadata(RelationMetadata {
            similarity_threshold: self.params.similarity_threshold,
            max_relations_per_document: self.params.max_relations_per_document,
            average_relations_per_document: relations.average_relations_per_document(store.len()),
        });

        tracing::info!(
            "Extracted {} relations for {} of {} documents (threshold {}, max {})",
            relations.relation_count(),
            relations.source_count(),
            store.len(),
            self.params.similarity_threshold,
            self.params.max_relations_per_document
        );

        Ok(relations)
    }

    fn relations_for(
        &self,
        index: &SimilarityIndex,
        target: &Target<'_>,
        document: &DocumentVector,
        restrict: Option<&AllowedPairs>,
    ) -> SimilarityResult<Vec<(String, Similarity)>> {
        let max = self.params.max_relations_per_document;
        if max == 0 || restrict.is_some_and(|allowed| !allowed.has_source(&document.id)) {
            return Ok(Vec::new());
        }

        let own: Position =
            index
                .position_of(&document.id)
                .ok_or_else(|| SimilarityError::MissingCounterpart {
                    id: document.id.clone(),
                    index: "source".to_string(),
                })?;

        let requested = max.saturating_add(1);
        let neighbors =
            target
                .index
                .nearest(&document.vector, requested, target.index.search_k_for(requested))?;

        let mut kept = Vec::with_capacity(max.min(target.index.len()));
        for neighbor in neighbors {
            if kept.len() >= max {
                break;
            }
            if target.same_corpus && neighbor.position == own {
                continue;
            }
            if !(neighbor.similarity > 0.0 && neighbor.similarity >= self.params.similarity_threshold) {
                continue;
            }

            let dest = target.index.id_at(neighbor.position).ok_or_else(|| {
                SimilarityError::MissingCounterpart {
                    id: format!("position {}", neighbor.position),
                    index: "target".to_string(),
                }
            })?;
            if restrict.is_some_and(|allowed| !allowed.contains(&document.id, dest)) {
                continue;
            }

            kept.push((dest.to_string(), neighbor.similarity));
        }

        tracing::trace!("{}: kept {} relations", document.id, kept.len());
        Ok(kept)
    }
}
