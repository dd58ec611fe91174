//! Retrieval scores of extracted relations against known pairs.

use std::collections::HashSet;

use crate::corpus::DocumentPair;
use crate::relation::store::RelationStore;

/// Set of directed pairs that are known to be related.
#[derive(Debug, Clone, Default)]
pub struct GroundTruth {
    positives: HashSet<(String, String)>,
}

impl GroundTruth {
    /// Ground truth from labelled pairs; only positive labels count.
    pub fn from_pairs(pairs: &[DocumentPair]) -> Self {
        Self {
            positives: pairs
                .iter()
                .filter(|pair| pair.is_positive())
                .map(|pair| (pair.src.clone(), pair.dest.clone()))
                .collect(),
        }
    }

    /// Every document related to the document with the same id.
    ///
    /// Used when two corpora hold aligned versions of the same documents.
    pub fn identity<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            positives: ids
                .into_iter()
                .map(|id| (id.to_string(), id.to_string()))
                .collect(),
        }
    }

    pub fn contains(&self, src: &str, dest: &str) -> bool {
        self.positives
            .contains(&(src.to_string(), dest.to_string()))
    }

    /// Number of relevant pairs.
    pub fn len(&self) -> usize {
        self.positives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positives.is_empty()
    }
}

/// Precision, recall and F1 of one extraction run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalScores {
    pub true_positives: usize,
    pub retrieved: usize,
    pub relevant: usize,
    pub precision: f32,
    pub recall: f32,
    pub f1: f32,
}

/// Scores `relations` against `truth`. A ratio with a zero denominator is 0.
pub fn score(relations: &RelationStore, truth: &GroundTruth) -> RetrievalScores {
    let retrieved = relations.relation_count();
    let relevant = truth.len();
    let true_positives = relations
        .iter()
        .flat_map(|(src, related)| related.iter().map(move |r| (src, r.dest.as_str())))
        .filter(|(src, dest)| truth.contains(src, dest))
        .count();

    let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f32 / den as f32 };
    let precision = ratio(true_positives, retrieved);
    let recall = ratio(true_positives, relevant);
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    RetrievalScores {
        true_positives,
        retrieved,
        relevant,
        precision,
        recall,
        f1,
    }
}
