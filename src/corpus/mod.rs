//! Corpus collaborators: which documents exist and which pairs are labelled.

mod directory;

pub use directory::{DirectoryCorpus, read_pairs_file, write_pairs_file};

use std::collections::HashSet;

use crate::error::{SimilarityError, SimilarityResult};
use crate::vector::VectorStore;

/// A labelled pair of documents from a corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentPair {
    pub src: String,
    pub dest: String,
    /// 0 for unrelated, positive for related (graded labels allowed)
    pub label: f32,
}

impl DocumentPair {
    pub fn new(src: impl Into<String>, dest: impl Into<String>, label: f32) -> Self {
        Self {
            src: src.into(),
            dest: dest.into(),
            label,
        }
    }

    pub fn is_positive(&self) -> bool {
        self.label > 0.0
    }
}

/// Source of document identifiers and ground-truth pairs.
pub trait Corpus {
    fn number_of_documents(&self) -> usize;

    /// Document ids in a stable order.
    fn document_ids(&self) -> Vec<String>;

    /// Labelled pairs used for restricted extraction and datasets.
    fn document_pairs(&self) -> SimilarityResult<Vec<DocumentPair>>;
}

/// Corpus held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCorpus {
    ids: Vec<String>,
    pairs: Vec<DocumentPair>,
}

impl InMemoryCorpus {
    pub fn new(ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
            pairs: Vec::new(),
        }
    }

    pub fn with_pairs(mut self, pairs: impl IntoIterator<Item = DocumentPair>) -> Self {
        self.pairs.extend(pairs);
        self
    }
}

impl Corpus for InMemoryCorpus {
    fn number_of_documents(&self) -> usize {
        self.ids.len()
    }

    fn document_ids(&self) -> Vec<String> {
        self.ids.clone()
    }

    fn document_pairs(&self) -> SimilarityResult<Vec<DocumentPair>> {
        Ok(self.pairs.clone())
    }
}

/// Keeps the vectors of `all` that belong to a document of `corpus`.
///
/// Returns the filtered store, in `all`'s order, together with the corpus
/// ids that have no vector. A vector set sharing no id with the corpus is a
/// configuration error.
pub fn corpus_vectors(
    corpus: &dyn Corpus,
    all: &VectorStore,
) -> SimilarityResult<(VectorStore, Vec<String>)> {
    let ids = corpus.document_ids();
    let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
    let missing: Vec<String> = ids.iter().filter(|id| !all.contains(id)).cloned().collect();

    let store = VectorStore::from_documents(
        all.iter()
            .filter(|document| wanted.contains(document.id.as_str()))
            .cloned(),
    )?;
    if store.is_empty() {
        return Err(SimilarityError::config(format!(
            "None of the {} vectors belongs to one of the {} corpus documents",
            all.len(),
            ids.len()
        )));
    }
    Ok((store, missing))
}
