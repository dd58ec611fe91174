//! In-memory collection of document vectors.
//!
//! Insertion order is preserved and is the order in which a similarity
//! index assigns positions, so two stores filled in the same order always
//! produce the same index.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{SimilarityError, SimilarityResult};
use crate::vector::types::VectorDimension;

/// Embedding of one section of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionVector {
    /// Position of the section inside its document
    pub index: usize,
    pub vector: Vec<f32>,
}

/// Full-document embedding plus optional per-section embeddings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentVector {
    pub id: String,
    pub vector: Vec<f32>,
    #[serde(default)]
    pub sections: Vec<SectionVector>,
}

impl DocumentVector {
    /// Creates a document vector without sections.
    pub fn new(id: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            vector,
            sections: Vec::new(),
        }
    }

    /// Adds section embeddings, in document order.
    pub fn with_sections(mut self, sections: impl IntoIterator<Item = (usize, Vec<f32>)>) -> Self {
        self.sections
            .extend(sections.into_iter().map(|(index, vector)| SectionVector { index, vector }));
        self
    }

    /// The section embeddings without their indexes.
    pub fn section_vectors(&self) -> Vec<&[f32]> {
        self.sections.iter().map(|s| s.vector.as_slice()).collect()
    }

    /// Looks up a section by its index.
    pub fn section(&self, index: usize) -> SimilarityResult<&SectionVector> {
        self.sections
            .iter()
            .find(|s| s.index == index)
            .ok_or_else(|| SimilarityError::SectionNotFound {
                id: self.id.clone(),
                section: index,
            })
    }
}

/// Provider of document vectors, as consumed by the index and datasets.
pub trait DocumentVectorSource {
    /// All documents in a stable order.
    fn iterate(&self) -> Box<dyn Iterator<Item = &DocumentVector> + '_>;

    /// Dimension shared by every vector, `None` while empty.
    fn vector_size(&self) -> Option<usize>;

    /// Looks up one document.
    fn get(&self, id: &str) -> SimilarityResult<&DocumentVector>;
}

/// Ordered mapping from document id to [`DocumentVector`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorStore {
    documents: Vec<DocumentVector>,
    by_id: HashMap<String, usize>,
    dimension: Option<VectorDimension>,
}

impl VectorStore {
    /// Creates an empty store whose dimension is fixed by the first insert.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store with a fixed dimension.
    pub fn with_dimension(dimension: VectorDimension) -> Self {
        Self {
            dimension: Some(dimension),
            ..Self::default()
        }
    }

    /// Builds a store from documents, in iteration order.
    pub fn from_documents(
        documents: impl IntoIterator<Item = DocumentVector>,
    ) -> SimilarityResult<Self> {
        let mut store = Self::new();
        for document in documents {
            store.insert(document)?;
        }
        Ok(store)
    }

    /// Adds a document.
    ///
    /// The document vector and every section vector must match the store
    /// dimension. Ids must be unique.
    pub fn insert(&mut self, document: DocumentVector) -> SimilarityResult<()> {
        if self.by_id.contains_key(&document.id) {
            return Err(SimilarityError::DuplicateDocument { id: document.id });
        }

        let dimension = match self.dimension {
            Some(dimension) => dimension,
            None => VectorDimension::new(document.vector.len()).map_err(|_| {
                SimilarityError::config(format!("Document '{}' has an empty vector", document.id))
            })?,
        };

        let mismatch = |actual: usize| SimilarityError::DimensionMismatch {
            id: document.id.clone(),
            expected: dimension.get(),
            actual,
        };
        if dimension.validate_vector(&document.vector).is_err() {
            return Err(mismatch(document.vector.len()));
        }
        if let Some(section) = document
            .sections
            .iter()
            .find(|s| dimension.validate_vector(&s.vector).is_err())
        {
            return Err(mismatch(section.vector.len()));
        }

        self.dimension = Some(dimension);
        self.by_id.insert(document.id.clone(), self.documents.len());
        self.documents.push(document);
        Ok(())
    }

    /// Looks up a document by id.
    pub fn get(&self, id: &str) -> SimilarityResult<&DocumentVector> {
        self.by_id
            .get(id)
            .map(|&i| &self.documents[i])
            .ok_or_else(|| SimilarityError::DocumentNotFound { id: id.to_string() })
    }

    /// Insertion index of a document.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    /// Document at an insertion index.
    pub fn at(&self, index: usize) -> Option<&DocumentVector> {
        self.documents.get(index)
    }

    /// Checks if a document exists.
    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Documents in insertion order, as a slice.
    pub fn documents(&self) -> &[DocumentVector] {
        &self.documents
    }

    /// Iterates documents in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, DocumentVector> {
        self.documents.iter()
    }

    /// Document ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.documents.iter().map(|d| d.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Shared vector dimension, `None` while the store is empty and unconstrained.
    pub fn dimension(&self) -> Option<VectorDimension> {
        self.dimension
    }

    /// Number of documents that carry section vectors.
    pub fn documents_with_sections(&self) -> usize {
        self.documents.iter().filter(|d| !d.sections.is_empty()).count()
    }
}

impl DocumentVectorSource for VectorStore {
    fn iterate(&self) -> Box<dyn Iterator<Item = &DocumentVector> + '_> {
        Box::new(self.documents.iter())
    }

    fn vector_size(&self) -> Option<usize> {
        self.dimension.map(|d| d.get())
    }

    fn get(&self, id: &str) -> SimilarityResult<&DocumentVector> {
        VectorStore::get(self, id)
    }
}

impl<'a> IntoIterator for &'a VectorStore {
    type Item = &'a DocumentVector;
    type IntoIter = std::slice::Iter<'a, DocumentVector>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.iter()
    }
}
