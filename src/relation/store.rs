//! Ordered accumulator of directed document relations.

use std::collections::HashMap;

use crate::vector::Similarity;

/// A directed, scored link from one document to another.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub src: String,
    pub dest: String,
    pub similarity: Similarity,
}

/// One destination in a source document's relation list.
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedDocument {
    pub dest: String,
    pub similarity: Similarity,
}

/// Provenance recorded alongside extracted relations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelationMetadata {
    pub similarity_threshold: f32,
    pub max_relations_per_document: usize,
    pub average_relations_per_document: f32,
}

#[derive(Debug, Clone, PartialEq)]
struct SourceEntry {
    src: String,
    relations: Vec<RelatedDocument>,
}

/// Mapping from source id to its relations, in discovery order.
///
/// This is a plain accumulator: it neither deduplicates nor enforces the
/// per-document cap. Sources appear in the order of their first `add`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationStore {
    sources: Vec<SourceEntry>,
    by_source: HashMap<String, usize>,
    metadata: Option<RelationMetadata>,
}

impl RelationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a relation to the end of `src`'s list.
    pub fn add(&mut self, src: &str, dest: &str, similarity: Similarity) {
        let slot = match self.by_source.get(src) {
            Some(&slot) => slot,
            None => {
                self.by_source.insert(src.to_string(), self.sources.len());
                self.sources.push(SourceEntry {
                    src: src.to_string(),
                    relations: Vec::new(),
                });
                self.sources.len() - 1
            }
        };
        self.sources[slot].relations.push(RelatedDocument {
            dest: dest.to_string(),
            similarity,
        });
    }

    /// Relations of one source, `None` if it has none.
    pub fn get(&self, src: &str) -> Option<&[RelatedDocument]> {
        self.by_source
            .get(src)
            .map(|&slot| self.sources[slot].relations.as_slice())
    }

    /// Checks for a `src -> dest` relation.
    pub fn contains(&self, src: &str, dest: &str) -> bool {
        self.get(src)
            .is_some_and(|relations| relations.iter().any(|r| r.dest == dest))
    }

    /// Per-source relation lists in insertion order.
    ///
    /// Every call starts a fresh traversal from the first source.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[RelatedDocument])> {
        self.sources
            .iter()
            .map(|entry| (entry.src.as_str(), entry.relations.as_slice()))
    }

    /// All relations flattened, sources in insertion order.
    pub fn relations(&self) -> impl Iterator<Item = Relation> + '_ {
        self.iter().flat_map(|(src, related)| {
            related.iter().map(move |r| Relation {
                src: src.to_string(),
                dest: r.dest.clone(),
                similarity: r.similarity,
            })
        })
    }

    /// Number of sources with at least one relation.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Total number of relations.
    pub fn relation_count(&self) -> usize {
        self.sources.iter().map(|entry| entry.relations.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Relations divided by the number of documents in the source corpus.
    pub fn average_relations_per_document(&self, document_count: usize) -> f32 {
        if document_count == 0 {
            return 0.0;
        }
        self.relation_count() as f32 / document_count as f32
    }

    pub fn metadata(&self) -> Option<&RelationMetadata> {
        self.metadata.as_ref()
    }

    pub fn set_metadata(&mut self, metadata: RelationMetadata) {
        self.metadata = Some(metadata);
    }
}

impl FromIterator<Relation> for RelationStore {
    fn from_iter<I: IntoIterator<Item = Relation>>(iter: I) -> Self {
        let mut store = Self::new();
        for relation in iter {
            store.add(&relation.src, &relation.dest, relation.similarity);
        }
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_preserves_order() {
        let mut store = RelationStore::new();
        store.add("b", "x", 0.9);
        store.add("a", "y", 0.8);
        store.add("b", "z", 0.7);

        let sources: Vec<&str> = store.iter().map(|(src, _)| src).collect();
        assert_eq!(sources, vec!["b", "a"]);

        let b: Vec<&str> = store.get("b").unwrap().iter().map(|r| r.dest.as_str()).collect();
        assert_eq!(b, vec!["x", "z"]);
        assert_eq!(store.relation_count(), 3);
        assert_eq!(store.source_count(), 2);
    }

    #[test]
    fn test_no_deduplication() {
        let mut store = RelationStore::new();
        store.add("a", "b", 0.5);
        store.add("a", "b", 0.5);
        assert_eq!(store.get("a").unwrap().len(), 2);
    }

    #[test]
    fn test_relations_are_directed() {
        let mut store = RelationStore::new();
        store.add("a", "b", 0.5);
        assert!(store.contains("a", "b"));
        assert!(!store.contains("b", "a"));
        assert!(store.get("b").is_none());
    }

    #[test]
    fn test_iteration_restarts() {
        let store: RelationStore = [
            Relation {
                src: "a".into(),
                dest: "b".into(),
                similarity: 0.6,
            },
            Relation {
                src: "c".into(),
                dest: "d".into(),
                similarity: 0.7,
            },
        ]
        .into_iter()
        .collect();

        let mut first = store.iter();
        first.next();
        // A new traversal begins at the first source again
        assert_eq!(store.iter().next().unwrap().0, "a");
        assert_eq!(store.relations().count(), 2);
    }

    #[test]
    fn test_average_relations_per_document() {
        let mut store = RelationStore::new();
        store.add("a", "b", 0.9);
        store.add("a", "c", 0.8);
        store.add("b", "a", 0.9);

        assert!((store.average_relations_per_document(6) - 0.5).abs() < 1e-6);
        assert_eq!(store.average_relations_per_document(0), 0.0);
    }
}
