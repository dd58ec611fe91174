//! Extraction from one corpus into an aligned second corpus.

use crate::common::{build_index, perturbed, random_store};
use docrel::config::IndexConfig;
use docrel::error::SimilarityError;
use docrel::relation::{AllowedPairs, ExtractionParams, GroundTruth, RelationExtractor, score};
use docrel::vector::{DocumentVector, Metric, SimilarityIndex, VectorStore};

#[test]
fn test_aligned_corpora_find_their_counterparts() {
    let source_store = random_store("doc", 40, 24, 0, 13);
    let target_store = perturbed(&source_store, 0.02, 14);
    let ids: Vec<String> = source_store.ids().map(str::to_string).collect();

    let source = build_index(source_store);
    let target = build_index(target_store);

    let relations = RelationExtractor::new(ExtractionParams::new(0.5, 2))
        .extract(&source, Some(&target), None)
        .unwrap();

    let truth = GroundTruth::identity(ids.iter().map(String::as_str));
    let scores = score(&relations, &truth);

    // Counterparts may be the document with the same id in the other corpus
    assert!(scores.true_positives >= 36, "only {} counterparts found", scores.true_positives);
    assert!(scores.recall >= 0.9);
    assert!(scores.precision > 0.0 && scores.precision <= 1.0);
    assert!(scores.f1 > 0.0);
}

#[test]
fn test_cross_metadata_counts_source_documents() {
    let source = build_index(random_store("s", 10, 4, 0, 1));
    let target = build_index(random_store("t", 25, 4, 0, 2));

    let relations = RelationExtractor::new(ExtractionParams::new(0.0, 1))
        .extract(&source, Some(&target), None)
        .unwrap();

    for relation in relations.relations() {
        assert!(relation.src.starts_with('s'));
        assert!(relation.dest.starts_with('t'));
        assert!(relation.similarity > 0.0);
    }
    let metadata = relations.metadata().unwrap();
    let expected = relations.relation_count() as f32 / 10.0;
    assert!((metadata.average_relations_per_document - expected).abs() < 1e-6);
}

#[test]
fn test_cross_zero_threshold_skips_non_positive() {
    for metric in [Metric::Angular, Metric::Cosine] {
        let config = IndexConfig {
            metric,
            ..IndexConfig::default()
        };
        let source = VectorStore::from_documents([
            DocumentVector::new("x", vec![1.0, 0.0, 0.0]),
            DocumentVector::new("y", vec![0.0, 1.0, 0.0]),
        ])
        .unwrap();
        let target = VectorStore::from_documents([
            DocumentVector::new("t-near", vec![1.0, 0.0, 0.01]),
            DocumentVector::new("t-orthogonal", vec![0.0, 0.0, 1.0]),
            DocumentVector::new("t-opposite", vec![-1.0, 0.0, 0.0]),
        ])
        .unwrap();
        let source = SimilarityIndex::from_store(source, config.clone()).unwrap();
        let target = SimilarityIndex::from_store(target, config).unwrap();

        let relations = RelationExtractor::new(ExtractionParams::new(0.0, 5))
            .extract(&source, Some(&target), None)
            .unwrap();

        assert_eq!(relations.relation_count(), 1, "metric {metric}");
        assert!(relations.contains("x", "t-near"));
        assert!(!relations.contains("x", "t-orthogonal"));
        assert!(!relations.contains("x", "t-opposite"));
        // y is orthogonal to every target document
        assert!(relations.get("y").is_none());
    }
}

#[test]
fn test_restricted_target_id_must_exist() {
    let source = build_index(random_store("s", 5, 4, 0, 1));
    let target = build_index(random_store("t", 5, 4, 0, 2));
    let allowed: AllowedPairs = [("s0", "t0"), ("s1", "s2")].into_iter().collect();

    let result = RelationExtractor::new(ExtractionParams::new(0.0, 2)).extract(
        &source,
        Some(&target),
        Some(&allowed),
    );
    match result {
        Err(SimilarityError::MissingCounterpart { id, index }) => {
            assert_eq!(id, "s2");
            assert_eq!(index, "target");
        }
        other => panic!("Expected MissingCounterpart, got {other:?}"),
    }
}
