//! Same-corpus extraction over a built index.

use crate::common::{abc_store, build_index, random_store};
use docrel::config::IndexConfig;
use docrel::error::SimilarityError;
use docrel::relation::{AllowedPairs, ExtractionParams, RelationExtractor, RelationStore};
use docrel::vector::{DocumentVector, Metric, SimilarityIndex, VectorStore};

fn extract(index: &SimilarityIndex, threshold: f32, max: usize) -> RelationStore {
    RelationExtractor::new(ExtractionParams::new(threshold, max))
        .extract(index, None, None)
        .expect("extraction succeeds")
}

#[test]
fn test_abc_relations_under_angular_metric() {
    let index = build_index(abc_store());
    let relations = extract(&index, 0.9, 2);

    let a = relations.get("A").expect("A has relations");
    assert_eq!(a.len(), 1);
    assert_eq!(a[0].dest, "B");
    assert!((a[0].similarity - 0.99).abs() < 1e-3);

    let b = relations.get("B").expect("B has relations");
    assert_eq!(b[0].dest, "A");

    assert!(relations.get("C").is_none());
    assert_eq!(relations.relation_count(), 2);

    let metadata = relations.metadata().expect("metadata attached");
    assert_eq!(metadata.max_relations_per_document, 2);
    assert!((metadata.average_relations_per_document - 2.0 / 3.0).abs() < 1e-6);
}

#[test]
fn test_abc_relations_under_cosine_metric() {
    let config = IndexConfig {
        metric: Metric::Cosine,
        ..IndexConfig::default()
    };
    let index = SimilarityIndex::from_store(abc_store(), config).unwrap();
    let relations = extract(&index, 0.9, 2);

    let a = relations.get("A").unwrap();
    assert_eq!(a[0].dest, "B");
    assert!((a[0].similarity - 0.99995).abs() < 1e-4);
    assert!(relations.get("C").is_none());
}

#[test]
fn test_no_document_relates_to_itself() {
    let index = build_index(random_store("d", 60, 8, 0, 7));
    let relations = extract(&index, 0.0, 10);

    for relation in relations.relations() {
        assert_ne!(relation.src, relation.dest);
    }
}

#[test]
fn test_cap_threshold_and_ordering() {
    let index = build_index(random_store("d", 80, 6, 0, 11));
    let threshold = 0.3;
    let max = 4;
    let relations = extract(&index, threshold, max);

    for (_, related) in relations.iter() {
        assert!(!related.is_empty());
        assert!(related.len() <= max);
        for relation in related {
            assert!(relation.similarity >= threshold);
        }
        for pair in related.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
    }
}

#[test]
fn test_raising_threshold_never_adds_relations() {
    let index = build_index(random_store("d", 50, 5, 0, 3));

    let ids: Vec<String> = index.store().unwrap().ids().map(str::to_string).collect();
    let counts_at = |percent: u32| -> Vec<usize> {
        let params = ExtractionParams::from_percent(percent, 5).unwrap();
        let relations = RelationExtractor::new(params).extract(&index, None, None).unwrap();
        ids.iter()
            .map(|id| relations.get(id).map_or(0, <[_]>::len))
            .collect()
    };

    let mut previous = counts_at(0);
    for percent in [20, 40, 60, 80, 95] {
        let counts = counts_at(percent);
        for (id, (now, before)) in ids.iter().zip(counts.iter().zip(&previous)) {
            assert!(now <= before, "threshold {percent}% gave {id} more relations");
        }
        assert!(counts.iter().sum::<usize>() <= previous.iter().sum::<usize>());
        previous = counts;
    }
}

#[test]
fn test_parallel_matches_sequential() {
    let index = build_index(random_store("d", 120, 16, 0, 5));

    let sequential = RelationExtractor::new(ExtractionParams::new(0.2, 5))
        .extract(&index, None, None)
        .unwrap();
    let parallel = RelationExtractor::new(ExtractionParams::new(0.2, 5).with_parallel(true))
        .extract(&index, None, None)
        .unwrap();
    let pooled = RelationExtractor::new(
        ExtractionParams::new(0.2, 5)
            .with_parallel(true)
            .with_threads(3),
    )
    .extract(&index, None, None)
    .unwrap();

    assert_eq!(sequential, parallel);
    assert_eq!(sequential, pooled);
}

#[test]
fn test_restricted_extraction_keeps_allowed_pairs_only() {
    let store = VectorStore::from_documents(
        (0..5).map(|i| DocumentVector::new(format!("d{i}"), vec![1.0, i as f32 * 0.1, 0.0])),
    )
    .unwrap();
    let index = build_index(store);

    let allowed: AllowedPairs = [("d0", "d1"), ("d0", "d4"), ("d3", "d2")].into_iter().collect();
    let relations = RelationExtractor::new(ExtractionParams::new(0.0, 4))
        .extract(&index, None, Some(&allowed))
        .unwrap();

    for relation in relations.relations() {
        assert!(allowed.contains(&relation.src, &relation.dest));
    }
    assert_eq!(relations.relation_count(), 3);
    assert_eq!(relations.source_count(), 2);
    // Sources without an allowed pair are never queried
    assert!(relations.get("d1").is_none());
}

#[test]
fn test_restricted_pair_with_unknown_id() {
    let index = build_index(abc_store());
    let allowed: AllowedPairs = [("A", "B"), ("A", "Z")].into_iter().collect();

    let result = RelationExtractor::new(ExtractionParams::new(0.5, 2)).extract(&index, None, Some(&allowed));
    match result {
        Err(SimilarityError::MissingCounterpart { id, .. }) => assert_eq!(id, "Z"),
        other => panic!("Expected MissingCounterpart, got {other:?}"),
    }
}

#[test]
fn test_unbuilt_index_is_state_error() {
    let index = SimilarityIndex::new(IndexConfig::default());
    let result = RelationExtractor::new(ExtractionParams::new(0.5, 2)).extract(&index, None, None);
    assert!(matches!(result, Err(SimilarityError::IndexNotBuilt)));
}

#[test]
fn test_same_seed_same_relations() {
    let first = extract(&build_index(random_store("d", 70, 12, 0, 21)), 0.1, 3);
    let second = extract(&build_index(random_store("d", 70, 12, 0, 21)), 0.1, 3);
    assert_eq!(first, second);
}
