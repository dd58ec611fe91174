//! Relation and section relation files written by a full extraction.

use std::fs;

use crate::common::{build_index, perturbed, random_store};
use docrel::error::SimilarityError;
use docrel::relation::{ExtractionParams, RelationExtractor, RelationStore, SectionRelationStore};
use tempfile::TempDir;

#[test]
fn test_extracted_relations_survive_save_and_load() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("out").join("relations.xml");

    let index = build_index(random_store("d", 40, 8, 0, 17));
    let relations = RelationExtractor::new(ExtractionParams::new(0.2, 3))
        .extract(&index, None, None)
        .unwrap();
    assert!(!relations.is_empty());

    relations.save(&path).unwrap();
    let loaded = RelationStore::load(&path).unwrap();

    assert_eq!(loaded, relations);
    assert_eq!(loaded.metadata(), relations.metadata());

    let xml = fs::read_to_string(&path).unwrap();
    assert!(xml.starts_with("<?xml"));
    assert!(xml.contains("created=\""));
}

#[test]
fn test_overwrite_replaces_previous_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("relations.xml");

    let mut first = RelationStore::new();
    first.add("a", "b", 0.8);
    first.save(&path).unwrap();

    let mut second = RelationStore::new();
    second.add("c", "d", 0.7);
    second.save(&path).unwrap();

    assert_eq!(RelationStore::load(&path).unwrap(), second);
    // Only the relation file remains, no temporary leftovers
    assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
}

#[test]
fn test_relation_outside_document_is_malformed() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.xml");
    fs::write(&path, r#"<relations><relation dest="b" similarity="0.5"/></relations>"#).unwrap();

    match RelationStore::load(&path) {
        Err(SimilarityError::Malformed { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("Expected Malformed, got {other:?}"),
    }
}

#[test]
fn test_missing_relation_file() {
    let temp_dir = TempDir::new().unwrap();
    assert!(matches!(
        RelationStore::load(&temp_dir.path().join("none.xml")),
        Err(SimilarityError::FileRead { .. })
    ));
}

#[test]
fn test_section_relations_from_cross_extraction() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("sections.xml");

    let source_store = random_store("doc", 20, 8, 4, 31);
    let target_store = perturbed(&source_store, 0.01, 32);

    let source = build_index(source_store.clone());
    let target = build_index(target_store.clone());
    let relations = RelationExtractor::new(ExtractionParams::new(0.5, 1))
        .extract(&source, Some(&target), None)
        .unwrap();

    let sections =
        SectionRelationStore::from_relations(&relations, &source_store, &target_store, 0.9).unwrap();
    assert_eq!(sections.relation_count(), relations.relation_count());

    // Each section closely matches its own perturbed copy
    for (src, related) in sections.iter() {
        for relation in related {
            if relation.dest == src {
                for index in 0..4 {
                    assert!(
                        relation
                            .sections
                            .iter()
                            .any(|s| s.src_section == index && s.dest_section == index)
                    );
                }
            }
            for section in &relation.sections {
                assert!(section.similarity >= 0.9);
            }
        }
    }

    sections.save(&path).unwrap();
    assert_eq!(SectionRelationStore::load(&path).unwrap(), sections);
}

#[test]
fn test_section_relations_unknown_document() {
    let mut relations = RelationStore::new();
    relations.add("doc0", "ghost", 0.9);

    let store = random_store("doc", 2, 4, 2, 1);
    assert!(matches!(
        SectionRelationStore::from_relations(&relations, &store, &store, 0.5),
        Err(SimilarityError::DocumentNotFound { .. })
    ));
}
