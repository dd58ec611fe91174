//! Settings files driving index and extraction parameters.

use std::fs;

use crate::common::abc_store;
use docrel::config::Settings;
use docrel::relation::{ExtractionParams, RelationExtractor};
use docrel::vector::{Metric, SimilarityIndex};
use tempfile::TempDir;

#[test]
fn test_generated_template_matches_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = Settings::init_config_file_in(temp_dir.path(), false).unwrap();

    let loaded = Settings::load_from(&path).unwrap();
    assert_eq!(loaded, Settings::default());

    // A second init without force keeps the existing file
    fs::write(&path, "version = 3\n").unwrap();
    assert!(Settings::init_config_file_in(temp_dir.path(), false).is_err());
    assert_eq!(Settings::load_from(&path).unwrap().version, 3);

    Settings::init_config_file_in(temp_dir.path(), true).unwrap();
    assert_eq!(Settings::load_from(&path).unwrap().version, 1);
}

#[test]
fn test_settings_drive_extraction() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.toml");
    fs::write(
        &path,
        r#"
[index]
metric = "cosine"

[extraction]
similarity_threshold = 99
max_relations_per_document = 1
"#,
    )
    .unwrap();

    let settings = Settings::load_from(&path).unwrap();
    assert_eq!(settings.index.metric, Metric::Cosine);

    let index = SimilarityIndex::from_store(abc_store(), settings.index.clone()).unwrap();
    let params = ExtractionParams::from_settings(&settings.extraction).unwrap();
    let relations = RelationExtractor::new(params).extract(&index, None, None).unwrap();

    // Cosine similarity of A and B is about 0.99995, above the 0.99 threshold
    assert_eq!(relations.get("A").map(|r| r[0].dest.as_str()), Some("B"));
    assert_eq!(relations.relation_count(), 2);
}

#[test]
fn test_threshold_above_hundred_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.toml");
    fs::write(&path, "[extraction]\nsimilarity_threshold = 120\n").unwrap();

    let settings = Settings::load_from(&path).unwrap();
    assert!(ExtractionParams::from_settings(&settings.extraction).is_err());
}
