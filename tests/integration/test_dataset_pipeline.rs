//! Corpus directory to cached section dataset.

use std::fs;

use crate::common::{corpus_dir, random_store};
use docrel::config::CorpusConfig;
use docrel::corpus::{Corpus, DirectoryCorpus, DocumentPair, write_pairs_file};
use docrel::dataset::{
    DatasetCache, ReductionPolicy, SectionDataset, SectionMatrixTransformer, cache_file_name,
};
use docrel::error::SimilarityError;
use docrel::io::ExitCode;
use docrel::vector::{VectorStore, read_vector_file, write_vector_file};
use tempfile::TempDir;

fn pairs() -> Vec<DocumentPair> {
    vec![
        DocumentPair::new("doc0", "doc1", 1.0),
        DocumentPair::new("doc0", "doc2", 0.0),
        DocumentPair::new("doc3", "doc4", 1.0),
        DocumentPair::new("doc4", "doc9", 0.0),
    ]
}

#[test]
fn test_dataset_from_corpus_directory() {
    let temp_dir = TempDir::new().unwrap();
    let root = corpus_dir(&temp_dir, "corpus", &["doc0", "doc1", "doc2", "doc3", "doc4"]);
    write_pairs_file(&root.join("similarities.xml"), &pairs()).unwrap();

    let vectors_path = temp_dir.path().join("vectors.jsonl");
    // Sections per document vary from 0 to 14
    let mut store = VectorStore::new();
    for (i, document) in random_store("doc", 5, 6, 14, 3).iter().enumerate() {
        let mut document = document.clone();
        document.sections.truncate(i * 3 + 2);
        store.insert(document).unwrap();
    }
    write_vector_file(&vectors_path, &store).unwrap();

    let corpus = DirectoryCorpus::open(&root, &CorpusConfig::default()).unwrap();
    assert_eq!(corpus.number_of_documents(), 5);
    assert_eq!(corpus.document_ids(), vec!["doc0", "doc1", "doc2", "doc3", "doc4"]);

    let store = read_vector_file(&vectors_path).unwrap();
    let transformer = SectionMatrixTransformer::new(4, ReductionPolicy::Average).unwrap();
    let cache = DatasetCache::new(
        temp_dir
            .path()
            .join("cache")
            .join(cache_file_name(4, ReductionPolicy::Average, false)),
    )
    .with_fingerprint("vectors.jsonl;4;avg");

    let dataset =
        SectionDataset::load_or_build(&cache, &corpus.document_pairs().unwrap(), &store, &transformer)
            .unwrap();

    assert_eq!(dataset.len(), 3);
    assert_eq!(dataset.skipped_pairs(), 1);
    assert_eq!(dataset.positive_count(), 2);
    assert!(dataset.iter().all(|row| row.features.len() == 16));

    let artifact = fs::read(cache.path()).unwrap();
    let again =
        SectionDataset::load_or_build(&cache, &corpus.document_pairs().unwrap(), &store, &transformer)
            .unwrap();
    assert_eq!(again, dataset);
    assert_eq!(fs::read(cache.path()).unwrap(), artifact);
}

#[test]
fn test_cache_rejects_other_parameters() {
    let temp_dir = TempDir::new().unwrap();
    let store = random_store("doc", 5, 4, 3, 8);
    let path = temp_dir.path().join("dataset.bin");

    let avg = SectionMatrixTransformer::new(3, ReductionPolicy::Average).unwrap();
    SectionDataset::load_or_build(
        &DatasetCache::new(&path).with_fingerprint("n=3;avg"),
        &pairs(),
        &store,
        &avg,
    )
    .unwrap();

    let truncate = SectionMatrixTransformer::new(3, ReductionPolicy::Truncate).unwrap();
    let result = SectionDataset::load_or_build(
        &DatasetCache::new(&path).with_fingerprint("n=3;truncate"),
        &pairs(),
        &store,
        &truncate,
    );
    let error = result.unwrap_err();
    assert!(matches!(error, SimilarityError::CacheKeyMismatch { .. }));
    assert_eq!(ExitCode::from_error(&error), ExitCode::ConfigError);
}

#[test]
fn test_truncated_cache_is_not_rebuilt() {
    let temp_dir = TempDir::new().unwrap();
    let store = random_store("doc", 5, 4, 3, 8);
    let cache = DatasetCache::new(temp_dir.path().join("dataset.bin"));
    let transformer = SectionMatrixTransformer::new(2, ReductionPolicy::Truncate).unwrap();

    SectionDataset::load_or_build(&cache, &pairs(), &store, &transformer).unwrap();
    let bytes = fs::read(cache.path()).unwrap();
    fs::write(cache.path(), &bytes[..bytes.len() / 2]).unwrap();

    let error = SectionDataset::load_or_build(&cache, &pairs(), &store, &transformer).unwrap_err();
    assert!(matches!(
        error,
        SimilarityError::CacheCorrupted { .. } | SimilarityError::PartialCacheArtifact { .. }
    ));
}

#[test]
fn test_empty_corpus_directory() {
    let temp_dir = TempDir::new().unwrap();
    let root = corpus_dir(&temp_dir, "empty", &[]);
    fs::write(root.join("notes.txt"), "not a document").unwrap();

    let error = DirectoryCorpus::open(&root, &CorpusConfig::default()).unwrap_err();
    assert!(matches!(error, SimilarityError::EmptyInput { .. }));
    assert_eq!(ExitCode::from_error(&error), ExitCode::NoInput);
}

#[test]
fn test_missing_pairs_file() {
    let temp_dir = TempDir::new().unwrap();
    let root = corpus_dir(&temp_dir, "corpus", &["a"]);
    let corpus = DirectoryCorpus::open(&root, &CorpusConfig::default()).unwrap();

    assert!(matches!(
        corpus.document_pairs(),
        Err(SimilarityError::FileRead { .. })
    ));
}
