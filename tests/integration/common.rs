//! Shared fixtures for integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use docrel::config::IndexConfig;
use docrel::vector::{DocumentVector, SimilarityIndex, VectorStore};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

/// The three-document example: A and B nearly parallel, C orthogonal.
pub fn abc_store() -> VectorStore {
    VectorStore::from_documents([
        DocumentVector::new("A", vec![1.0, 0.0, 0.0]),
        DocumentVector::new("B", vec![1.0, 0.0, 0.01]),
        DocumentVector::new("C", vec![0.0, 1.0, 0.0]),
    ])
    .expect("valid store")
}

/// `n` random documents with `sections` random section vectors each.
pub fn random_store(prefix: &str, n: usize, dim: usize, sections: usize, seed: u64) -> VectorStore {
    let mut rng = StdRng::seed_from_u64(seed);
    let random_vector = |rng: &mut StdRng| -> Vec<f32> {
        (0..dim).map(|_| rng.random_range(-1.0f32..1.0)).collect()
    };

    let mut store = VectorStore::new();
    for i in 0..n {
        let vector = random_vector(&mut rng);
        let section_vectors: Vec<(usize, Vec<f32>)> =
            (0..sections).map(|s| (s, random_vector(&mut rng))).collect();
        store
            .insert(DocumentVector::new(format!("{prefix}{i}"), vector).with_sections(section_vectors))
            .expect("unique ids");
    }
    store
}

/// Copy of `store` with every vector moved by a small deterministic offset.
pub fn perturbed(store: &VectorStore, scale: f32, seed: u64) -> VectorStore {
    let mut rng = StdRng::seed_from_u64(seed);
    let jitter = |v: &[f32], rng: &mut StdRng| -> Vec<f32> {
        v.iter()
            .map(|x| x + rng.random_range(-scale..scale))
            .collect()
    };

    VectorStore::from_documents(store.iter().map(|document| {
        let vector = jitter(&document.vector, &mut rng);
        let sections: Vec<(usize, Vec<f32>)> = document
            .sections
            .iter()
            .map(|s| (s.index, jitter(&s.vector, &mut rng)))
            .collect();
        DocumentVector::new(document.id.clone(), vector).with_sections(sections)
    }))
    .expect("valid store")
}

pub fn build_index(store: VectorStore) -> SimilarityIndex {
    SimilarityIndex::from_store(store, IndexConfig::default()).expect("index builds")
}

/// Corpus directory holding one empty `.xml` file per document id.
pub fn corpus_dir(temp_dir: &TempDir, name: &str, ids: &[&str]) -> PathBuf {
    let dir = temp_dir.path().join(name);
    fs::create_dir_all(&dir).expect("create corpus dir");
    for id in ids {
        write_file(&dir.join(format!("{id}.xml")), "<document/>");
    }
    dir
}

pub fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    fs::write(path, contents).expect("write file");
}
