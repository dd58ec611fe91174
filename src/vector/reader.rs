//! Reading and writing document vector files.
//!
//! Vector files are JSON Lines, one document per line:
//!
//! ```text
//! {"id": "doc-1", "vector": [0.1, 0.2], "sections": [{"index": 0, "vector": [0.3, 0.4]}]}
//! ```
//!
//! `sections` is optional. Blank lines are ignored.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{SimilarityError, SimilarityResult};
use crate::io::write_atomic;
use crate::vector::store::{DocumentVector, VectorStore};

/// Reads a vector file into a [`VectorStore`], preserving line order.
pub fn read_vector_file(path: &Path) -> SimilarityResult<VectorStore> {
    let file = File::open(path).map_err(|source| SimilarityError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let mut store = VectorStore::new();
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| SimilarityError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }

        let document: DocumentVector =
            serde_json::from_str(&line).map_err(|e| SimilarityError::Malformed {
                path: path.to_path_buf(),
                reason: format!("line {}: {e}", line_no + 1),
            })?;
        store.insert(document)?;
    }

    tracing::debug!(
        "Read {} document vectors ({} with sections) from {}",
        store.len(),
        store.documents_with_sections(),
        path.display()
    );
    Ok(store)
}

/// Writes a store as a vector file.
pub fn write_vector_file(path: &Path, store: &VectorStore) -> SimilarityResult<()> {
    let mut contents = String::new();
    for document in store {
        let line = serde_json::to_string(document).map_err(|e| SimilarityError::Serialization {
            reason: format!("document '{}': {e}", document.id),
        })?;
        contents.push_str(&line);
        contents.push('\n');
    }
    write_atomic(path, contents.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_read_vector_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("vectors.jsonl");
        fs::write(
            &path,
            r#"{"id": "a", "vector": [1.0, 0.0], "sections": [{"index": 0, "vector": [1.0, 0.0]}]}

{"id": "b", "vector": [0.0, 1.0]}
"#,
        )
        .unwrap();

        let store = read_vector_file(&path).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("a").unwrap().sections.len(), 1);
        assert!(store.get("b").unwrap().sections.is_empty());
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("vectors.jsonl");
        fs::write(&path, "{\"id\": \"a\", \"vector\": [1.0]}\n{not json}\n").unwrap();

        match read_vector_file(&path).unwrap_err() {
            SimilarityError::Malformed { reason, .. } => assert!(reason.starts_with("line 2")),
            other => panic!("Expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = read_vector_file(&temp_dir.path().join("absent.jsonl"));
        assert!(matches!(result, Err(SimilarityError::FileRead { .. })));
    }

    #[test]
    fn test_write_then_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out").join("vectors.jsonl");
        let store = VectorStore::from_documents([
            DocumentVector::new("x", vec![0.5, 0.25]).with_sections([(2, vec![0.1, 0.9])]),
            DocumentVector::new("y", vec![-1.0, 3.0]),
        ])
        .unwrap();

        write_vector_file(&path, &store).unwrap();
        assert_eq!(read_vector_file(&path).unwrap(), store);
    }
}
