//! All-or-nothing file replacement.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{SimilarityError, SimilarityResult};

/// Writes `contents` to `path` through a temporary file in the same
/// directory, then renames it over the target.
///
/// Readers either see the previous file or the complete new one. Missing
/// parent directories are created.
pub fn write_atomic(path: &Path, contents: &[u8]) -> SimilarityResult<()> {
    let write_error = |source: std::io::Error| SimilarityError::FileWrite {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(write_error)?;

    let mut temp = NamedTempFile::new_in(parent).map_err(write_error)?;
    temp.write_all(contents).map_err(write_error)?;
    temp.as_file().sync_all().map_err(write_error)?;
    temp.persist(path).map_err(|e| write_error(e.error))?;

    tracing::debug!("Wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}
