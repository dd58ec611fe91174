//! Corpus stored as a directory of document files plus a pairs file.
//!
//! The pairs file lists labelled document pairs:
//!
//! ```xml
//! <similarities>
//!   <relation><src>a</src><dest>b</dest><similarity>1</similarity></relation>
//! </similarities>
//! ```

use std::path::{Path, PathBuf};

use quick_xml::Reader;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use walkdir::WalkDir;

use crate::config::CorpusConfig;
use crate::corpus::{Corpus, DocumentPair};
use crate::error::{SimilarityError, SimilarityResult};
use crate::io::write_atomic;
use crate::relation::xml::{finish, malformed, new_writer, read_file, write};

/// Corpus directory in which every document file's stem is its id.
#[derive(Debug, Clone)]
pub struct DirectoryCorpus {
    root: PathBuf,
    ids: Vec<String>,
    pairs_path: PathBuf,
}

impl DirectoryCorpus {
    /// Scans `root` for document files.
    ///
    /// Fails with `EmptyInput` when no document file is found.
    pub fn open(root: &Path, config: &CorpusConfig) -> SimilarityResult<Self> {
        if !root.is_dir() {
            return Err(SimilarityError::FileRead {
                path: root.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "corpus directory does not exist",
                ),
            });
        }

        let extension = config.document_extension.trim_start_matches('.');
        let mut ids = Vec::new();

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| SimilarityError::FileRead {
                path: root.to_path_buf(),
                source: std::io::Error::from(e),
            })?;
            let path = entry.path();

            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(extension)
                || entry.file_name().to_str() == Some(config.pairs_file.as_str())
            {
                continue;
            }

            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }

        if ids.is_empty() {
            return Err(SimilarityError::EmptyInput {
                what: format!("corpus directory '{}'", root.display()),
            });
        }

        tracing::debug!("Corpus {} contains {} documents", root.display(), ids.len());

        Ok(Self {
            root: root.to_path_buf(),
            ids,
            pairs_path: root.join(&config.pairs_file),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn pairs_path(&self) -> &Path {
        &self.pairs_path
    }
}

impl Corpus for DirectoryCorpus {
    fn number_of_documents(&self) -> usize {
        self.ids.len()
    }

    fn document_ids(&self) -> Vec<String> {
        self.ids.clone()
    }

    fn document_pairs(&self) -> SimilarityResult<Vec<DocumentPair>> {
        read_pairs_file(&self.pairs_path)
    }
}

#[derive(Clone, Copy)]
enum PairField {
    Src,
    Dest,
    Label,
}

/// Reads a pairs file, keeping file order.
pub fn read_pairs_file(path: &Path) -> SimilarityResult<Vec<DocumentPair>> {
    let xml = read_file(path)?;
    let mut reader = Reader::from_str(&xml);
    reader.config_mut().trim_text(true);

    let mut pairs = Vec::new();
    let mut field: Option<PairField> = None;
    let (mut src, mut dest, mut label) = (None, None, None);

    loop {
        let event = reader
            .read_event()
            .map_err(|e| malformed(path, format!("at byte {}: {e}", reader.buffer_position())))?;

        match event {
            Event::Start(element) => match element.name().as_ref() {
                b"relation" => (src, dest, label) = (None, None, None),
                b"src" => field = Some(PairField::Src),
                b"dest" => field = Some(PairField::Dest),
                b"similarity" => field = Some(PairField::Label),
                _ => {}
            },
            Event::Text(text) => {
                if let Some(current) = field {
                    let value = text
                        .unescape()
                        .map_err(|e| malformed(path, e.to_string()))?
                        .into_owned();
                    match current {
                        PairField::Src => src = Some(value),
                        PairField::Dest => dest = Some(value),
                        PairField::Label => label = Some(value),
                    }
                }
            }
            Event::End(element) => match element.name().as_ref() {
                b"relation" => {
                    let (Some(s), Some(d), Some(l)) = (src.take(), dest.take(), label.take()) else {
                        return Err(malformed(path, "<relation> needs <src>, <dest> and <similarity>"));
                    };
                    let label = l.trim().parse::<f32>().map_err(|e| {
                        malformed(path, format!("invalid similarity '{l}' for pair {s} -> {d}: {e}"))
                    })?;
                    pairs.push(DocumentPair::new(s, d, label));
                }
                _ => field = None,
            },
            Event::Eof => break,
            _ => {}
        }
    }

    tracing::debug!("Read {} document pairs from {}", pairs.len(), path.display());
    Ok(pairs)
}

/// Writes a pairs file atomically.
pub fn write_pairs_file(path: &Path, pairs: &[DocumentPair]) -> SimilarityResult<()> {
    let mut writer = new_writer()?;
    write(&mut writer, Event::Start(BytesStart::new("similarities")))?;

    for pair in pairs {
        write(&mut writer, Event::Start(BytesStart::new("relation")))?;
        for (name, value) in [
            ("src", pair.src.clone()),
            ("dest", pair.dest.clone()),
            ("similarity", pair.label.to_string()),
        ] {
            write(&mut writer, Event::Start(BytesStart::new(name)))?;
            write(&mut writer, Event::Text(BytesText::new(&value)))?;
            write(&mut writer, Event::End(BytesEnd::new(name)))?;
        }
        write(&mut writer, Event::End(BytesEnd::new("relation")))?;
    }

    write(&mut writer, Event::End(BytesEnd::new("similarities")))?;
    write_atomic(path, finish(writer)?.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn corpus_dir() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        for name in ["b.xml", "a.xml", "notes.txt", "similarities.xml"] {
            fs::write(temp_dir.path().join(name), "<doc/>").unwrap();
        }
        fs::create_dir(temp_dir.path().join("nested")).unwrap();
        fs::write(temp_dir.path().join("nested").join("c.xml"), "<doc/>").unwrap();
        temp_dir
    }

    #[test]
    fn test_open_collects_document_ids() {
        let temp_dir = corpus_dir();
        let corpus = DirectoryCorpus::open(temp_dir.path(), &CorpusConfig::default()).unwrap();

        assert_eq!(corpus.number_of_documents(), 3);
        assert_eq!(corpus.document_ids(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_open_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("readme.txt"), "hi").unwrap();

        assert!(matches!(
            DirectoryCorpus::open(temp_dir.path(), &CorpusConfig::default()),
            Err(SimilarityError::EmptyInput { .. })
        ));
    }

    #[test]
    fn test_open_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        assert!(matches!(
            DirectoryCorpus::open(&temp_dir.path().join("absent"), &CorpusConfig::default()),
            Err(SimilarityError::FileRead { .. })
        ));
    }

    #[test]
    fn test_pairs_file_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("similarities.xml");
        let pairs = vec![
            DocumentPair::new("a", "b", 1.0),
            DocumentPair::new("a", "c<1>", 0.0),
            DocumentPair::new("c", "a", 2.0),
        ];

        write_pairs_file(&path, &pairs).unwrap();
        assert_eq!(read_pairs_file(&path).unwrap(), pairs);
    }

    #[test]
    fn test_read_pairs_with_integer_labels() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("similarities.xml");
        fs::write(
            &path,
            "<similarities><relation><src>x</src><dest>y</dest><similarity>2</similarity></relation></similarities>",
        )
        .unwrap();

        let pairs = read_pairs_file(&path).unwrap();
        assert_eq!(pairs, vec![DocumentPair::new("x", "y", 2.0)]);
        assert!(pairs[0].is_positive());
    }

    #[test]
    fn test_incomplete_pair_is_malformed() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("similarities.xml");
        fs::write(&path, "<similarities><relation><src>x</src></relation></similarities>").unwrap();

        assert!(matches!(
            read_pairs_file(&path),
            Err(SimilarityError::Malformed { .. })
        ));
    }

    #[test]
    fn test_missing_pairs_file() {
        let temp_dir = corpus_dir();
        fs::remove_file(temp_dir.path().join("similarities.xml")).unwrap();
        let corpus = DirectoryCorpus::open(temp_dir.path(), &CorpusConfig::default()).unwrap();

        assert!(matches!(
            corpus.document_pairs(),
            Err(SimilarityError::FileRead { .. })
        ));
    }
}
