//! Training rows built from labelled document pairs.

use bincode::{Decode, Encode};

use crate::corpus::DocumentPair;
use crate::dataset::cache::DatasetCache;
use crate::dataset::transform::{ReductionPolicy, SectionMatrixTransformer};
use crate::error::{SimilarityError, SimilarityResult};
use crate::vector::DocumentVectorSource;

/// One labelled feature vector.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct DatasetRow {
    pub features: Vec<f32>,
    pub label: f32,
    pub src: String,
    pub dest: String,
}

/// Section feature rows for every usable corpus pair, in pair order.
#[derive(Debug, Clone, Default, PartialEq, Encode, Decode)]
pub struct SectionDataset {
    rows: Vec<DatasetRow>,
    feature_len: usize,
    skipped_pairs: usize,
}

impl SectionDataset {
    /// Transforms every pair whose two documents are in `store`.
    ///
    /// Pairs naming an unknown document are skipped and counted.
    pub fn build<S>(
        pairs: &[DocumentPair],
        store: &S,
        transformer: &SectionMatrixTransformer,
    ) -> SimilarityResult<Self>
    where
        S: DocumentVectorSource + ?Sized,
    {
        let mut rows = Vec::with_capacity(pairs.len());
        let mut skipped_pairs = 0;

        for pair in pairs {
            let (src, dest) = match (lookup(store, &pair.src)?, lookup(store, &pair.dest)?) {
                (Some(src), Some(dest)) => (src, dest),
                _ => {
                    tracing::warn!(
                        "Skipping pair {} -> {}: document vector missing",
                        pair.src,
                        pair.dest
                    );
                    skipped_pairs += 1;
                    continue;
                }
            };

            rows.push(DatasetRow {
                features: transformer.transform(&src.section_vectors(), &dest.section_vectors()),
                label: pair.label,
                src: pair.src.clone(),
                dest: pair.dest.clone(),
            });
        }

        tracing::info!(
            "Built {} dataset rows of length {} ({} pairs skipped)",
            rows.len(),
            transformer.feature_len(),
            skipped_pairs
        );

        Ok(Self {
            rows,
            feature_len: transformer.feature_len(),
            skipped_pairs,
        })
    }

    /// Loads the dataset from `cache`, building and persisting it when absent.
    pub fn load_or_build<S>(
        cache: &DatasetCache,
        pairs: &[DocumentPair],
        store: &S,
        transformer: &SectionMatrixTransformer,
    ) -> SimilarityResult<Self>
    where
        S: DocumentVectorSource + ?Sized,
    {
        let dataset: Self = cache.get_or_build(|| Self::build(pairs, store, transformer))?;
        if dataset.feature_len != transformer.feature_len() {
            return Err(SimilarityError::config(format!(
                "Cached dataset at {} has rows of length {}, expected {}. Use a different cache file",
                cache.path().display(),
                dataset.feature_len,
                transformer.feature_len()
            )));
        }
        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&DatasetRow> {
        self.rows.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DatasetRow> {
        self.rows.iter()
    }

    pub fn labels(&self) -> Vec<f32> {
        self.rows.iter().map(|row| row.label).collect()
    }

    /// Rows with a positive label.
    pub fn positive_count(&self) -> usize {
        self.rows.iter().filter(|row| row.label > 0.0).count()
    }

    pub fn feature_len(&self) -> usize {
        self.feature_len
    }

    /// Pairs left out because a document vector was missing.
    pub fn skipped_pairs(&self) -> usize {
        self.skipped_pairs
    }
}

fn lookup<'a, S>(store: &'a S, id: &str) -> SimilarityResult<Option<&'a crate::vector::DocumentVector>>
where
    S: DocumentVectorSource + ?Sized,
{
    match store.get(id) {
        Ok(document) => Ok(Some(document)),
        Err(SimilarityError::DocumentNotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Default cache file name for a transformer configuration.
pub fn cache_file_name(sections: usize, policy: ReductionPolicy, row_mask: bool) -> String {
    let mask = if row_mask { "_mask" } else { "" };
    format!("sections_{sections}_{policy}{mask}.bin")
}
