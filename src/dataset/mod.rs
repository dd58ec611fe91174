//! Section feature datasets for pairwise classifiers.
//!
//! A [`SectionMatrixTransformer`] turns the section similarity matrix of two
//! documents into a fixed-length feature vector, a [`SectionDataset`] holds
//! one labelled row per corpus pair, and a [`DatasetCache`] persists the
//! result so repeated runs skip the transformation.

mod cache;
mod section;
mod transform;

pub use cache::{DatasetCache, get_or_build};
pub use section::{DatasetRow, SectionDataset, cache_file_name};
pub use transform::{ReductionPolicy, SectionMatrixTransformer, SectionSimilarityMatrix};
