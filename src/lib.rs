//! Document and section relation extraction over approximate
//! nearest-neighbor indexes.

pub mod config;
pub mod corpus;
pub mod dataset;
pub mod display;
pub mod error;
pub mod io;
pub mod logging;
pub mod relation;
pub mod vector;

pub use config::Settings;
pub use corpus::{Corpus, DirectoryCorpus, DocumentPair, InMemoryCorpus};
pub use dataset::{
    DatasetCache, ReductionPolicy, SectionDataset, SectionMatrixTransformer,
    SectionSimilarityMatrix,
};
pub use error::{ErrorKind, SimilarityError, SimilarityResult};
pub use relation::{
    AllowedPairs, ExtractionParams, GroundTruth, RelationExtractor, RelationStore,
    SectionRelationStore,
};
pub use vector::{DocumentVector, Metric, SimilarityIndex, VectorStore};
