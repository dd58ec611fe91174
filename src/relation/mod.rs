//! Document relations: accumulation, extraction, persistence and scoring.
//!
//! A [`RelationExtractor`] queries a [`SimilarityIndex`](crate::vector::SimilarityIndex)
//! for every source document and collects the kept neighbors in a
//! [`RelationStore`], which reads and writes the relation file format.

pub mod evaluate;
mod extractor;
mod sections;
mod store;
pub(crate) mod xml;

pub use evaluate::{GroundTruth, RetrievalScores, score};
pub use extractor::{AllowedPairs, ExtractionParams, RelationExtractor};
pub use sections::{DocumentSectionRelations, SectionRelation, SectionRelationStore};
pub use store::{RelatedDocument, Relation, RelationMetadata, RelationStore};
