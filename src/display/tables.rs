//! Table formatting for command summaries and reports.

use comfy_table::{Attribute, Cell, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

use crate::dataset::SectionDataset;
use crate::relation::{RelationStore, RetrievalScores};

/// Builder for creating formatted tables.
pub struct TableBuilder {
    table: Table,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBuilder {
    pub fn new() -> Self {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.apply_modifier(UTF8_ROUND_CORNERS);
        Self { table }
    }

    /// Set the table headers, rendered bold.
    pub fn set_headers(mut self, headers: Vec<&str>) -> Self {
        let header_cells: Vec<Cell> = headers
            .into_iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect();
        self.table.set_header(header_cells);
        self
    }

    pub fn add_row(mut self, row: Vec<String>) -> Self {
        self.table.add_row(row);
        self
    }

    pub fn build(self) -> String {
        self.table.to_string()
    }
}

/// Two-column metric/value table.
pub fn create_summary_table(title: &str, items: Vec<(&str, String)>) -> String {
    items
        .into_iter()
        .fold(
            TableBuilder::new().set_headers(vec![title, "Value"]),
            |table, (key, value)| table.add_row(vec![key.to_string(), value]),
        )
        .build()
}

/// Every relation as one row, grouped by source in discovery order.
pub fn create_relation_report(relations: &RelationStore) -> String {
    relations
        .relations()
        .fold(
            TableBuilder::new().set_headers(vec!["Source", "Destination", "Similarity"]),
            |table, relation| {
                table.add_row(vec![
                    relation.src,
                    relation.dest,
                    format!("{:.4}", relation.similarity),
                ])
            },
        )
        .build()
}

/// Summary of one extraction run.
pub fn create_extraction_table(relations: &RelationStore, document_count: usize) -> String {
    let mut items = vec![
        ("Documents", document_count.to_string()),
        ("Sources with relations", relations.source_count().to_string()),
        ("Relations", relations.relation_count().to_string()),
        (
            "Relations per document",
            format!("{:.2}", relations.average_relations_per_document(document_count)),
        ),
    ];
    if let Some(metadata) = relations.metadata() {
        items.push(("Similarity threshold", format!("{:.2}", metadata.similarity_threshold)));
        items.push(("Max relations per document", metadata.max_relations_per_document.to_string()));
    }
    create_summary_table("Extraction", items)
}

/// Retrieval scores against a ground truth.
pub fn create_scores_table(scores: &RetrievalScores) -> String {
    create_summary_table(
        "Evaluation",
        vec![
            ("True positives", scores.true_positives.to_string()),
            ("Retrieved", scores.retrieved.to_string()),
            ("Relevant", scores.relevant.to_string()),
            ("Precision", format!("{:.4}", scores.precision)),
            ("Recall", format!("{:.4}", scores.recall)),
            ("F1", format!("{:.4}", scores.f1)),
        ],
    )
}

/// Shape and label balance of a section dataset.
pub fn create_dataset_table(dataset: &SectionDataset) -> String {
    create_summary_table(
        "Dataset",
        vec![
            ("Rows", dataset.len().to_string()),
            ("Feature length", dataset.feature_len().to_string()),
            ("Positive rows", dataset.positive_count().to_string()),
            ("Skipped pairs", dataset.skipped_pairs().to_string()),
        ],
    )
}
