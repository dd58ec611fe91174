//! Terminal output for the command-line interface.
//!
//! Spinners go to stderr, tables are returned as strings for the caller
//! to print.

pub mod progress;
pub mod tables;
pub mod theme;

pub use progress::{create_spinner, with_spinner};
pub use tables::{
    TableBuilder, create_dataset_table, create_extraction_table, create_relation_report,
    create_scores_table, create_summary_table,
};
pub use theme::{THEME, Theme};
