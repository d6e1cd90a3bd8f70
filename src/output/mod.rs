//! Output module for products documents and run reports
//!
//! This module handles:
//! - Writing and reading the category-grouped products document
//! - Recording per-category counts and tolerated failures
//! - Rendering the run report to stdout and markdown

pub mod json;
mod markdown;
pub mod report;

pub use json::{read_products, to_products_json, write_products};
pub use markdown::{format_markdown_report, generate_markdown_report};
pub use report::{print_report, CategoryStats, FailureRecord, FailureStage, RunReport};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to format output: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
