//! Markdown run report generation
//!
//! This module renders a human-readable report of a sweep: timing,
//! per-category counts and the list of dropped pages and items.

use crate::output::report::RunReport;
use crate::output::OutputResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Maximum number of individual failures listed in the report
const MAX_LISTED_FAILURES: usize = 100;

/// Writes a markdown report of the sweep
///
/// # Arguments
///
/// * `report` - The run report
/// * `output_path` - Path where the markdown file should be written
pub fn generate_markdown_report(report: &RunReport, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_report(report);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a run report as markdown
pub fn format_markdown_report(report: &RunReport) -> String {
    let mut md = String::new();

    md.push_str("# Catalog-Sweep Report\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", report.started_at.to_rfc3339()));
    if let Some(finished) = &report.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished.to_rfc3339()));
    }
    if let Some(duration) = report.duration_seconds() {
        md.push_str(&format!("- **Duration**: {:.2} seconds\n", duration));
    }
    md.push('\n');

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Categories**: {}\n", report.categories.len()));
    md.push_str(&format!("- **Items Extracted**: {}\n", report.total_items()));
    md.push_str(&format!(
        "- **Items Dropped**: {}\n",
        report.total_item_failures()
    ));
    md.push_str(&format!(
        "- **Listing Pages Failed**: {}\n",
        report.total_listing_failures()
    ));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n\n",
        report.success_rate()
    ));

    // Category breakdown
    md.push_str("## Categories\n\n");
    md.push_str("| Category | Listing Pages | Failed Pages | Items Found | Extracted | Fetch Failures | Extraction Failures |\n");
    md.push_str("|----------|---------------|--------------|-------------|-----------|----------------|---------------------|\n");
    for (name, stats) in &report.categories {
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} |\n",
            name,
            stats.listing_pages,
            stats.listing_failures,
            stats.items_found,
            stats.items_extracted,
            stats.item_fetch_failures,
            stats.item_extraction_failures
        ));
    }
    md.push('\n');

    // Failures
    if !report.failures.is_empty() {
        md.push_str("## Failures\n\n");
        md.push_str("| Stage | Category | URL | Cause |\n");
        md.push_str("|-------|----------|-----|-------|\n");

        for failure in report.failures.iter().take(MAX_LISTED_FAILURES) {
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                failure.stage,
                failure.category,
                failure.url,
                failure.message.replace('|', "\\|")
            ));
        }

        if report.failures.len() > MAX_LISTED_FAILURES {
            md.push_str(&format!(
                "\n... and {} more\n",
                report.failures.len() - MAX_LISTED_FAILURES
            ));
        }
        md.push('\n');
    }

    md
}
