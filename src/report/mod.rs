//! Report generation for a dashboard view
//!
//! - **HTML**: self-contained page with the country map, grouped statistics,
//!   top lists and the ranked table
//! - **JSON**: the whole dashboard view, machine-readable
//! - **CSV**: the filtered rows with every original column plus
//!   `weighted_rating`, ready for a spreadsheet
//!
//! # Usage
//!
//! ```ignore
//! use varredor::report;
//!
//! // Automatically picks format based on extension
//! report::generate("report.html", &dashboard)?;  // HTML
//! report::generate("report.json", &dashboard)?;  // JSON
//! report::generate("report.csv", &dashboard)?;   // CSV
//! ```

pub mod csv;
pub mod html;
pub mod json;

use crate::catalog::Catalog;
use crate::dashboard::Dashboard;
use crate::error::Result;
use serde::Serialize;
use std::path::Path;

/// Output format chosen from a file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Html,
    Json,
    Csv,
}

impl Format {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "html" | "htm" => Format::Html,
            "json" => Format::Json,
            _ => Format::Csv,
        }
    }
}

/// Generate a report in the appropriate format based on file extension
pub fn generate<P: AsRef<Path>>(path: P, dashboard: &Dashboard) -> Result<()> {
    let path = path.as_ref();
    let mut file = std::fs::File::create(path)?;

    match Format::from_path(path) {
        Format::Html => html::write(&mut file, dashboard),
        Format::Json => json::write(&mut file, dashboard),
        Format::Csv => csv::write(&mut file, dashboard),
    }?;

    tracing::debug!(path = %path.display(), rows = dashboard.albums.len(), "report written");
    Ok(())
}

/// Headline numbers for a catalog and the current filter
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub rated: usize,
    pub unrated: usize,
    pub filtered: usize,
    pub global_mean: f64,
    pub prior_weight: f64,
}

impl Summary {
    pub fn new(catalog: &Catalog, filtered: usize) -> Self {
        Self {
            total: catalog.len(),
            rated: catalog.prior.rated,
            unrated: catalog.len() - catalog.prior.rated,
            filtered,
            global_mean: catalog.prior.global_mean,
            prior_weight: catalog.prior.prior_weight,
        }
    }
}
