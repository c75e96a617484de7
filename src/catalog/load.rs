//! Reading catalogs from disk
//!
//! A path may name a single CSV file or a directory. Directories are walked
//! recursively and every `.csv` file found is concatenated in path order, so
//! split exports (one file per letter, per country, ...) load as one corpus.

use super::Catalog;
use crate::error::{Error, Result};
use crate::rating::RatingConfig;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

/// Load a catalog from a CSV file or a directory of CSV files
pub fn load<P: AsRef<Path>>(path: P, config: &RatingConfig) -> Result<Catalog> {
    let path = path.as_ref();
    let files = csv_files(path)?;

    let mut headers: Vec<String> = Vec::new();
    let mut rows: Vec<Vec<String>> = Vec::new();

    for file in &files {
        let reader = std::fs::File::open(file)?;
        let (file_headers, file_rows) = read_csv(reader, file)?;
        tracing::debug!(file = %file.display(), rows = file_rows.len(), "read CSV");
        merge(&mut headers, &mut rows, file_headers, file_rows);
    }

    let catalog = Catalog::from_rows(headers, rows, config).with_source(path);
    tracing::info!(
        albums = catalog.len(),
        rated = catalog.prior.rated,
        global_mean = catalog.prior.global_mean,
        prior_weight = catalog.prior.prior_weight,
        "catalog loaded"
    );
    Ok(catalog)
}

/// Read one CSV into a header row and raw rows.
///
/// Rows are padded or truncated to the header width. `origin` only labels
/// errors.
pub fn read_csv<R: Read>(reader: R, origin: &Path) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| Error::csv(origin, e))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| Error::csv(origin, e))?;
        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        row.resize(headers.len(), String::new());
        rows.push(row);
    }

    Ok((headers, rows))
}

/// Every CSV file of the source with its modification time, in path order
pub type Fingerprint = Vec<(PathBuf, Option<SystemTime>)>;

/// Fingerprint of the catalog source, `None` when it is gone.
///
/// Adding, removing or touching any CSV file changes it.
pub fn source_fingerprint(path: &Path) -> Option<Fingerprint> {
    let files = csv_files(path).ok()?;
    Some(
        files
            .into_iter()
            .map(|f| {
                let modified = std::fs::metadata(&f).and_then(|m| m.modified()).ok();
                (f, modified)
            })
            .collect(),
    )
}

fn csv_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        return Err(Error::NotFound(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("csv"))
                .unwrap_or(false)
        })
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(Error::NoCsvFiles(path.to_path_buf()));
    }
    Ok(files)
}

fn same_column(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Append rows from another file, widening the header set as needed.
///
/// Columns are matched by name, trimmed and ignoring case. A name repeated
/// within one file gets a column of its own. Columns a file lacks are left
/// blank.
fn merge(
    headers: &mut Vec<String>,
    rows: &mut Vec<Vec<String>>,
    file_headers: Vec<String>,
    file_rows: Vec<Vec<String>>,
) {
    let mut positions: Vec<usize> = Vec::with_capacity(file_headers.len());
    for h in &file_headers {
        let free = headers
            .iter()
            .enumerate()
            .position(|(i, existing)| same_column(existing, h) && !positions.contains(&i));

        let pos = match free {
            Some(i) => i,
            None => {
                if positions.iter().any(|&i| same_column(&headers[i], h)) {
                    tracing::warn!(column = %h, "repeated column name");
                }
                headers.push(h.clone());
                headers.len() - 1
            }
        };
        positions.push(pos);
    }

    let width = headers.len();
    for row in rows.iter_mut() {
        row.resize(width, String::new());
    }

    for file_row in file_rows {
        let mut row = vec![String::new(); width];
        for (cell, &pos) in file_row.into_iter().zip(positions.iter()) {
            row[pos] = cell;
        }
        rows.push(row);
    }
}
