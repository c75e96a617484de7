//! CSV export of the filtered rows
//!
//! Original columns are written back unchanged, in their original order,
//! followed by `weighted_rating`. Rows come out best-rated first, the same
//! order as the table on screen.

use crate::dashboard::Dashboard;
use crate::error::Result;
use std::io::Write;

pub const WEIGHTED_COLUMN: &str = "weighted_rating";

/// `weighted_rating`, `Weighted Rating`, `weighted-rating` and so on
fn is_weighted_column(header: &str) -> bool {
    let key: String = header
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .collect();
    key.eq_ignore_ascii_case("weightedrating")
}

pub fn write<W: Write>(writer: &mut W, dashboard: &Dashboard) -> Result<()> {
    let mut wtr = ::csv::Writer::from_writer(writer);

    // An export re-imported and exported again must not grow a second column
    let existing = dashboard
        .headers
        .iter()
        .position(|h| is_weighted_column(h));

    let mut header: Vec<&str> = dashboard.headers.iter().map(String::as_str).collect();
    if existing.is_none() {
        header.push(WEIGHTED_COLUMN);
    }
    wtr.write_record(&header)?;

    let width = dashboard.headers.len();
    for album in &dashboard.albums {
        let mut record: Vec<String> = album.fields.clone();
        record.resize(width, String::new());

        let weighted = album.weighted_rating.to_string();
        match existing {
            Some(i) => record[i] = weighted,
            None => record.push(weighted),
        }
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Render the export into memory, for HTTP downloads
pub fn to_bytes(dashboard: &Dashboard) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write(&mut buf, dashboard)?;
    Ok(buf)
}
