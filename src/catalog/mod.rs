//! Album catalog: records, lenient column coercion, and the loaded corpus
//!
//! A catalog is read from one or more CSV files. Every raw cell is kept so
//! exports can pass the original columns through untouched, while the handful
//! of columns the dashboard needs are coerced into typed fields.
//!
//! # Coercion rules
//!
//! Coercion never fails. A value that cannot be read is simply absent:
//!
//! | Column        | Accepted                              | Absent when                          |
//! |---------------|---------------------------------------|--------------------------------------|
//! | `num_ratings` | `42`, `42.0`, `4.2e1`                 | empty, NA token, negative, fractional |
//! | `rating`      | any finite real (`3.87`, `4`)         | empty, NA token, `inf`, `NaN`        |
//! | `year`        | `1972`, `1972.0`                      | empty, NA token, fractional          |
//! | text columns  | any non-blank text                    | empty, NA token                      |

pub mod load;

use crate::rating::{self, RatingConfig, RatingPrior};
use serde::Serialize;
use std::path::PathBuf;

pub use load::{load, read_csv, source_fingerprint, Fingerprint};

/// Cell values a spreadsheet or dataframe export uses for "no value"
const NA_TOKENS: &[&str] = &["nan", "na", "n/a", "#n/a", "null", "none", "-"];

/// A single album row
#[derive(Debug, Clone, Default, Serialize)]
pub struct Album {
    pub artist_name: Option<String>,
    pub album_name: Option<String>,
    pub year: Option<i32>,
    pub country: Option<String>,
    pub style: Option<String>,
    pub rating: Option<f64>,
    pub num_ratings: Option<u64>,
    /// Derived from the whole corpus, see [`crate::rating`]
    pub weighted_rating: f64,
    /// Raw cells, aligned with [`Catalog::headers`]
    #[serde(skip)]
    pub fields: Vec<String>,
}

impl Album {
    /// Rating count with absent treated as zero
    pub fn votes(&self) -> u64 {
        self.num_ratings.unwrap_or(0)
    }

    pub fn is_rated(&self) -> bool {
        self.votes() > 0
    }

    /// "Artist - Album" for terminal output
    pub fn display_name(&self) -> String {
        format!(
            "{} - {}",
            self.artist_name.as_deref().unwrap_or("?"),
            self.album_name.as_deref().unwrap_or("?")
        )
    }
}

/// Positions of the typed columns within a header row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Columns {
    pub artist_name: Option<usize>,
    pub album_name: Option<usize>,
    pub year: Option<usize>,
    pub country: Option<usize>,
    pub style: Option<usize>,
    pub rating: Option<usize>,
    pub num_ratings: Option<usize>,
}

impl Columns {
    /// Resolve column positions. Matching trims whitespace and ignores case.
    pub fn resolve(headers: &[String]) -> Self {
        let find = |names: &[&str]| {
            headers.iter().position(|h| {
                let h = h.trim();
                names.iter().any(|n| h.eq_ignore_ascii_case(n))
            })
        };

        Self {
            artist_name: find(&["artist_name", "artist"]),
            album_name: find(&["album_name", "album", "title"]),
            year: find(&["year"]),
            country: find(&["country"]),
            style: find(&["style", "genre"]),
            rating: find(&["rating", "avg_rating"]),
            num_ratings: find(&["num_ratings", "ratings", "votes"]),
        }
    }

    /// Build a typed album from a raw row
    pub fn album(&self, fields: Vec<String>) -> Album {
        let cell = |idx: Option<usize>| idx.and_then(|i| fields.get(i)).map(String::as_str);

        Album {
            artist_name: cell(self.artist_name).and_then(parse_text),
            album_name: cell(self.album_name).and_then(parse_text),
            year: cell(self.year).and_then(parse_year),
            country: cell(self.country).and_then(parse_text),
            style: cell(self.style).and_then(parse_text),
            rating: cell(self.rating).and_then(parse_real),
            num_ratings: cell(self.num_ratings).and_then(parse_count),
            weighted_rating: 0.0,
            fields,
        }
    }
}

/// The loaded corpus with weighted ratings already derived
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub headers: Vec<String>,
    pub albums: Vec<Album>,
    pub prior: RatingPrior,
    pub source: Option<PathBuf>,
}

impl Catalog {
    /// Build a catalog from raw rows and derive weighted ratings.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>, config: &RatingConfig) -> Self {
        let columns = Columns::resolve(&headers);
        if columns.rating.is_none() {
            tracing::warn!("no rating column found; every album will weigh 0");
        }
        if columns.num_ratings.is_none() {
            tracing::warn!("no num_ratings column found; every album will weigh 0");
        }

        let albums = rows.into_iter().map(|row| columns.album(row)).collect();
        Self::from_albums(headers, albums, config)
    }

    pub fn from_albums(headers: Vec<String>, mut albums: Vec<Album>, config: &RatingConfig) -> Self {
        let prior = rating::apply(&mut albums, config);
        Self {
            headers,
            albums,
            prior,
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn len(&self) -> usize {
        self.albums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.albums.is_empty()
    }

    /// Case-insensitive substring search over artist and album names
    pub fn search(&self, query: &str) -> Vec<&Album> {
        let needle = query.trim().to_lowercase();
        self.albums
            .iter()
            .filter(|a| a.display_name().to_lowercase().contains(&needle))
            .collect()
    }
}

fn is_na(s: &str) -> bool {
    let s = s.trim();
    s.is_empty() || NA_TOKENS.iter().any(|t| s.eq_ignore_ascii_case(t))
}

/// Non-blank text, trimmed
pub fn parse_text(s: &str) -> Option<String> {
    if is_na(s) {
        None
    } else {
        Some(s.trim().to_string())
    }
}

/// Finite real number
pub fn parse_real(s: &str) -> Option<f64> {
    if is_na(s) {
        return None;
    }
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Non-negative whole count. `"12.0"` is accepted, `"12.5"` is not.
pub fn parse_count(s: &str) -> Option<u64> {
    if is_na(s) {
        return None;
    }
    let s = s.trim();
    if let Ok(n) = s.parse::<u64>() {
        return Some(n);
    }
    parse_real(s)
        .filter(|v| *v >= 0.0 && v.fract() == 0.0 && *v <= u64::MAX as f64)
        .map(|v| v as u64)
}

/// Whole year, same rules as counts but signed
pub fn parse_year(s: &str) -> Option<i32> {
    if is_na(s) {
        return None;
    }
    let s = s.trim();
    if let Ok(n) = s.parse::<i32>() {
        return Some(n);
    }
    parse_real(s)
        .filter(|v| v.fract() == 0.0 && *v >= i32::MIN as f64 && *v <= i32::MAX as f64)
        .map(|v| v as i32)
}
