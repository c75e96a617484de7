//! Row filtering by country, style and year
//!
//! All criteria are conjunctive. An empty criterion does not restrict. The
//! result is always a subset of the input in the original order.

use crate::catalog::Album;
use crate::error::{Error, Result};
use serde::Serialize;

/// Query value meaning "no country restriction"
pub const ALL_COUNTRIES: &str = "all";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Filter {
    pub country: Option<String>,
    pub styles: Vec<String>,
    pub years: Vec<i32>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        let country = country.into();
        self.country = if country.trim().is_empty() || country.eq_ignore_ascii_case(ALL_COUNTRIES) {
            None
        } else {
            Some(country)
        };
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.styles.push(style.into());
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.years.push(year);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.country.is_none() && self.styles.is_empty() && self.years.is_empty()
    }

    /// Parse `country=..&style=..&style=..&year=..` query pairs.
    ///
    /// `styles` and `years` also accept comma-separated lists. Unknown keys are
    /// ignored so the UI can add its own parameters.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut filter = Filter::new();
        for (key, value) in pairs {
            let value = value.as_ref().trim();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "country" => filter = filter.with_country(value),
                "style" => filter.styles.push(value.to_string()),
                "styles" => filter
                    .styles
                    .extend(value.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from)),
                "year" => filter.years.push(parse_year(value)?),
                "years" => {
                    for y in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                        filter.years.push(parse_year(y)?);
                    }
                }
                _ => {}
            }
        }
        Ok(filter)
    }

    /// Parse a raw URL query string
    pub fn from_query(query: &str) -> Result<Self> {
        let pairs: Vec<(String, String)> =
            serde_urlencoded::from_str(query).map_err(|e| Error::InvalidQuery(e.to_string()))?;
        Self::from_pairs(pairs)
    }

    pub fn matches(&self, album: &Album) -> bool {
        if let Some(ref country) = self.country {
            if album.country.as_deref() != Some(country.as_str()) {
                return false;
            }
        }
        if !self.styles.is_empty() {
            match album.style {
                Some(ref style) if self.styles.iter().any(|s| s == style) => {}
                _ => return false,
            }
        }
        if !self.years.is_empty() {
            match album.year {
                Some(year) if self.years.contains(&year) => {}
                _ => return false,
            }
        }
        true
    }

    pub fn apply<'a>(&self, albums: &'a [Album]) -> Vec<&'a Album> {
        albums.iter().filter(|a| self.matches(a)).collect()
    }
}

fn parse_year(s: &str) -> Result<i32> {
    s.parse::<i32>()
        .map_err(|_| Error::InvalidQuery(format!("year must be a whole number, got '{}'", s)))
}
