//! The computed view behind every output: filtered rows plus aggregates
//!
//! A [`Dashboard`] borrows from a [`Catalog`] and is cheap to rebuild for each
//! filter. The CLI prints it, the report writers serialize it, and the web UI
//! receives it as JSON.

use crate::catalog::{Album, Catalog};
use crate::filter::Filter;
use crate::report::Summary;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Length of the top lists
pub const DEFAULT_TOP: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryCount {
    pub country: String,
    pub count: usize,
}

/// Mean of some per-album value within one group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMean {
    pub group: String,
    /// `None` when no album in the group has a value
    pub mean: Option<f64>,
    pub albums: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopList<'a> {
    pub key: String,
    pub albums: Vec<&'a Album>,
}

/// Choices offered by the filter widgets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub countries: Vec<String>,
    pub styles: Vec<String>,
    pub years: Vec<i32>,
}

impl FilterOptions {
    pub fn from_albums(albums: &[Album]) -> Self {
        let countries: BTreeSet<&str> = albums.iter().filter_map(|a| a.country.as_deref()).collect();
        let styles: BTreeSet<&str> = albums.iter().filter_map(|a| a.style.as_deref()).collect();
        let years: BTreeSet<i32> = albums.iter().filter_map(|a| a.year).collect();

        Self {
            countries: countries.into_iter().map(String::from).collect(),
            styles: styles.into_iter().map(String::from).collect(),
            years: years.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard<'a> {
    pub generated: String,
    pub filter: Filter,
    pub summary: Summary,
    /// Over the whole catalog, feeds the map
    pub country_counts: Vec<CountryCount>,
    pub avg_rating_by_style: Vec<GroupMean>,
    pub avg_weighted_by_country: Vec<GroupMean>,
    pub top_by_style: Option<TopList<'a>>,
    pub top_by_country: Option<TopList<'a>>,
    /// Filtered rows, best weighted rating first
    pub albums: Vec<&'a Album>,
    #[serde(skip)]
    pub headers: &'a [String],
}

impl<'a> Dashboard<'a> {
    pub fn build(catalog: &'a Catalog, filter: &Filter, top: usize) -> Self {
        let albums = ranked(filter.apply(&catalog.albums));

        let top_by_style = filter.styles.first().map(|style| TopList {
            key: style.clone(),
            albums: albums
                .iter()
                .copied()
                .filter(|a| a.style.as_deref() == Some(style.as_str()))
                .take(top)
                .collect(),
        });

        let top_by_country = filter.country.as_ref().map(|country| TopList {
            key: country.clone(),
            albums: albums
                .iter()
                .copied()
                .filter(|a| a.country.as_deref() == Some(country.as_str()))
                .take(top)
                .collect(),
        });

        Self {
            generated: chrono::Local::now().to_rfc3339(),
            filter: filter.clone(),
            summary: Summary::new(catalog, albums.len()),
            country_counts: country_counts(&catalog.albums),
            avg_rating_by_style: group_mean(&albums, |a| a.style.as_deref(), |a| a.rating),
            avg_weighted_by_country: group_mean(&albums, |a| a.country.as_deref(), |a| {
                Some(a.weighted_rating)
            }),
            top_by_style,
            top_by_country,
            albums,
            headers: &catalog.headers,
        }
    }
}

/// Sort by weighted rating, best first. Ties keep their input order.
pub fn ranked(mut albums: Vec<&Album>) -> Vec<&Album> {
    albums.sort_by(|a, b| b.weighted_rating.total_cmp(&a.weighted_rating));
    albums
}

/// Albums per country, most first, ties alphabetical
pub fn country_counts(albums: &[Album]) -> Vec<CountryCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for country in albums.iter().filter_map(|a| a.country.as_deref()) {
        *counts.entry(country).or_default() += 1;
    }

    let mut out: Vec<CountryCount> = counts
        .into_iter()
        .map(|(country, count)| CountryCount {
            country: country.to_string(),
            count,
        })
        .collect();
    // BTreeMap order is alphabetical and the sort is stable
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out
}

/// Mean of `value` per `key`, highest mean first.
///
/// Albums without a key are left out. Missing values are skipped; a group
/// with no values has mean `None` and sorts last.
pub fn group_mean<K, V>(albums: &[&Album], key: K, value: V) -> Vec<GroupMean>
where
    K: Fn(&Album) -> Option<&str>,
    V: Fn(&Album) -> Option<f64>,
{
    let mut groups: BTreeMap<&str, (f64, usize, usize)> = BTreeMap::new();
    for album in albums {
        let Some(k) = key(*album) else { continue };
        let entry = groups.entry(k).or_insert((0.0, 0, 0));
        entry.2 += 1;
        if let Some(v) = value(*album) {
            entry.0 += v;
            entry.1 += 1;
        }
    }

    let mut out: Vec<GroupMean> = groups
        .into_iter()
        .map(|(group, (sum, n, albums))| GroupMean {
            group: group.to_string(),
            mean: (n > 0).then(|| sum / n as f64),
            albums,
        })
        .collect();

    out.sort_by(|a, b| match (a.mean, b.mean) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::RatingConfig;

    fn row(artist: &str, country: &str, style: &str, year: &str, rating: &str, votes: &str) -> Vec<String> {
        [artist, "LP", year, country, style, rating, votes]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn catalog() -> Catalog {
        let headers: Vec<String> = ["artist_name", "album_name", "year", "country", "style", "rating", "num_ratings"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        Catalog::from_rows(
            headers,
            vec![
                row("Banco", "Italy", "RPI", "1972", "4.5", "800"),
                row("PFM", "Italy", "RPI", "1972", "4.4", "1200"),
                row("Le Orme", "Italy", "Symphonic Prog", "1972", "4.0", "40"),
                row("Genesis", "United Kingdom", "Symphonic Prog", "1972", "4.6", "3000"),
                row("Caravan", "United Kingdom", "Canterbury Scene", "1971", "4.3", "1500"),
                row("Magma", "France", "Zeuhl", "1973", "", "0"),
                row("Anon", "", "", "", "", ""),
            ],
            &RatingConfig::default(),
        )
    }

    #[test]
    fn test_ranked_descending_and_stable() {
        let cat = catalog();
        let ranked = ranked(cat.albums.iter().collect());

        for pair in ranked.windows(2) {
            assert!(pair[0].weighted_rating >= pair[1].weighted_rating);
        }
        // Two zero-weight albums keep input order at the bottom
        assert_eq!(ranked[5].artist_name.as_deref(), Some("Magma"));
        assert_eq!(ranked[6].artist_name.as_deref(), Some("Anon"));
    }

    #[test]
    fn test_country_counts() {
        let cat = catalog();
        let counts = country_counts(&cat.albums);

        assert_eq!(
            counts,
            vec![
                CountryCount { country: "Italy".into(), count: 3 },
                CountryCount { country: "United Kingdom".into(), count: 2 },
                CountryCount { country: "France".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn test_group_mean_rating_by_style() {
        let cat = catalog();
        let rows: Vec<&Album> = cat.albums.iter().collect();
        let means = group_mean(&rows, |a| a.style.as_deref(), |a| a.rating);

        assert_eq!(means.len(), 4);
        assert_eq!(means[0].group, "RPI");
        assert!((means[0].mean.unwrap() - 4.45).abs() < 1e-9);
        assert_eq!(means[0].albums, 2);
        // Zeuhl has an album but no rating
        assert_eq!(means[3].group, "Zeuhl");
        assert_eq!(means[3].mean, None);
    }

    #[test]
    fn test_filter_options_sorted_distinct() {
        let cat = catalog();
        let opts = FilterOptions::from_albums(&cat.albums);

        assert_eq!(opts.countries, vec!["France", "Italy", "United Kingdom"]);
        assert_eq!(opts.years, vec![1971, 1972, 1973]);
        assert_eq!(opts.styles.len(), 4);
    }

    #[test]
    fn test_build_with_filter() {
        let cat = catalog();
        let filter = Filter::new().with_country("Italy").with_style("RPI");
        let dash = Dashboard::build(&cat, &filter, DEFAULT_TOP);

        assert_eq!(dash.albums.len(), 2);
        assert_eq!(dash.summary.filtered, 2);
        assert_eq!(dash.summary.total, 7);
        // Map counts ignore the filter
        assert_eq!(dash.country_counts.len(), 3);

        let by_style = dash.top_by_style.as_ref().unwrap();
        assert_eq!(by_style.key, "RPI");
        assert_eq!(by_style.albums.len(), 2);

        let by_country = dash.top_by_country.as_ref().unwrap();
        assert_eq!(by_country.key, "Italy");
        assert_eq!(dash.avg_weighted_by_country.len(), 1);
    }

    #[test]
    fn test_build_without_filter_has_no_top_lists() {
        let cat = catalog();
        let dash = Dashboard::build(&cat, &Filter::new(), DEFAULT_TOP);

        assert_eq!(dash.albums.len(), cat.len());
        assert!(dash.top_by_style.is_none());
        assert!(dash.top_by_country.is_none());
    }

    #[test]
    fn test_top_list_truncates() {
        let cat = catalog();
        let filter = Filter::new().with_country("Italy");
        let dash = Dashboard::build(&cat, &filter, 1);

        let top = dash.top_by_country.unwrap();
        assert_eq!(top.albums.len(), 1);
        assert!(std::ptr::eq(top.albums[0], dash.albums[0]));
    }

    #[test]
    fn test_dashboard_serializes() {
        let cat = catalog();
        let dash = Dashboard::build(&cat, &Filter::new().with_year(1971), DEFAULT_TOP);
        let json = serde_json::to_value(&dash).unwrap();

        assert_eq!(json["summary"]["filtered"], 1);
        assert_eq!(json["albums"][0]["artist_name"], "Caravan");
        assert!(json["albums"][0].get("fields").is_none());
        assert!(json.get("headers").is_none());
    }
}
