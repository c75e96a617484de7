//! Varredor - explore progressive rock albums by weighted rating
//!
//! Varredor loads a catalog of albums (CSV), computes a weighted rating for
//! every album, and lets you filter, rank, aggregate and export the result,
//! either from the terminal or through a local web dashboard with a world map.
//!
//! # Overview
//!
//! Average ratings are unreliable for albums with few votes. Varredor ranks by
//! a Bayesian average instead: each album's own rating is blended with the
//! catalog-wide mean, and the blend leans toward the album's own rating as
//! its vote count grows. See [`rating`] for the formula.
//!
//! # Quick Start
//!
//! ```no_run
//! use varredor::{catalog, Dashboard, Filter, RatingConfig};
//!
//! let catalog = catalog::load("progarchives.csv", &RatingConfig::default())?;
//! let filter = Filter::new().with_country("Italy");
//! let dashboard = Dashboard::build(&catalog, &filter, 10);
//!
//! for album in dashboard.albums.iter().take(5) {
//!     println!("{:.2}  {}", album.weighted_rating, album.display_name());
//! }
//! # Ok::<(), varredor::Error>(())
//! ```
//!
//! # Floor value
//!
//! Albums with no votes or no usable rating get a weighted rating of exactly
//! `0`, never `NaN`. Loading and rating never fail because of bad cells.
//!
//! # Modules
//!
//! - [`catalog`]: album records, CSV loading, lenient coercion
//! - [`rating`]: the weighted rating calculator
//! - [`filter`]: country, style and year filters
//! - [`dashboard`]: ranked rows and grouped statistics
//! - [`report`]: output formatters (HTML, JSON, CSV)
//! - [`serve`]: interactive web UI

pub mod catalog;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod logging;
pub mod rating;
pub mod report;
pub mod serve;

pub use catalog::{Album, Catalog};
pub use dashboard::Dashboard;
pub use error::{Error, Result};
pub use filter::Filter;
pub use rating::{RatingConfig, RatingPrior};

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // PUBLIC API TESTS
    // ==========================================================================
    //
    // These tests verify the public API surface is reachable from the crate
    // root and that the pieces fit together end to end.
    // ==========================================================================

    #[test]
    fn test_public_exports() {
        let _ = Filter::new();
        let _ = RatingConfig::default();
        let _ = RatingPrior::default();
        let _ = Catalog::default();
        let _ = Album::default();
    }

    #[test]
    fn test_default_quantile() {
        assert_eq!(RatingConfig::default().quantile, 0.75);
    }

    #[test]
    fn test_end_to_end_in_memory() {
        let data = "\
artist_name,album_name,year,country,style,rating,num_ratings
Magma,Mekanik Destruktiw Kommandoh,1973,France,Zeuhl,4.5,1100
Ange,Au-delà du délire,1974,France,Symphonic Prog,3.5,500
Someone,Lost Tape,1979,France,Zeuhl,5.0,1
Nobody,Unreleased,1980,France,Zeuhl,,0
";
        let (headers, rows) = catalog::read_csv(data.as_bytes(), std::path::Path::new("mem.csv")).unwrap();
        let cat = Catalog::from_rows(headers, rows, &RatingConfig::default());
        let dash = Dashboard::build(&cat, &Filter::new().with_style("Zeuhl"), dashboard::DEFAULT_TOP);

        assert_eq!(dash.albums.len(), 3);
        // The single perfect vote does not beat the well-established album
        assert_eq!(dash.albums[0].artist_name.as_deref(), Some("Magma"));
        assert_eq!(dash.albums[2].weighted_rating, 0.0);
    }
}
