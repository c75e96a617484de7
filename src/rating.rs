//! Weighted (Bayesian average) album rating
//!
//! A raw average rating is a noisy signal when few people voted: one 5-star
//! vote beats three thousand votes averaging 4.6. The weighted rating pulls
//! each album's own average `R` toward the corpus-wide mean `C`, and the pull
//! fades as the album's vote count `v` grows past the prior weight `m`:
//!
//! ```text
//! weighted = v / (v + m) * R  +  m / (v + m) * C
//! ```
//!
//! - `C` is the mean rating over albums with at least one vote.
//! - `m` is a quantile (by default the 75th percentile) of the vote counts of
//!   those same albums, using linear interpolation between closest ranks.
//!
//! # Floor value
//!
//! Albums with no votes, or without a usable rating, get a weighted rating of
//! exactly `0.0`. This keeps "no data" visibly apart from "rated low" and
//! keeps the calculation total: it never errors and never produces `NaN`.
//!
//! When no album has a vote at all, `C` and `m` are both `0` and every album
//! floors to `0`.

use crate::catalog::Album;
use serde::Serialize;

/// Quantile of vote counts used as the prior weight
pub const DEFAULT_QUANTILE: f64 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingConfig {
    /// In `[0, 1]`; out-of-range values are clamped
    pub quantile: f64,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            quantile: DEFAULT_QUANTILE,
        }
    }
}

impl RatingConfig {
    pub fn with_quantile(mut self, quantile: f64) -> Self {
        self.quantile = quantile;
        self
    }
}

/// Corpus-wide constants of the weighted rating formula
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RatingPrior {
    /// `C`: mean rating over albums with at least one vote
    pub global_mean: f64,
    /// `m`: damping constant, a quantile of the vote counts
    pub prior_weight: f64,
    /// Number of albums with at least one vote
    pub rated: usize,
}

/// How a single weighted rating was put together
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Breakdown {
    pub votes: u64,
    pub rating: Option<f64>,
    pub global_mean: f64,
    pub prior_weight: f64,
    /// Share of the result taken from the album's own rating, `v / (v + m)`
    pub own_share: f64,
    pub weighted_rating: f64,
}

impl RatingPrior {
    /// Derive `C` and `m` from the corpus
    pub fn from_albums(albums: &[Album], config: &RatingConfig) -> Self {
        let rated: Vec<&Album> = albums.iter().filter(|a| a.is_rated()).collect();
        if rated.is_empty() {
            return Self::default();
        }

        // Albums with votes but an unreadable rating are skipped for the mean
        let ratings: Vec<f64> = rated.iter().filter_map(|a| a.rating).collect();
        let global_mean = if ratings.is_empty() {
            0.0
        } else {
            ratings.iter().sum::<f64>() / ratings.len() as f64
        };

        let mut votes: Vec<f64> = rated.iter().map(|a| a.votes() as f64).collect();
        let prior_weight = percentile(&mut votes, config.quantile);

        Self {
            global_mean,
            prior_weight,
            rated: rated.len(),
        }
    }

    /// Weighted rating for one album's vote count and rating
    pub fn weigh(&self, num_ratings: Option<u64>, rating: Option<f64>) -> f64 {
        let v = num_ratings.unwrap_or(0);
        match rating {
            Some(r) if v > 0 => {
                let v = v as f64;
                let m = self.prior_weight;
                (v / (v + m)) * r + (m / (v + m)) * self.global_mean
            }
            _ => 0.0,
        }
    }

    pub fn explain(&self, album: &Album) -> Breakdown {
        let votes = album.votes();
        let own_share = if votes > 0 && album.rating.is_some() {
            votes as f64 / (votes as f64 + self.prior_weight)
        } else {
            0.0
        };

        Breakdown {
            votes,
            rating: album.rating,
            global_mean: self.global_mean,
            prior_weight: self.prior_weight,
            own_share,
            weighted_rating: self.weigh(album.num_ratings, album.rating),
        }
    }
}

/// Weighted ratings for every album, in input order
pub fn weighted_ratings(albums: &[Album], config: &RatingConfig) -> (RatingPrior, Vec<f64>) {
    let prior = RatingPrior::from_albums(albums, config);
    let weighted = albums
        .iter()
        .map(|a| prior.weigh(a.num_ratings, a.rating))
        .collect();
    (prior, weighted)
}

/// Compute and store `weighted_rating` on every album
pub fn apply(albums: &mut [Album], config: &RatingConfig) -> RatingPrior {
    let (prior, weighted) = weighted_ratings(albums, config);
    for (album, w) in albums.iter_mut().zip(weighted) {
        album.weighted_rating = w;
    }
    tracing::debug!(
        rated = prior.rated,
        global_mean = prior.global_mean,
        prior_weight = prior.prior_weight,
        "weighted ratings computed"
    );
    prior
}

/// Quantile by linear interpolation between closest ranks.
///
/// Sorts `values` in place. Returns `0.0` for an empty slice.
pub fn percentile(values: &mut [f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.total_cmp(b));

    let q = if q.is_nan() { DEFAULT_QUANTILE } else { q.clamp(0.0, 1.0) };
    let pos = q * (values.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;

    values[lo] + (values[hi] - values[lo]) * frac
}
