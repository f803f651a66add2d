//! Scale search: find the integer block size of an upscaled sprite.
//!
//! Two scoring strategies implement the [`ScaleSearch`] trait:
//!
//! - [`FidelitySearch`] downsizes by each candidate factor, upsizes back and
//!   measures how faithfully the original is reconstructed, rewarding
//!   retained detail.
//! - [`UniformitySearch`] looks for the block size and phase offset at which
//!   every block is closest to a single flat color, preferring the largest
//!   such block size.
//!
//! Candidates are scored in parallel with rayon and reduced sequentially in
//! factor order, so results never depend on thread scheduling.

mod fidelity;
mod uniformity;

pub use fidelity::{alignment_score, information_content, FidelitySearch, MIN_OUTPUT_SIDE};
pub use uniformity::{best_phase, block_variance, UniformitySearch};

use image::RgbaImage;
use serde::Serialize;

use crate::config::{DownscaleConfig, ScaleStrategy};

/// Inclusive range of integer factors to try.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchBounds {
    pub min_factor: u32,
    pub max_factor: u32,
}

impl SearchBounds {
    pub fn new(min_factor: u32, max_factor: u32) -> Self {
        Self { min_factor, max_factor }
    }

    /// Whether `value` lies within the bounds.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min_factor as f64 && value <= self.max_factor as f64
    }

    /// Clamp a factor into the bounds.
    pub fn clamp(&self, factor: u32) -> u32 {
        factor.clamp(self.min_factor, self.max_factor.max(self.min_factor))
    }
}

impl From<&DownscaleConfig> for SearchBounds {
    fn from(config: &DownscaleConfig) -> Self {
        Self::new(config.min_factor, config.max_factor)
    }
}

/// One scored factor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaleCandidate {
    /// Integer factor (block size)
    pub factor: u32,
    /// Size of the downsized image
    pub size: (u32, u32),
    /// Reconstruction error (fidelity) or mean block variance (uniformity)
    pub score: f64,
    /// Retained-detail score of the downsized image (fidelity only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub information: Option<f64>,
    /// Value the strategy minimises
    pub combined: f64,
    /// Best block phase offset (uniformity only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<(u32, u32)>,
}

/// Result of a scale search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Chosen factor; 1 when every candidate was degenerate
    pub factor: u32,
    /// The image downsized by `factor`
    pub image: RgbaImage,
    /// Selection score of the chosen candidate (infinite when none)
    pub score: f64,
    /// Block phase used for sampling (uniformity only)
    pub phase: Option<(u32, u32)>,
    /// Factor range actually searched
    pub searched: SearchBounds,
    /// Every non-degenerate candidate in factor order
    pub candidates: Vec<ScaleCandidate>,
}

impl SearchOutcome {
    /// The identity outcome used when no candidate is usable.
    pub fn identity(image: &RgbaImage, searched: SearchBounds) -> Self {
        Self {
            factor: 1,
            image: image.clone(),
            score: f64::INFINITY,
            phase: None,
            searched,
            candidates: Vec::new(),
        }
    }
}

/// A scale-search strategy.
///
/// Implementations must be deterministic: identical inputs give identical
/// outcomes. A search never fails; when no candidate is usable it returns
/// [`SearchOutcome::identity`].
pub trait ScaleSearch: Send + Sync {
    /// Short strategy name for logs and reports.
    fn name(&self) -> &'static str;

    /// Search `bounds` for the best factor, optionally guided by a grid hint.
    fn search(&self, image: &RgbaImage, bounds: SearchBounds, hint: Option<f64>) -> SearchOutcome;
}

/// Build the search selected by the configuration.
pub fn searcher_for(config: &DownscaleConfig) -> Box<dyn ScaleSearch> {
    match config.scale_strategy {
        ScaleStrategy::Fidelity => Box::new(FidelitySearch::from(config)),
        ScaleStrategy::Uniformity => Box::new(UniformitySearch::from(config)),
    }
}

/// Index of the lowest `key`, earliest index winning ties. NaN keys are skipped.
fn argmin_by<T>(items: &[T], key: impl Fn(&T) -> f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, item) in items.iter().enumerate() {
        let value = key(item);
        if value.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if value >= b => {}
            _ => best = Some((i, value)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_contains_and_clamp() {
        let bounds = SearchBounds::new(6, 20);
        assert!(bounds.contains(6.0) && bounds.contains(19.5) && bounds.contains(20.0));
        assert!(!bounds.contains(5.9) && !bounds.contains(20.1));
        assert_eq!(bounds.clamp(3), 6);
        assert_eq!(bounds.clamp(30), 20);
        assert_eq!(bounds.clamp(10), 10);
    }

    #[test]
    fn test_argmin_prefers_first_on_ties() {
        let values = [3.0, 1.0, 1.0, 2.0];
        assert_eq!(argmin_by(&values, |v| *v), Some(1));
        assert_eq!(argmin_by::<f64>(&[], |v| *v), None);
    }

    #[test]
    fn test_argmin_skips_nan() {
        let values = [f64::NAN, 4.0, 2.0];
        assert_eq!(argmin_by(&values, |v| *v), Some(2));
    }

    #[test]
    fn test_searcher_for_strategy() {
        let mut config = DownscaleConfig::default();
        assert_eq!(searcher_for(&config).name(), "fidelity");
        config.scale_strategy = ScaleStrategy::Uniformity;
        assert_eq!(searcher_for(&config).name(), "uniformity");
    }

    #[test]
    fn test_identity_outcome() {
        let img = RgbaImage::new(3, 3);
        let outcome = SearchOutcome::identity(&img, SearchBounds::new(6, 20));
        assert_eq!(outcome.factor, 1);
        assert_eq!(outcome.image.dimensions(), (3, 3));
        assert!(outcome.score.is_infinite());
    }
}
