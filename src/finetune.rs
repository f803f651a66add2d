//! Fractional scale refinement.

use std::collections::BTreeMap;

use image::RgbaImage;
use serde::Serialize;

use crate::search::alignment_score;

/// Distance searched on each side of the centre factor.
const WINDOW: f64 = 1.0;

/// Spacing of candidate factors.
const STEP: f64 = 0.05;

/// Best candidate producing one output size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeCandidate {
    pub size: (u32, u32),
    pub factor: f64,
    pub score: f64,
}

/// Result of [`fine_tune`].
#[derive(Debug, Clone)]
pub struct FineTuneOutcome {
    /// Best fractional factor
    pub factor: f64,
    /// Image downsized by `factor`
    pub image: RgbaImage,
    /// Alignment score of `factor`
    pub score: f64,
    /// Lowest-scoring factor per distinct output size, ordered by size
    pub by_size: Vec<SizeCandidate>,
}

/// Candidate factors `center - 1.0 + 0.05 * i` for `i` in `0..=40`, skipping
/// values below 1.
fn candidate_factors(center: f64) -> impl Iterator<Item = f64> {
    let steps = (2.0 * WINDOW / STEP).round() as u32;
    (0..=steps).map(move |i| center - WINDOW + STEP * i as f64).filter(|&f| f >= 1.0)
}

/// Refine an integer factor to a fractional one.
///
/// The window is centred on the grid hint when there is one, otherwise on
/// `factor`. Every candidate is scored with [`alignment_score`]; the first
/// candidate with the lowest score wins. Returns `None` when every
/// candidate is degenerate.
pub fn fine_tune(image: &RgbaImage, factor: u32, hint: Option<f64>) -> Option<FineTuneOutcome> {
    let center = hint.unwrap_or(factor as f64);

    let mut best: Option<(f64, f64, RgbaImage)> = None;
    let mut by_size: BTreeMap<(u32, u32), SizeCandidate> = BTreeMap::new();

    for f in candidate_factors(center) {
        let Some((score, down)) = alignment_score(image, f) else {
            continue;
        };
        let size = down.dimensions();

        match by_size.get(&size) {
            Some(existing) if existing.score <= score => {}
            _ => {
                by_size.insert(size, SizeCandidate { size, factor: f, score });
            }
        }

        if best.as_ref().map_or(true, |(_, s, _)| score < *s) {
            best = Some((f, score, down));
        }
    }

    let (factor, score, image) = best?;
    log::debug!("Fine-tuned factor {:.2} (score {:.3}) around {:.2}", factor, score, center);

    Some(FineTuneOutcome { factor, image, score, by_size: by_size.into_values().collect() })
}
