//! Block-uniformity scale search.
//!
//! A correctly sized and aligned block grid puts every upscaled source
//! pixel into exactly one block, so every block is a flat color. Smaller
//! scales trivially satisfy this as well, which is why the largest scale
//! that is still nearly as uniform as the best one wins.

use image::RgbaImage;
use rayon::prelude::*;

use super::{argmin_by, ScaleCandidate, ScaleSearch, SearchBounds, SearchOutcome};
use crate::config::DownscaleConfig;
use crate::resample::downsample_with_phase;

/// Scale used when no candidate can be measured and there is no grid hint.
const FALLBACK_SCALE: u32 = 10;

/// Start and count of whole blocks inside `[start, end)` aligned to `phase`.
fn block_span(start: u32, end: u32, scale: u32, phase: u32) -> (u32, u32) {
    let offset = (phase % scale + scale - start % scale) % scale;
    let first = start + offset;
    let count = end.saturating_sub(first) / scale;
    (first, count)
}

/// Mean per-block color variance for one scale and phase.
///
/// Only the central region is measured: a margin of `height / 6` rows and
/// `width / 6` columns is excluded on each side. Blocks are `scale × scale`
/// tiles whose corners sit at image coordinates congruent to
/// `(phase_x, phase_y)` modulo `scale`. A block's variance is the summed
/// squared deviation of R, G and B from the block means, divided by three
/// times the pixel count; the result is the mean over all blocks. Returns
/// `f64::INFINITY` when fewer than two whole blocks fit on either axis.
pub fn block_variance(image: &RgbaImage, scale: u32, phase_x: u32, phase_y: u32) -> f64 {
    if scale == 0 {
        return f64::INFINITY;
    }
    let (width, height) = image.dimensions();
    let margin_x = width / 6;
    let margin_y = height / 6;

    let (x0, blocks_x) = block_span(margin_x, width - margin_x, scale, phase_x);
    let (y0, blocks_y) = block_span(margin_y, height - margin_y, scale, phase_y);
    if blocks_x < 2 || blocks_y < 2 {
        return f64::INFINITY;
    }

    let pixels = (scale * scale) as f64;
    let mut total = 0.0;
    for by in 0..blocks_y {
        for bx in 0..blocks_x {
            let left = x0 + bx * scale;
            let top = y0 + by * scale;

            let mut sum = [0.0f64; 3];
            let mut sum_sq = [0.0f64; 3];
            for y in top..top + scale {
                for x in left..left + scale {
                    let p = image.get_pixel(x, y);
                    for c in 0..3 {
                        let v = p[c] as f64;
                        sum[c] += v;
                        sum_sq[c] += v * v;
                    }
                }
            }

            let squared_deviation: f64 =
                (0..3).map(|c| (sum_sq[c] - sum[c] * sum[c] / pixels).max(0.0)).sum();
            total += squared_deviation / (pixels * 3.0);
        }
    }

    total / (blocks_x * blocks_y) as f64
}

/// Phase offset with the lowest [`block_variance`] for `scale`.
///
/// Offsets are first tried on a coarse lattice with stride `max(1, scale / 3)`,
/// then every offset within one stride of the coarse winner is tried. Earlier
/// offsets win ties. Returns `(phase_x, phase_y, variance)`.
pub fn best_phase(image: &RgbaImage, scale: u32) -> (u32, u32, f64) {
    let step = (scale / 3).max(1);
    let mut best = (0, 0, f64::INFINITY);

    let mut consider = |px: u32, py: u32| {
        let variance = block_variance(image, scale, px, py);
        if variance < best.2 {
            best = (px, py, variance);
        }
    };

    for py in (0..scale).step_by(step as usize) {
        for px in (0..scale).step_by(step as usize) {
            consider(px, py);
        }
    }

    if step > 1 {
        let (cx, cy, _) = best;
        for py in cy.saturating_sub(step)..(cy + step + 1).min(scale) {
            for px in cx.saturating_sub(step)..(cx + step + 1).min(scale) {
                let variance = block_variance(image, scale, px, py);
                if variance < best.2 {
                    best = (px, py, variance);
                }
            }
        }
    }

    best
}

/// Pick among measured candidates (in ascending scale order).
///
/// Scales whose variance is at most `ratio` times the minimum are valid.
/// With a hint, the valid scale closest to it wins (the smaller one on
/// ties); without one, the largest valid scale wins.
fn select_scale(candidates: &[ScaleCandidate], ratio: f64, hint: Option<f64>) -> Option<usize> {
    let best = argmin_by(candidates, |c| c.score)?;
    let threshold = candidates[best].score * ratio;
    let valid: Vec<usize> = (0..candidates.len()).filter(|&i| candidates[i].score <= threshold).collect();

    match hint {
        Some(h) => {
            let pick = argmin_by(&valid, |&i| (candidates[i].factor as f64 - h).abs())?;
            Some(valid[pick])
        }
        None => valid.last().copied(),
    }
}

/// Uniformity search: block uniformity with phase search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformitySearch {
    /// A scale is valid when its variance is within this multiple of the minimum
    pub variance_ratio: f64,
}

impl Default for UniformitySearch {
    fn default() -> Self {
        Self { variance_ratio: 2.0 }
    }
}

impl From<&DownscaleConfig> for UniformitySearch {
    fn from(config: &DownscaleConfig) -> Self {
        Self { variance_ratio: config.variance_ratio }
    }
}

impl UniformitySearch {
    fn fallback(&self, image: &RgbaImage, bounds: SearchBounds, hint: Option<f64>) -> SearchOutcome {
        let scale = match hint {
            Some(h) if h.is_finite() && h > 0.0 => bounds.clamp(h.round() as u32),
            _ => bounds.clamp(FALLBACK_SCALE),
        };
        let (width, height) = image.dimensions();
        if scale == 0 || width / scale == 0 || height / scale == 0 {
            log::debug!("Fallback scale {} leaves no whole block", scale);
            return SearchOutcome::identity(image, bounds);
        }
        log::debug!("No measurable scale, falling back to {}", scale);
        SearchOutcome {
            factor: scale,
            image: downsample_with_phase(image, scale, 0, 0),
            score: f64::INFINITY,
            phase: Some((0, 0)),
            searched: bounds,
            candidates: Vec::new(),
        }
    }
}

impl ScaleSearch for UniformitySearch {
    fn name(&self) -> &'static str {
        "uniformity"
    }

    fn search(&self, image: &RgbaImage, bounds: SearchBounds, hint: Option<f64>) -> SearchOutcome {
        let (width, height) = image.dimensions();

        let measured: Vec<(u32, u32, u32, f64)> = (bounds.min_factor.max(1)..=bounds.max_factor)
            .into_par_iter()
            .map(|scale| {
                let (px, py, variance) = best_phase(image, scale);
                (scale, px, py, variance)
            })
            .collect();

        let candidates: Vec<ScaleCandidate> = measured
            .into_iter()
            .filter(|&(_, _, _, variance)| variance.is_finite())
            .map(|(scale, px, py, variance)| {
                log::trace!("scale {:>2}: phase ({}, {}) variance {:.3}", scale, px, py, variance);
                ScaleCandidate {
                    factor: scale,
                    size: (width.saturating_sub(px) / scale, height.saturating_sub(py) / scale),
                    score: variance,
                    information: None,
                    combined: variance,
                    phase: Some((px, py)),
                }
            })
            .collect();

        let Some(best) = select_scale(&candidates, self.variance_ratio, hint) else {
            return self.fallback(image, bounds, hint);
        };

        let chosen = &candidates[best];
        let (px, py) = chosen.phase.unwrap_or((0, 0));
        log::debug!(
            "Uniformity picked scale {} at phase ({}, {}), variance {:.3}",
            chosen.factor,
            px,
            py,
            chosen.score
        );

        SearchOutcome {
            factor: chosen.factor,
            image: downsample_with_phase(image, chosen.factor, px, py),
            score: chosen.score,
            phase: Some((px, py)),
            searched: bounds,
            candidates,
        }
    }
}
