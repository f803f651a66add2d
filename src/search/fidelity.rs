//! Reconstruction-fidelity scale search.

use image::RgbaImage;
use rayon::prelude::*;

use super::{argmin_by, ScaleCandidate, ScaleSearch, SearchBounds, SearchOutcome};
use crate::color;
use crate::config::DownscaleConfig;
use crate::resample::{resize_nearest, scaled_size, upscale_to};

/// Smallest usable side of a downsized candidate.
pub const MIN_OUTPUT_SIDE: u32 = 8;

/// Grey-level difference that counts as an edge in [`information_content`].
const EDGE_CONTRAST: f64 = 20.0;

/// Half-width of the factor window searched around a grid hint.
const HINT_WINDOW: f64 = 2.0;

/// How well a downsized image reconstructs the original.
///
/// The image is resized to [`scaled_size`] and back with
/// nearest-neighbor sampling. Over pixels whose original alpha is non-zero:
///
/// `score = MAE(rgb) + 0.5 × MAE(alpha) + 100 × semi_ratio`
///
/// where `semi_ratio` is the fraction of downsized pixels that are partially
/// transparent. Lower is better. Returns `None` (an infinitely bad
/// candidate) when either downsized side is below [`MIN_OUTPUT_SIDE`] or the
/// image has no visible pixel; otherwise the score and the downsized image.
pub fn alignment_score(image: &RgbaImage, factor: f64) -> Option<(f64, RgbaImage)> {
    let (width, height) = image.dimensions();
    let (new_w, new_h) = scaled_size(width, height, factor);
    if new_w < MIN_OUTPUT_SIDE || new_h < MIN_OUTPUT_SIDE {
        return None;
    }

    let down = resize_nearest(image, new_w, new_h);
    let up = upscale_to(&down, width, height);

    let mut rgb_error = 0u64;
    let mut alpha_error = 0u64;
    let mut visible = 0u64;
    for (orig, rec) in image.pixels().zip(up.pixels()) {
        if orig[3] == 0 {
            continue;
        }
        visible += 1;
        rgb_error += color::manhattan(color::rgb_of(orig), color::rgb_of(rec)) as u64;
        alpha_error += orig[3].abs_diff(rec[3]) as u64;
    }
    if visible == 0 {
        return None;
    }

    let mae_rgb = rgb_error as f64 / (visible * 3) as f64;
    let mae_alpha = alpha_error as f64 / visible as f64;
    let semi = down.pixels().filter(|p| color::is_semi_transparent(p)).count();
    let semi_ratio = semi as f64 / (new_w as f64 * new_h as f64);

    Some((mae_rgb + 0.5 * mae_alpha + 100.0 * semi_ratio, down))
}

/// Amount of detail in an image.
///
/// Population variance of every visible pixel's R, G and B values, plus one
/// tenth of the number of horizontal and vertical neighbour pairs whose
/// channel-mean grey levels differ by more than 20. Zero for an image with
/// no visible pixel.
pub fn information_content(image: &RgbaImage) -> f64 {
    let mut n = 0u64;
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    for p in image.pixels().filter(|p| p[3] > 0) {
        for &v in &p.0[..3] {
            let v = v as f64;
            sum += v;
            sum_sq += v * v;
        }
        n += 3;
    }
    if n == 0 {
        return 0.0;
    }
    let mean = sum / n as f64;
    let variance = (sum_sq / n as f64 - mean * mean).max(0.0);

    let (w, h) = image.dimensions();
    let grey = |x: u32, y: u32| color::channel_mean(image.get_pixel(x, y));
    let mut edges = 0usize;
    for y in 0..h {
        for x in 0..w {
            let g = grey(x, y);
            if x + 1 < w && (grey(x + 1, y) - g).abs() > EDGE_CONTRAST {
                edges += 1;
            }
            if y + 1 < h && (grey(x, y + 1) - g).abs() > EDGE_CONTRAST {
                edges += 1;
            }
        }
    }

    variance + edges as f64 / 10.0
}

/// Factor range searched for a given hint.
///
/// A hint inside `bounds` narrows the range to
/// `max(min, trunc(hint − 2)) ..= min(max, trunc(hint + 2))`; otherwise the
/// full bounds are searched.
pub fn narrowed_bounds(bounds: SearchBounds, hint: Option<f64>) -> SearchBounds {
    match hint {
        Some(h) if bounds.contains(h) => {
            let lo = (h - HINT_WINDOW).trunc().max(bounds.min_factor as f64) as u32;
            let hi = (h + HINT_WINDOW).trunc().min(bounds.max_factor as f64) as u32;
            SearchBounds::new(lo, hi)
        }
        _ => bounds,
    }
}

/// Whether the hint-closest candidate may replace the best one.
///
/// The closest candidate is accepted when its score is within
/// `tolerance × |best|` above the best score. Using the magnitude keeps the
/// rule meaningful for negative scores.
fn accepts_hint_candidate(best: f64, closest: f64, tolerance: f64) -> bool {
    closest <= best + best.abs() * tolerance
}

/// Fidelity search: downscale/upscale reconstruction fidelity with a detail bonus.
///
/// Each factor is scored `alignment − information / 1000`. When a grid hint
/// narrowed the lower end of the range, the factor numerically closest to
/// the hint wins if its score is within `hint_tolerance` of the best.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FidelitySearch {
    pub hint_tolerance: f64,
}

impl Default for FidelitySearch {
    fn default() -> Self {
        Self { hint_tolerance: 0.2 }
    }
}

impl From<&DownscaleConfig> for FidelitySearch {
    fn from(config: &DownscaleConfig) -> Self {
        Self { hint_tolerance: config.hint_tolerance }
    }
}

impl ScaleSearch for FidelitySearch {
    fn name(&self) -> &'static str {
        "fidelity"
    }

    fn search(&self, image: &RgbaImage, bounds: SearchBounds, hint: Option<f64>) -> SearchOutcome {
        let searched = narrowed_bounds(bounds, hint);

        let scored: Vec<(ScaleCandidate, RgbaImage)> = (searched.min_factor..=searched.max_factor)
            .into_par_iter()
            .filter_map(|factor| {
                let (alignment, down) = alignment_score(image, factor as f64)?;
                let information = information_content(&down);
                let candidate = ScaleCandidate {
                    factor,
                    size: down.dimensions(),
                    score: alignment,
                    information: Some(information),
                    combined: alignment - information / 1000.0,
                    phase: None,
                };
                Some((candidate, down))
            })
            .collect();
        let (candidates, mut images): (Vec<ScaleCandidate>, Vec<RgbaImage>) = scored.into_iter().unzip();

        for c in &candidates {
            log::trace!(
                "factor {:>2}: alignment {:.3} information {:.1} combined {:.4}",
                c.factor,
                c.score,
                c.information.unwrap_or(0.0),
                c.combined
            );
        }

        let Some(mut best) = argmin_by(&candidates, |c| c.combined) else {
            log::debug!("No usable factor in {}..={}", searched.min_factor, searched.max_factor);
            return SearchOutcome::identity(image, searched);
        };

        if let Some(h) = hint {
            if searched.min_factor != bounds.min_factor {
                let closest = argmin_by(&candidates, |c| (c.factor as f64 - h).abs());
                if let Some(closest) = closest {
                    if closest != best
                        && accepts_hint_candidate(
                            candidates[best].combined,
                            candidates[closest].combined,
                            self.hint_tolerance,
                        )
                    {
                        log::debug!(
                            "Preferring hint-closest factor {} over {}",
                            candidates[closest].factor,
                            candidates[best].factor
                        );
                        best = closest;
                    }
                }
            }
        }

        let chosen = &candidates[best];
        log::debug!("Fidelity search chose factor {} (score {:.4})", chosen.factor, chosen.combined);

        SearchOutcome {
            factor: chosen.factor,
            score: chosen.combined,
            image: images.swap_remove(best),
            phase: None,
            searched,
            candidates,
        }
    }
}
