//! Grid period estimation.
//!
//! An upscaled sprite shows a strong edge at every block boundary. Summing
//! absolute luminance differences along each axis gives a 1-D edge-energy
//! profile whose dominant frequency is the block size. The estimate is only
//! a hint for the scale search, so anything that does not look clearly
//! periodic is rejected.

use image::RgbaImage;
use rustfft::{num_complex::Complex, FftPlanner};

use crate::color;
use crate::config::DownscaleConfig;

/// Profiles shorter than this carry no usable periodicity.
const MIN_PROFILE_LEN: usize = 8;

/// Fraction of the unrestricted spectrum maximum the band peak must reach.
const GLOBAL_PEAK_RATIO: f64 = 0.1;

/// Relative power difference below which two band bins count as tied.
const TIE_EPSILON: f64 = 1e-9;

/// Settings for [`estimate_grid`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridOptions {
    /// Smallest reportable period in pixels
    pub min_grid: f64,
    /// Largest reportable period in pixels
    pub max_grid: f64,
    /// How far the band peak must stand above the median band power
    pub min_prominence: f64,
    /// Scale each pixel's luminance by its opacity
    pub alpha_weighted: bool,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self { min_grid: 4.0, max_grid: 30.0, min_prominence: 20.0, alpha_weighted: false }
    }
}

impl From<&DownscaleConfig> for GridOptions {
    fn from(config: &DownscaleConfig) -> Self {
        Self { min_grid: config.min_grid, max_grid: config.max_grid, ..Self::default() }
    }
}

/// Horizontal and vertical edge-energy profiles.
///
/// The horizontal profile has `width - 1` entries: entry `x` is the sum over
/// all rows of `|L(x + 1, y) - L(x, y)|`. The vertical profile is the same
/// along columns with `height - 1` entries.
pub fn edge_profiles(image: &RgbaImage, alpha_weighted: bool) -> (Vec<f64>, Vec<f64>) {
    let (w, h) = image.dimensions();
    let (w, h) = (w as usize, h as usize);
    let lum: Vec<f64> = image
        .pixels()
        .map(|p| {
            let l = color::luma(p);
            if alpha_weighted {
                l * p[3] as f64 / 255.0
            } else {
                l
            }
        })
        .collect();

    let mut horizontal = vec![0.0; w.saturating_sub(1)];
    let mut vertical = vec![0.0; h.saturating_sub(1)];

    for y in 0..h {
        let row = &lum[y * w..(y + 1) * w];
        for x in 0..w.saturating_sub(1) {
            horizontal[x] += (row[x + 1] - row[x]).abs();
        }
        if y + 1 < h {
            let next = &lum[(y + 1) * w..(y + 2) * w];
            vertical[y] = row.iter().zip(next).map(|(a, b)| (b - a).abs()).sum();
        }
    }

    (horizontal, vertical)
}

/// Power spectrum of the de-meaned signal for bins `0..=n/2`, DC zeroed.
fn power_spectrum(signal: &[f64]) -> Vec<f64> {
    let n = signal.len();
    let mean = signal.iter().sum::<f64>() / n as f64;

    let mut buffer: Vec<Complex<f64>> = signal.iter().map(|&v| Complex::new(v - mean, 0.0)).collect();
    let mut planner = FftPlanner::new();
    planner.plan_fft_forward(n).process(&mut buffer);

    let mut power: Vec<f64> = buffer[..=n / 2].iter().map(|c| c.norm_sqr()).collect();
    power[0] = 0.0;
    power
}

/// Dominant period of a 1-D profile within `[options.min_grid, options.max_grid]`.
///
/// Returns `None` when the profile is too short, the band is empty, or the
/// band peak is weak: below 10% of the whole spectrum's maximum, or less than
/// `min_prominence` times the median band power. Bins whose power differs
/// only by rounding noise are tied, and the lowest frequency among them wins.
pub fn detect_period(profile: &[f64], options: &GridOptions) -> Option<f64> {
    let n = profile.len();
    if n < MIN_PROFILE_LEN {
        return None;
    }

    let power = power_spectrum(profile);
    let in_band = |k: usize| {
        let freq = k as f64 / n as f64;
        k > 0 && freq >= 1.0 / options.max_grid && freq <= 1.0 / options.min_grid
    };
    let band: Vec<usize> = (0..power.len()).filter(|&k| in_band(k)).collect();
    if band.is_empty() {
        return None;
    }

    let mut peak = band[0];
    for &k in &band {
        if power[k] > power[peak] * (1.0 + TIE_EPSILON) {
            peak = k;
        }
    }
    let peak_power = power[peak];
    if peak_power <= 0.0 {
        return None;
    }

    let global_max = power.iter().cloned().fold(0.0, f64::max);
    if peak_power < GLOBAL_PEAK_RATIO * global_max {
        return None;
    }

    let mut band_power: Vec<f64> = band.iter().map(|&k| power[k]).collect();
    band_power.sort_by(|a, b| a.total_cmp(b));
    let median = band_power[band_power.len() / 2];
    if median > 0.0 && peak_power < options.min_prominence * median {
        return None;
    }

    Some(n as f64 / peak as f64)
}

/// Estimate the block size of an upscaled image.
///
/// Both axes are analysed independently; when both yield a period the two
/// are averaged, otherwise whichever exists is returned.
pub fn estimate_grid(image: &RgbaImage, options: &GridOptions) -> Option<f64> {
    let (horizontal, vertical) = edge_profiles(image, options.alpha_weighted);
    let period_x = detect_period(&horizontal, options);
    let period_y = detect_period(&vertical, options);
    log::debug!("Grid periods: x={:?} y={:?}", period_x, period_y);

    match (period_x, period_y) {
        (Some(x), Some(y)) => Some((x + y) / 2.0),
        (x, y) => x.or(y),
    }
}
