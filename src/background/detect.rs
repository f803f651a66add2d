//! Background color detection.
//!
//! Finds the colors a generator painted behind the sprite, either as a
//! two-color transparency checkerboard in the top-left corner or as the most
//! common colors along the image edges.

use std::collections::{BTreeMap, HashMap};

use image::RgbaImage;

use crate::color::{self, Rgb, WideRgb};
use crate::mask::Mask;

/// Side of the top-left square inspected for a checkerboard.
pub const CHECKER_SAMPLE_SIZE: u32 = 50;

/// Coarse sub-sample window (even rows/columns below this bound) used to confirm
/// a checkerboard.
const CHECKER_SUBSAMPLE_SIZE: u32 = 20;

/// Fraction of sub-sampled pixels that must match one of the two colors.
const CHECKER_MATCH_RATIO: f64 = 0.9;

/// Width of the edge bands sampled for background colors.
pub const EDGE_SAMPLE_WIDTH: u32 = 5;

/// Width of the border band where the looser edge tolerance applies.
pub const BORDER_BAND: u32 = 10;

/// Quantization step used when clustering edge samples.
pub const QUANT_STEP: u8 = 16;

/// Where a set of background colors came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSource {
    /// Two-color transparency checkerboard in the top-left corner
    Checkerboard,
    /// Most frequent quantized edge colors
    EdgeCluster,
}

/// Representative background colors with their occurrence counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundColors {
    /// Colors ordered by priority (most frequent first for edge clusters)
    pub colors: Vec<(WideRgb, usize)>,
    /// Detection method that produced the colors
    pub source: ColorSource,
}

impl BackgroundColors {
    /// The colors without their counts.
    pub fn rgb(&self) -> impl Iterator<Item = WideRgb> + '_ {
        self.colors.iter().map(|&(c, _)| c)
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

/// Detect a synthetic transparency checkerboard.
///
/// The top-left corner (up to 50×50) must contain exactly two distinct RGB
/// colors, and at least 90% of the pixels at even coordinates within its
/// first 20 rows and columns must be one of them. Both colors must also
/// alternate along the corner's top row and left column, which rejects a
/// flat background with a sprite reaching into the corner. Returns both
/// colors in ascending RGB order.
pub fn detect_checkerboard(image: &RgbaImage) -> Option<BackgroundColors> {
    let sample_w = image.width().min(CHECKER_SAMPLE_SIZE);
    let sample_h = image.height().min(CHECKER_SAMPLE_SIZE);

    let mut counts: BTreeMap<Rgb, usize> = BTreeMap::new();
    for y in 0..sample_h {
        for x in 0..sample_w {
            *counts.entry(color::rgb_of(image.get_pixel(x, y))).or_default() += 1;
            if counts.len() > 2 {
                return None;
            }
        }
    }
    if counts.len() != 2 {
        return None;
    }

    let mut matched = 0usize;
    let mut total = 0usize;
    for y in (0..sample_h.min(CHECKER_SUBSAMPLE_SIZE)).step_by(2) {
        for x in (0..sample_w.min(CHECKER_SUBSAMPLE_SIZE)).step_by(2) {
            if counts.contains_key(&color::rgb_of(image.get_pixel(x, y))) {
                matched += 1;
            }
            total += 1;
        }
    }
    if total == 0 || (matched as f64 / total as f64) < CHECKER_MATCH_RATIO {
        return None;
    }

    let top_row = (0..sample_w).map(|x| color::rgb_of(image.get_pixel(x, 0)));
    let left_column = (0..sample_h).map(|y| color::rgb_of(image.get_pixel(0, y)));
    if !(alternates(top_row, sample_w) && alternates(left_column, sample_h)) {
        return None;
    }

    Some(BackgroundColors {
        colors: counts.into_iter().map(|(c, n)| (color::widen(c), n)).collect(),
        source: ColorSource::Checkerboard,
    })
}

/// Whether a run of `len` pixels changes color at least once.
///
/// Single-pixel runs cannot alternate and are accepted.
fn alternates(mut run: impl Iterator<Item = Rgb>, len: u32) -> bool {
    if len < 2 {
        return true;
    }
    match run.next() {
        Some(first) => run.any(|c| c != first),
        None => true,
    }
}

/// Collect RGB samples from bands of `width` pixels along all four edges.
///
/// Order: top rows, bottom rows, left columns, right columns, each scanned
/// row-major. Corner pixels are sampled more than once. Alpha is ignored.
pub fn sample_edge_colors(image: &RgbaImage, width: u32) -> Vec<Rgb> {
    let (w, h) = image.dimensions();
    let band_h = width.min(h);
    let band_w = width.min(w);
    let mut samples =
        Vec::with_capacity(2 * (band_h as usize * w as usize + band_w as usize * h as usize));

    for y in 0..band_h {
        samples.extend((0..w).map(|x| color::rgb_of(image.get_pixel(x, y))));
    }
    for y in h - band_h..h {
        samples.extend((0..w).map(|x| color::rgb_of(image.get_pixel(x, y))));
    }
    for y in 0..h {
        samples.extend((0..band_w).map(|x| color::rgb_of(image.get_pixel(x, y))));
    }
    for y in 0..h {
        samples.extend((w - band_w..w).map(|x| color::rgb_of(image.get_pixel(x, y))));
    }

    samples
}

/// Quantize samples to multiples of 16 and keep the `max_colors` most frequent.
///
/// Ties are broken in favour of the color seen first.
pub fn cluster_background_colors(samples: &[Rgb], max_colors: usize) -> BackgroundColors {
    let mut counts: HashMap<WideRgb, (usize, usize)> = HashMap::new();
    for (i, &sample) in samples.iter().enumerate() {
        let entry = counts.entry(color::quantize(sample, QUANT_STEP)).or_insert((0, i));
        entry.0 += 1;
    }

    let mut ranked: Vec<(WideRgb, usize, usize)> =
        counts.into_iter().map(|(c, (count, first))| (c, count, first)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    BackgroundColors {
        colors: ranked.into_iter().take(max_colors).map(|(c, count, _)| (c, count)).collect(),
        source: ColorSource::EdgeCluster,
    }
}

/// Pixels whose RGB lies within tolerance of any background color.
///
/// Pixels inside the 10-pixel border band use `edge_tolerance`; interior
/// pixels use `tolerance`. Distances are Manhattan over RGB.
pub fn background_mask(
    image: &RgbaImage,
    colors: &BackgroundColors,
    tolerance: u32,
    edge_tolerance: u32,
) -> Mask {
    let (w, h) = image.dimensions();
    let palette: Vec<WideRgb> = colors.rgb().collect();

    Mask::from_fn(w, h, |x, y| {
        let limit = if in_border_band(x, y, w, h, BORDER_BAND) { edge_tolerance } else { tolerance };
        let rgb = color::rgb_of(image.get_pixel(x, y));
        palette.iter().any(|&bg| color::manhattan_wide(rgb, bg) <= limit)
    })
}

/// Whether (x, y) lies within `band` pixels of any image edge.
#[inline]
pub fn in_border_band(x: u32, y: u32, w: u32, h: u32, band: u32) -> bool {
    x < band || y < band || x + band >= w || y + band >= h
}
