//! Color-space and color-metric primitives shared by every stage.
//!
//! All functions operate on plain RGB triples or `image::Rgba<u8>`
//! pixels so callers never have to convert between representations.

use image::Rgba;

/// An RGB triple without alpha.
pub type Rgb = [u8; 3];

/// An RGB triple whose channels may exceed 255 (quantization centres).
pub type WideRgb = [u16; 3];

/// Standard luma weights (ITU-R BT.601).
pub const LUMA_WEIGHTS: [f64; 3] = [0.299, 0.587, 0.114];

/// Extract the RGB channels of a pixel.
#[inline]
pub fn rgb_of(pixel: &Rgba<u8>) -> Rgb {
    [pixel[0], pixel[1], pixel[2]]
}

/// Luminance of a pixel in the 0-255 range.
#[inline]
pub fn luma(pixel: &Rgba<u8>) -> f64 {
    pixel[0] as f64 * LUMA_WEIGHTS[0]
        + pixel[1] as f64 * LUMA_WEIGHTS[1]
        + pixel[2] as f64 * LUMA_WEIGHTS[2]
}

/// Sum of the three color channels (0-765).
#[inline]
pub fn rgb_sum(pixel: &Rgba<u8>) -> u32 {
    pixel[0] as u32 + pixel[1] as u32 + pixel[2] as u32
}

/// Unweighted channel mean, used as a cheap grey level for edge counting.
#[inline]
pub fn channel_mean(pixel: &Rgba<u8>) -> f64 {
    rgb_sum(pixel) as f64 / 3.0
}

/// Manhattan (L1) distance between two RGB colors.
#[inline]
pub fn manhattan(a: Rgb, b: Rgb) -> u32 {
    a.iter().zip(b.iter()).map(|(&x, &y)| (x as i32 - y as i32).unsigned_abs()).sum()
}

/// Manhattan distance from a pixel color to a (possibly wide) centre.
#[inline]
pub fn manhattan_wide(a: Rgb, b: WideRgb) -> u32 {
    a.iter().zip(b.iter()).map(|(&x, &y)| (x as i32 - y as i32).unsigned_abs()).sum()
}

/// Widen an RGB triple.
#[inline]
pub fn widen(color: Rgb) -> WideRgb {
    color.map(u16::from)
}

/// Quantize each channel to the nearest multiple of `step`.
///
/// Halfway values round to the even multiple, so 8 maps to 0 and 24 maps
/// to 32 for a step of 16. Channels near white round up to 256.
pub fn quantize(color: Rgb, step: u8) -> WideRgb {
    if step <= 1 {
        return widen(color);
    }
    let step = step as f64;
    color.map(|c| ((c as f64 / step).round_ties_even() * step) as u16)
}

/// Whether the pixel is fully transparent.
#[inline]
pub fn is_transparent(pixel: &Rgba<u8>) -> bool {
    pixel[3] == 0
}

/// Whether the pixel is partially transparent (neither invisible nor opaque).
#[inline]
pub fn is_semi_transparent(pixel: &Rgba<u8>) -> bool {
    pixel[3] > 0 && pixel[3] < 255
}
