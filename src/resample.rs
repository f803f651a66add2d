//! Nearest-neighbor resampling primitives.
//!
//! Every resize in the pipeline picks exactly one source pixel per
//! destination pixel so hard pixel-art edges are never blended.

use image::imageops::{self, FilterType};
use image::RgbaImage;

/// Resize with nearest-neighbor sampling.
///
/// Each destination pixel centre `(d + 0.5)` is projected into source space
/// and floored, so integer upscales replicate every pixel `factor` times and
/// integer downscales sample block centres. Zero sizes produce an empty image.
pub fn resize_nearest(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if width == 0 || height == 0 || image.width() == 0 || image.height() == 0 {
        return RgbaImage::new(width, height);
    }
    imageops::resize(image, width, height, FilterType::Nearest)
}

/// Target size when dividing an image by a (possibly fractional) factor.
///
/// Each side is `side / factor` rounded to the nearest integer, halves to even.
pub fn scaled_size(width: u32, height: u32, factor: f64) -> (u32, u32) {
    let w = (width as f64 / factor).round_ties_even().max(0.0) as u32;
    let h = (height as f64 / factor).round_ties_even().max(0.0) as u32;
    (w, h)
}

/// Downscale by a (possibly fractional) factor with nearest-neighbor sampling.
pub fn downscale_by(image: &RgbaImage, factor: f64) -> RgbaImage {
    let (w, h) = scaled_size(image.width(), image.height(), factor);
    resize_nearest(image, w, h)
}

/// Upscale an image back to an exact size with nearest-neighbor sampling.
pub fn upscale_to(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    resize_nearest(image, width, height)
}

/// Downsample by sampling the centre pixel of each `scale`×`scale` block.
///
/// Blocks start at `(phase_x, phase_y)`; partial blocks at the trailing edges
/// are dropped. Returns a copy of the input when no whole block fits.
pub fn downsample_with_phase(image: &RgbaImage, scale: u32, phase_x: u32, phase_y: u32) -> RgbaImage {
    let (width, height) = image.dimensions();
    if scale == 0 {
        return image.clone();
    }

    let out_w = width.saturating_sub(phase_x) / scale;
    let out_h = height.saturating_sub(phase_y) / scale;
    if out_w == 0 || out_h == 0 {
        return image.clone();
    }

    let center = scale / 2;
    RgbaImage::from_fn(out_w, out_h, |x, y| {
        let src_x = phase_x + x * scale + center;
        let src_y = phase_y + y * scale + center;
        *image.get_pixel(src_x, src_y)
    })
}
