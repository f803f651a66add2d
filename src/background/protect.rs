//! Protection masks that keep sprite content out of the background flood.

use image::RgbaImage;

use super::detect::{in_border_band, BORDER_BAND};
use crate::color;
use crate::mask::Mask;

/// Alpha above which a dark pixel counts as visible.
const DARK_MIN_ALPHA: u8 = 10;

/// Connected dark runs at least this long survive as outlines even when the
/// opening erases them (one-pixel-wide lines).
pub const MIN_LINE_PIXELS: usize = 8;

/// Radius of the square neighbourhood inspected by the content-edge test.
pub const CONTENT_RADIUS: u32 = 3;

/// Neighbourhood RGB variance above which a border pixel is content.
const CONTENT_VARIANCE: f64 = 100.0;

/// Summed per-channel range above which a border pixel is content.
const CONTENT_RANGE: u32 = 50;

/// Dark outline pixels that the background flood must not remove.
///
/// Candidates are visible pixels (alpha > 10) whose RGB sum is below
/// `threshold`. An opening (erode then dilate, plus-shaped) marks the solid
/// dark structures; a 4-connected candidate component is kept when it touches
/// that opened core or spans at least [`MIN_LINE_PIXELS`] pixels. Isolated
/// dark specks are dropped while one-pixel outlines survive.
pub fn dark_line_mask(image: &RgbaImage, threshold: u32) -> Mask {
    let (w, h) = image.dimensions();
    let dark = Mask::from_fn(w, h, |x, y| {
        let p = image.get_pixel(x, y);
        color::rgb_sum(p) < threshold && p[3] > DARK_MIN_ALPHA
    });
    if dark.is_empty() {
        return dark;
    }

    let core = dark.open();
    dark.filter_components(|component| {
        component.len() >= MIN_LINE_PIXELS || component.iter().any(|&(x, y)| core.get(x, y))
    })
}

/// Border-band pixels that sit in a detailed (high-variance) neighbourhood.
///
/// Only pixels within 10 pixels of an edge are tested. The 7×7 window around
/// each one (clipped to the image) is flagged as content when the population
/// variance of its channel values (averaged over the three channels) exceeds
/// 100, or when the per-channel ranges summed exceed 50. Flat synthetic
/// backgrounds pass neither test.
///
/// A window made only of `background` pixels is never content, so a
/// textured background (a checkerboard, dithering) cannot protect itself.
pub fn content_edge_mask(image: &RgbaImage, background: &Mask) -> Mask {
    let (w, h) = image.dimensions();
    Mask::from_fn(w, h, |x, y| {
        in_border_band(x, y, w, h, BORDER_BAND)
            && window_has_foreground(background, w, h, x, y)
            && is_content_edge(image, x, y)
    })
}

fn window_bounds(w: u32, h: u32, x: u32, y: u32) -> (u32, u32, u32, u32) {
    (
        x.saturating_sub(CONTENT_RADIUS),
        y.saturating_sub(CONTENT_RADIUS),
        (x + CONTENT_RADIUS + 1).min(w),
        (y + CONTENT_RADIUS + 1).min(h),
    )
}

fn window_has_foreground(background: &Mask, w: u32, h: u32, x: u32, y: u32) -> bool {
    let (x0, y0, x1, y1) = window_bounds(w, h, x, y);
    (y0..y1).any(|ny| (x0..x1).any(|nx| !background.get(nx, ny)))
}

fn is_content_edge(image: &RgbaImage, x: u32, y: u32) -> bool {
    let (w, h) = image.dimensions();
    let (x0, y0, x1, y1) = window_bounds(w, h, x, y);

    let mut min = [u8::MAX; 3];
    let mut max = [u8::MIN; 3];
    let mut sum = [0.0f64; 3];
    let mut sum_sq = [0.0f64; 3];
    let mut n = 0usize;

    for ny in y0..y1 {
        for nx in x0..x1 {
            let p = image.get_pixel(nx, ny);
            for c in 0..3 {
                let v = p[c];
                min[c] = min[c].min(v);
                max[c] = max[c].max(v);
                sum[c] += v as f64;
                sum_sq[c] += (v as f64) * (v as f64);
            }
            n += 1;
        }
    }

    let range: u32 = (0..3).map(|c| (max[c] - min[c]) as u32).sum();
    if range > CONTENT_RANGE {
        return true;
    }

    // Mean of the per-channel variances, so a flat colored fill scores zero
    let n = n as f64;
    let variance = (0..3)
        .map(|c| {
            let mean = sum[c] / n;
            sum_sq[c] / n - mean * mean
        })
        .sum::<f64>()
        / 3.0;
    variance > CONTENT_VARIANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const BG: Rgba<u8> = Rgba([200, 180, 160, 255]);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    #[test]
    fn test_dark_line_mask_keeps_thin_outline() {
        let mut img = RgbaImage::from_pixel(32, 32, BG);
        for i in 8..24 {
            img.put_pixel(i, 8, BLACK);
            img.put_pixel(i, 23, BLACK);
            img.put_pixel(8, i, BLACK);
            img.put_pixel(23, i, BLACK);
        }
        let mask = dark_line_mask(&img, 50);
        assert_eq!(mask.count(), 60);
        assert!(mask.get(8, 8) && mask.get(15, 23));
    }

    #[test]
    fn test_dark_line_mask_drops_specks() {
        let mut img = RgbaImage::from_pixel(16, 16, BG);
        img.put_pixel(3, 3, BLACK);
        img.put_pixel(10, 10, BLACK);
        img.put_pixel(11, 10, BLACK);
        assert!(dark_line_mask(&img, 50).is_empty());
    }

    #[test]
    fn test_dark_line_mask_keeps_solid_blob() {
        let mut img = RgbaImage::from_pixel(16, 16, BG);
        for (x, y) in [(5, 4), (4, 5), (5, 5), (6, 5), (5, 6)] {
            img.put_pixel(x, y, BLACK);
        }
        // Too short for a line, but the plus survives the opening
        let mask = dark_line_mask(&img, 50);
        assert_eq!(mask.count(), 5);
    }

    #[test]
    fn test_dark_line_mask_ignores_invisible_pixels() {
        let img = RgbaImage::from_pixel(16, 16, Rgba([0, 0, 0, 5]));
        assert!(dark_line_mask(&img, 50).is_empty());
    }

    #[test]
    fn test_content_edge_mask_flat_background() {
        let img = RgbaImage::from_pixel(40, 40, BG);
        assert!(content_edge_mask(&img, &Mask::new(40, 40)).is_empty());
    }

    #[test]
    fn test_content_edge_mask_flags_detail_near_border() {
        let mut img = RgbaImage::from_pixel(40, 40, BG);
        img.put_pixel(2, 20, Rgba([20, 200, 40, 255]));
        // Detail deep in the interior is never tested
        img.put_pixel(20, 20, Rgba([20, 200, 40, 255]));

        let mask = content_edge_mask(&img, &Mask::new(40, 40));
        assert!(mask.get(2, 20));
        assert!(mask.get(5, 23));
        assert!(!mask.get(6, 20));
        assert!(!mask.get(20, 20));
    }

    #[test]
    fn test_content_edge_mask_ignores_background_texture() {
        // One-pixel checker along the border, a sprite pixel near the left edge
        let mut img = RgbaImage::from_fn(40, 40, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([204, 204, 204, 255])
            }
        });
        img.put_pixel(2, 20, Rgba([20, 200, 40, 255]));
        let background = Mask::from_fn(40, 40, |x, y| (x, y) != (2, 20));

        let mask = content_edge_mask(&img, &background);
        assert!(!mask.get(0, 0));
        assert!(!mask.get(35, 5));
        assert!(mask.get(2, 20));
        assert!(mask.get(5, 17));
        assert!(!mask.get(6, 20));
    }

    #[test]
    fn test_content_edge_variance_only() {
        // Range sum of exactly 50 does not trigger; the red variance does
        let img = RgbaImage::from_fn(20, 20, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([150, 100, 100, 255])
            } else {
                Rgba([100, 100, 100, 255])
            }
        });
        assert!(is_content_edge(&img, 0, 0));
    }

    #[test]
    fn test_content_edge_flat_color_not_content() {
        let img = RgbaImage::from_pixel(20, 20, Rgba([250, 20, 130, 255]));
        assert!(!is_content_edge(&img, 0, 0));
    }
}
