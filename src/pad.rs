//! Canvas padding to a rounding multiple.

use image::{Rgba, RgbaImage};

/// Smallest multiple of `multiple` that is no less than `value`.
fn round_up(value: u32, multiple: u32) -> u32 {
    value.div_ceil(multiple) * multiple
}

/// Grow the canvas so both sides are multiples of `multiple`, centering the art.
///
/// The new area is fully transparent. When the extra space is odd, the spare
/// pixel goes to the right/bottom. Images already aligned (and a multiple of
/// 0 or 1) are returned unchanged.
///
/// # Example
///
/// A 68×78 sprite padded to a multiple of 16 becomes 80×80 with the art at
/// offset (6, 1).
pub fn pad_to_multiple(image: RgbaImage, multiple: u32) -> RgbaImage {
    if multiple <= 1 {
        return image;
    }

    let (width, height) = image.dimensions();
    let target_w = round_up(width, multiple);
    let target_h = round_up(height, multiple);

    if (target_w, target_h) == (width, height) {
        return image;
    }

    let mut canvas = RgbaImage::from_pixel(target_w, target_h, Rgba([0, 0, 0, 0]));
    let offset_x = (target_w - width) / 2;
    let offset_y = (target_h - height) / 2;
    image::imageops::replace(&mut canvas, &image, offset_x as i64, offset_y as i64);

    canvas
}
