//! Content trimming: crop an image to the bounding box of its visible pixels.

use image::RgbaImage;

/// Bounding box of visible content as `[x, y, width, height]`.
///
/// Returns `None` when every pixel is fully transparent.
pub fn content_bounds(image: &RgbaImage) -> Option<[u32; 4]> {
    let (width, height) = image.dimensions();
    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0;
    let mut max_y = 0;
    let mut found = false;

    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel[3] > 0 {
            found = true;
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
    }

    if !found || width == 0 || height == 0 {
        return None;
    }

    Some([min_x, min_y, max_x - min_x + 1, max_y - min_y + 1])
}

/// Crop to the minimal rectangle containing every pixel with alpha > 0.
///
/// A fully transparent image is returned unchanged.
pub fn trim_transparency(image: RgbaImage) -> RgbaImage {
    match content_bounds(&image) {
        Some([x, y, w, h]) if (w, h) != image.dimensions() => {
            image::imageops::crop_imm(&image, x, y, w, h).to_image()
        }
        _ => image,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn with_block(w: u32, h: u32, x0: u32, y0: u32, bw: u32, bh: u32) -> RgbaImage {
        let mut img = RgbaImage::from_pixel(w, h, Rgba([9, 9, 9, 0]));
        for y in y0..y0 + bh {
            for x in x0..x0 + bw {
                img.put_pixel(x, y, Rgba([200, 10, 10, 255]));
            }
        }
        img
    }

    #[test]
    fn test_content_bounds() {
        let img = with_block(20, 10, 3, 2, 5, 4);
        assert_eq!(content_bounds(&img), Some([3, 2, 5, 4]));
    }

    #[test]
    fn test_trim_crops_to_content() {
        let img = with_block(20, 10, 3, 2, 5, 4);
        let trimmed = trim_transparency(img);
        assert_eq!(trimmed.dimensions(), (5, 4));
        assert!(trimmed.pixels().all(|p| p[3] == 255));
    }

    #[test]
    fn test_trim_keeps_semi_transparent_pixels() {
        let mut img = RgbaImage::from_pixel(6, 6, Rgba([0, 0, 0, 0]));
        img.put_pixel(1, 4, Rgba([0, 0, 0, 1]));
        img.put_pixel(3, 2, Rgba([0, 0, 0, 255]));
        assert_eq!(trim_transparency(img).dimensions(), (3, 3));
    }

    #[test]
    fn test_trim_fully_transparent_unchanged() {
        let img = RgbaImage::from_pixel(7, 5, Rgba([1, 2, 3, 0]));
        let trimmed = trim_transparency(img.clone());
        assert_eq!(trimmed, img);
    }

    #[test]
    fn test_trim_idempotent() {
        let img = with_block(16, 16, 4, 7, 3, 6);
        let once = trim_transparency(img);
        let twice = trim_transparency(once.clone());
        assert_eq!(once, twice);
    }
}
