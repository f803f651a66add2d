//! Shared fixtures for integration tests.
#![allow(dead_code)]

use image::{Rgba, RgbaImage};
use pixeldown::resample::resize_nearest;

pub const BACKGROUND: Rgba<u8> = Rgba([240, 240, 240, 255]);
pub const OUTLINE: Rgba<u8> = Rgba([0, 0, 0, 255]);

const PALETTE: [Rgba<u8>; 5] = [
    Rgba([200, 40, 40, 255]),
    Rgba([40, 160, 60, 255]),
    Rgba([50, 80, 200, 255]),
    Rgba([230, 200, 60, 255]),
    Rgba([140, 60, 160, 255]),
];

/// Deterministic xorshift generator.
pub struct XorShift(pub u64);

impl XorShift {
    pub fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }
}

/// Inclusive content box of [`true_sprite`]: columns 3..=12, rows 2..=13.
pub const CONTENT: (u32, u32, u32, u32) = (3, 2, 12, 13);

/// A 16×16 sprite: a black-outlined 10×12 body filled with random palette
/// colors, fully transparent elsewhere.
pub fn true_sprite(seed: u64) -> RgbaImage {
    let mut rng = XorShift(seed);
    let (x0, y0, x1, y1) = CONTENT;
    RgbaImage::from_fn(16, 16, |x, y| {
        if x < x0 || x > x1 || y < y0 || y > y1 {
            Rgba([0, 0, 0, 0])
        } else if x == x0 || x == x1 || y == y0 || y == y1 {
            OUTLINE
        } else {
            PALETTE[(rng.next() % PALETTE.len() as u64) as usize]
        }
    })
}

/// Upscale `sprite` by `factor` and composite it over an opaque background.
pub fn upscale_on_background(sprite: &RgbaImage, factor: u32, background: Rgba<u8>) -> RgbaImage {
    let big = resize_nearest(sprite, sprite.width() * factor, sprite.height() * factor);
    RgbaImage::from_fn(big.width(), big.height(), |x, y| {
        let p = *big.get_pixel(x, y);
        if p[3] == 0 {
            background
        } else {
            p
        }
    })
}

/// The content box of [`true_sprite`] cropped out at 1×.
pub fn sprite_content(sprite: &RgbaImage) -> RgbaImage {
    let (x0, y0, x1, y1) = CONTENT;
    image::imageops::crop_imm(sprite, x0, y0, x1 - x0 + 1, y1 - y0 + 1).to_image()
}

pub fn opaque_count(image: &RgbaImage) -> usize {
    image.pixels().filter(|p| p[3] > 0).count()
}
