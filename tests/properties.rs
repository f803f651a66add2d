//! Property tests for the individual stages on synthetic images.

mod common;

use common::{opaque_count, XorShift};
use image::{Rgba, RgbaImage};
use pixeldown::background::{detect_checkerboard, remove_background, BackgroundOptions, ColorSource};
use pixeldown::config::BgRemovalMode;
use pixeldown::grid::{estimate_grid, GridOptions};
use pixeldown::pad::pad_to_multiple;
use pixeldown::resample::{downscale_by, upscale_to};
use pixeldown::trim::trim_transparency;

fn noise(w: u32, h: u32, seed: u64) -> RgbaImage {
    let mut rng = XorShift(seed);
    RgbaImage::from_fn(w, h, |_, _| {
        let v = rng.next();
        Rgba([v as u8, (v >> 8) as u8, (v >> 16) as u8, 255])
    })
}

fn sparse_alpha(w: u32, h: u32, seed: u64) -> RgbaImage {
    let mut rng = XorShift(seed);
    RgbaImage::from_fn(w, h, |x, y| {
        let inside = x > w / 4 && x < 3 * w / 4 && y > h / 5 && y < 4 * h / 5;
        let alpha = if inside && rng.next() % 3 != 0 { 255 } else { 0 };
        Rgba([(x * 9) as u8, (y * 5) as u8, 77, alpha])
    })
}

#[test]
fn test_trim_is_idempotent() {
    for seed in [3, 17, 99] {
        let once = trim_transparency(sparse_alpha(40, 33, seed));
        let twice = trim_transparency(once.clone());
        assert_eq!(once, twice, "seed {}", seed);
    }
}

#[test]
fn test_padding_round_trip_and_centering() {
    for (w, h) in [(1, 1), (10, 12), (16, 16), (17, 31), (68, 78)] {
        for multiple in [2, 8, 16] {
            let img = RgbaImage::from_pixel(w, h, Rgba([9, 8, 7, 255]));
            let padded = pad_to_multiple(img, multiple);
            let (pw, ph) = padded.dimensions();
            assert_eq!(pw % multiple, 0);
            assert_eq!(ph % multiple, 0);
            assert_eq!(pad_to_multiple(padded.clone(), multiple), padded);

            // Left and right (top and bottom) margins differ by at most one
            let bounds = pixeldown::trim::content_bounds(&padded).unwrap();
            let left = bounds[0];
            let right = pw - bounds[0] - bounds[2];
            let top = bounds[1];
            let bottom = ph - bounds[1] - bounds[3];
            assert!(right >= left && right - left <= 1, "{}x{} / {}", w, h, multiple);
            assert!(bottom >= top && bottom - top <= 1, "{}x{} / {}", w, h, multiple);
        }
    }
}

#[test]
fn test_downsize_upsize_restores_dimensions() {
    let img = noise(97, 61, 5);
    for factor in [1.0, 2.0, 3.5, 6.0, 7.25, 10.0, 20.0] {
        let down = downscale_by(&img, factor);
        let up = upscale_to(&down, img.width(), img.height());
        assert_eq!(up.dimensions(), img.dimensions(), "factor {}", factor);
    }
}

#[test]
fn test_background_removal_never_adds_opacity() {
    let inputs = [noise(48, 48, 1), sparse_alpha(60, 40, 2), RgbaImage::from_pixel(30, 30, Rgba([1, 2, 3, 255]))];
    for img in inputs {
        for mode in [BgRemovalMode::Conservative, BgRemovalMode::Aggressive, BgRemovalMode::None] {
            let before = opaque_count(&img);
            let mut copy = img.clone();
            remove_background(&mut copy, &BackgroundOptions { mode, ..Default::default() });
            assert!(opaque_count(&copy) <= before, "{:?}", mode);
        }
    }
}

#[test]
fn test_dark_line_border_is_preserved() {
    let bg = Rgba([120, 170, 210, 255]);
    let mut img = RgbaImage::from_pixel(64, 64, bg);
    for i in 16..48 {
        img.put_pixel(i, 16, Rgba([0, 0, 0, 255]));
        img.put_pixel(i, 47, Rgba([0, 0, 0, 255]));
        img.put_pixel(16, i, Rgba([0, 0, 0, 255]));
        img.put_pixel(47, i, Rgba([0, 0, 0, 255]));
    }

    remove_background(&mut img, &BackgroundOptions::default());

    for i in 16..48 {
        for (x, y) in [(i, 16), (i, 47), (16, i), (47, i)] {
            assert_eq!(img.get_pixel(x, y)[3], 255, "outline pixel ({}, {})", x, y);
        }
    }
    assert_eq!(img.get_pixel(0, 0)[3], 0);
    assert_eq!(img.get_pixel(8, 40)[3], 0);
    assert_eq!(img.get_pixel(60, 60)[3], 0);
}

#[test]
fn test_checkerboard_classified_despite_dominant_color() {
    let light = Rgba([255, 255, 255, 255]);
    let dark = Rgba([204, 204, 204, 255]);
    let red = Rgba([200, 30, 30, 255]);
    let img = RgbaImage::from_fn(100, 100, |x, y| {
        if x < 50 && y < 50 {
            if (x / 8 + y / 8) % 2 == 0 {
                light
            } else {
                dark
            }
        } else {
            red
        }
    });

    let found = detect_checkerboard(&img).expect("checkerboard");
    assert_eq!(found.source, ColorSource::Checkerboard);
    let colors: Vec<_> = found.rgb().collect();
    assert_eq!(colors, vec![[204, 204, 204], [255, 255, 255]]);
}

#[test]
fn test_grid_estimator_rejects_noise() {
    for seed in [11, 222, 3333, 44444] {
        let img = noise(160, 160, seed);
        assert_eq!(estimate_grid(&img, &GridOptions::default()), None, "seed {}", seed);
    }
}
