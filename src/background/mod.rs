//! Background removal (matting).
//!
//! Generated pixel art usually arrives on an opaque synthetic background:
//! a flat fill, a noisy near-flat fill, or a two-color transparency
//! checkerboard. This module finds those colors, protects outline and
//! content pixels, and floods inward from the image border, clearing the
//! alpha of every reached pixel. RGB values are left untouched.
//!
//! Two removers are provided:
//!
//! - [`remove_background`]: the full remover with checkerboard detection,
//!   multi-color edge clustering, dark-line and content-edge protection.
//! - [`remove_background_simple`]: a single dominant edge color flooded
//!   without barriers, used alongside the block-uniformity scale search.

pub mod detect;
pub mod protect;

use image::RgbaImage;

use crate::config::{BgRemovalMode, DownscaleConfig};
use crate::mask::Mask;

pub use detect::{
    background_mask, cluster_background_colors, detect_checkerboard, sample_edge_colors,
    BackgroundColors, ColorSource,
};
pub use protect::{content_edge_mask, dark_line_mask};

/// Number of edge colors kept by the full remover.
pub const MAX_BACKGROUND_COLORS: usize = 3;

/// Flood iteration ceilings.
const CONSERVATIVE_MAX_ITERATIONS: u32 = 500;
const AGGRESSIVE_MAX_ITERATIONS: u32 = 1000;

/// Settings for background removal.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundOptions {
    /// Removal aggressiveness
    pub mode: BgRemovalMode,
    /// Interior Manhattan tolerance
    pub tolerance: u32,
    /// Tolerance inside the border band
    pub edge_tolerance: u32,
    /// Protect dark outlines
    pub preserve_dark_lines: bool,
    /// RGB sum cutoff for dark pixels
    pub dark_line_threshold: u32,
}

impl Default for BackgroundOptions {
    fn default() -> Self {
        Self::from(&DownscaleConfig::default())
    }
}

impl From<&DownscaleConfig> for BackgroundOptions {
    fn from(config: &DownscaleConfig) -> Self {
        Self {
            mode: config.bg_removal_mode,
            tolerance: config.bg_tolerance,
            edge_tolerance: config.bg_edge_tolerance,
            preserve_dark_lines: config.preserve_dark_lines,
            dark_line_threshold: config.dark_line_threshold,
        }
    }
}

/// What a removal pass found and did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemovalReport {
    /// Detected background colors (`None` when removal was disabled)
    pub colors: Option<BackgroundColors>,
    /// Number of pixels whose alpha was cleared
    pub cleared: usize,
}

/// Remove the background in place.
///
/// Steps:
/// 1. Background colors come from [`detect_checkerboard`], falling back to
///    the three most frequent quantized colors of the 5-pixel edge bands.
/// 2. [`background_mask`] marks pixels close to any of them.
/// 3. Dark outlines (if enabled) and, in conservative mode, detailed
///    border pixels are subtracted from that mask. Border windows made only
///    of background matches never count as detail.
/// 4. The flood is seeded with the border ring of the protected mask and
///    grows through the mask dilated once (conservative) or twice
///    (aggressive). Conservative floods additionally never enter a
///    protected pixel.
/// 5. Every flooded pixel gets alpha 0.
pub fn remove_background(image: &mut RgbaImage, options: &BackgroundOptions) -> RemovalReport {
    if options.mode == BgRemovalMode::None {
        return RemovalReport::default();
    }
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return RemovalReport::default();
    }
    let conservative = options.mode == BgRemovalMode::Conservative;

    let dark_lines = if options.preserve_dark_lines {
        dark_line_mask(image, options.dark_line_threshold)
    } else {
        Mask::new(w, h)
    };

    let colors = match detect_checkerboard(image) {
        Some(found) => found,
        None => cluster_background_colors(
            &sample_edge_colors(image, detect::EDGE_SAMPLE_WIDTH),
            MAX_BACKGROUND_COLORS,
        ),
    };

    let matches = background_mask(image, &colors, options.tolerance, options.edge_tolerance);
    let content_edges = if conservative {
        content_edge_mask(image, &matches)
    } else {
        Mask::new(w, h)
    };
    log::debug!(
        "Background colors ({:?}): {:?}; {} dark-line and {} content-edge pixels protected",
        colors.source,
        colors.colors,
        dark_lines.count(),
        content_edges.count()
    );

    let candidates = matches.difference(&dark_lines).difference(&content_edges);

    let seed = candidates.border_ring();
    let flooded = if conservative {
        let barrier = &dark_lines | &content_edges;
        Mask::propagate(&seed, &candidates.dilate(1), Some(&barrier), CONSERVATIVE_MAX_ITERATIONS)
    } else {
        Mask::propagate(&seed, &candidates.dilate(2), None, AGGRESSIVE_MAX_ITERATIONS)
    };

    let cleared = clear_alpha(image, &flooded);
    log::debug!("Background removal cleared {} of {} pixels", cleared, w as usize * h as usize);

    RemovalReport { colors: Some(colors), cleared }
}

/// Remove a single dominant background color in place.
///
/// The most frequent quantized color of the 5-pixel edge bands is the only
/// background color. Pixels within `tolerance` of it form the candidate
/// mask, which is dilated once; the flood starts from the candidate border
/// ring and has no barriers. Disabled by [`BgRemovalMode::None`] like the
/// full remover.
pub fn remove_background_simple(
    image: &mut RgbaImage,
    mode: BgRemovalMode,
    tolerance: u32,
) -> RemovalReport {
    if mode == BgRemovalMode::None {
        return RemovalReport::default();
    }
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return RemovalReport::default();
    }

    let colors = cluster_background_colors(&sample_edge_colors(image, detect::EDGE_SAMPLE_WIDTH), 1);
    log::debug!("Dominant background color: {:?}", colors.colors);

    let candidates = background_mask(image, &colors, tolerance, tolerance);
    let flooded = Mask::propagate(&candidates.border_ring(), &candidates.dilate(1), None, w.max(h));

    let cleared = clear_alpha(image, &flooded);
    log::debug!("Simple background removal cleared {} pixels", cleared);

    RemovalReport { colors: Some(colors), cleared }
}

/// Set alpha to zero under `mask`, returning how many visible pixels changed.
fn clear_alpha(image: &mut RgbaImage, mask: &Mask) -> usize {
    let mut cleared = 0;
    for (x, y) in mask.iter_set() {
        let pixel = image.get_pixel_mut(x, y);
        if pixel[3] != 0 {
            cleared += 1;
        }
        pixel[3] = 0;
    }
    cleared
}
