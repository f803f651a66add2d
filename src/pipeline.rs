//! Single-image orchestration.
//!
//! Stages run in a fixed order:
//!
//! 1. Background removal (the full remover for the fidelity strategy, the
//!    single-color remover for the uniformity strategy)
//! 2. Transparency trim (optional)
//! 3. Grid estimation
//! 4. Scale search
//! 5. Fractional fine-tune (optional, fidelity only, outputs of at least
//!    16×16)
//! 6. Canvas padding (optional)

use std::path::{Path, PathBuf};

use image::RgbaImage;
use serde::Serialize;

use crate::background::{remove_background, remove_background_simple, BackgroundOptions};
use crate::config::{DownscaleConfig, ScaleStrategy};
use crate::error::{DownscaleError, Result};
use crate::finetune::fine_tune;
use crate::grid::{estimate_grid, GridOptions};
use crate::output::save_png;
use crate::pad::pad_to_multiple;
use crate::search::{searcher_for, ScaleCandidate, SearchBounds};
use crate::trim::trim_transparency;

/// Smallest search result (both sides) that is worth fine-tuning.
pub const FINE_TUNE_MIN_SIDE: u32 = 16;

/// Metadata describing one processed image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownscaleResult {
    /// Input file name without directories
    pub filename: String,
    /// Input dimensions
    pub original_size: (u32, u32),
    /// Dimensions after background removal and trimming
    pub after_cleanup_size: (u32, u32),
    /// Output dimensions, padding included
    pub final_size: (u32, u32),
    /// Chosen scale factor (fractional after fine-tuning)
    pub scale_factor: f64,
    /// Estimated grid period, if one was found
    pub detected_grid: Option<f64>,
    /// Where the output was written
    pub output_path: Option<PathBuf>,
    /// Scale search strategy used
    pub strategy: ScaleStrategy,
    /// Block phase used by the uniformity strategy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<(u32, u32)>,
    /// Number of pixels the background remover cleared
    pub background_cleared: usize,
}

/// In-memory result of [`downscale_image`].
#[derive(Debug, Clone)]
pub struct Downscaled {
    /// The final image
    pub image: RgbaImage,
    pub original_size: (u32, u32),
    pub after_cleanup_size: (u32, u32),
    pub scale_factor: f64,
    pub detected_grid: Option<f64>,
    pub strategy: ScaleStrategy,
    pub phase: Option<(u32, u32)>,
    pub background_cleared: usize,
    /// Every scored integer factor
    pub candidates: Vec<ScaleCandidate>,
    /// Whether the fine-tuner replaced the search result
    pub fine_tuned: bool,
}

impl Downscaled {
    /// Build the result record for a file written to `output_path`.
    pub fn record(&self, input: &Path, output_path: Option<PathBuf>) -> DownscaleResult {
        DownscaleResult {
            filename: input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            original_size: self.original_size,
            after_cleanup_size: self.after_cleanup_size,
            final_size: self.image.dimensions(),
            scale_factor: self.scale_factor,
            detected_grid: self.detected_grid,
            output_path,
            strategy: self.strategy,
            phase: self.phase,
            background_cleared: self.background_cleared,
        }
    }
}

/// Background removal followed by the optional trim.
///
/// The remover matches the configured strategy. Returns the cleaned image
/// and the number of pixels the remover cleared.
pub fn clean_image(mut image: RgbaImage, config: &DownscaleConfig) -> (RgbaImage, usize) {
    let removal = match config.scale_strategy {
        ScaleStrategy::Fidelity => remove_background(&mut image, &BackgroundOptions::from(config)),
        ScaleStrategy::Uniformity => {
            remove_background_simple(&mut image, config.bg_removal_mode, config.bg_edge_tolerance)
        }
    };

    if config.auto_trim {
        image = trim_transparency(image);
    }
    (image, removal.cleared)
}

/// Run every stage on an in-memory image.
///
/// Never fails: degenerate inputs fall through the stages unchanged and
/// surface as a scale factor of 1.
pub fn downscale_image(image: RgbaImage, config: &DownscaleConfig) -> Downscaled {
    let original_size = image.dimensions();

    let (image, background_cleared) = clean_image(image, config);
    let after_cleanup_size = image.dimensions();

    let detected_grid = estimate_grid(&image, &GridOptions::from(config));
    log::debug!("Grid hint: {:?}", detected_grid);

    let searcher = searcher_for(config);
    let outcome = searcher.search(&image, SearchBounds::from(config), detected_grid);
    log::debug!(
        "{} search chose factor {} ({} candidates)",
        searcher.name(),
        outcome.factor,
        outcome.candidates.len()
    );

    let mut result = outcome.image;
    let mut scale_factor = outcome.factor as f64;
    let mut fine_tuned = false;

    let (rw, rh) = result.dimensions();
    if config.enable_fine_tune
        && config.scale_strategy == ScaleStrategy::Fidelity
        && outcome.factor > 1
        && rw >= FINE_TUNE_MIN_SIDE
        && rh >= FINE_TUNE_MIN_SIDE
    {
        if let Some(tuned) = fine_tune(&image, outcome.factor, detected_grid) {
            result = tuned.image;
            scale_factor = tuned.factor;
            fine_tuned = true;
        }
    }

    if config.pad_canvas {
        result = pad_to_multiple(result, config.canvas_multiple);
    }

    Downscaled {
        image: result,
        original_size,
        after_cleanup_size,
        scale_factor,
        detected_grid,
        strategy: config.scale_strategy,
        phase: outcome.phase,
        background_cleared,
        candidates: outcome.candidates,
        fine_tuned,
    }
}

/// Load an image file as RGBA.
pub fn load_image(path: &Path) -> Result<RgbaImage> {
    let image = image::open(path)
        .map_err(|source| DownscaleError::Decode { path: path.to_path_buf(), source })?;
    Ok(image.to_rgba8())
}

/// Process one file: load, downscale and save as PNG at `output`.
pub fn process_file(input: &Path, output: &Path, config: &DownscaleConfig) -> Result<DownscaleResult> {
    let errors = config.validate();
    if !errors.is_empty() {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        return Err(DownscaleError::InvalidConfig(messages.join(", ")));
    }

    let image = load_image(input)?;
    let downscaled = downscale_image(image, config);
    save_png(&downscaled.image, output)?;

    let record = downscaled.record(input, Some(output.to_path_buf()));
    log::info!(
        "{}: {}x{} -> {}x{} (factor {:.2})",
        record.filename,
        record.original_size.0,
        record.original_size.1,
        record.final_size.0,
        record.final_size.1,
        record.scale_factor
    );
    Ok(record)
}
