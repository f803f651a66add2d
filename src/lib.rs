//! Pixeldown - recover the true resolution of AI-upscaled pixel art
//!
//! Image generators render "pixel art" at a high resolution where every
//! intended pixel is a roughly uniform block of many real pixels, usually on
//! a synthetic background. This library:
//! - Removes flat, noisy or checkerboard backgrounds while keeping outlines
//! - Trims transparent margins
//! - Estimates the block grid period from edge-energy spectra
//! - Searches integer scale factors by reconstruction fidelity or block
//!   uniformity, optionally refining to a fractional factor
//! - Pads the result to a canvas multiple
//! - Processes batches in parallel with per-image error isolation

pub mod background;
pub mod batch;
pub mod cli;
pub mod color;
pub mod config;
pub mod error;
pub mod finetune;
pub mod grid;
pub mod mask;
pub mod output;
pub mod pad;
pub mod pipeline;
pub mod resample;
pub mod search;
pub mod trim;

pub use config::{BgRemovalMode, DownscaleConfig, ScaleStrategy};
pub use error::{DownscaleError, Result};
pub use pipeline::{downscale_image, process_file, DownscaleResult, Downscaled};
