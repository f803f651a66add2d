//! Command-line interface implementation
//!
//! This module is organized into submodules by command category:
//! - `process`: downscale images and write PNGs
//! - `analyze`: report grid and per-factor scores without writing output

mod analyze;
mod process;

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::{load_config, merge_cli_overrides, BgRemovalMode, CliOverrides, DownscaleConfig, ScaleStrategy};

/// Exit codes per CLI spec
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Pixeldown - recover the true resolution of upscaled pixel art
#[derive(Parser)]
#[command(name = "pxdown")]
#[command(about = "Pixeldown - recover the true resolution of AI-upscaled pixel art")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (default: nearest pxdown.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Downscale images to their native pixel resolution
    Process {
        /// Input images, directories or glob patterns
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory (default: next to each input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Search directories recursively
        #[arg(short, long)]
        recursive: bool,

        /// Number of images processed in parallel (default: available cores)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Print result records as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        settings: SettingsArgs,
    },

    /// Show the grid hint and both strategies' scores for one image
    Analyze {
        /// Input image
        input: PathBuf,

        /// Print the analysis as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        settings: SettingsArgs,
    },
}

/// Flags that override configuration values.
#[derive(Args, Debug, Default, Clone)]
pub struct SettingsArgs {
    /// Background removal mode (conservative, aggressive, none)
    #[arg(long)]
    pub mode: Option<BgRemovalMode>,

    /// Scale search strategy (fidelity, uniformity)
    #[arg(long)]
    pub strategy: Option<ScaleStrategy>,

    /// Smallest scale factor to try
    #[arg(long)]
    pub min_factor: Option<u32>,

    /// Largest scale factor to try
    #[arg(long)]
    pub max_factor: Option<u32>,

    /// Keep the transparent margin after background removal
    #[arg(long)]
    pub no_trim: bool,

    /// Skip fractional fine-tuning
    #[arg(long)]
    pub no_fine_tune: bool,

    /// Pad the canvas to this multiple (0 disables padding)
    #[arg(long)]
    pub canvas_multiple: Option<u32>,

    /// Prefix for output file names
    #[arg(long)]
    pub prefix: Option<String>,

    /// Suffix for output file names
    #[arg(long)]
    pub suffix: Option<String>,
}

impl From<&SettingsArgs> for CliOverrides {
    fn from(args: &SettingsArgs) -> Self {
        CliOverrides {
            bg_removal_mode: args.mode,
            scale_strategy: args.strategy,
            min_factor: args.min_factor,
            max_factor: args.max_factor,
            no_trim: args.no_trim,
            no_fine_tune: args.no_fine_tune,
            canvas_multiple: args.canvas_multiple,
            filename_prefix: args.prefix.clone(),
            filename_suffix: args.suffix.clone(),
        }
    }
}

/// Load the config file (explicit or discovered) and apply CLI overrides.
///
/// Prints the error and returns the exit code on failure.
pub(crate) fn resolve_config(path: Option<&Path>, settings: &SettingsArgs) -> Result<DownscaleConfig, ExitCode> {
    let mut config = match load_config(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return Err(ExitCode::from(EXIT_ERROR));
        }
    };

    merge_cli_overrides(&mut config, &CliOverrides::from(settings));

    let errors = config.validate();
    if !errors.is_empty() {
        eprintln!("Error: invalid settings:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(ExitCode::from(EXIT_INVALID_ARGS));
    }
    Ok(config)
}

/// Entry point for the CLI
pub fn run(cli: Cli) -> ExitCode {
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Process { inputs, output, recursive, jobs, json, settings } => {
            let config = match resolve_config(config_path, &settings) {
                Ok(config) => config,
                Err(code) => return code,
            };
            process::run_process(&inputs, output.as_deref(), recursive, jobs, json, &config)
        }
        Commands::Analyze { input, json, settings } => {
            let config = match resolve_config(config_path, &settings) {
                Ok(config) => config,
                Err(code) => return code,
            };
            analyze::run_analyze(&input, json, &config)
        }
    }
}
