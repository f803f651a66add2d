//! Pixeldown - command-line tool for downscaling AI-upscaled pixel art

use std::process::ExitCode;

use clap::Parser;
use pixeldown::cli::{self, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    cli::run(cli)
}
