//! Process command implementation

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use super::{EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};
use crate::batch::{plan_jobs, ImageStatus, ParallelBatch};
use crate::config::DownscaleConfig;
use crate::output::expand_inputs;

/// Run the process command
pub fn run_process(
    inputs: &[PathBuf],
    output: Option<&Path>,
    recursive: bool,
    jobs: Option<usize>,
    json: bool,
    config: &DownscaleConfig,
) -> ExitCode {
    let files = match expand_inputs(inputs, recursive) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };
    if files.is_empty() {
        eprintln!("Error: no supported images found");
        return ExitCode::from(EXIT_INVALID_ARGS);
    }

    let plan = plan_jobs(&files, output, config);
    let mut batch = ParallelBatch::new(config).with_progress(move |outcome| {
        if json {
            return;
        }
        match &outcome.status {
            ImageStatus::Success { result } => println!(
                "{} -> {} ({}x{} -> {}x{}, factor {:.2}, grid {})",
                outcome.input.display(),
                result.output_path.as_deref().map(|p| p.display().to_string()).unwrap_or_default(),
                result.original_size.0,
                result.original_size.1,
                result.final_size.0,
                result.final_size.1,
                result.scale_factor,
                result.detected_grid.map(|g| format!("{:.1}", g)).unwrap_or_else(|| "none".to_string()),
            ),
            ImageStatus::Failed { error } => eprintln!("Error: {}", error),
        }
    });
    if let Some(jobs) = jobs {
        batch = batch.with_jobs(jobs);
    }

    let result = batch.run(&plan);

    if json {
        match serde_json::to_string_pretty(&result) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: failed to serialize results: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        }
    } else if plan.len() > 1 || !result.is_success() {
        println!("{}", result.summary());
    }

    if result.is_success() {
        ExitCode::from(EXIT_SUCCESS)
    } else {
        ExitCode::from(EXIT_ERROR)
    }
}
