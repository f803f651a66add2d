//! Batch processing of many images.
//!
//! Each image runs the full pipeline independently; [`ParallelBatch`]
//! spreads jobs over a worker pool and collects one [`ImageOutcome`] per
//! input without letting a single failure abort the rest.

mod parallel;
mod result;

pub use parallel::ParallelBatch;
pub use result::{BatchResult, ImageOutcome, ImageStatus};

use std::path::{Path, PathBuf};

use crate::config::DownscaleConfig;
use crate::output::generate_output_path;

/// One input image and where its result goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchJob {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// Pair each input with its output path.
///
/// Output names follow [`generate_output_path`] with the configured prefix
/// and suffix.
pub fn plan_jobs(inputs: &[PathBuf], output_dir: Option<&Path>, config: &DownscaleConfig) -> Vec<BatchJob> {
    inputs
        .iter()
        .map(|input| BatchJob {
            input: input.clone(),
            output: generate_output_path(
                input,
                output_dir,
                &config.filename_prefix,
                &config.filename_suffix,
            ),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_jobs_applies_naming() {
        let config = DownscaleConfig {
            filename_prefix: "px_".to_string(),
            filename_suffix: "_1x".to_string(),
            ..Default::default()
        };
        let inputs = vec![PathBuf::from("art/a.jpg"), PathBuf::from("b.png")];
        let jobs = plan_jobs(&inputs, Some(Path::new("out")), &config);

        assert_eq!(jobs[0].output, PathBuf::from("out/px_a_1x.png"));
        assert_eq!(jobs[1].output, PathBuf::from("out/px_b_1x.png"));
        assert_eq!(jobs[1].input, PathBuf::from("b.png"));
    }

    #[test]
    fn test_plan_jobs_next_to_inputs() {
        let config = DownscaleConfig::default();
        let jobs = plan_jobs(&[PathBuf::from("art/a.png")], None, &config);
        // Without a directory or renaming, a PNG input keeps its source intact
        assert_eq!(jobs[0].output, PathBuf::from("art/a_downscaled.png"));
    }
}
