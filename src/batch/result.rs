//! Batch result types.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::pipeline::DownscaleResult;

/// Outcome status of one image.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ImageStatus {
    /// Written successfully
    Success { result: DownscaleResult },
    /// Failed with a message naming the cause
    Failed { error: String },
}

impl ImageStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ImageStatus::Success { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ImageStatus::Failed { .. })
    }
}

impl std::fmt::Display for ImageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageStatus::Success { .. } => write!(f, "success"),
            ImageStatus::Failed { error } => write!(f, "failed: {}", error),
        }
    }
}

/// Result of processing a single input image.
#[derive(Debug, Clone, Serialize)]
pub struct ImageOutcome {
    /// Input file
    pub input: PathBuf,
    #[serde(flatten)]
    pub status: ImageStatus,
    /// Wall-clock processing time
    #[serde(skip)]
    pub duration: Duration,
}

impl ImageOutcome {
    pub fn success(input: PathBuf, result: DownscaleResult, duration: Duration) -> Self {
        Self { input, status: ImageStatus::Success { result }, duration }
    }

    pub fn failed(input: PathBuf, error: String, duration: Duration) -> Self {
        Self { input, status: ImageStatus::Failed { error }, duration }
    }

    /// The result record, when processing succeeded.
    pub fn result(&self) -> Option<&DownscaleResult> {
        match &self.status {
            ImageStatus::Success { result } => Some(result),
            ImageStatus::Failed { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Result of a complete batch run, in input order.
#[derive(Debug, Default, Serialize)]
pub struct BatchResult {
    /// One outcome per processed image
    pub images: Vec<ImageOutcome>,
    /// Inputs never started because the batch was cancelled
    pub cancelled: usize,
    /// Total batch duration
    #[serde(skip)]
    pub total_duration: Duration,
}

impl BatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_outcome(&mut self, outcome: ImageOutcome) {
        self.images.push(outcome);
    }

    pub fn success_count(&self) -> usize {
        self.images.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.images.iter().filter(|o| o.status.is_failure()).count()
    }

    /// No image failed.
    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }

    pub fn failures(&self) -> Vec<&ImageOutcome> {
        self.images.iter().filter(|o| o.status.is_failure()).collect()
    }

    /// Human-readable summary distinguishing succeeded and failed counts.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();

        let success = self.success_count();
        let failed = self.failed_count();
        let total = self.images.len();

        if failed > 0 {
            lines.push(format!(
                "Batch finished with errors: {} succeeded, {} failed ({} total)",
                success, failed, total
            ));
            for outcome in self.failures() {
                lines.push(format!("  - {}: {}", outcome.input.display(), outcome.status));
            }
        } else {
            lines.push(format!(
                "Batch succeeded: {} processed ({} total) in {:?}",
                success, total, self.total_duration
            ));
        }

        if self.cancelled > 0 {
            lines.push(format!("Cancelled before {} image(s) started", self.cancelled));
        }

        lines.join("\n")
    }
}
