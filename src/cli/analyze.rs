//! Analyze command implementation

use std::collections::BTreeMap;
use std::path::Path;
use std::process::ExitCode;

use serde::Serialize;

use super::{EXIT_ERROR, EXIT_SUCCESS};
use crate::config::DownscaleConfig;
use crate::grid::{estimate_grid, GridOptions};
use crate::pipeline::{clean_image, load_image};
use crate::search::{FidelitySearch, ScaleCandidate, ScaleSearch, SearchBounds, SearchOutcome, UniformitySearch};

/// What one strategy chose and how every factor scored.
#[derive(Debug, Serialize)]
pub struct StrategyReport {
    pub factor: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<(u32, u32)>,
    pub searched: SearchBounds,
    pub candidates: Vec<ScaleCandidate>,
}

impl From<SearchOutcome> for StrategyReport {
    fn from(outcome: SearchOutcome) -> Self {
        Self {
            factor: outcome.factor,
            phase: outcome.phase,
            searched: outcome.searched,
            candidates: outcome.candidates,
        }
    }
}

/// Side-by-side comparison of both scale strategies on one image.
#[derive(Debug, Serialize)]
pub struct AnalyzeReport {
    pub filename: String,
    pub original_size: (u32, u32),
    pub after_cleanup_size: (u32, u32),
    pub detected_grid: Option<f64>,
    pub fidelity: StrategyReport,
    pub uniformity: StrategyReport,
}

/// Run the analyze command
pub fn run_analyze(input: &Path, json: bool, config: &DownscaleConfig) -> ExitCode {
    let image = match load_image(input) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    let original_size = image.dimensions();

    let (cleaned, _) = clean_image(image, config);
    let detected_grid = estimate_grid(&cleaned, &GridOptions::from(config));
    let bounds = SearchBounds::from(config);

    let report = AnalyzeReport {
        filename: input.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default(),
        original_size,
        after_cleanup_size: cleaned.dimensions(),
        detected_grid,
        fidelity: FidelitySearch::from(config).search(&cleaned, bounds, detected_grid).into(),
        uniformity: UniformitySearch::from(config).search(&cleaned, bounds, detected_grid).into(),
    };

    if json {
        return match serde_json::to_string_pretty(&report) {
            Ok(text) => {
                println!("{}", text);
                ExitCode::from(EXIT_SUCCESS)
            }
            Err(e) => {
                eprintln!("Error: failed to serialize analysis: {}", e);
                ExitCode::from(EXIT_ERROR)
            }
        };
    }

    print_report(&report);
    ExitCode::from(EXIT_SUCCESS)
}

fn print_report(report: &AnalyzeReport) {
    println!("File: {}", report.filename);
    println!("Original size: {}x{}", report.original_size.0, report.original_size.1);
    println!("After cleanup: {}x{}", report.after_cleanup_size.0, report.after_cleanup_size.1);
    match report.detected_grid {
        Some(grid) => println!("Grid hint: {:.2}", grid),
        None => println!("Grid hint: none"),
    }
    println!();

    // Rows keyed by factor; either strategy may have skipped a factor
    let mut rows: BTreeMap<u32, (Option<&ScaleCandidate>, Option<&ScaleCandidate>)> = BTreeMap::new();
    for c in &report.fidelity.candidates {
        rows.entry(c.factor).or_default().0 = Some(c);
    }
    for c in &report.uniformity.candidates {
        rows.entry(c.factor).or_default().1 = Some(c);
    }

    println!("{:>6}  {:>9}  {:>12}  {:>12}  {:>8}", "factor", "size", "fidelity", "variance", "phase");
    for (factor, (fidelity, uniformity)) in rows {
        let size = fidelity
            .or(uniformity)
            .map(|c| format!("{}x{}", c.size.0, c.size.1))
            .unwrap_or_default();
        let combined = fidelity.map(|c| format!("{:.4}", c.combined)).unwrap_or_else(|| "-".to_string());
        let variance = uniformity.map(|c| format!("{:.3}", c.score)).unwrap_or_else(|| "-".to_string());
        let phase = uniformity
            .and_then(|c| c.phase)
            .map(|(x, y)| format!("{},{}", x, y))
            .unwrap_or_else(|| "-".to_string());
        println!("{:>6}  {:>9}  {:>12}  {:>12}  {:>8}", factor, size, combined, variance, phase);
    }
    println!();

    println!("Fidelity picks factor {}", report.fidelity.factor);
    match report.uniformity.phase {
        Some((x, y)) => println!("Uniformity picks factor {} at phase ({}, {})", report.uniformity.factor, x, y),
        None => println!("Uniformity picks factor {}", report.uniformity.factor),
    }
}
