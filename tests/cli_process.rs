//! CLI integration tests
//!
//! These tests run the `pxdown` binary against generated images and check
//! exit codes, output files and printed records.

mod common;

use std::path::Path;
use std::process::{Command, Output};

use common::{true_sprite, upscale_on_background, BACKGROUND};
use tempfile::TempDir;

fn pxdown(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pxdown"))
        .args(args)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute pxdown")
}

fn write_input(dir: &Path, name: &str, seed: u64) {
    upscale_on_background(&true_sprite(seed), 10, BACKGROUND).save(dir.join(name)).unwrap();
}

#[test]
fn test_process_writes_downscaled_png() {
    let temp = TempDir::new().unwrap();
    write_input(temp.path(), "hero.png", 42);

    let output = pxdown(&["process", "hero.png", "-o", "out", "--canvas-multiple", "0"], temp.path());
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let img = image::open(temp.path().join("out/hero.png")).unwrap();
    assert_eq!((img.width(), img.height()), (10, 12));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("160x160 -> 10x12"), "stdout: {}", stdout);
}

#[test]
fn test_process_json_and_naming() {
    let temp = TempDir::new().unwrap();
    write_input(temp.path(), "a.png", 42);
    write_input(temp.path(), "b.png", 7);

    let output = pxdown(
        &["process", ".", "-o", "out", "--prefix", "px_", "--suffix", "_1x", "--json", "--jobs", "2"],
        temp.path(),
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let images = json["images"].as_array().unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!(images[0]["status"], "success");
    assert_eq!(images[0]["result"]["filename"], "a.png");
    assert_eq!(images[0]["result"]["scale_factor"], 10.0);
    assert!(temp.path().join("out/px_a_1x.png").exists());
    assert!(temp.path().join("out/px_b_1x.png").exists());
}

#[test]
fn test_process_without_output_dir_keeps_input() {
    let temp = TempDir::new().unwrap();
    write_input(temp.path(), "hero.png", 42);
    let before = std::fs::read(temp.path().join("hero.png")).unwrap();

    let output = pxdown(&["process", "hero.png"], temp.path());
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    assert_eq!(std::fs::read(temp.path().join("hero.png")).unwrap(), before);
    let img = image::open(temp.path().join("hero_downscaled.png")).unwrap();
    assert_eq!((img.width(), img.height()), (16, 16));
}

#[test]
fn test_corrupt_input_fails_without_stopping_batch() {
    let temp = TempDir::new().unwrap();
    write_input(temp.path(), "good.png", 2024);
    std::fs::write(temp.path().join("bad.png"), b"definitely not a png").unwrap();

    let output = pxdown(&["process", "bad.png", "good.png", "-o", "out"], temp.path());
    assert_eq!(output.status.code(), Some(1));
    assert!(temp.path().join("out/good.png").exists());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("bad.png"), "stderr: {}", stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("1 succeeded, 1 failed"), "stdout: {}", stdout);
}

#[test]
fn test_no_inputs_found_is_invalid_args() {
    let temp = TempDir::new().unwrap();
    let output = pxdown(&["process", "*.png"], temp.path());
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_invalid_override_is_invalid_args() {
    let temp = TempDir::new().unwrap();
    write_input(temp.path(), "hero.png", 42);
    let output = pxdown(&["process", "hero.png", "--min-factor", "30", "--max-factor", "10"], temp.path());
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_config_file_is_discovered() {
    let temp = TempDir::new().unwrap();
    write_input(temp.path(), "hero.png", 7);
    std::fs::write(temp.path().join("pxdown.toml"), "filename_suffix = \"_small\"\npad_canvas = false\n").unwrap();

    let output = pxdown(&["process", "hero.png"], temp.path());
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let img = image::open(temp.path().join("hero_small.png")).unwrap();
    assert_eq!((img.width(), img.height()), (10, 12));
}

#[test]
fn test_analyze_reports_both_strategies() {
    let temp = TempDir::new().unwrap();
    write_input(temp.path(), "hero.png", 2024);

    let output = pxdown(&["analyze", "hero.png", "--json"], temp.path());
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["fidelity"]["factor"], 10);
    assert!(json["uniformity"]["factor"].is_u64());
    assert!(!json["fidelity"]["candidates"].as_array().unwrap().is_empty());

    let text = pxdown(&["analyze", "hero.png"], temp.path());
    assert!(String::from_utf8_lossy(&text.stdout).contains("Fidelity picks factor 10"));
}
