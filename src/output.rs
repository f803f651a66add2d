//! Input discovery, output naming and PNG writing

use glob::glob;
use image::RgbaImage;
use std::path::{Component, Path, PathBuf};

use crate::error::{DownscaleError, Result};

/// File extensions accepted as input images (compared case-insensitively).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "webp"];

/// Check if a path has a supported image extension.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.iter().any(|s| e.eq_ignore_ascii_case(s)))
        .unwrap_or(false)
}

/// Find supported images in a directory, sorted by path.
///
/// With `recursive`, subdirectories are searched as well.
pub fn find_images(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    let pattern = if recursive {
        dir.join("**").join("*")
    } else {
        dir.join("*")
    };
    let mut files = glob_files(&pattern.to_string_lossy())?;
    files.sort();
    Ok(files)
}

fn glob_files(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob(pattern).map_err(|source| DownscaleError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => {
                if path.is_file() && is_supported_image(&path) {
                    files.push(path);
                }
            }
            Err(e) => log::warn!("Skipping unreadable path: {}", e),
        }
    }
    Ok(files)
}

/// Expand command-line inputs into a list of image files.
///
/// Directories are searched with [`find_images`], arguments containing glob
/// metacharacters are expanded, and anything else is taken as a file path.
/// Duplicates are dropped, keeping the first occurrence.
pub fn expand_inputs(inputs: &[PathBuf], recursive: bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        let text = input.to_string_lossy();
        if input.is_dir() {
            files.extend(find_images(input, recursive)?);
        } else if text.contains(['*', '?', '[']) {
            let mut matched = glob_files(&text)?;
            matched.sort();
            files.extend(matched);
        } else {
            files.push(input.clone());
        }
    }

    let mut seen = std::collections::HashSet::new();
    files.retain(|f| seen.insert(f.clone()));
    Ok(files)
}

/// Suffix appended when the plain output name would overwrite the input.
pub const COLLISION_SUFFIX: &str = "_downscaled";

/// Output path for a processed input.
///
/// The file is named `{prefix}{stem}{suffix}.png` and placed in
/// `output_dir`, or next to the input when no directory is given. If that
/// path is the input itself, [`COLLISION_SUFFIX`] is added to the stem so
/// the source image is never overwritten.
///
/// # Example
///
/// `sprites/hero.jpg` with prefix `px_`, suffix `_small` and output
/// directory `out` becomes `out/px_hero_small.png`.
pub fn generate_output_path(input: &Path, output_dir: Option<&Path>, prefix: &str, suffix: &str) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    let dir = match output_dir {
        Some(dir) => dir,
        None => input.parent().unwrap_or(Path::new("")),
    };

    let path = join_name(dir, format!("{}{}{}.png", prefix, stem, suffix));
    if lexically_equal(&path, input) {
        join_name(dir, format!("{}{}{}{}.png", prefix, stem, suffix, COLLISION_SUFFIX))
    } else {
        path
    }
}

fn join_name(dir: &Path, name: String) -> PathBuf {
    if dir.as_os_str().is_empty() {
        PathBuf::from(name)
    } else {
        dir.join(name)
    }
}

/// Compare paths ignoring `.` components, so `./a.png` equals `a.png`.
fn lexically_equal(a: &Path, b: &Path) -> bool {
    let strip = |p: &Path| -> PathBuf { p.components().filter(|c| !matches!(c, Component::CurDir)).collect() };
    strip(a) == strip(b)
}

/// Save an RGBA image as PNG, creating parent directories as needed.
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    image
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|source| DownscaleError::Write { path: path.to_path_buf(), source })
}
