//! Configuration loading and discovery for `pxdown.toml`
//!
//! Provides functions to find, load, and merge configuration from TOML
//! files, JSON settings objects and flat key/value maps.

use super::schema::DownscaleConfig;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up during config discovery
pub const CONFIG_FILE_NAME: &str = "pxdown.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse pxdown.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// JSON settings parsing error
    #[error("Failed to parse settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A flat-map value could not be converted to the key's type
    #[error("Invalid value '{value}' for '{key}'")]
    InvalidValue { key: String, value: String },
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override background removal mode
    pub bg_removal_mode: Option<super::BgRemovalMode>,
    /// Override scale strategy
    pub scale_strategy: Option<super::ScaleStrategy>,
    /// Override lower factor bound
    pub min_factor: Option<u32>,
    /// Override upper factor bound
    pub max_factor: Option<u32>,
    /// Disable trimming
    pub no_trim: bool,
    /// Disable fine-tuning
    pub no_fine_tune: bool,
    /// Override padding multiple (0 disables padding)
    pub canvas_multiple: Option<u32>,
    /// Override output file prefix
    pub filename_prefix: Option<String>,
    /// Override output file suffix
    pub filename_suffix: Option<String>,
}

/// Find pxdown.toml by walking up from the current working directory.
///
/// Search order:
/// 1. Walk up from current directory looking for pxdown.toml
/// 2. Check XDG_CONFIG_HOME/pixeldown/pxdown.toml (or ~/.config/pixeldown/pxdown.toml)
pub fn find_config() -> Option<PathBuf> {
    if let Ok(cwd) = env::current_dir() {
        if let Some(path) = find_config_from(cwd) {
            return Some(path);
        }
    }

    find_xdg_config()
}

/// Find pxdown.toml in the XDG config directory.
pub fn find_xdg_config() -> Option<PathBuf> {
    let xdg_config = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok()?;

    let config_path = xdg_config.join("pixeldown").join(CONFIG_FILE_NAME);
    config_path.exists().then_some(config_path)
}

/// Find pxdown.toml by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from a pxdown.toml file.
///
/// If a path is provided, loads from that file. Otherwise, uses `find_config()`
/// to locate the config file. If no config file is found, returns the
/// default configuration.
pub fn load_config(path: Option<&Path>) -> Result<DownscaleConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => {
            log::debug!("Loading config from {}", p.display());
            load_config_file(&p)
        }
        None => Ok(DownscaleConfig::default()),
    }
}

fn load_config_file(path: &Path) -> Result<DownscaleConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: DownscaleConfig = toml::from_str(&contents)?;
    validated(config)
}

/// Parse a JSON settings object such as the one a GUI front end persists.
///
/// Missing keys take defaults and unknown keys are ignored.
pub fn config_from_json(json: &str) -> Result<DownscaleConfig, ConfigError> {
    let config: DownscaleConfig = serde_json::from_str(json)?;
    validated(config)
}

/// Build a configuration from a flat string map.
///
/// Values are parsed according to the key's type; unknown keys are ignored
/// and logged at debug level.
pub fn config_from_map(map: &HashMap<String, String>) -> Result<DownscaleConfig, ConfigError> {
    let mut config = DownscaleConfig::default();

    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();

    for key in keys {
        let value = &map[key];
        let invalid = || ConfigError::InvalidValue { key: key.clone(), value: value.clone() };

        match key.as_str() {
            "bg_removal_mode" => config.bg_removal_mode = value.parse().map_err(|_| invalid())?,
            "bg_tolerance" => config.bg_tolerance = value.trim().parse().map_err(|_| invalid())?,
            "bg_edge_tolerance" => {
                config.bg_edge_tolerance = value.trim().parse().map_err(|_| invalid())?
            }
            "preserve_dark_lines" => config.preserve_dark_lines = parse_bool(value).ok_or_else(invalid)?,
            "dark_line_threshold" => {
                config.dark_line_threshold = value.trim().parse().map_err(|_| invalid())?
            }
            "auto_trim" => config.auto_trim = parse_bool(value).ok_or_else(invalid)?,
            "enable_fine_tune" => config.enable_fine_tune = parse_bool(value).ok_or_else(invalid)?,
            "pad_canvas" => config.pad_canvas = parse_bool(value).ok_or_else(invalid)?,
            "canvas_multiple" => config.canvas_multiple = value.trim().parse().map_err(|_| invalid())?,
            "min_factor" => config.min_factor = value.trim().parse().map_err(|_| invalid())?,
            "max_factor" => config.max_factor = value.trim().parse().map_err(|_| invalid())?,
            "scale_strategy" => config.scale_strategy = value.parse().map_err(|_| invalid())?,
            "hint_tolerance" => config.hint_tolerance = value.trim().parse().map_err(|_| invalid())?,
            "variance_ratio" => config.variance_ratio = value.trim().parse().map_err(|_| invalid())?,
            "min_grid" => config.min_grid = value.trim().parse().map_err(|_| invalid())?,
            "max_grid" => config.max_grid = value.trim().parse().map_err(|_| invalid())?,
            "filename_prefix" => config.filename_prefix = value.clone(),
            "filename_suffix" => config.filename_suffix = value.clone(),
            other => log::debug!("Ignoring unknown config key '{}'", other),
        }
    }

    validated(config)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn validated(config: DownscaleConfig) -> Result<DownscaleConfig, ConfigError> {
    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }
    Ok(config)
}

/// Merge CLI overrides into a configuration.
///
/// CLI arguments take precedence over config file values.
pub fn merge_cli_overrides(config: &mut DownscaleConfig, overrides: &CliOverrides) {
    if let Some(mode) = overrides.bg_removal_mode {
        config.bg_removal_mode = mode;
    }

    if let Some(strategy) = overrides.scale_strategy {
        config.scale_strategy = strategy;
    }

    if let Some(min) = overrides.min_factor {
        config.min_factor = min;
    }
    if let Some(max) = overrides.max_factor {
        config.max_factor = max;
    }

    if overrides.no_trim {
        config.auto_trim = false;
    }
    if overrides.no_fine_tune {
        config.enable_fine_tune = false;
    }

    // A multiple of 0 turns padding off
    if let Some(multiple) = overrides.canvas_multiple {
        if multiple == 0 {
            config.pad_canvas = false;
        } else {
            config.pad_canvas = true;
            config.canvas_multiple = multiple;
        }
    }

    if let Some(ref prefix) = overrides.filename_prefix {
        config.filename_prefix = prefix.clone();
    }
    if let Some(ref suffix) = overrides.filename_suffix {
        config.filename_suffix = suffix.clone();
    }
}
