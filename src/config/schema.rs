//! Configuration schema types for `pxdown.toml`
//!
//! Defines the flat option set every pipeline stage reads, its defaults and
//! its validation rules.

use serde::{Deserialize, Serialize};

/// How aggressively the background remover floods into the image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BgRemovalMode {
    /// Single-pixel gap bridging, content and outline barriers enforced
    #[default]
    Conservative,
    /// Two-pixel gap bridging, no barrier during the flood
    Aggressive,
    /// Leave the image untouched
    None,
}

impl std::str::FromStr for BgRemovalMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "conservative" => Ok(Self::Conservative),
            "aggressive" => Ok(Self::Aggressive),
            "none" | "off" => Ok(Self::None),
            other => Err(format!("unknown background removal mode '{}'", other)),
        }
    }
}

/// Scoring strategy used by the scale search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScaleStrategy {
    /// Reconstruction fidelity (downscale, upscale back, compare)
    #[default]
    Fidelity,
    /// Within-block color uniformity with phase search
    Uniformity,
}

impl std::str::FromStr for ScaleStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fidelity" | "a" => Ok(Self::Fidelity),
            "uniformity" | "b" => Ok(Self::Uniformity),
            other => Err(format!("unknown scale strategy '{}'", other)),
        }
    }
}

impl std::fmt::Display for ScaleStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fidelity => write!(f, "fidelity"),
            Self::Uniformity => write!(f, "uniformity"),
        }
    }
}

/// Complete downscaler configuration.
///
/// Every key is optional in a config file; missing keys take the defaults
/// below. The value is immutable once loaded and passed by reference into
/// each stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownscaleConfig {
    /// Background matting aggressiveness
    pub bg_removal_mode: BgRemovalMode,
    /// Interior Manhattan RGB tolerance for background matches
    pub bg_tolerance: u32,
    /// Looser tolerance applied inside the border band
    pub bg_edge_tolerance: u32,
    /// Protect dark outline pixels from removal
    pub preserve_dark_lines: bool,
    /// RGB sum below which a visible pixel counts as dark
    pub dark_line_threshold: u32,
    /// Crop to visible content after background removal
    pub auto_trim: bool,
    /// Refine the integer factor with a fractional search
    pub enable_fine_tune: bool,
    /// Pad the result to a multiple of `canvas_multiple`
    pub pad_canvas: bool,
    /// Padding multiple
    pub canvas_multiple: u32,
    /// Smallest scale factor searched
    pub min_factor: u32,
    /// Largest scale factor searched
    pub max_factor: u32,
    /// Active scoring strategy
    pub scale_strategy: ScaleStrategy,
    /// Relative score slack granted to the hint-closest factor (fidelity)
    pub hint_tolerance: f64,
    /// Multiple of the minimum variance a scale may reach and still be valid (uniformity)
    pub variance_ratio: f64,
    /// Smallest grid period the estimator reports
    pub min_grid: f64,
    /// Largest grid period the estimator reports
    pub max_grid: f64,
    /// Prepended to output file stems
    pub filename_prefix: String,
    /// Appended to output file stems
    pub filename_suffix: String,
}

impl Default for DownscaleConfig {
    fn default() -> Self {
        Self {
            bg_removal_mode: BgRemovalMode::Conservative,
            bg_tolerance: 15,
            bg_edge_tolerance: 25,
            preserve_dark_lines: true,
            dark_line_threshold: 50,
            auto_trim: true,
            enable_fine_tune: true,
            pad_canvas: true,
            canvas_multiple: 16,
            min_factor: 6,
            max_factor: 20,
            scale_strategy: ScaleStrategy::Fidelity,
            hint_tolerance: 0.2,
            variance_ratio: 2.0,
            min_grid: 4.0,
            max_grid: 30.0,
            filename_prefix: String::new(),
            filename_suffix: String::new(),
        }
    }
}

/// A configuration validation error
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationError {
    /// Offending key
    pub field: String,
    /// What is wrong with it
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}' {}", self.field, self.message)
    }
}

impl DownscaleConfig {
    /// Check value ranges, returning every problem found.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();
        let mut push = |field: &str, message: &str| {
            errors.push(ConfigValidationError {
                field: field.to_string(),
                message: message.to_string(),
            });
        };

        if self.min_factor == 0 {
            push("min_factor", "must be a positive integer");
        }
        if self.min_factor > self.max_factor {
            push("max_factor", "must not be smaller than min_factor");
        }
        if self.canvas_multiple == 0 {
            push("canvas_multiple", "must be a positive integer");
        }
        if !(self.min_grid > 0.0) {
            push("min_grid", "must be positive");
        }
        if !(self.min_grid < self.max_grid) {
            push("max_grid", "must be greater than min_grid");
        }
        if !(self.hint_tolerance >= 0.0) {
            push("hint_tolerance", "must not be negative");
        }
        if !(self.variance_ratio >= 1.0) {
            push("variance_ratio", "must be at least 1.0");
        }

        errors
    }

    /// Whether [`validate`](Self::validate) reports no errors.
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_parse_uses_defaults() {
        let config: DownscaleConfig = toml::from_str("").unwrap();
        assert_eq!(config, DownscaleConfig::default());
        assert_eq!(config.min_factor, 6);
        assert_eq!(config.max_factor, 20);
        assert_eq!(config.bg_removal_mode, BgRemovalMode::Conservative);
    }

    #[test]
    fn test_full_config_parse() {
        let toml = r#"
bg_removal_mode = "aggressive"
bg_tolerance = 20
bg_edge_tolerance = 40
preserve_dark_lines = false
dark_line_threshold = 90
auto_trim = false
enable_fine_tune = false
pad_canvas = false
canvas_multiple = 8
min_factor = 4
max_factor = 12
scale_strategy = "uniformity"
hint_tolerance = 0.1
variance_ratio = 3.0
min_grid = 3.0
max_grid = 24.0
filename_prefix = "px_"
filename_suffix = "_small"
"#;
        let config: DownscaleConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.bg_removal_mode, BgRemovalMode::Aggressive);
        assert_eq!(config.bg_tolerance, 20);
        assert!(!config.preserve_dark_lines);
        assert_eq!(config.canvas_multiple, 8);
        assert_eq!((config.min_factor, config.max_factor), (4, 12));
        assert_eq!(config.scale_strategy, ScaleStrategy::Uniformity);
        assert_eq!(config.variance_ratio, 3.0);
        assert_eq!(config.filename_prefix, "px_");
        assert!(config.is_valid());
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("None".parse::<BgRemovalMode>().unwrap(), BgRemovalMode::None);
        assert_eq!(" aggressive ".parse::<BgRemovalMode>().unwrap(), BgRemovalMode::Aggressive);
        assert!("magic".parse::<BgRemovalMode>().is_err());
        assert_eq!("B".parse::<ScaleStrategy>().unwrap(), ScaleStrategy::Uniformity);
    }

    #[test]
    fn test_default_is_valid() {
        assert!(DownscaleConfig::default().is_valid());
    }

    #[test]
    fn test_validation_factor_range() {
        let config = DownscaleConfig { min_factor: 12, max_factor: 8, ..Default::default() };
        let errors = config.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "max_factor");
    }

    #[test]
    fn test_validation_zero_values() {
        let config = DownscaleConfig {
            min_factor: 0,
            canvas_multiple: 0,
            variance_ratio: 0.5,
            ..Default::default()
        };
        let fields: Vec<_> = config.validate().into_iter().map(|e| e.field).collect();
        assert!(fields.contains(&"min_factor".to_string()));
        assert!(fields.contains(&"canvas_multiple".to_string()));
        assert!(fields.contains(&"variance_ratio".to_string()));
    }

    #[test]
    fn test_validation_grid_band() {
        let config = DownscaleConfig { min_grid: 10.0, max_grid: 10.0, ..Default::default() };
        assert!(config.validate().iter().any(|e| e.field == "max_grid"));

        let config = DownscaleConfig { min_grid: f64::NAN, ..Default::default() };
        assert!(config.validate().iter().any(|e| e.field == "min_grid"));
    }

    #[test]
    fn test_validation_error_display() {
        let err = ConfigValidationError {
            field: "min_factor".to_string(),
            message: "must be a positive integer".to_string(),
        };
        assert_eq!(err.to_string(), "'min_factor' must be a positive integer");
    }
}
