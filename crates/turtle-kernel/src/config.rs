//! Engine configuration, loaded from TOML.
//!
//! ```toml
//! weld_tolerance = 0.001
//! select_buffer = 0.001
//! curve_resolution = 12
//! snap_moves = true
//! dispatch_policy = "abort_on_first_error"
//! ```
//!
//! Every key is optional.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// What a script or macro run does when a command fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchPolicy {
    /// Stop at the first failing command and report it.
    #[default]
    AbortOnFirstError,
    /// Log the failure, skip the command and keep going.
    Continue,
}

/// Tunables of a [`TurtleSession`](crate::TurtleSession).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurtleConfig {
    /// Merge distance for curve joins, `merge` and move snapping.
    pub weld_tolerance: f64,
    /// Inclusion buffer for `select_at_cursor`.
    pub select_buffer: f64,
    /// Segments per Bézier curve.
    pub curve_resolution: usize,
    /// A pen-down move ending on an existing vertex reuses it.
    pub snap_moves: bool,
    /// Failure handling for scripts and macros.
    pub dispatch_policy: DispatchPolicy,
}

impl Default for TurtleConfig {
    fn default() -> Self {
        Self {
            weld_tolerance: 0.001,
            select_buffer: 0.001,
            curve_resolution: 12,
            snap_moves: true,
            dispatch_policy: DispatchPolicy::default(),
        }
    }
}

impl TurtleConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.weld_tolerance.is_finite() && self.weld_tolerance > 0.0) {
            return Err(ConfigError::InvalidSetting {
                key: "weld_tolerance",
                reason: format!("must be a positive number, got {}", self.weld_tolerance),
            });
        }
        if !(self.select_buffer.is_finite() && self.select_buffer >= 0.0) {
            return Err(ConfigError::InvalidSetting {
                key: "select_buffer",
                reason: format!("must be a non-negative number, got {}", self.select_buffer),
            });
        }
        if self.curve_resolution == 0 {
            return Err(ConfigError::InvalidSetting {
                key: "curve_resolution",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(TurtleConfig::from_toml_str("").unwrap(), TurtleConfig::default());
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let config = TurtleConfig::from_toml_str(
            "curve_resolution = 32\ndispatch_policy = \"continue\"\n",
        )
        .unwrap();
        assert_eq!(config.curve_resolution, 32);
        assert_eq!(config.dispatch_policy, DispatchPolicy::Continue);
        assert_eq!(config.weld_tolerance, 0.001);
        assert!(config.snap_moves);
    }

    #[test]
    fn rejects_invalid_values() {
        let err = TurtleConfig::from_toml_str("weld_tolerance = 0.0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidSetting { key: "weld_tolerance", .. }
        ));
        assert!(TurtleConfig::from_toml_str("curve_resolution = 0").is_err());
        assert!(TurtleConfig::from_toml_str("select_buffer = -1.0").is_err());
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            TurtleConfig::from_toml_str("snap_moves = \"yes\""),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = TurtleConfig::load_from_file(Path::new("/nonexistent/turtle.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
