#![forbid(unsafe_code)]

//! Navigation configuration.
//!
//! [`NavigationConfig`] gathers every tunable of the engine (friction, scan,
//! flashlight, travel, input) plus the input-vs-travel arbitration policy
//! and an optional waypoint table. It can be loaded from TOML or JSON with
//! the `config` feature.
//!
//! # Loading
//!
//! ```toml
//! arbitration = "ignore_input"
//!
//! [friction]
//! travel_multiplier = 4.0
//!
//! [path]
//! total_distance = 2000.0
//!
//! [[path.waypoints]]
//! id = "home"
//! name = "Home"
//! position = { x = 0.0, y = 0.0 }
//! scroll_start = 0.0
//! scroll_end = 1000.0
//! sticky_zone_size = 400.0
//! virtual_content_bounds = { width = 1200.0, height = 800.0 }
//! ```
//!
//! ```rust,ignore
//! let config = NavigationConfig::from_toml_file("navigation.toml")?;
//! let config = NavigationConfig::from_json_str(json)?;
//! ```
//!
//! # Defaults
//!
//! Every field defaults to the built-in constant, and a missing `path`
//! means [`Path::standard`].

#[cfg(feature = "config")]
use std::path::Path as FsPath;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use waypath_core::{
    FlashlightConfig, FrictionTuning, InputConfig, Path, PathError, ScanTuning, TravelConfig,
    Waypoint,
};

/// What raw scroll input does while a click-to-travel flight is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "snake_case"))]
pub enum ArbitrationPolicy {
    /// Input cancels the flight, then applies.
    #[default]
    CancelTravel,
    /// Input is dropped until the flight ends.
    IgnoreInput,
}

/// A waypoint table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
pub struct PathConfig {
    pub total_distance: f64,
    pub waypoints: Vec<Waypoint>,
}

impl PathConfig {
    /// Validate and build the path.
    pub fn build(&self) -> Result<Path, PathError> {
        Path::new(self.waypoints.clone(), self.total_distance)
    }
}

/// Every tunable of a navigator.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct NavigationConfig {
    pub friction: FrictionTuning,
    pub scan: ScanTuning,
    pub flashlight: FlashlightConfig,
    pub travel: TravelConfig,
    pub input: InputConfig,
    pub arbitration: ArbitrationPolicy,
    /// Waypoint table. `None` uses [`Path::standard`].
    pub path: Option<PathConfig>,
}

impl NavigationConfig {
    /// Load from a TOML string.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<FsPath>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config")]
    pub fn from_json_file(path: impl AsRef<FsPath>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Validate all parameters. An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.friction.validate());
        errors.extend(self.scan.validate());
        errors.extend(self.flashlight.validate());
        errors.extend(self.travel.validate());
        errors.extend(self.input.validate());
        if let Some(path) = &self.path
            && let Err(err) = path.build()
        {
            errors.push(format!("path: {err}"));
        }
        errors
    }

    /// The configured path, or the standard layout.
    pub fn build_path(&self) -> Result<Path, ConfigError> {
        match &self.path {
            Some(path) => path.build().map_err(ConfigError::Path),
            None => Ok(Path::standard()),
        }
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur when loading or applying a navigation config.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "config")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
    /// The waypoint table is malformed.
    Path(PathError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "config")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
            Self::Path(e) => write!(f, "invalid path: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "config")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
            Self::Path(e) => Some(e),
        }
    }
}

impl From<PathError> for ConfigError {
    fn from(err: PathError) -> Self {
        Self::Path(err)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use waypath_core::{Point, Size};

    fn waypoint(id: &str, start: f64, end: f64) -> Waypoint {
        Waypoint {
            id: id.into(),
            name: id.into(),
            position: Point::ZERO,
            scroll_start: start,
            scroll_end: end,
            sticky_zone_size: 200.0,
            virtual_content_bounds: Size::new(100.0, 100.0),
            angle: None,
        }
    }

    #[test]
    fn default_validates_clean() {
        let config = NavigationConfig::default();
        assert!(config.validate().is_empty(), "{:?}", config.validate());
        assert_eq!(config.arbitration, ArbitrationPolicy::CancelTravel);
        assert_eq!(config.build_path().unwrap(), Path::standard());
    }

    #[test]
    fn default_matches_component_defaults() {
        let config = NavigationConfig::default();
        assert_eq!(config.friction.travel_multiplier, 5.0);
        assert_eq!(config.friction.exiting_multiplier, 0.5);
        assert_eq!(config.scan.height_factor, 1.5);
        assert_eq!(config.travel.max_ms, 2000.0);
        assert_eq!(config.input.touch_scale, 2.0);
    }

    #[test]
    fn multiple_validation_errors_collected() {
        let mut config = NavigationConfig::default();
        config.friction.travel_multiplier = f64::NAN;
        config.scan.height_factor = 0.0;
        config.travel.base_ms = -1.0;
        let errors = config.validate();
        assert!(errors.len() >= 3, "should catch multiple errors: {errors:?}");
    }

    #[test]
    fn bad_path_is_reported() {
        let config = NavigationConfig {
            path: Some(PathConfig {
                total_distance: 2000.0,
                waypoints: vec![waypoint("a", 0.0, 1000.0), waypoint("b", 1200.0, 2000.0)],
            }),
            ..NavigationConfig::default()
        };
        let errors = config.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("path: "), "{errors:?}");
        assert!(matches!(
            config.build_path(),
            Err(ConfigError::Path(PathError::Gap { .. }))
        ));
    }

    #[test]
    fn custom_path_builds() {
        let config = NavigationConfig {
            path: Some(PathConfig {
                total_distance: 2000.0,
                waypoints: vec![waypoint("a", 0.0, 1000.0), waypoint("b", 1000.0, 2000.0)],
            }),
            ..NavigationConfig::default()
        };
        let path = config.build_path().unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(path.total_distance(), 2000.0);
    }

    #[test]
    fn error_display() {
        let err = ConfigError::Validation(vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "validation errors: a; b");
        let err = ConfigError::from(PathError::Empty);
        assert!(err.to_string().starts_with("invalid path: "));
        assert!(std::error::Error::source(&err).is_some());
    }
}
