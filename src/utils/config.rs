//! Configuration loading and validation
//!
//! The coordinate system itself takes a [`CoordinateParams`] value; this
//! module adds the deployment-facing layer on top: a serializable tuning
//! record covering every recognized option, JSON file round-trips, and
//! range validation with typed errors. Dimensionality and window sizes are
//! compile-time parameters of the coordinate types, so the window fields
//! here are advisory values for the caller to check against its chosen
//! constants.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{
    CoordinateParams, DEFAULT_ADJUSTMENT_WINDOW, DEFAULT_CC, DEFAULT_CE, DEFAULT_FILTER_WINDOW,
    DEFAULT_MAX_ERROR, DEFAULT_MIN_HEIGHT, DEFAULT_RHO,
};

/// Complete tuning configuration for the coordinate system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuningConfig {
    /// Ceiling on the coordinate error estimate.
    pub max_error: f64,
    /// Floor on the height component (seconds).
    pub min_height: f64,
    /// Learning rate of the error estimate, in [0, 1).
    pub ce: f64,
    /// Learning rate of coordinate motion, in [0, 1).
    pub cc: f64,
    /// Gravitational constant (seconds).
    pub rho: f64,
    /// Ring size of the hybrid adjustment window; 0 disables it.
    pub adjustment_window: usize,
    /// Ring size of the per-peer median filter; must be positive.
    pub filter_window: usize,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            max_error: DEFAULT_MAX_ERROR,
            min_height: DEFAULT_MIN_HEIGHT,
            ce: DEFAULT_CE,
            cc: DEFAULT_CC,
            rho: DEFAULT_RHO,
            adjustment_window: DEFAULT_ADJUSTMENT_WINDOW,
            filter_window: DEFAULT_FILTER_WINDOW,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A parameter value is outside its allowed range.
    InvalidParameter {
        parameter: &'static str,
        value: String,
        reason: &'static str,
    },
    /// Configuration file I/O failure.
    IoError { message: String },
    /// JSON serialization or deserialization failure.
    SerializationError { message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "invalid value {} for {}: {}", value, parameter, reason)
            }
            ConfigError::IoError { message } => write!(f, "configuration I/O error: {}", message),
            ConfigError::SerializationError { message } => {
                write!(f, "configuration serialization error: {}", message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl TuningConfig {
    /// Load a configuration from a JSON file and validate it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            message: e.to_string(),
        })?;
        let config: TuningConfig =
            serde_json::from_str(&contents).map_err(|e| ConfigError::SerializationError {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration to a JSON file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::SerializationError {
                message: e.to_string(),
            })?;
        fs::write(path, contents).map_err(|e| ConfigError::IoError {
            message: e.to_string(),
        })
    }

    /// Check every parameter against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.max_error.is_finite() && self.max_error > 0.0) {
            return Err(ConfigError::InvalidParameter {
                parameter: "max_error",
                value: self.max_error.to_string(),
                reason: "must be a positive finite value",
            });
        }
        if !(self.min_height.is_finite() && self.min_height >= 0.0) {
            return Err(ConfigError::InvalidParameter {
                parameter: "min_height",
                value: self.min_height.to_string(),
                reason: "must be a non-negative finite value",
            });
        }
        if !(0.0..1.0).contains(&self.ce) {
            return Err(ConfigError::InvalidParameter {
                parameter: "ce",
                value: self.ce.to_string(),
                reason: "must be in [0, 1)",
            });
        }
        if !(0.0..1.0).contains(&self.cc) {
            return Err(ConfigError::InvalidParameter {
                parameter: "cc",
                value: self.cc.to_string(),
                reason: "must be in [0, 1)",
            });
        }
        if !(self.rho.is_finite() && self.rho > 0.0) {
            return Err(ConfigError::InvalidParameter {
                parameter: "rho",
                value: self.rho.to_string(),
                reason: "must be a positive finite value",
            });
        }
        if self.filter_window == 0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "filter_window",
                value: "0".to_string(),
                reason: "must be at least 1",
            });
        }
        Ok(())
    }

    /// The coordinate tuning parameters described by this configuration.
    pub fn to_params(&self) -> CoordinateParams {
        CoordinateParams {
            max_error: self.max_error,
            min_height: self.min_height,
            ce: self.ce,
            cc: self.cc,
            rho: self.rho,
        }
    }
}
