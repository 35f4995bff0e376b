//! Core parameter types for the coordinate system

use serde::{Deserialize, Serialize};

use crate::core::constants::*;

/// Tuning parameters held by every coordinate.
///
/// The Euclidean dimensionality is a compile-time parameter of
/// [`Coordinate`](crate::Coordinate); the real-valued tuning constants live
/// in this record because they cannot be const generics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinateParams {
    /// Ceiling on the error estimate; also its initial value.
    pub max_error: f64,
    /// Floor on the height component; also its initial value (seconds).
    pub min_height: f64,
    /// Learning rate of the error estimate, in [0, 1).
    pub ce: f64,
    /// Learning rate of coordinate motion, in [0, 1).
    pub cc: f64,
    /// Gravitational constant (seconds); gravity scales as `(d / rho)^2`.
    pub rho: f64,
}

impl Default for CoordinateParams {
    fn default() -> Self {
        Self {
            max_error: DEFAULT_MAX_ERROR,
            min_height: DEFAULT_MIN_HEIGHT,
            ce: DEFAULT_CE,
            cc: DEFAULT_CC,
            rho: DEFAULT_RHO,
        }
    }
}

impl CoordinateParams {
    /// Panic if any parameter is outside its allowed range.
    ///
    /// Out-of-range tuning constants are a programming error, not a runtime
    /// condition, so this asserts rather than returning a result.
    pub fn validate(&self) {
        assert!(
            self.max_error.is_finite() && self.max_error > 0.0,
            "max_error must be a positive finite value, got {}",
            self.max_error
        );
        assert!(
            self.min_height.is_finite() && self.min_height >= 0.0,
            "min_height must be a non-negative finite value, got {}",
            self.min_height
        );
        assert!(
            (0.0..1.0).contains(&self.ce),
            "ce must be in [0, 1), got {}",
            self.ce
        );
        assert!(
            (0.0..1.0).contains(&self.cc),
            "cc must be in [0, 1), got {}",
            self.cc
        );
        assert!(
            self.rho.is_finite() && self.rho > 0.0,
            "rho must be a positive finite value, got {}",
            self.rho
        );
    }
}
