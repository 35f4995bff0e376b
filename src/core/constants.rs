//! Tuning constants and numeric guards for the coordinate system

/// Default ceiling (and initial value) of a coordinate's error estimate.
pub const DEFAULT_MAX_ERROR: f64 = 1.5;

/// Default floor (and initial value) of the height component, in seconds.
///
/// Height models access-link latency, so it never drops to exactly zero.
pub const DEFAULT_MIN_HEIGHT: f64 = 1.0e-5;

/// Default learning rate of the error estimate EWMA.
pub const DEFAULT_CE: f64 = 0.25;

/// Default learning rate of coordinate motion.
pub const DEFAULT_CC: f64 = 0.25;

/// Default gravitational constant, in seconds.
///
/// Gravity toward the origin grows as `(distance / rho)^2`; larger values
/// mean weaker gravity.
pub const DEFAULT_RHO: f64 = 150.0;

/// Default ring size of the hybrid adjustment window.
pub const DEFAULT_ADJUSTMENT_WINDOW: usize = 20;

/// Default ring size of the per-peer median latency filter.
pub const DEFAULT_FILTER_WINDOW: usize = 3;

/// Threshold below which a magnitude is treated as zero.
///
/// The smallest positive normal f64, used to guard divisions by near-zero
/// RTTs, error sums, and vector magnitudes.
pub const ZERO_THRESHOLD: f64 = f64::MIN_POSITIVE;
