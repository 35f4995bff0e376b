//! Observation processing ahead of coordinate updates

pub mod median;

pub use median::{LatencyFilter, MedianBuffer};
