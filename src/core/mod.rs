//! Core types and constants for the network coordinate system

pub mod constants;
pub mod types;

pub use constants::*;
pub use types::CoordinateParams;
