//! Decentralized network coordinate system
//!
//! Maintains Vivaldi-style network coordinates: each peer owns a point in a
//! low-dimensional Euclidean space plus a height, positioned so that the
//! distance between two peers' coordinates predicts the round-trip time
//! between them. Updates are driven purely by externally observed RTTs; the
//! library does no networking of its own.
//!
//! A per-peer streaming median filter smooths raw RTT samples before they
//! reach the update. The node layer folds a sliding-window non-Euclidean
//! adjustment into every prediction, and the coordinate underneath moves by
//! spring relaxation with a weak gravity toward the origin.
//!
//! ```rust
//! use netcoord::{LatencyFilter, Node};
//!
//! // 8 Euclidean dimensions, 20-sample adjustment window.
//! let mut local: Node<8, 20> = Node::new();
//! let remote: Node<8, 20> = Node::new();
//! let mut filter: LatencyFilter<&str, f64, 3> = LatencyFilter::new();
//!
//! // An RTT of 23 ms was observed against peer-1.
//! let filtered = filter.push("peer-1", 0.023);
//! local.update(&remote, filtered);
//!
//! let predicted = local.distance(&remote);
//! assert!(predicted > 0.0);
//! ```

pub mod algorithms;
pub mod core;
pub mod processing;
pub mod utils;
pub mod validation;

// Re-export commonly used types
pub use crate::algorithms::coordinate::Coordinate;
pub use crate::algorithms::node::Node;
pub use crate::core::{CoordinateParams, DEFAULT_ADJUSTMENT_WINDOW, DEFAULT_FILTER_WINDOW};
pub use crate::processing::median::{LatencyFilter, MedianBuffer};
pub use crate::utils::config::{ConfigError, TuningConfig};
pub use crate::validation::accuracy::ConvergenceStats;
