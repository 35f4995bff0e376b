//! Hybrid node: a coordinate plus a sliding-window adjustment offset
//!
//! Pure Euclidean embeddings systematically under-predict some paths because
//! real network latencies violate the triangle inequality. The node keeps a
//! window of recent signed residuals (observed RTT minus predicted distance)
//! and averages them into a per-node offset that is added to every predicted
//! distance and fed back into subsequent coordinate updates.

use rand::Rng;
use tracing::trace;

use crate::algorithms::coordinate::Coordinate;
use crate::core::CoordinateParams;

/// A coordinate wrapped with the hybrid adjustment of window size `W`.
///
/// `W = 0` disables the adjustment entirely; the node then behaves exactly
/// like its inner [`Coordinate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node<const D: usize, const W: usize> {
    coordinate: Coordinate<D>,
    adjustment: f64,
    samples: [f64; W],
    index: usize,
}

impl<const D: usize, const W: usize> Node<D, W> {
    /// Create a node at the origin with default parameters.
    pub fn new() -> Self {
        Self::with_params(CoordinateParams::default())
    }

    /// Create a node at the origin with explicit tuning parameters.
    pub fn with_params(params: CoordinateParams) -> Self {
        Self {
            coordinate: Coordinate::with_params(params),
            adjustment: 0.0,
            samples: [0.0; W],
            index: 0,
        }
    }

    /// Update against an observed RTT to `other`, in seconds.
    pub fn update(&mut self, other: &Self, rtt: f64) {
        self.update_with_rng(other, rtt, &mut rand::thread_rng());
    }

    /// Update with a caller-supplied random source for reproducibility.
    pub fn update_with_rng<R: Rng>(&mut self, other: &Self, rtt: f64, rng: &mut R) {
        self.coordinate.update_adjusted_with_rng(
            &other.coordinate,
            rtt,
            self.adjustment,
            other.adjustment,
            rng,
        );

        if W > 0 {
            // Residual measured after the coordinate moved; the factor of
            // two splits the offset between the two endpoints of a path.
            let dist = self.coordinate.distance(&other.coordinate);
            self.samples[self.index] = rtt - dist;
            self.index = (self.index + 1) % W;
            self.adjustment = self.samples.iter().sum::<f64>() / (2.0 * W as f64);
            trace!(adjustment = self.adjustment, "recomputed hybrid adjustment");
        }
    }

    /// Predicted RTT to `other`, in seconds, including both adjustments.
    ///
    /// Adjustments may only inflate the prediction; a net-negative pair of
    /// offsets leaves the raw coordinate distance in place.
    pub fn distance(&self, other: &Self) -> f64 {
        let dist = self.coordinate.distance(&other.coordinate);
        if W > 0 {
            dist.max(dist + self.adjustment + other.adjustment)
        } else {
            dist
        }
    }

    /// The inner coordinate.
    pub fn coordinate(&self) -> &Coordinate<D> {
        &self.coordinate
    }

    /// Mutable access to the inner coordinate, e.g. to seed a position.
    pub fn coordinate_mut(&mut self) -> &mut Coordinate<D> {
        &mut self.coordinate
    }

    /// The current adjustment offset, in seconds. Zero when `W = 0`.
    pub fn adjustment(&self) -> f64 {
        self.adjustment
    }
}

impl<const D: usize, const W: usize> Default for Node<D, W> {
    fn default() -> Self {
        Self::new()
    }
}
