//! Vivaldi coordinate with height and error estimate
//!
//! A coordinate is a point in a height-augmented Euclidean space. The
//! Euclidean part models the latency of the network core; the height models
//! the latency of the access link, which every path through the node pays.
//! Distance model: `||v1 - v2|| + h1 + h2`, all quantities in seconds.

use nalgebra::SVector;
use rand::Rng;
use tracing::trace;

use crate::core::{CoordinateParams, ZERO_THRESHOLD};

/// A network coordinate in `D` Euclidean dimensions plus height.
///
/// The coordinate carries its own error estimate, which weighs how strongly
/// an observation moves it: a confident coordinate resists updates against a
/// poorly-converged remote, and vice versa.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate<const D: usize> {
    vector: SVector<f64, D>,
    height: f64,
    error: f64,
    params: CoordinateParams,
}

impl<const D: usize> Coordinate<D> {
    /// Create a coordinate at the origin with the default tuning parameters.
    pub fn new() -> Self {
        Self::with_params(CoordinateParams::default())
    }

    /// Create a coordinate at the origin with explicit tuning parameters.
    ///
    /// Panics if `D` is zero or any parameter is out of range.
    pub fn with_params(params: CoordinateParams) -> Self {
        assert!(D >= 1, "coordinate dimensionality must be at least 1");
        params.validate();
        Self {
            vector: SVector::zeros(),
            height: params.min_height,
            error: params.max_error,
            params,
        }
    }

    /// Predicted round-trip time to `other`, in seconds.
    ///
    /// Non-negative and symmetric; zero only when both vectors and both
    /// heights are equal (and the heights are zero).
    pub fn distance(&self, other: &Self) -> f64 {
        (self.vector - other.vector).norm() + self.height + other.height
    }

    /// Update this coordinate against an observed RTT, with no adjustments.
    pub fn update(&mut self, other: &Self, rtt: f64) {
        self.update_adjusted(other, rtt, 0.0, 0.0);
    }

    /// Update this coordinate against an observed RTT, folding in the hybrid
    /// adjustment offsets of both endpoints.
    pub fn update_adjusted(&mut self, other: &Self, rtt: f64, local_adj: f64, remote_adj: f64) {
        self.update_adjusted_with_rng(other, rtt, local_adj, remote_adj, &mut rand::thread_rng());
    }

    /// Update with a caller-supplied random source.
    ///
    /// The random source is only consumed when this coordinate and `other`
    /// occupy the same point and a direction must be invented. Seeding it
    /// makes update sequences reproducible.
    ///
    /// Panics if `rtt` is NaN or infinite.
    pub fn update_adjusted_with_rng<R: Rng>(
        &mut self,
        other: &Self,
        rtt: f64,
        local_adj: f64,
        remote_adj: f64,
        rng: &mut R,
    ) {
        assert!(rtt.is_finite(), "rtt must be finite, got {}", rtt);

        // Adjustments may only inflate the effective distance, never shrink
        // or invert it.
        let dist = self.distance(other);
        let dist = dist.max(dist + local_adj + remote_adj);
        let rtt = rtt.max(ZERO_THRESHOLD);

        let relative_error = (dist - rtt).abs() / rtt;

        // Weight by confidence: when both error estimates are zero the
        // weight is zero and the spring step is a no-op.
        let weight = self.error / (self.error + other.error).max(ZERO_THRESHOLD);

        let ce = self.params.ce;
        self.error = (relative_error * ce * weight + self.error * (1.0 - ce * weight))
            .min(self.params.max_error);

        // Positive force pushes the endpoints apart, negative pulls them
        // together.
        let force = self.params.cc * weight * (rtt - dist);
        self.apply_force(other, force, rng);

        // Gravity: a gentle pull toward the origin, quadratic in distance,
        // that keeps the coordinate cloud from drifting translationally.
        // The origin is constructed per update; it is never shared state.
        let origin = Self::with_params(self.params);
        let gravity_dist = self.distance(&origin);
        let gravity_dist = gravity_dist.max(gravity_dist + local_adj);
        let gravity = -(gravity_dist / self.params.rho).powi(2);
        self.apply_force(&origin, gravity, rng);

        self.assert_finite();
    }

    /// Move this coordinate along the direction away from `other` by `force`
    /// seconds, and drag the height along with it.
    fn apply_force<R: Rng>(&mut self, other: &Self, force: f64, rng: &mut R) {
        let (unit, mag) = unit_vector_from(&other.vector, &self.vector, rng);
        self.vector += unit * force;
        if mag > ZERO_THRESHOLD {
            // The trailing `+ height` keeps repeated attractive forces from
            // collapsing the height to zero.
            self.height = ((self.height + other.height) * force / mag + self.height)
                .max(self.params.min_height);
        }
    }

    /// The Euclidean component.
    pub fn vector(&self) -> &SVector<f64, D> {
        &self.vector
    }

    /// The height component, in seconds.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// The current error estimate.
    pub fn error(&self) -> f64 {
        self.error
    }

    /// The tuning parameters this coordinate was built with.
    pub fn params(&self) -> &CoordinateParams {
        &self.params
    }

    /// Place the Euclidean component directly, e.g. to seed a simulation.
    ///
    /// Panics if any component is not finite.
    pub fn set_vector(&mut self, vector: SVector<f64, D>) {
        assert!(
            vector.iter().all(|v| v.is_finite()),
            "coordinate components must be finite"
        );
        self.vector = vector;
    }

    /// Set the height directly. Clamped to the configured minimum.
    ///
    /// Panics if `height` is not finite.
    pub fn set_height(&mut self, height: f64) {
        assert!(height.is_finite(), "height must be finite, got {}", height);
        self.height = height.max(self.params.min_height);
    }

    /// Halt on corrupted state: every field must stay finite, the height at
    /// or above its floor, the error at or below its ceiling.
    fn assert_finite(&self) {
        assert!(
            self.vector.iter().all(|v| v.is_finite()),
            "coordinate vector became non-finite: {:?}",
            self.vector
        );
        assert!(
            self.height.is_finite() && self.height >= self.params.min_height,
            "coordinate height became invalid: {}",
            self.height
        );
        assert!(
            self.error.is_finite() && self.error <= self.params.max_error,
            "coordinate error became invalid: {}",
            self.error
        );
    }
}

impl<const D: usize> Default for Coordinate<D> {
    fn default() -> Self {
        Self::new()
    }
}

/// Unit vector pointing from `src` toward `dest`, and the magnitude of the
/// difference.
///
/// When the two points coincide the direction is invented: each component is
/// drawn uniformly from [-0.5, 0.5) so coincident coordinates still push
/// apart in some arbitrary direction, and the reported magnitude is zero
/// because the real separation is zero. A fixed axis direction is the last
/// resort for the (improbable) all-zero draw.
fn unit_vector_from<const D: usize, R: Rng>(
    src: &SVector<f64, D>,
    dest: &SVector<f64, D>,
    rng: &mut R,
) -> (SVector<f64, D>, f64) {
    let diff = dest - src;
    let mag = diff.norm();
    if mag > ZERO_THRESHOLD {
        return (diff / mag, mag);
    }

    trace!("coincident coordinates, choosing a random direction");
    let random: SVector<f64, D> = SVector::from_fn(|_, _| rng.gen::<f64>() - 0.5);
    let mag = random.norm();
    if mag > ZERO_THRESHOLD {
        return (random / mag, 0.0);
    }

    let mut axis = SVector::zeros();
    axis[0] = 1.0;
    (axis, 0.0)
}
