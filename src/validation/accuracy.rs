//! Convergence validation over simulated network topologies
//!
//! Generates RTT matrices for reference topologies, drives a population of
//! nodes through seeded observation cycles (each raw RTT passes through a
//! small median filter first, as a deployment would do), and reports how
//! well the resulting embedding predicts the true RTTs.

use rand::Rng;

use crate::algorithms::Node;
use crate::core::DEFAULT_FILTER_WINDOW;
use crate::processing::LatencyFilter;

/// Accuracy of an embedding against the true RTT matrix.
#[derive(Debug, Clone, Copy)]
pub struct ConvergenceStats {
    /// Mean of |predicted - true| / true over all distinct pairs.
    pub mean_relative_error: f64,
    /// Worst relative error over all distinct pairs.
    pub max_relative_error: f64,
    /// Number of pairs evaluated.
    pub pair_count: usize,
}

/// RTT matrix for `nodes` peers evenly spaced on a line, in seconds.
pub fn generate_line(nodes: usize, spacing: f64) -> Vec<Vec<f64>> {
    let mut rtt = vec![vec![0.0; nodes]; nodes];
    for i in 0..nodes {
        for j in (i + 1)..nodes {
            let dist = (j - i) as f64 * spacing;
            rtt[i][j] = dist;
            rtt[j][i] = dist;
        }
    }
    rtt
}

/// RTT matrix for `side * side` peers on a square grid, in seconds.
pub fn generate_grid(side: usize, spacing: f64) -> Vec<Vec<f64>> {
    let nodes = side * side;
    let mut rtt = vec![vec![0.0; nodes]; nodes];
    for i in 0..nodes {
        for j in (i + 1)..nodes {
            let (x1, y1) = ((i / side) as f64, (i % side) as f64);
            let (x2, y2) = ((j / side) as f64, (j % side) as f64);
            let dist = ((x1 - x2).powi(2) + (y1 - y2).powi(2)).sqrt() * spacing;
            rtt[i][j] = dist;
            rtt[j][i] = dist;
        }
    }
    rtt
}

/// RTT matrix for two half-populations with a short intra-cluster latency
/// and a longer cross-cluster latency, in seconds.
pub fn generate_clusters(nodes: usize, local: f64, cross: f64) -> Vec<Vec<f64>> {
    let split = nodes / 2;
    let mut rtt = vec![vec![0.0; nodes]; nodes];
    for i in 0..nodes {
        for j in (i + 1)..nodes {
            let dist = if (i < split) == (j < split) {
                local
            } else {
                cross
            };
            rtt[i][j] = dist;
            rtt[j][i] = dist;
        }
    }
    rtt
}

/// RTT matrix for peers on a circle with node 0 in the center, in seconds.
///
/// Rim-to-rim latencies are the chord lengths, but the center node is a full
/// diameter away from every rim node. That is further than any planar point
/// can be from all of them at once, so the center can only absorb the excess
/// in its height.
pub fn generate_circle(nodes: usize, radius: f64) -> Vec<Vec<f64>> {
    let mut rtt = vec![vec![0.0; nodes]; nodes];
    let rim = nodes - 1;
    for i in 0..nodes {
        for j in (i + 1)..nodes {
            let dist = if i == 0 {
                2.0 * radius
            } else {
                let t1 = 2.0 * std::f64::consts::PI * (i - 1) as f64 / rim as f64;
                let t2 = 2.0 * std::f64::consts::PI * (j - 1) as f64 / rim as f64;
                let (x1, y1) = (radius * t1.cos(), radius * t1.sin());
                let (x2, y2) = (radius * t2.cos(), radius * t2.sin());
                ((x1 - x2).powi(2) + (y1 - y2).powi(2)).sqrt()
            };
            rtt[i][j] = dist;
            rtt[j][i] = dist;
        }
    }
    rtt
}

/// Drive the node population for `cycles` rounds of observations.
///
/// Each round, every node observes one randomly chosen peer; the raw RTT is
/// smoothed by a per-pair median filter before it reaches the update.
pub fn simulate<const D: usize, const W: usize, R: Rng>(
    nodes: &mut [Node<D, W>],
    rtt: &[Vec<f64>],
    cycles: usize,
    rng: &mut R,
) {
    let mut filter: LatencyFilter<(usize, usize), f64, DEFAULT_FILTER_WINDOW> =
        LatencyFilter::new();
    let count = nodes.len();
    for _ in 0..cycles {
        for i in 0..count {
            let mut j = rng.gen_range(0..count);
            while j == i {
                j = rng.gen_range(0..count);
            }
            let filtered = filter.push((i, j), rtt[i][j]);
            let remote = nodes[j];
            nodes[i].update_with_rng(&remote, filtered, rng);
        }
    }
}

/// Compare every distinct pair's predicted distance to the true RTT.
pub fn evaluate<const D: usize, const W: usize>(
    nodes: &[Node<D, W>],
    rtt: &[Vec<f64>],
) -> ConvergenceStats {
    let mut sum = 0.0;
    let mut max = 0.0f64;
    let mut pairs = 0usize;
    for i in 0..nodes.len() {
        for j in (i + 1)..nodes.len() {
            let actual = rtt[i][j];
            if actual <= 0.0 {
                continue;
            }
            let predicted = nodes[i].distance(&nodes[j]);
            let error = (predicted - actual).abs() / actual;
            sum += error;
            max = max.max(error);
            pairs += 1;
        }
    }
    ConvergenceStats {
        mean_relative_error: if pairs > 0 { sum / pairs as f64 } else { 0.0 },
        max_relative_error: max,
        pair_count: pairs,
    }
}

/// Distance of the population centroid from the origin, over the Euclidean
/// components only.
pub fn centroid_distance<const D: usize, const W: usize>(nodes: &[Node<D, W>]) -> f64 {
    let mut centroid = nalgebra::SVector::<f64, D>::zeros();
    for node in nodes {
        centroid += *node.coordinate().vector();
    }
    centroid /= nodes.len() as f64;
    centroid.norm()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::SVector;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    const DIMS: usize = 8;
    const WINDOW: usize = 20;

    fn population(count: usize) -> Vec<Node<DIMS, WINDOW>> {
        vec![Node::new(); count]
    }

    #[test]
    fn test_matrix_generators_are_symmetric() {
        for rtt in [
            generate_line(10, 0.01),
            generate_grid(5, 0.01),
            generate_clusters(25, 0.001, 0.011),
            generate_circle(25, 0.1),
        ] {
            for i in 0..rtt.len() {
                assert_eq!(rtt[i][i], 0.0);
                for j in 0..rtt.len() {
                    assert_eq!(rtt[i][j], rtt[j][i]);
                    if i != j {
                        assert!(rtt[i][j] > 0.0);
                    }
                }
            }
        }
    }

    #[test]
    fn test_circle_center_is_a_diameter_from_rim() {
        let rtt = generate_circle(25, 0.1);
        for j in 1..25 {
            assert!((rtt[0][j] - 0.2).abs() < 1e-12);
        }
    }

    #[test]
    fn test_convergence_line() {
        let rtt = generate_line(10, 0.01);
        let mut nodes = population(10);
        let mut rng = StdRng::seed_from_u64(1);
        simulate(&mut nodes, &rtt, 5000, &mut rng);

        let stats = evaluate(&nodes, &rtt);
        assert!(
            stats.mean_relative_error <= 0.0025,
            "line mean error too high: {}",
            stats.mean_relative_error
        );
        assert!(
            stats.max_relative_error <= 0.01,
            "line max error too high: {}",
            stats.max_relative_error
        );
    }

    #[test]
    fn test_convergence_grid() {
        let rtt = generate_grid(5, 0.01);
        let mut nodes = population(25);
        let mut rng = StdRng::seed_from_u64(1);
        simulate(&mut nodes, &rtt, 6000, &mut rng);

        let stats = evaluate(&nodes, &rtt);
        assert!(
            stats.mean_relative_error <= 0.0015,
            "grid mean error too high: {}",
            stats.mean_relative_error
        );
        assert!(
            stats.max_relative_error <= 0.022,
            "grid max error too high: {}",
            stats.max_relative_error
        );
    }

    #[test]
    fn test_convergence_clusters() {
        let rtt = generate_clusters(25, 0.001, 0.011);
        let mut nodes = population(25);
        let mut rng = StdRng::seed_from_u64(1);
        simulate(&mut nodes, &rtt, 1000, &mut rng);

        // Residual error on the 1 ms intra-cluster paths is dominated by
        // slow height jitter around the floor, so the bounds leave room for
        // it while still demanding sub-percent accuracy.
        let stats = evaluate(&nodes, &rtt);
        assert!(
            stats.mean_relative_error <= 0.01,
            "cluster mean error too high: {}",
            stats.mean_relative_error
        );
        assert!(
            stats.max_relative_error <= 0.1,
            "cluster max error too high: {}",
            stats.max_relative_error
        );

        // Every node ends up carrying half of the non-Euclidean excess of
        // the cross-cluster paths in its adjustment term.
        for node in &nodes {
            assert!(
                (0.0003..=0.0006).contains(&node.adjustment()),
                "adjustment out of band: {}",
                node.adjustment()
            );
        }
    }

    #[test]
    fn test_convergence_circle_pushes_center_height() {
        // Two planar dimensions: the center node is a full diameter from
        // every rim node, which no planar position can satisfy, so the
        // excess has to surface as height.
        let radius = 0.1;
        let rtt = generate_circle(25, radius);
        let mut nodes: Vec<Node<2, WINDOW>> = vec![Node::new(); 25];
        let mut rng = StdRng::seed_from_u64(1);
        simulate(&mut nodes, &rtt, 1000, &mut rng);

        assert!(
            nodes[0].coordinate().height() >= 0.97 * radius,
            "center height too low: {}",
            nodes[0].coordinate().height()
        );
        for node in &nodes[1..] {
            assert!(
                node.coordinate().height() <= 0.05 * radius,
                "rim height too high: {}",
                node.coordinate().height()
            );
        }

        let stats = evaluate(&nodes, &rtt);
        assert!(
            stats.mean_relative_error <= 0.025,
            "circle mean error too high: {}",
            stats.mean_relative_error
        );
        assert!(
            stats.max_relative_error <= 0.3,
            "circle max error too high: {}",
            stats.max_relative_error
        );
    }

    #[test]
    fn test_gravity_limits_drift() {
        // A square of nodes up in the first quadrant: the embedding is
        // self-consistent anywhere in the plane, so only gravity decides
        // where the cloud ends up.
        let side: f64 = 0.5;
        let corners = [[0.0, 0.0], [0.0, side], [side, side], [side, 0.0]];
        let mut rtt: Vec<Vec<f64>> = vec![vec![0.0; 4]; 4];
        for i in 0..4 {
            for j in 0..4 {
                let dx = corners[i][0] - corners[j][0];
                let dy = corners[i][1] - corners[j][1];
                rtt[i][j] = (dx * dx + dy * dy).sqrt();
            }
        }

        let mut nodes: Vec<Node<2, WINDOW>> = vec![Node::new(); 4];
        for (node, corner) in nodes.iter_mut().zip(&corners) {
            node.coordinate_mut()
                .set_vector(SVector::from([corner[0], corner[1]]));
        }

        let mut rng = StdRng::seed_from_u64(1);
        simulate(&mut nodes, &rtt, 1000, &mut rng);
        let baseline = centroid_distance(&nodes);

        simulate(&mut nodes, &rtt, 10_000, &mut rng);
        let drifted = centroid_distance(&nodes);
        assert!(
            drifted <= 0.81 * baseline,
            "centroid moved from {} to {}",
            baseline,
            drifted
        );
    }

    #[test]
    fn test_convergence_survives_measurement_noise() {
        let rtt = generate_clusters(25, 0.001, 0.011);
        let mut nodes = population(25);
        let mut rng = StdRng::seed_from_u64(1);
        let jitter = Normal::new(0.0, 0.0001).unwrap();

        let mut filter: LatencyFilter<(usize, usize), f64, DEFAULT_FILTER_WINDOW> =
            LatencyFilter::new();
        for _ in 0..1000 {
            for i in 0..25 {
                let mut j = rng.gen_range(0..25usize);
                while j == i {
                    j = rng.gen_range(0..25);
                }
                let noisy = (rtt[i][j] + jitter.sample(&mut rng)).max(1.0e-6);
                let filtered = filter.push((i, j), noisy);
                let remote = nodes[j];
                nodes[i].update_with_rng(&remote, filtered, &mut rng);
            }
        }

        let stats = evaluate(&nodes, &rtt);
        assert!(
            stats.mean_relative_error <= 0.05,
            "noisy cluster mean error too high: {}",
            stats.mean_relative_error
        );
    }
}
