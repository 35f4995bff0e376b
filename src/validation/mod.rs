//! Embedding quality validation

pub mod accuracy;

pub use accuracy::{
    centroid_distance, evaluate, generate_circle, generate_clusters, generate_grid, generate_line,
    simulate, ConvergenceStats,
};
