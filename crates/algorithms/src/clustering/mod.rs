//! Spatial clustering of candidate points
//!
//! - **kdtree**: 2D k-d tree for fixed-radius queries
//! - **dbscan**: density-based clustering with a noise label

mod dbscan;
mod kdtree;

pub use dbscan::{dbscan, Clustering, Dbscan, DbscanParams};
pub use kdtree::KdTree;
