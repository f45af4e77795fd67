//! # Canopy Parallel
//!
//! Block tiling and execution strategies for the canopy pipeline.
//!
//! This crate provides:
//! - Tiling of large height grids into fixed-size blocks
//! - Order-preserving tile execution, sequential or on a Rayon pool

pub mod strategy;
pub mod tiled;

pub use strategy::{ParallelStrategy, ProcessingMode};
pub use tiled::{Tile, TileIterator};
