//! # Canopy Core
//!
//! Core types, traits and I/O for the canopy tree-delineation engine.
//!
//! This crate provides:
//! - `Raster<T>`: Generic georeferenced grid (ground, surface, height model, labels)
//! - `GeoTransform`: Axis-aligned affine georeferencing
//! - `CRS`: Coordinate reference system identifiers
//! - `Error`: The error taxonomy shared by every stage
//! - GeoTIFF raster I/O and GeoJSON feature output

pub mod crs;
pub mod error;
pub mod io;
pub mod raster;
pub mod vector;

pub use crs::CRS;
pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster, RasterElement};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
    pub use crate::Algorithm;
}

/// Core trait for the processing stages in canopy.
///
/// A stage is a pure function of its input and an explicit parameter value.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
