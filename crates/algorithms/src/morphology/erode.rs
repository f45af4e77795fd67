//! Morphological erosion (minimum filter)
//!
//! Replaces each pixel with the minimum value in its window. Shrinks
//! bright regions and enlarges dark regions.

use canopy_core::raster::Raster;
use canopy_core::{Algorithm, Error, Result};

use super::element::StructuringElement;
use super::filter::extreme_filter;

/// Parameters for morphological erosion
#[derive(Debug, Clone, Default)]
pub struct ErodeParams {
    /// Structuring element shape
    pub element: StructuringElement,
}

/// Erosion algorithm
#[derive(Debug, Clone, Default)]
pub struct Erode;

impl Algorithm for Erode {
    type Input = Raster<f64>;
    type Output = Raster<f64>;
    type Params = ErodeParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Erode"
    }

    fn description(&self) -> &'static str {
        "Morphological erosion (minimum filter over structuring element)"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        erode(&input, &params.element)
    }
}

/// Perform morphological erosion on a raster
///
/// Each output pixel is the minimum of the valid cells within its window.
/// Windows are clipped at the raster edge, nodata neighbors are ignored and
/// nodata cells stay nodata.
pub fn erode(raster: &Raster<f64>, element: &StructuringElement) -> Result<Raster<f64>> {
    extreme_filter(raster, element, |v, best| v < best)
}
