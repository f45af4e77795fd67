//! Canopy height model: surface minus ground
//!
//! Heights are computed cell-wise on aligned grids. Nodata in either input
//! propagates as NaN, and negative heights are treated as registration noise
//! and cleared to NaN.

use canopy_core::raster::{Raster, RasterStatistics};
use canopy_core::{Algorithm, Error, Result};
use ndarray::Zip;

/// A canopy height grid with the bookkeeping of its construction
#[derive(Debug, Clone)]
pub struct HeightModel {
    /// Height above ground, NaN where invalid
    pub grid: Raster<f64>,
    /// Cells whose surface lay below the ground and were cleared
    pub negative_cells: usize,
}

impl HeightModel {
    /// Statistics over the finite heights
    pub fn statistics(&self) -> RasterStatistics<f64> {
        self.grid.statistics()
    }
}

/// Height model construction stage
#[derive(Debug, Clone, Default)]
pub struct HeightModelBuilder;

impl Algorithm for HeightModelBuilder {
    type Input = (Raster<f64>, Raster<f64>);
    type Output = HeightModel;
    type Params = ();
    type Error = Error;

    fn name(&self) -> &'static str {
        "Height Model Builder"
    }

    fn description(&self) -> &'static str {
        "Canopy height as surface minus ground, negatives cleared"
    }

    fn execute(&self, input: Self::Input, _params: Self::Params) -> Result<Self::Output> {
        let (ground, surface) = input;
        build_height_model(&ground, &surface)
    }
}

/// Compute `surface - ground` on two grids of identical shape.
///
/// The result carries the ground grid's georeferencing and a NaN nodata
/// value. Fails with [`Error::EmptyHeightModel`] when no finite height
/// remains.
pub fn build_height_model(ground: &Raster<f64>, surface: &Raster<f64>) -> Result<HeightModel> {
    if ground.shape() != surface.shape() {
        let (er, ec) = ground.shape();
        let (ar, ac) = surface.shape();
        return Err(Error::SizeMismatch { er, ec, ar, ac });
    }

    let ground = ground.normalized_nodata();
    let surface = surface.normalized_nodata();

    let mut heights = surface.data() - ground.data();
    let mut negative_cells = 0;
    Zip::from(&mut heights).for_each(|h| {
        if *h < 0.0 {
            *h = f64::NAN;
            negative_cells += 1;
        }
    });

    let grid = ground.with_data(heights, Some(f64::NAN))?;
    if grid.finite_count() == 0 {
        return Err(Error::EmptyHeightModel);
    }

    Ok(HeightModel { grid, negative_cells })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_elementwise_difference() {
        let ground = Raster::from_vec(vec![100.0, 101.0, 102.0, 103.0], 2, 2).unwrap();
        let surface = Raster::from_vec(vec![110.0, 101.0, 99.0, 120.5], 2, 2).unwrap();

        let model = build_height_model(&ground, &surface).unwrap();
        assert_relative_eq!(model.grid.get(0, 0).unwrap(), 10.0);
        assert_relative_eq!(model.grid.get(0, 1).unwrap(), 0.0);
        assert!(model.grid.get(1, 0).unwrap().is_nan());
        assert_relative_eq!(model.grid.get(1, 1).unwrap(), 17.5);
        assert_eq!(model.negative_cells, 1);
    }

    #[test]
    fn test_nodata_propagates() {
        let mut ground = Raster::from_vec(vec![-9999.0, 1.0, 1.0], 1, 3).unwrap();
        ground.set_nodata(Some(-9999.0));
        let surface = Raster::from_vec(vec![5.0, f64::NAN, 4.0], 1, 3).unwrap();

        let model = build_height_model(&ground, &surface).unwrap();
        assert!(model.grid.get(0, 0).unwrap().is_nan());
        assert!(model.grid.get(0, 1).unwrap().is_nan());
        assert_relative_eq!(model.grid.get(0, 2).unwrap(), 3.0);
        assert_eq!(model.negative_cells, 0);
        assert_eq!(model.statistics().valid_count, 1);
    }

    #[test]
    fn test_all_negative_is_empty() {
        let ground = Raster::filled(3, 3, 10.0);
        let surface = Raster::filled(3, 3, 5.0);
        let err = HeightModelBuilder.execute((ground, surface), ()).unwrap_err();
        assert!(matches!(err, Error::EmptyHeightModel));
    }

    #[test]
    fn test_shape_mismatch() {
        let ground: Raster<f64> = Raster::new(2, 2);
        let surface: Raster<f64> = Raster::new(2, 3);
        assert!(matches!(
            build_height_model(&ground, &surface),
            Err(Error::SizeMismatch { .. })
        ));
    }
}
