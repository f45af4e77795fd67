//! Morphological closing (dilation followed by erosion)
//!
//! Fills small dark gaps and pits while preserving the overall shape of
//! larger dark regions. Over a canopy height surface this removes single
//! pixel dropouts between returns.

use canopy_core::raster::Raster;
use canopy_core::{Algorithm, Error, Result};

use super::dilate::dilate;
use super::element::StructuringElement;
use super::erode::erode;

/// Parameters for morphological closing
#[derive(Debug, Clone, Default)]
pub struct ClosingParams {
    /// Structuring element shape
    pub element: StructuringElement,
}

/// Closing algorithm
#[derive(Debug, Clone, Default)]
pub struct Closing;

impl Algorithm for Closing {
    type Input = Raster<f64>;
    type Output = Raster<f64>;
    type Params = ClosingParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Closing"
    }

    fn description(&self) -> &'static str {
        "Morphological closing (dilation then erosion) to fill small dark gaps"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        closing(&input, &params.element)
    }
}

/// Perform morphological closing on a raster
///
/// Closing = dilate then erode with the same window. With an even window
/// both passes lean the same way, so features shift by one cell towards the
/// lower-right.
pub fn closing(raster: &Raster<f64>, element: &StructuringElement) -> Result<Raster<f64>> {
    let dilated = dilate(raster, element)?;
    erode(&dilated, element)
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_core::GeoTransform;

    fn make_raster(rows: usize, cols: usize, value: f64) -> Raster<f64> {
        let mut r = Raster::filled(rows, cols, value);
        r.set_transform(GeoTransform::new(0.0, rows as f64, 1.0, -1.0));
        r
    }

    #[test]
    fn test_closing_uniform() {
        let raster = make_raster(11, 11, 5.0);
        let result = closing(&raster, &StructuringElement::Square(3)).unwrap();
        assert!((result.get(5, 5).unwrap() - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_closing_fills_dark_spot() {
        let mut raster = make_raster(11, 11, 100.0);
        raster.set(5, 5, 1.0).unwrap();

        let result = closing(&raster, &StructuringElement::Square(2)).unwrap();
        assert!(result.data().iter().all(|&v| (v - 100.0).abs() < 1e-10));
    }

    #[test]
    fn test_closing_preserves_large_dark_region() {
        let mut raster = make_raster(11, 11, 100.0);
        for r in 4..7 {
            for c in 4..7 {
                raster.set(r, c, 1.0).unwrap();
            }
        }

        let result = closing(&raster, &StructuringElement::Square(3)).unwrap();
        assert!((result.get(5, 5).unwrap() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_closing_even_window_shifts_peak() {
        let mut raster = make_raster(6, 6, 0.0);
        raster.set(2, 2, 8.0).unwrap();
        let result = closing(&raster, &StructuringElement::Square(2)).unwrap();
        assert_eq!(result.get(3, 3).unwrap(), 8.0);
        assert_eq!(result.get(2, 2).unwrap(), 0.0);
    }
}
