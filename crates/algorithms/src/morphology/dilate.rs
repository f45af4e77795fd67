//! Morphological dilation (maximum filter)
//!
//! Replaces each pixel with the maximum value in its window. Enlarges
//! bright regions and shrinks dark regions.

use canopy_core::raster::Raster;
use canopy_core::{Algorithm, Error, Result};

use super::element::StructuringElement;
use super::filter::extreme_filter;

/// Parameters for morphological dilation
#[derive(Debug, Clone, Default)]
pub struct DilateParams {
    /// Structuring element shape
    pub element: StructuringElement,
}

/// Dilation algorithm
#[derive(Debug, Clone, Default)]
pub struct Dilate;

impl Algorithm for Dilate {
    type Input = Raster<f64>;
    type Output = Raster<f64>;
    type Params = DilateParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Dilate"
    }

    fn description(&self) -> &'static str {
        "Morphological dilation (maximum filter over structuring element)"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        dilate(&input, &params.element)
    }
}

/// Perform morphological dilation on a raster
///
/// Each output pixel is the maximum of the valid cells within its window.
/// Windows are clipped at the raster edge, nodata neighbors are ignored and
/// nodata cells stay nodata.
pub fn dilate(raster: &Raster<f64>, element: &StructuringElement) -> Result<Raster<f64>> {
    extreme_filter(raster, element, |v, best| v > best)
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
    fn test_dilate_uniform() {
        let raster = make_raster(7, 7, 5.0);
        let result = dilate(&raster, &StructuringElement::Square(3)).unwrap();
        assert!(result.data().iter().all(|&v| (v - 5.0).abs() < 1e-10));
    }

    #[test]
    fn test_dilate_picks_maximum() {
        let mut raster = make_raster(7, 7, 5.0);
        raster.set(3, 4, 20.0).unwrap();

        let result = dilate(&raster, &StructuringElement::Square(3)).unwrap();
        assert_eq!(result.get(3, 3).unwrap(), 20.0);
        assert_eq!(result.get(3, 1).unwrap(), 5.0);
    }

    #[test]
    fn test_dilate_clips_at_edges() {
        let mut raster = make_raster(4, 4, 1.0);
        raster.set(0, 0, 9.0).unwrap();
        let result = dilate(&raster, &StructuringElement::Square(3)).unwrap();
        assert_eq!(result.get(0, 0).unwrap(), 9.0);
        assert_eq!(result.get(1, 1).unwrap(), 9.0);
        assert_eq!(result.get(2, 2).unwrap(), 1.0);
    }

    #[test]
    fn test_dilate_even_window_spreads_down_right() {
        let mut raster = make_raster(4, 4, 0.0);
        raster.set(1, 1, 3.0).unwrap();
        let result = dilate(&raster, &StructuringElement::Square(2)).unwrap();
        assert_eq!(result.get(2, 2).unwrap(), 3.0);
        assert_eq!(result.get(1, 2).unwrap(), 3.0);
        assert_eq!(result.get(0, 0).unwrap(), 0.0);
    }

    #[test]
    fn test_dilate_nodata() {
        let mut raster = make_raster(5, 5, 5.0);
        raster.set_nodata(Some(-9999.0));
        raster.set(2, 2, -9999.0).unwrap();

        let result = dilate(&raster, &StructuringElement::Square(3)).unwrap();
        assert!(result.get(2, 2).unwrap().is_nan());
        assert_eq!(result.get(2, 1).unwrap(), 5.0);
    }

    #[test]
    fn test_algorithm_trait() {
        let raster = make_raster(3, 3, 2.0);
        let result = Dilate.execute_default(raster).unwrap();
        assert_eq!(result.shape(), (3, 3));
        assert_eq!(Dilate.name(), "Dilate");
    }
}
