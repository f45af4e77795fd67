//! Affine geotransformation for rasters

use serde::{Deserialize, Serialize};

/// Affine transformation coefficients for georeferencing rasters.
///
/// Converts between pixel coordinates (col, row) and geographic coordinates (x, y):
/// ```text
/// x = origin_x + col * pixel_width + row * row_rotation
/// y = origin_y + col * col_rotation + row * pixel_height
/// ```
///
/// Height grids are north-up: rotations are 0 and `pixel_height` is negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner
    pub origin_y: f64,
    /// Pixel width (cell size in X direction)
    pub pixel_width: f64,
    /// Pixel height (cell size in Y direction, usually negative)
    pub pixel_height: f64,
    /// Rotation about X axis (usually 0)
    pub row_rotation: f64,
    /// Rotation about Y axis (usually 0)
    pub col_rotation: f64,
}

impl GeoTransform {
    /// Create a new GeoTransform with no rotation (north-up image)
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
            row_rotation: 0.0,
            col_rotation: 0.0,
        }
    }

    /// Convert pixel coordinates to geographic coordinates
    ///
    /// Returns the coordinates of the pixel center
    pub fn pixel_to_geo(&self, col: usize, row: usize) -> (f64, f64) {
        self.fractional_to_geo(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// Convert fractional pixel coordinates (corner based) to geographic coordinates
    pub fn fractional_to_geo(&self, col: f64, row: f64) -> (f64, f64) {
        let x = self.origin_x + col * self.pixel_width + row * self.row_rotation;
        let y = self.origin_y + col * self.col_rotation + row * self.pixel_height;
        (x, y)
    }

    /// Convert geographic coordinates to pixel coordinates
    ///
    /// Returns fractional pixel coordinates; use `.floor()` to get integer indices
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let det = self.determinant();

        if det.abs() < 1e-12 {
            return (f64::NAN, f64::NAN);
        }

        let dx = x - self.origin_x;
        let dy = y - self.origin_y;

        let col = (self.pixel_height * dx - self.row_rotation * dy) / det;
        let row = (-self.col_rotation * dx + self.pixel_width * dy) / det;

        (col, row)
    }

    /// Determinant of the linear part; zero means the cells have no area
    pub fn determinant(&self) -> f64 {
        self.pixel_width * self.pixel_height - self.row_rotation * self.col_rotation
    }

    /// Ground resolution of one cell: the coarser of the two axes.
    pub fn resolution(&self) -> f64 {
        self.pixel_width.abs().max(self.pixel_height.abs())
    }

    /// Check if this is an axis-aligned (unrotated) transform
    pub fn is_axis_aligned(&self) -> bool {
        self.row_rotation.abs() < 1e-10 && self.col_rotation.abs() < 1e-10
    }

    /// Transform of a sub-window starting at (`row_offset`, `col_offset`)
    pub fn offset(&self, row_offset: usize, col_offset: usize) -> Self {
        let (origin_x, origin_y) = self.fractional_to_geo(col_offset as f64, row_offset as f64);
        Self {
            origin_x,
            origin_y,
            ..*self
        }
    }

    /// Whether two transforms describe the same grid lattice
    pub fn approx_eq(&self, other: &GeoTransform, tolerance: f64) -> bool {
        (self.origin_x - other.origin_x).abs() <= tolerance
            && (self.origin_y - other.origin_y).abs() <= tolerance
            && (self.pixel_width - other.pixel_width).abs() <= tolerance
            && (self.pixel_height - other.pixel_height).abs() <= tolerance
            && (self.row_rotation - other.row_rotation).abs() <= tolerance
            && (self.col_rotation - other.col_rotation).abs() <= tolerance
    }

    /// Calculate the bounding box (min_x, min_y, max_x, max_y) for a raster of given dimensions
    pub fn bounds(&self, width: usize, height: usize) -> (f64, f64, f64, f64) {
        let corners = [
            self.fractional_to_geo(0.0, 0.0),
            self.fractional_to_geo(width as f64, 0.0),
            self.fractional_to_geo(0.0, height as f64),
            self.fractional_to_geo(width as f64, height as f64),
        ];

        corners.iter().fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(min_x, min_y, max_x, max_y), &(x, y)| {
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            },
        )
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pixel_center_inverse() {
        let gt = GeoTransform::new(500_000.0, 4_600_000.0, 0.1, -0.1);

        let (x, y) = gt.pixel_to_geo(5, 10);
        assert_relative_eq!(x, 500_000.55, epsilon = 1e-6);
        assert_relative_eq!(y, 4_599_998.95, epsilon = 1e-6);

        let (col, row) = gt.geo_to_pixel(x, y);
        assert_relative_eq!(col, 5.5, epsilon = 1e-6);
        assert_relative_eq!(row, 10.5, epsilon = 1e-6);
    }

    #[test]
    fn test_resolution_takes_coarser_axis() {
        let gt = GeoTransform::new(0.0, 0.0, 0.5, -0.25);
        assert_relative_eq!(gt.resolution(), 0.5);
    }

    #[test]
    fn test_offset_window() {
        let gt = GeoTransform::new(100.0, 200.0, 2.0, -2.0);
        let tile = gt.offset(10, 5);
        assert_relative_eq!(tile.origin_x, 110.0);
        assert_relative_eq!(tile.origin_y, 180.0);
        assert_eq!(tile.pixel_to_geo(0, 0), gt.pixel_to_geo(5, 10));
    }

    #[test]
    fn test_bounds() {
        let gt = GeoTransform::new(0.0, 100.0, 1.0, -1.0);
        let (min_x, min_y, max_x, max_y) = gt.bounds(100, 50);

        assert_relative_eq!(min_x, 0.0);
        assert_relative_eq!(min_y, 50.0);
        assert_relative_eq!(max_x, 100.0);
        assert_relative_eq!(max_y, 100.0);
    }

    #[test]
    fn test_degenerate_inverse() {
        let gt = GeoTransform::new(0.0, 0.0, 0.0, -1.0);
        let (col, row) = gt.geo_to_pixel(1.0, 1.0);
        assert!(col.is_nan() && row.is_nan());
    }
}
