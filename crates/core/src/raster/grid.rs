//! Main Raster type

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, RasterElement};
use ndarray::{s, Array2, ArrayView2, ArrayViewMut2};

/// A georeferenced 2D raster grid.
///
/// `Raster<T>` stores values of type `T` in a 2D grid with associated
/// geographic metadata (transform, CRS and nodata sentinel).
///
/// # Example
///
/// ```ignore
/// use canopy_core::Raster;
///
/// // 100x100 surface model at 0.1 m
/// let mut dsm: Raster<f64> = Raster::new(100, 100);
/// dsm.set_transform(GeoTransform::new(500_000.0, 4_600_010.0, 0.1, -0.1));
/// dsm.set(10, 20, 142.0)?;
/// ```
#[derive(Debug, Clone)]
pub struct Raster<T: RasterElement> {
    /// Raster data stored in row-major order (row, col)
    data: Array2<T>,
    /// Affine transformation
    transform: GeoTransform,
    /// Coordinate reference system
    crs: Option<CRS>,
    /// No-data value
    nodata: Option<T>,
}

impl<T: RasterElement> Raster<T> {
    /// Create a new raster filled with zeros
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::from_array(Array2::zeros((rows, cols)))
    }

    /// Create a new raster filled with a specific value
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self::from_array(Array2::from_elem((rows, cols), value))
    }

    /// Create a raster from existing row-major data
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }

        let array = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;

        Ok(Self::from_array(array))
    }

    /// Create a raster from an ndarray
    pub fn from_array(data: Array2<T>) -> Self {
        Self {
            data,
            transform: GeoTransform::default(),
            crs: None,
            nodata: None,
        }
    }

    /// Create a raster with the same georeferencing but a different cell type
    pub fn with_same_meta<U: RasterElement>(&self, rows: usize, cols: usize) -> Raster<U> {
        Raster {
            data: Array2::zeros((rows, cols)),
            transform: self.transform,
            crs: self.crs.clone(),
            nodata: None,
        }
    }

    /// Wrap `data` with this raster's georeferencing
    pub fn with_data<U: RasterElement>(&self, data: Array2<U>, nodata: Option<U>) -> Result<Raster<U>> {
        if data.dim() != self.shape() {
            let (ar, ac) = data.dim();
            return Err(Error::SizeMismatch {
                er: self.rows(),
                ec: self.cols(),
                ar,
                ac,
            });
        }
        Ok(Raster {
            data,
            transform: self.transform,
            crs: self.crs.clone(),
            nodata,
        })
    }

    // Dimensions

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the raster is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // Data access

    /// Get value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Get value at (row, col) without bounds checking
    ///
    /// # Safety
    /// Caller must ensure row < self.rows() and col < self.cols()
    pub unsafe fn get_unchecked(&self, row: usize, col: usize) -> T {
        unsafe { *self.data.uget((row, col)) }
    }

    /// Set value at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        if row >= self.rows() || col >= self.cols() {
            return Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        self.data[(row, col)] = value;
        Ok(())
    }

    /// Get a view of the underlying data
    pub fn view(&self) -> ArrayView2<'_, T> {
        self.data.view()
    }

    /// Get a mutable view of the underlying data
    pub fn view_mut(&mut self) -> ArrayViewMut2<'_, T> {
        self.data.view_mut()
    }

    /// Get a reference to the underlying array
    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    /// Get a mutable reference to the underlying array
    pub fn data_mut(&mut self) -> &mut Array2<T> {
        &mut self.data
    }

    /// Consume the raster and return the underlying array
    pub fn into_array(self) -> Array2<T> {
        self.data
    }

    /// Copy a rectangular sub-window, keeping it georeferenced.
    ///
    /// The window's transform is shifted so that its pixel (0, 0) maps to the
    /// same location as (`row_offset`, `col_offset`) in this raster.
    pub fn window(&self, row_offset: usize, col_offset: usize, rows: usize, cols: usize) -> Result<Raster<T>> {
        let row_end = row_offset + rows;
        let col_end = col_offset + cols;
        if rows == 0 || cols == 0 || row_end > self.rows() || col_end > self.cols() {
            return Err(Error::IndexOutOfBounds {
                row: row_end,
                col: col_end,
                rows: self.rows(),
                cols: self.cols(),
            });
        }

        Ok(Raster {
            data: self.data.slice(s![row_offset..row_end, col_offset..col_end]).to_owned(),
            transform: self.transform.offset(row_offset, col_offset),
            crs: self.crs.clone(),
            nodata: self.nodata,
        })
    }

    // Metadata

    /// Get the geotransform
    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Set the geotransform
    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    /// Get the CRS
    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    /// Set the CRS
    pub fn set_crs(&mut self, crs: Option<CRS>) {
        self.crs = crs;
    }

    /// Get the no-data value
    pub fn nodata(&self) -> Option<T> {
        self.nodata
    }

    /// Set the no-data value
    pub fn set_nodata(&mut self, nodata: Option<T>) {
        self.nodata = nodata;
    }

    /// Ground resolution of one cell
    pub fn resolution(&self) -> f64 {
        self.transform.resolution()
    }

    /// Geographic bounds (min_x, min_y, max_x, max_y)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.transform.bounds(self.cols(), self.rows())
    }

    // Coordinate conversion

    /// Convert pixel coordinates to geographic coordinates (cell center)
    pub fn pixel_to_geo(&self, col: usize, row: usize) -> (f64, f64) {
        self.transform.pixel_to_geo(col, row)
    }

    /// Convert geographic coordinates to fractional pixel coordinates
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        self.transform.geo_to_pixel(x, y)
    }

    // Value checks

    /// Check if a value is no-data
    pub fn is_nodata(&self, value: T) -> bool {
        value.is_nodata(self.nodata)
    }

    /// Check if cell at (row, col) contains no-data
    pub fn is_nodata_at(&self, row: usize, col: usize) -> Result<bool> {
        let value = self.get(row, col)?;
        Ok(self.is_nodata(value))
    }

    // Statistics

    /// Calculate min, max, mean and population standard deviation of valid cells
    pub fn statistics(&self) -> RasterStatistics<T> {
        let mut min: Option<T> = None;
        let mut max: Option<T> = None;
        let mut sum: f64 = 0.0;
        let mut sum_sq: f64 = 0.0;
        let mut count: usize = 0;

        for &value in self.data.iter() {
            if self.is_nodata(value) {
                continue;
            }

            if min.is_none_or(|m| value < m) {
                min = Some(value);
            }
            if max.is_none_or(|m| value > m) {
                max = Some(value);
            }

            if let Some(v) = value.to_f64() {
                sum += v;
                sum_sq += v * v;
                count += 1;
            }
        }

        let (mean, std_dev) = if count > 0 {
            let mean = sum / count as f64;
            let variance = (sum_sq / count as f64 - mean * mean).max(0.0);
            (Some(mean), Some(variance.sqrt()))
        } else {
            (None, None)
        };

        RasterStatistics {
            min,
            max,
            mean,
            std_dev,
            valid_count: count,
            nodata_count: self.len() - count,
        }
    }
}

impl Raster<f64> {
    /// Replace the nodata sentinel with NaN so that invalid cells propagate
    /// through arithmetic.
    pub fn normalized_nodata(&self) -> Raster<f64> {
        let nodata = self.nodata;
        let data = self
            .data
            .mapv(|v| if v.is_nodata(nodata) { f64::NAN } else { v });
        Raster {
            data,
            transform: self.transform,
            crs: self.crs.clone(),
            nodata: Some(f64::NAN),
        }
    }

    /// Number of finite cells
    pub fn finite_count(&self) -> usize {
        self.data.iter().filter(|v| v.is_finite()).count()
    }
}

/// Basic statistics for a raster
#[derive(Debug, Clone)]
pub struct RasterStatistics<T> {
    pub min: Option<T>,
    pub max: Option<T>,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
    pub valid_count: usize,
    pub nodata_count: usize,
}
