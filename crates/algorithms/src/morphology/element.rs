//! Structuring element definitions for morphological operations
//!
//! A structuring element defines the window used in erosion, dilation and
//! the derived transforms. Window sizes follow the usual image-filter
//! convention: a window of edge `n` centers on the cell when `n` is odd and
//! leans towards the upper-left when `n` is even.

use canopy_core::raster::Neighborhood;
use canopy_core::{Error, Result};

/// Shape of a structuring element for morphological operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuringElement {
    /// Square window with the given edge length in cells
    Square(usize),
    /// Rectangular window of `rows x cols` cells
    Rect { rows: usize, cols: usize },
}

impl Default for StructuringElement {
    fn default() -> Self {
        StructuringElement::Square(3)
    }
}

impl StructuringElement {
    /// Validate the structuring element, returning an error for empty windows
    pub fn validate(&self) -> Result<()> {
        let (rows, cols) = self.size();
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidParameter {
                name: "window",
                value: format!("{}x{}", rows, cols),
                reason: "structuring element must cover at least one cell".to_string(),
            });
        }
        Ok(())
    }

    /// Window size as (rows, cols)
    pub fn size(&self) -> (usize, usize) {
        match *self {
            StructuringElement::Square(n) => (n, n),
            StructuringElement::Rect { rows, cols } => (rows, cols),
        }
    }

    /// Inclusive `((row_min, row_max), (col_min, col_max))` offsets
    /// relative to the anchor cell
    pub fn extent(&self) -> ((isize, isize), (isize, isize)) {
        let (rows, cols) = self.size();
        Neighborhood::Rect { rows, cols }.extent()
    }
}
