//! Block tiling for large height grids
//!
//! Tiles partition the grid into fixed-size, non-overlapping core windows
//! (edge tiles are smaller when the grid is not an exact multiple of the
//! tile size). An optional overlap widens each tile's read window so that
//! window operations see context across a seam, while every cell still
//! belongs to exactly one tile's core.

use canopy_core::raster::{Raster, RasterElement};
use canopy_core::{Error, Result};

/// A tile representing a subset of a raster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// Sequential index in row-major tile order
    pub index: usize,
    /// Row offset of the read window in the source raster
    pub row_offset: usize,
    /// Column offset of the read window in the source raster
    pub col_offset: usize,
    /// Number of rows in the read window
    pub rows: usize,
    /// Number of columns in the read window
    pub cols: usize,
    /// Core window (row_start, col_start, row_end, col_end), tile-local, end exclusive
    pub core: (usize, usize, usize, usize),
}

impl Tile {
    /// Whether the tile-local cell lies inside this tile's core window
    pub fn in_core(&self, local_row: usize, local_col: usize) -> bool {
        let (r0, c0, r1, c1) = self.core;
        (r0..r1).contains(&local_row) && (c0..c1).contains(&local_col)
    }

    /// Copy this tile's read window out of the source raster
    pub fn extract<T: RasterElement>(&self, source: &Raster<T>) -> Result<Raster<T>> {
        source.window(self.row_offset, self.col_offset, self.rows, self.cols)
    }
}

/// Iterator over tiles covering a raster
#[derive(Debug, Clone)]
pub struct TileIterator {
    total_rows: usize,
    total_cols: usize,
    tile_size: usize,
    overlap: usize,
    current_row: usize,
    current_col: usize,
    index: usize,
}

impl TileIterator {
    /// Create a new tile iterator. `tile_size` must be non-zero.
    pub fn new(total_rows: usize, total_cols: usize, tile_size: usize, overlap: usize) -> Result<Self> {
        if tile_size == 0 {
            return Err(Error::InvalidParameter {
                name: "tile_size",
                value: "0".to_string(),
                reason: "tile edge length must be at least 1 cell".to_string(),
            });
        }
        Ok(Self {
            total_rows,
            total_cols,
            tile_size,
            overlap,
            current_row: 0,
            current_col: 0,
            index: 0,
        })
    }

    /// Number of tiles along (rows, cols)
    pub fn grid_shape(&self) -> (usize, usize) {
        (
            self.total_rows.div_ceil(self.tile_size),
            self.total_cols.div_ceil(self.tile_size),
        )
    }
}

impl Iterator for TileIterator {
    type Item = Tile;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_row >= self.total_rows || self.total_cols == 0 {
            return None;
        }

        let core_row_end = (self.current_row + self.tile_size).min(self.total_rows);
        let core_col_end = (self.current_col + self.tile_size).min(self.total_cols);

        let row_start = self.current_row.saturating_sub(self.overlap);
        let col_start = self.current_col.saturating_sub(self.overlap);
        let row_end = (core_row_end + self.overlap).min(self.total_rows);
        let col_end = (core_col_end + self.overlap).min(self.total_cols);

        let tile = Tile {
            index: self.index,
            row_offset: row_start,
            col_offset: col_start,
            rows: row_end - row_start,
            cols: col_end - col_start,
            core: (
                self.current_row - row_start,
                self.current_col - col_start,
                core_row_end - row_start,
                core_col_end - col_start,
            ),
        };

        self.index += 1;
        self.current_col += self.tile_size;
        if self.current_col >= self.total_cols {
            self.current_col = 0;
            self.current_row += self.tile_size;
        }

        Some(tile)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (tr, tc) = self.grid_shape();
        let remaining = (tr * tc).saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TileIterator {}
