//! Per-tile apex candidate detection
//!
//! For one tile of the height model:
//! 1. denoise with a max-then-min filter over a small window
//! 2. find plateau-inclusive local maxima over a resolution-derived window
//! 3. keep maxima above a floor derived from the tile's height statistics
//! 4. flood the negated denoised heights from the labelled maxima
//! 5. trim each segment to its crown and emit one candidate per crown cell

use canopy_core::raster::{Neighborhood, Raster};
use canopy_core::{Algorithm, Error, Result};
use canopy_parallel::Tile;
use serde::Serialize;

use super::params::DetectionParams;
use crate::morphology::{closing, StructuringElement};
use crate::segmentation::{label_markers, local_maxima, trim_segments, watershed};

/// A georeferenced height sample emitted by the detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CandidatePoint {
    pub x: f64,
    pub y: f64,
    /// Height above ground, rounded to 0.1
    pub height: f64,
    /// (row, col) offset of the source tile in the height model
    pub tile_offset: (usize, usize),
}

/// Apex detection stage
#[derive(Debug, Clone, Default)]
pub struct ApexDetector;

impl Algorithm for ApexDetector {
    type Input = (Raster<f64>, Tile);
    type Output = Vec<CandidatePoint>;
    type Params = DetectionParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Apex Detector"
    }

    fn description(&self) -> &'static str {
        "Denoise, mark local maxima, watershed and emit crown candidates for one tile"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (grid, tile) = input;
        detect_candidates(&grid, &tile, &params)
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Marker acceptance floor for a tile: `max(mean - f * std, min)`, raised
/// to the absolute minimum tree height.
pub fn marker_floor(grid: &Raster<f64>, params: &DetectionParams) -> Option<f64> {
    let stats = grid.statistics();
    let (mean, std, min) = (stats.mean?, stats.std_dev?, stats.min?);
    let relative = (mean - params.threshold_std_factor * std).max(min);
    Some(relative.max(params.min_tree_height))
}

/// Detect candidate points in one tile.
///
/// `grid` is the tile's read window (NaN marks invalid cells) and `tile`
/// locates it in the height model. Only cells inside the tile's core window
/// are emitted. Degenerate tiles (no finite cells, no markers) fail with
/// [`Error::TileProcessing`].
pub fn detect_candidates(grid: &Raster<f64>, tile: &Tile, params: &DetectionParams) -> Result<Vec<CandidatePoint>> {
    let tile_error = |reason: &str| Error::TileProcessing {
        row_offset: tile.row_offset,
        col_offset: tile.col_offset,
        reason: reason.to_string(),
    };

    let floor = marker_floor(grid, params).ok_or_else(|| tile_error("no finite height cells"))?;

    let smoothed = closing(grid, &StructuringElement::Square(params.denoise_window))?;

    let resolution = params.resolution(grid.transform());
    // Beyond twice the longer edge every window already spans the whole tile
    let (rows, cols) = grid.shape();
    let edge = params.max_window(resolution).min(2 * rows.max(cols)).max(1);
    let window = StructuringElement::Square(edge);
    let mask = local_maxima(&smoothed, &window, floor)?;
    let (markers, n_markers) = label_markers(&mask)?;
    if n_markers == 0 {
        return Err(tile_error(&format!("no local maxima at or above {:.2}", floor)));
    }

    let mut basins = smoothed;
    basins.data_mut().mapv_inplace(|v| -v);
    let segments = watershed(&basins, &markers, Neighborhood::Rook)?;
    let crowns = trim_segments(&segments, grid, params.crown_prop)?;

    let (r0, c0, r1, c1) = tile.core;
    let mut candidates = Vec::new();
    for row in r0..r1 {
        for col in c0..c1 {
            if unsafe { crowns.get_unchecked(row, col) } == 0 {
                continue;
            }
            let h = unsafe { grid.get_unchecked(row, col) };
            let (x, y) = grid.pixel_to_geo(col, row);
            candidates.push(CandidatePoint {
                x,
                y,
                height: round1(h),
                tile_offset: (tile.row_offset, tile.col_offset),
            });
        }
    }

    Ok(candidates)
}
