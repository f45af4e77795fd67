//! Marker-controlled watershed segmentation
//!
//! Grows labelled seeds over a surface in order of increasing value using a
//! priority queue, in the manner of Priority-Flood (Barnes et al. 2014).
//! Each unlabelled cell takes the label of the first flooded neighbour that
//! reaches it. Non-finite cells act as a mask and are never labelled.
//!
//! To segment crowns the caller floods the negated height, so that tree
//! tops become basins.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use canopy_core::raster::{Neighborhood, Raster};
use canopy_core::{Algorithm, Error, Result};

/// A queued cell. Lower values pop first, then older entries.
#[derive(Debug, Clone)]
struct Cell {
    value: f64,
    age: u64,
    row: usize,
    col: usize,
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Cell {}

impl PartialOrd for Cell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cell {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the max-heap behaves as a min-heap
        other
            .value
            .partial_cmp(&self.value)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.age.cmp(&self.age))
    }
}

/// Parameters for marker-controlled watershed
#[derive(Debug, Clone)]
pub struct WatershedParams {
    /// Cell connectivity used when growing regions
    pub connectivity: Neighborhood,
}

impl Default for WatershedParams {
    fn default() -> Self {
        Self {
            connectivity: Neighborhood::Rook,
        }
    }
}

/// Marker-controlled watershed algorithm
#[derive(Debug, Clone, Default)]
pub struct MarkerWatershed;

impl Algorithm for MarkerWatershed {
    type Input = (Raster<f64>, Raster<u32>);
    type Output = Raster<u32>;
    type Params = WatershedParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Marker Watershed"
    }

    fn description(&self) -> &'static str {
        "Grow labelled markers over a surface by priority flooding"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (surface, markers) = input;
        watershed(&surface, &markers, params.connectivity)
    }
}

/// Flood `surface` from the non-zero cells of `markers`.
///
/// Returns a label grid of the same shape where every finite cell reachable
/// from a marker carries that marker's label and all other cells are 0.
/// Markers that sit on non-finite cells are dropped.
pub fn watershed(surface: &Raster<f64>, markers: &Raster<u32>, connectivity: Neighborhood) -> Result<Raster<u32>> {
    let (rows, cols) = surface.shape();
    if markers.shape() != (rows, cols) {
        let (ar, ac) = markers.shape();
        return Err(Error::SizeMismatch { er: rows, ec: cols, ar, ac });
    }

    let offsets = connectivity.offsets_no_center();
    let mut labels = markers.data().clone();
    let mut heap = BinaryHeap::new();
    let mut age = 0u64;

    for row in 0..rows {
        for col in 0..cols {
            if labels[(row, col)] == 0 {
                continue;
            }
            let value = unsafe { surface.get_unchecked(row, col) };
            if !value.is_finite() {
                labels[(row, col)] = 0;
                continue;
            }
            heap.push(Cell { value, age, row, col });
            age += 1;
        }
    }

    while let Some(cell) = heap.pop() {
        let label = labels[(cell.row, cell.col)];
        for &(dr, dc) in &offsets {
            let nr = cell.row as isize + dr;
            let nc = cell.col as isize + dc;
            if nr < 0 || nc < 0 || nr >= rows as isize || nc >= cols as isize {
                continue;
            }
            let (nr, nc) = (nr as usize, nc as usize);
            if labels[(nr, nc)] != 0 {
                continue;
            }
            let value = unsafe { surface.get_unchecked(nr, nc) };
            if !value.is_finite() {
                continue;
            }
            labels[(nr, nc)] = label;
            heap.push(Cell { value, age, row: nr, col: nc });
            age += 1;
        }
    }

    surface.with_data(labels, Some(0))
}
