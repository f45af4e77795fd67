//! Local-maximum markers and their connected-component labels
//!
//! A cell is a marker when it is finite, reaches the acceptance floor and
//! equals the maximum of its window (plateaus therefore yield several
//! marker cells). Touching marker cells are merged into one seed.

use std::collections::VecDeque;

use canopy_core::raster::{Neighborhood, Raster};
use canopy_core::{Error, Result};
use ndarray::Array2;

use crate::maybe_rayon::*;
use crate::morphology::{dilate, StructuringElement};

/// Mark plateau-inclusive local maxima of `surface` at or above `floor`.
///
/// Returns a `u8` mask (1 = marker, 0 = background) with the surface's
/// georeferencing.
pub fn local_maxima(surface: &Raster<f64>, element: &StructuringElement, floor: f64) -> Result<Raster<u8>> {
    let peaks = dilate(surface, element)?;
    let (rows, cols) = surface.shape();

    let mask: Vec<u8> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            (0..cols)
                .map(|col| {
                    let v = unsafe { surface.get_unchecked(row, col) };
                    let max = unsafe { peaks.get_unchecked(row, col) };
                    u8::from(v.is_finite() && v >= floor && v == max)
                })
                .collect::<Vec<_>>()
        })
        .collect();

    let data = Array2::from_shape_vec((rows, cols), mask)
        .map_err(|e| Error::Other(e.to_string()))?;
    surface.with_data(data, Some(0))
}

/// Label 8-connected groups of marker cells with `1..=n` in row-major
/// discovery order. Returns the label grid and `n`.
pub fn label_markers(mask: &Raster<u8>) -> Result<(Raster<u32>, u32)> {
    let (rows, cols) = mask.shape();
    let mut labels = Array2::<u32>::zeros((rows, cols));
    let offsets = Neighborhood::Queen.offsets_no_center();
    let mut next = 0u32;
    let mut queue = VecDeque::new();

    for row in 0..rows {
        for col in 0..cols {
            if labels[(row, col)] != 0 || unsafe { mask.get_unchecked(row, col) } == 0 {
                continue;
            }

            next += 1;
            labels[(row, col)] = next;
            queue.push_back((row, col));

            while let Some((r, c)) = queue.pop_front() {
                for &(dr, dc) in &offsets {
                    let nr = r as isize + dr;
                    let nc = c as isize + dc;
                    if nr < 0 || nc < 0 || nr >= rows as isize || nc >= cols as isize {
                        continue;
                    }
                    let (nr, nc) = (nr as usize, nc as usize);
                    if labels[(nr, nc)] == 0 && unsafe { mask.get_unchecked(nr, nc) } != 0 {
                        labels[(nr, nc)] = next;
                        queue.push_back((nr, nc));
                    }
                }
            }
        }
    }

    Ok((mask.with_data(labels, Some(0))?, next))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: usize, cols: usize, values: &[f64]) -> Raster<f64> {
        Raster::from_vec(values.to_vec(), rows, cols).unwrap()
    }

    #[test]
    fn test_single_peak() {
        let surface = grid(3, 3, &[1.0, 2.0, 1.0, 2.0, 5.0, 2.0, 1.0, 2.0, 1.0]);
        let mask = local_maxima(&surface, &StructuringElement::Square(3), 0.0).unwrap();
        let markers: Vec<_> = mask.data().indexed_iter().filter(|(_, v)| **v == 1).collect();
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].0, (1, 1));
    }

    #[test]
    fn test_floor_rejects_low_peaks() {
        let surface = grid(1, 5, &[3.0, 1.0, 0.5, 1.0, 8.0]);
        let mask = local_maxima(&surface, &StructuringElement::Square(3), 2.0).unwrap();
        assert_eq!(mask.data().as_slice().unwrap(), &[1, 0, 0, 0, 1]);
    }

    #[test]
    fn test_plateau_is_one_label() {
        let surface = grid(3, 4, &[0.0, 0.0, 0.0, 0.0, 0.0, 4.0, 4.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let mask = local_maxima(&surface, &StructuringElement::Square(3), 1.0).unwrap();
        assert_eq!(mask.data().iter().filter(|&&v| v == 1).count(), 2);

        let (labels, n) = label_markers(&mask).unwrap();
        assert_eq!(n, 1);
        assert_eq!(labels.get(1, 1).unwrap(), 1);
        assert_eq!(labels.get(1, 2).unwrap(), 1);
    }

    #[test]
    fn test_nan_is_never_a_marker() {
        let surface = grid(1, 3, &[f64::NAN, 1.0, f64::NAN]);
        let mask = local_maxima(&surface, &StructuringElement::Square(3), 0.0).unwrap();
        assert_eq!(mask.data().as_slice().unwrap(), &[0, 1, 0]);
    }

    #[test]
    fn test_diagonal_markers_connect() {
        let mask = Raster::from_vec(vec![1u8, 0, 0, 0, 1, 0, 0, 0, 0, 1, 0, 1], 3, 4).unwrap();
        let (labels, n) = label_markers(&mask).unwrap();
        assert_eq!(n, 2);
        assert_eq!(labels.get(0, 0).unwrap(), 1);
        assert_eq!(labels.get(1, 0).unwrap(), 1);
        assert_eq!(labels.get(2, 1).unwrap(), 1);
        assert_eq!(labels.get(2, 3).unwrap(), 2);
    }
}
