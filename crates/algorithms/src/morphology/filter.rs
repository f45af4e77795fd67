//! Shared window-extreme filter behind erosion and dilation
//!
//! Rectangular windows are separable: the extreme over a window equals the
//! extreme along the columns of the per-row extremes. Each pass slides a
//! monotonic deque along one line, so the cost per cell does not depend on
//! the window size.

use std::collections::VecDeque;

use crate::maybe_rayon::*;
use canopy_core::raster::Raster;
use canopy_core::{Error, Result};
use ndarray::Array2;

use super::element::StructuringElement;

/// Replace each cell by the extreme of its window.
///
/// `better(candidate, current)` decides whether a neighbor replaces the
/// running extreme. Windows are clipped at the raster edge and nodata
/// neighbors are skipped. Nodata centers stay nodata (NaN).
pub(super) fn extreme_filter(
    raster: &Raster<f64>,
    element: &StructuringElement,
    better: fn(f64, f64) -> bool,
) -> Result<Raster<f64>> {
    element.validate()?;

    let (rows, cols) = raster.shape();
    let nodata = raster.nodata();
    let ((r0, r1), (c0, c1)) = element.extent();

    let row_pass: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let line: Vec<f64> = (0..cols)
                .map(|col| {
                    let v = unsafe { raster.get_unchecked(row, col) };
                    if is_nodata_val(v, nodata) { f64::NAN } else { v }
                })
                .collect();
            sliding_extreme(&line, c0, c1, better)
        })
        .collect();

    let col_pass: Vec<Vec<f64>> = (0..cols)
        .into_par_iter()
        .map(|col| {
            let line: Vec<f64> = (0..rows).map(|row| row_pass[row * cols + col]).collect();
            sliding_extreme(&line, r0, r1, better)
        })
        .collect();

    let output_data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            (0..cols)
                .map(|col| {
                    let center = unsafe { raster.get_unchecked(row, col) };
                    if is_nodata_val(center, nodata) {
                        f64::NAN
                    } else {
                        col_pass[col][row]
                    }
                })
                .collect::<Vec<f64>>()
        })
        .collect();

    build_output(raster, rows, cols, output_data)
}

/// Extreme of `line[i + lo ..= i + hi]` for every `i`, clipped to the line.
///
/// NaN entries are skipped; a window holding only NaN yields NaN.
fn sliding_extreme(line: &[f64], lo: isize, hi: isize, better: fn(f64, f64) -> bool) -> Vec<f64> {
    let n = line.len() as isize;
    let mut out = vec![f64::NAN; line.len()];
    // Indices whose values are strictly decreasing in `better` order
    let mut window: VecDeque<usize> = VecDeque::new();
    let mut next: isize = 0;

    for i in 0..n {
        let end = (i + hi).min(n - 1);
        while next <= end {
            let v = line[next as usize];
            if !v.is_nan() {
                while let Some(&back) = window.back() {
                    if better(line[back], v) {
                        break;
                    }
                    window.pop_back();
                }
                window.push_back(next as usize);
            }
            next += 1;
        }

        let start = i + lo;
        while let Some(&front) = window.front() {
            if front as isize >= start {
                break;
            }
            window.pop_front();
        }

        if let Some(&front) = window.front() {
            out[i as usize] = line[front];
        }
    }

    out
}

fn is_nodata_val(value: f64, nodata: Option<f64>) -> bool {
    if value.is_nan() {
        return true;
    }
    match nodata {
        Some(nd) => (value - nd).abs() < f64::EPSILON,
        None => false,
    }
}

fn build_output(
    template: &Raster<f64>,
    rows: usize,
    cols: usize,
    data: Vec<f64>,
) -> Result<Raster<f64>> {
    let mut output = template.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    Ok(output)
}
