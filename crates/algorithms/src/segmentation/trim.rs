//! Crown trimming of watershed segments
//!
//! A watershed floods every finite cell, so on a continuous canopy adjacent
//! segments touch along their valleys. Trimming unlabels the low fringe of
//! each segment, keeping only cells that reach a fraction of the segment's
//! apex height.

use canopy_core::raster::Raster;
use canopy_core::{Error, Result};

/// Unlabel cells lower than `crown_prop` times their segment's apex height.
///
/// `heights` supplies the values the apex is measured on; non-finite
/// heights are unlabelled. A `crown_prop` of 0 keeps every finite cell.
pub fn trim_segments(labels: &Raster<u32>, heights: &Raster<f64>, crown_prop: f64) -> Result<Raster<u32>> {
    if labels.shape() != heights.shape() {
        let (er, ec) = heights.shape();
        let (ar, ac) = labels.shape();
        return Err(Error::SizeMismatch { er, ec, ar, ac });
    }

    let max_label = labels.data().iter().copied().max().unwrap_or(0) as usize;
    let mut apex = vec![f64::NEG_INFINITY; max_label + 1];
    for (&label, &h) in labels.data().iter().zip(heights.data().iter()) {
        if label != 0 && h.is_finite() && h > apex[label as usize] {
            apex[label as usize] = h;
        }
    }

    let mut trimmed = labels.data().clone();
    ndarray::Zip::from(&mut trimmed)
        .and(heights.data())
        .for_each(|label, &h| {
            if *label != 0 && !(h.is_finite() && h >= crown_prop * apex[*label as usize]) {
                *label = 0;
            }
        });

    labels.with_data(trimmed, Some(0))
}
