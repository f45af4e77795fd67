//! Marker-controlled crown segmentation
//!
//! - **Markers**: plateau-inclusive local maxima and their 8-connected labels
//! - **Watershed**: priority-flood region growing from labelled markers
//! - **Trim**: removal of low segment fringes relative to the segment apex

mod markers;
mod trim;
mod watershed;

pub use markers::{label_markers, local_maxima};
pub use trim::trim_segments;
pub use watershed::{watershed, MarkerWatershed, WatershedParams};
