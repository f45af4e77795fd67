//! # Canopy Algorithms
//!
//! Individual-tree delineation from canopy height rasters.
//!
//! ## Modules
//!
//! - **morphology**: erosion, dilation and closing over rectangular windows
//! - **segmentation**: local-maximum markers, marker labelling, watershed, crown trimming
//! - **clustering**: 2D k-d tree and DBSCAN
//! - **canopy**: grid alignment, height model, apex detection, deduplication, tree registry

pub mod canopy;
pub mod clustering;
pub mod morphology;
pub mod segmentation;

mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::canopy::{
        align_grids, build_height_model, crown_polygons, deduplicate, detect_candidates, tree_points,
        ApexDetector, CandidatePoint, CrownParams, DetectTrees, DetectionParams, DetectionReport,
        DetectionResult, GridAligner, HeightModel, HeightModelBuilder, SpatialDeduplicator,
        TreeDetector, TreeRecord, TreeRegistry,
    };
    pub use crate::clustering::{dbscan, Dbscan, DbscanParams};
    pub use crate::morphology::{closing, dilate, erode, StructuringElement};
    pub use crate::segmentation::{label_markers, local_maxima, watershed};
    pub use canopy_core::prelude::*;
    pub use canopy_parallel::{ProcessingMode, Tile, TileIterator};
}
