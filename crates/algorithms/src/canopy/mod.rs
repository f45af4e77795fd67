//! Individual-tree delineation
//!
//! Stages, leaf to root:
//! - [`GridAligner`]: puts the surface grid on the ground grid
//! - [`HeightModelBuilder`]: canopy height as surface minus ground
//! - [`ApexDetector`]: per-tile denoise, markers, watershed, candidate emission
//! - [`SpatialDeduplicator`]: DBSCAN over all candidates, one apex per cluster
//! - [`TreeRegistry`]: stable tree identifiers
//!
//! [`TreeDetector`] runs the whole chain over tiles produced by
//! [`canopy_parallel::TileIterator`].

mod align;
mod apex;
mod crowns;
mod dedup;
mod detector;
mod height_model;
mod params;
mod registry;

pub use align::{align_grids, resample_bilinear, AlignedGrids, GridAligner};
pub use apex::{detect_candidates, marker_floor, ApexDetector, CandidatePoint};
pub use crowns::{crown_polygon, crown_polygons, tree_points, CrownParams};
pub use dedup::{deduplicate, ClusterApex, Deduplication, SpatialDeduplicator};
pub use detector::{DetectTrees, DetectionReport, DetectionResult, TreeDetector};
pub use height_model::{build_height_model, HeightModel, HeightModelBuilder};
pub use params::{DetectionParams, FALLBACK_RESOLUTION};
pub use registry::{TreeRecord, TreeRegistry};
