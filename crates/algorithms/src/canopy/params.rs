//! Detection configuration shared by every pipeline stage

use std::path::Path;

use canopy_core::raster::GeoTransform;
use canopy_core::{Error, Result, CRS};
use serde::{Deserialize, Serialize};

/// Resolution assumed when a grid carries no usable pixel size
pub const FALLBACK_RESOLUTION: f64 = 0.5;

/// Parameters for individual-tree detection.
///
/// One value of this type is passed explicitly to each stage. Missing
/// fields in a JSON parameter file take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionParams {
    /// Ground resolution in map units; derived from the grid when `None`
    pub pixel_size: Option<f64>,
    /// Coordinate system expected for both inputs; fills in a grid that has none
    pub crs: Option<CRS>,
    /// Tile edge length in cells
    pub tile_size: usize,
    /// Extra context cells read around each tile
    pub tile_overlap: usize,
    /// Edge of the max-then-min denoise window
    pub denoise_window: usize,
    /// Lower bound of the local-maximum window
    pub min_window: usize,
    /// Marker floor is `mean - threshold_std_factor * std`, at least the tile minimum
    pub threshold_std_factor: f64,
    /// Absolute lower bound for marker heights.
    ///
    /// `f64::NEG_INFINITY` disables it, leaving the floor at exactly
    /// `max(mean - threshold_std_factor * std, min)` of the tile.
    pub min_tree_height: f64,
    /// Segment cells below this fraction of the segment apex are dropped
    pub crown_prop: f64,
    /// Clustering radius as a multiple of the resolution
    pub eps_multiplier: f64,
    /// Minimum neighbourhood size of a core point
    pub min_cluster_size: usize,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            pixel_size: None,
            crs: None,
            tile_size: 1000,
            tile_overlap: 0,
            denoise_window: 2,
            min_window: 2,
            threshold_std_factor: 0.2,
            min_tree_height: 2.0,
            crown_prop: 0.3,
            eps_multiplier: 3.0,
            min_cluster_size: 5,
        }
    }
}

fn invalid(name: &'static str, value: impl ToString, reason: &str) -> Error {
    Error::InvalidParameter {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

impl DetectionParams {
    /// Load parameters from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let params: Self = serde_json::from_str(&text)?;
        params.validate()?;
        Ok(params)
    }

    /// Check every field, reporting the first invalid one
    pub fn validate(&self) -> Result<()> {
        if let Some(p) = self.pixel_size {
            if !(p.is_finite() && p > 0.0) {
                return Err(invalid("pixel_size", p, "must be finite and positive"));
            }
        }
        if self.tile_size == 0 {
            return Err(invalid("tile_size", 0, "must be at least 1 cell"));
        }
        if self.denoise_window == 0 {
            return Err(invalid("denoise_window", 0, "must be at least 1 cell"));
        }
        if self.min_window == 0 {
            return Err(invalid("min_window", 0, "must be at least 1 cell"));
        }
        if !(self.threshold_std_factor.is_finite() && self.threshold_std_factor >= 0.0) {
            return Err(invalid("threshold_std_factor", self.threshold_std_factor, "must be finite and non-negative"));
        }
        if self.min_tree_height.is_nan() || self.min_tree_height == f64::INFINITY {
            return Err(invalid("min_tree_height", self.min_tree_height, "must be finite or negative infinity"));
        }
        if !(0.0..=1.0).contains(&self.crown_prop) {
            return Err(invalid("crown_prop", self.crown_prop, "must lie in [0, 1]"));
        }
        if !(self.eps_multiplier.is_finite() && self.eps_multiplier > 0.0) {
            return Err(invalid("eps_multiplier", self.eps_multiplier, "must be finite and positive"));
        }
        if self.min_cluster_size == 0 {
            return Err(invalid("min_cluster_size", 0, "must be at least 1"));
        }
        Ok(())
    }

    /// Resolution used for window and radius derivation.
    ///
    /// An explicit `pixel_size` wins; otherwise the larger of the grid's
    /// pixel width and height, or [`FALLBACK_RESOLUTION`] if that is not positive.
    pub fn resolution(&self, transform: &GeoTransform) -> f64 {
        if let Some(p) = self.pixel_size {
            return p;
        }
        let derived = transform.pixel_width.max(-transform.pixel_height);
        if derived.is_finite() && derived > 0.0 {
            derived
        } else {
            FALLBACK_RESOLUTION
        }
    }

    /// Edge of the local-maximum window: one map unit worth of cells, at least `min_window`
    pub fn max_window(&self, resolution: f64) -> usize {
        let cells = (1.0 / resolution).floor();
        let cells = if cells.is_finite() && cells > 0.0 { cells as usize } else { 0 };
        cells.max(self.min_window)
    }

    /// DBSCAN radius in map units
    pub fn eps(&self, resolution: f64) -> f64 {
        self.eps_multiplier * resolution
    }
}
