//! End-to-end tree detection
//!
//! (ground, surface) -> align -> height model -> tiles -> per-tile apex
//! candidates -> deduplication -> tree identifiers.
//!
//! Tiles are independent and may run in parallel; results are merged in
//! tile order, so the output does not depend on the processing mode.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use canopy_core::raster::Raster;
use canopy_core::{Algorithm, Error, Result};
use canopy_parallel::{ParallelStrategy, ProcessingMode, TileIterator};
use tracing::{debug, info, warn};

use super::align::align_grids;
use super::apex::{detect_candidates, CandidatePoint};
use super::dedup::deduplicate;
use super::height_model::build_height_model;
use super::params::DetectionParams;
use super::registry::{TreeRecord, TreeRegistry};

/// Summary of one detection run
#[derive(Debug, Default)]
pub struct DetectionReport {
    /// Resolution used for window and radius derivation
    pub resolution: f64,
    /// Whether the surface was resampled onto the ground grid
    pub resampled: bool,
    /// Height cells cleared because the surface lay below the ground
    pub negative_cells: usize,
    /// Number of finite height cells
    pub valid_cells: usize,
    pub mean_height: Option<f64>,
    pub max_height: Option<f64>,
    pub tiles_processed: usize,
    /// Tiles that contributed nothing (no data or no markers)
    pub tiles_skipped: usize,
    pub candidates: usize,
    pub noise: usize,
    pub clusters: usize,
    /// Recoverable problems met during the run
    pub warnings: Vec<Error>,
}

impl DetectionReport {
    fn warn(&mut self, error: Error) {
        warn!("{}", error);
        self.warnings.push(error);
    }
}

/// Trees found by a detection run and its report
#[derive(Debug)]
pub struct DetectionResult {
    pub trees: Vec<TreeRecord>,
    pub report: DetectionReport,
}

/// Configured tree-detection pipeline
#[derive(Debug, Clone, Default)]
pub struct TreeDetector {
    params: DetectionParams,
    mode: ProcessingMode,
    cancel: Option<Arc<AtomicBool>>,
}

impl TreeDetector {
    pub fn new(params: DetectionParams) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    /// Select sequential or parallel tile processing
    pub fn with_mode(mut self, mode: ProcessingMode) -> Self {
        self.mode = mode;
        self
    }

    /// Abort with [`Error::Cancelled`] once `flag` is set; checked before each tile
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn params(&self) -> &DetectionParams {
        &self.params
    }

    fn cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|f| f.load(Ordering::Relaxed))
    }

    /// Detect trees from a ground elevation grid and a canopy surface grid.
    ///
    /// Alignment failures and an empty height model are fatal. Degenerate
    /// tiles and an empty candidate set are reported as warnings.
    pub fn detect(&self, ground: &Raster<f64>, surface: &Raster<f64>) -> Result<DetectionResult> {
        self.params.validate()?;

        let aligned = align_grids(ground, surface, &self.params)?;
        let model = build_height_model(&aligned.ground, &aligned.surface)?;
        info!(
            rows = model.grid.rows(),
            cols = model.grid.cols(),
            resampled = aligned.resampled,
            negative_cells = model.negative_cells,
            "height model built"
        );

        let mut report = DetectionReport {
            resampled: aligned.resampled,
            negative_cells: model.negative_cells,
            ..Default::default()
        };
        let trees = self.run(&model.grid, &mut report)?;
        Ok(DetectionResult { trees, report })
    }

    /// Detect trees in an existing canopy height grid.
    ///
    /// Nodata cells are excluded. A grid without any valid cell yields no
    /// trees and a clustering warning.
    pub fn detect_in_height_model(&self, heights: &Raster<f64>) -> Result<DetectionResult> {
        self.params.validate()?;
        let grid = heights.normalized_nodata();
        let mut report = DetectionReport::default();
        let trees = self.run(&grid, &mut report)?;
        Ok(DetectionResult { trees, report })
    }

    fn run(&self, grid: &Raster<f64>, report: &mut DetectionReport) -> Result<Vec<TreeRecord>> {
        let stats = grid.statistics();
        report.resolution = self.params.resolution(grid.transform());
        report.valid_cells = stats.valid_count;
        report.mean_height = stats.mean;
        report.max_height = stats.max;

        let tiles: Vec<_> = TileIterator::new(grid.rows(), grid.cols(), self.params.tile_size, self.params.tile_overlap)?
            .collect();
        debug!(tiles = tiles.len(), tile_size = self.params.tile_size, "tiling height model");

        let results = self.mode.par_map(tiles, |tile| -> Result<Vec<CandidatePoint>> {
            if self.cancelled() {
                return Err(Error::Cancelled);
            }
            let window = tile.extract(grid)?;
            let found = detect_candidates(&window, &tile, &self.params)?;
            debug!(tile = tile.index, row = tile.row_offset, col = tile.col_offset, candidates = found.len(), "tile done");
            Ok(found)
        })?;

        let mut candidates = Vec::new();
        for result in results {
            match result {
                Ok(found) => {
                    report.tiles_processed += 1;
                    candidates.extend(found);
                }
                Err(e) if e.is_recoverable() => {
                    report.tiles_skipped += 1;
                    report.warn(e);
                }
                Err(e) => return Err(e),
            }
        }
        report.candidates = candidates.len();

        let eps = self.params.eps(report.resolution);
        let dedup = match deduplicate(&candidates, eps, self.params.min_cluster_size) {
            Ok(dedup) => dedup,
            Err(e) if e.is_recoverable() => {
                report.warn(e);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };
        report.noise = dedup.noise;
        report.clusters = dedup.apexes.len();
        if dedup.apexes.is_empty() {
            report.warn(Error::Clustering(format!(
                "all {} candidate points were labelled noise",
                candidates.len()
            )));
        }

        let mut registry = TreeRegistry::new();
        registry.register_clusters(&dedup.apexes);
        info!(
            trees = registry.len(),
            candidates = report.candidates,
            noise = report.noise,
            skipped_tiles = report.tiles_skipped,
            "tree detection finished"
        );
        Ok(registry.into_records())
    }
}

/// Tree detection as a single algorithm over (ground, surface) grids
#[derive(Debug, Clone, Default)]
pub struct DetectTrees;

impl Algorithm for DetectTrees {
    type Input = (Raster<f64>, Raster<f64>);
    type Output = DetectionResult;
    type Params = DetectionParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Tree Detection"
    }

    fn description(&self) -> &'static str {
        "Individual-tree apexes from ground and canopy surface grids"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (ground, surface) = input;
        TreeDetector::new(params).detect(&ground, &surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_core::GeoTransform;

    fn flat(rows: usize, cols: usize, value: f64) -> Raster<f64> {
        let mut r = Raster::filled(rows, cols, value);
        r.set_transform(GeoTransform::new(0.0, rows as f64 * 0.1, 0.1, -0.1));
        r
    }

    fn with_bump(mut surface: Raster<f64>, row: usize, col: usize, peak: f64) -> Raster<f64> {
        let (rows, cols) = surface.shape();
        for r in 0..rows {
            for c in 0..cols {
                let d2 = (r as f64 - row as f64).powi(2) + (c as f64 - col as f64).powi(2);
                let v = surface.get(r, c).unwrap() + peak * (-d2 / 50.0).exp();
                surface.set(r, c, v).unwrap();
            }
        }
        surface
    }

    #[test]
    fn test_single_tree() {
        let ground = flat(50, 50, 100.0);
        let surface = with_bump(flat(50, 50, 100.0), 25, 25, 8.0);
        let result = TreeDetector::default().detect(&ground, &surface).unwrap();

        assert_eq!(result.trees.len(), 1);
        assert_eq!(result.trees[0].tree_id, 1);
        assert!((result.trees[0].height - 8.0).abs() <= 0.2);
        assert!(result.report.warnings.is_empty());
        assert_eq!(result.report.tiles_processed, 1);
    }

    #[test]
    fn test_empty_height_model_is_fatal() {
        let ground = flat(10, 10, 100.0);
        let surface = flat(10, 10, 90.0);
        let err = TreeDetector::default().detect(&ground, &surface).unwrap_err();
        assert!(matches!(err, Error::EmptyHeightModel));
    }

    #[test]
    fn test_invalid_grid_yields_warning() {
        let chm = flat(20, 20, f64::NAN);
        let result = TreeDetector::default().detect_in_height_model(&chm).unwrap();
        assert!(result.trees.is_empty());
        assert_eq!(result.report.tiles_skipped, 1);
        assert!(result.report.warnings.iter().any(|w| matches!(w, Error::Clustering(_))));
    }

    #[test]
    fn test_fine_resolution_grid_finishes_with_one_tree() {
        let mut chm = Raster::filled(60, 60, 0.0);
        chm.set_transform(GeoTransform::new(0.0, 60.0 * 1e-4, 1e-4, -1e-4));
        let chm = with_bump(chm, 30, 30, 8.0);

        let detector = TreeDetector::default();
        assert_eq!(detector.params().max_window(1e-4), 10_000);
        let result = detector.detect_in_height_model(&chm).unwrap();

        assert_eq!(result.trees.len(), 1);
        assert!((result.report.resolution - 1e-4).abs() < 1e-15);
        assert!((result.trees[0].height - 8.0).abs() <= 0.2);
    }

    #[test]
    fn test_all_noise_clustering_yields_warning() {
        let params = DetectionParams { min_cluster_size: 100_000, ..Default::default() };
        let chm = with_bump(flat(40, 40, 0.0), 20, 20, 10.0);
        let result = TreeDetector::new(params).detect_in_height_model(&chm).unwrap();

        assert!(result.trees.is_empty());
        assert!(result.report.candidates > 0);
        assert_eq!(result.report.noise, result.report.candidates);
        assert_eq!(result.report.clusters, 0);
        assert_eq!(result.report.tiles_skipped, 0);
        assert!(result.report.warnings.iter().any(|w| matches!(w, Error::Clustering(_))));
    }

    #[test]
    fn test_cancelled_before_tiles() {
        let flag = Arc::new(AtomicBool::new(true));
        let detector = TreeDetector::default().with_cancel_flag(flag);
        let chm = with_bump(flat(30, 30, 0.0), 15, 15, 6.0);
        assert!(matches!(detector.detect_in_height_model(&chm), Err(Error::Cancelled)));
    }

    #[test]
    fn test_invalid_params_rejected_first() {
        let params = DetectionParams { tile_size: 0, ..Default::default() };
        let chm = flat(5, 5, 1.0);
        let err = TreeDetector::new(params).detect_in_height_model(&chm).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { name: "tile_size", .. }));
    }

    #[test]
    fn test_algorithm_entry_point() {
        let ground = flat(40, 40, 50.0);
        let surface = with_bump(flat(40, 40, 50.0), 20, 20, 10.0);
        let result = DetectTrees.execute_default((ground, surface)).unwrap();
        assert_eq!(result.trees.len(), 1);
        assert_eq!(result.report.clusters, 1);
        assert!(result.report.candidates > result.report.noise);
    }
}
