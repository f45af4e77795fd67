//! Grid alignment of ground and surface rasters
//!
//! The ground grid defines the common geometry. When the surface grid has
//! a different shape or transform it is resampled onto the ground grid by
//! bilinear interpolation of cell-centre values.

use canopy_core::raster::Raster;
use canopy_core::{Algorithm, Error, Result, CRS};
use ndarray::Array2;
use tracing::debug;

use super::params::DetectionParams;
use crate::maybe_rayon::*;

/// Ground and surface grids sharing one shape, transform and CRS.
///
/// Nodata in both grids is represented as NaN.
#[derive(Debug, Clone)]
pub struct AlignedGrids {
    pub ground: Raster<f64>,
    pub surface: Raster<f64>,
    /// Whether the surface had to be resampled
    pub resampled: bool,
}

/// Grid alignment stage
#[derive(Debug, Clone, Default)]
pub struct GridAligner;

impl Algorithm for GridAligner {
    type Input = (Raster<f64>, Raster<f64>);
    type Output = AlignedGrids;
    type Params = DetectionParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Grid Aligner"
    }

    fn description(&self) -> &'static str {
        "Resample the canopy surface onto the ground grid"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (ground, surface) = input;
        align_grids(&ground, &surface, &params)
    }
}

fn check_geometry(raster: &Raster<f64>, what: &str) -> Result<()> {
    if raster.is_empty() {
        return Err(Error::Alignment(format!("{} grid has zero area", what)));
    }
    let det = raster.transform().determinant();
    if !det.is_finite() || det.abs() < 1e-12 {
        return Err(Error::Alignment(format!("{} grid has a degenerate geotransform", what)));
    }
    Ok(())
}

fn reconcile_crs(ground: &Raster<f64>, surface: &Raster<f64>, expected: Option<&CRS>) -> Result<Option<CRS>> {
    let to_alignment = |e: Error| match e {
        Error::CrsMismatch(a, b) => Error::Alignment(format!("incompatible coordinate systems {} and {}", a, b)),
        other => other,
    };
    let grids = CRS::reconcile(ground.crs(), surface.crs()).map_err(to_alignment)?;
    CRS::reconcile(grids.as_ref(), expected).map_err(to_alignment)
}

fn extents_intersect(a: (f64, f64, f64, f64), b: (f64, f64, f64, f64)) -> bool {
    a.0 < b.2 && b.0 < a.2 && a.1 < b.3 && b.1 < a.3
}

/// Align `surface` onto the geometry of `ground`.
///
/// Fails with [`Error::Alignment`] when either grid has zero area or a
/// degenerate transform, when the coordinate systems disagree (with each
/// other or with `params.crs`), or when the grids do not overlap.
pub fn align_grids(ground: &Raster<f64>, surface: &Raster<f64>, params: &DetectionParams) -> Result<AlignedGrids> {
    check_geometry(ground, "ground")?;
    check_geometry(surface, "surface")?;
    let crs = reconcile_crs(ground, surface, params.crs.as_ref())?;

    let mut ground = ground.normalized_nodata();
    ground.set_crs(crs.clone());
    let surface = surface.normalized_nodata();

    let tolerance = 1e-9 * ground.resolution().max(1.0);
    if surface.shape() == ground.shape() && surface.transform().approx_eq(ground.transform(), tolerance) {
        let mut surface = surface;
        surface.set_crs(crs);
        return Ok(AlignedGrids { ground, surface, resampled: false });
    }

    if !extents_intersect(ground.bounds(), surface.bounds()) {
        return Err(Error::Alignment("ground and surface extents do not overlap".to_string()));
    }

    debug!(
        from = ?surface.shape(),
        to = ?ground.shape(),
        "resampling surface onto ground grid"
    );
    let mut resampled = resample_bilinear(&surface, &ground)?;
    resampled.set_crs(crs);
    Ok(AlignedGrids { ground, surface: resampled, resampled: true })
}

/// Bilinear resampling of `source` onto the geometry of `target`.
///
/// Each target cell centre is located in the source grid and interpolated
/// from the four surrounding source cell centres. Nodata (NaN) neighbours
/// are dropped and the remaining weights renormalised. Centres outside the
/// source extent become NaN; within the outer half-cell the nearest edge
/// values are used.
pub fn resample_bilinear(source: &Raster<f64>, target: &Raster<f64>) -> Result<Raster<f64>> {
    let (rows, cols) = target.shape();
    let (src_rows, src_cols) = source.shape();
    let src_transform = *source.transform();
    let dst_transform = *target.transform();

    let output_data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let (x, y) = dst_transform.pixel_to_geo(col, row);
                let (fc, fr) = src_transform.geo_to_pixel(x, y);
                if !(fc >= 0.0 && fr >= 0.0 && fc <= src_cols as f64 && fr <= src_rows as f64) {
                    continue;
                }

                // Continuous position relative to cell centres
                let cx = (fc - 0.5).clamp(0.0, (src_cols - 1) as f64);
                let cy = (fr - 0.5).clamp(0.0, (src_rows - 1) as f64);
                let c0 = cx.floor() as usize;
                let r0 = cy.floor() as usize;
                let c1 = (c0 + 1).min(src_cols - 1);
                let r1 = (r0 + 1).min(src_rows - 1);
                let tx = cx - c0 as f64;
                let ty = cy - r0 as f64;

                let samples = [
                    (r0, c0, (1.0 - tx) * (1.0 - ty)),
                    (r0, c1, tx * (1.0 - ty)),
                    (r1, c0, (1.0 - tx) * ty),
                    (r1, c1, tx * ty),
                ];

                let mut sum = 0.0;
                let mut weight = 0.0;
                for &(r, c, w) in &samples {
                    let v = unsafe { source.get_unchecked(r, c) };
                    if v.is_finite() && w > 0.0 {
                        sum += v * w;
                        weight += w;
                    }
                }
                if weight > 0.0 {
                    *out = sum / weight;
                }
            }
            row_data
        })
        .collect();

    let data = Array2::from_shape_vec((rows, cols), output_data).map_err(|e| Error::Other(e.to_string()))?;
    let mut output = target.with_data(data, Some(f64::NAN))?;
    output.set_crs(source.crs().cloned().or_else(|| target.crs().cloned()));
    Ok(output)
}
