//! Spatial deduplication of candidate points
//!
//! All tiles' candidates are clustered together with DBSCAN over (x, y).
//! Each cluster collapses to its highest member, the first one in input
//! order when several share the maximum height.

use std::collections::BTreeMap;

use canopy_core::{Algorithm, Error, Result};
use geo_types::Coord;
use tracing::debug;

use super::apex::CandidatePoint;
use crate::clustering::{dbscan, DbscanParams};

/// The surviving apex of one cluster
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterApex {
    /// DBSCAN cluster label
    pub label: usize,
    /// Number of candidates in the cluster
    pub members: usize,
    /// The highest candidate of the cluster
    pub apex: CandidatePoint,
}

/// Outcome of deduplication
#[derive(Debug, Clone, Default)]
pub struct Deduplication {
    /// One apex per cluster, in ascending label order
    pub apexes: Vec<ClusterApex>,
    /// Candidates that fell in no dense neighbourhood
    pub noise: usize,
}

/// Spatial deduplication stage.
///
/// Input is the merged candidate set and the clustering radius in map units.
#[derive(Debug, Clone, Default)]
pub struct SpatialDeduplicator;

impl Algorithm for SpatialDeduplicator {
    type Input = (Vec<CandidatePoint>, f64);
    type Output = Deduplication;
    type Params = DbscanParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Spatial Deduplicator"
    }

    fn description(&self) -> &'static str {
        "Cluster candidate points and keep the highest point per cluster"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (candidates, eps) = input;
        deduplicate(&candidates, eps, params.min_points)
    }
}

/// Cluster `candidates` within `eps` and select each cluster's apex.
///
/// Fails with [`Error::Clustering`] when there are no candidates.
pub fn deduplicate(candidates: &[CandidatePoint], eps: f64, min_points: usize) -> Result<Deduplication> {
    if candidates.is_empty() {
        return Err(Error::Clustering("no candidate points reached deduplication".to_string()));
    }

    let coords: Vec<Coord<f64>> = candidates.iter().map(|c| Coord { x: c.x, y: c.y }).collect();
    let clustering = dbscan(&coords, &DbscanParams { eps, min_points })?;
    debug!(
        candidates = candidates.len(),
        clusters = clustering.n_clusters,
        noise = clustering.noise_count(),
        "clustered candidates"
    );

    // label -> (index of highest member, member count)
    let mut best: BTreeMap<usize, (usize, usize)> = BTreeMap::new();
    for (i, label) in clustering.labels.iter().enumerate() {
        let Some(label) = *label else { continue };
        best.entry(label)
            .and_modify(|(top, members)| {
                *members += 1;
                if candidates[i].height > candidates[*top].height {
                    *top = i;
                }
            })
            .or_insert((i, 1));
    }

    let apexes = best
        .into_iter()
        .map(|(label, (top, members))| ClusterApex {
            label,
            members,
            apex: candidates[top],
        })
        .collect();

    Ok(Deduplication {
        apexes,
        noise: clustering.noise_count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(x: f64, y: f64, height: f64) -> CandidatePoint {
        CandidatePoint { x, y, height, tile_offset: (0, 0) }
    }

    fn patch(cx: f64, cy: f64, peak: f64) -> Vec<CandidatePoint> {
        (0..9)
            .map(|i| {
                let (dx, dy) = ((i % 3) as f64 - 1.0, (i / 3) as f64 - 1.0);
                let h = if dx == 0.0 && dy == 0.0 { peak } else { peak - 1.0 };
                candidate(cx + dx * 0.1, cy + dy * 0.1, h)
            })
            .collect()
    }

    #[test]
    fn test_one_apex_per_cluster() {
        let mut points = patch(0.0, 0.0, 12.0);
        points.extend(patch(5.0, 5.0, 9.5));
        points.push(candidate(50.0, 50.0, 30.0));

        let result = deduplicate(&points, 0.3, 5).unwrap();
        assert_eq!(result.apexes.len(), 2);
        assert_eq!(result.noise, 1);
        assert_eq!(result.apexes[0].apex.height, 12.0);
        assert_eq!((result.apexes[0].apex.x, result.apexes[0].apex.y), (0.0, 0.0));
        assert_eq!(result.apexes[0].members, 9);
        assert_eq!(result.apexes[1].apex.height, 9.5);
    }

    #[test]
    fn test_tie_keeps_first_occurrence() {
        let points: Vec<_> = (0..6).map(|i| candidate(i as f64 * 0.05, 0.0, 4.0)).collect();
        let result = deduplicate(&points, 0.3, 5).unwrap();
        assert_eq!(result.apexes.len(), 1);
        assert_eq!(result.apexes[0].apex.x, 0.0);
    }

    #[test]
    fn test_apex_is_cluster_maximum() {
        let points: Vec<_> = (0..40)
            .map(|i| candidate((i % 8) as f64 * 0.1, (i / 8) as f64 * 0.1, ((i * 37) % 23) as f64))
            .collect();
        let result = deduplicate(&points, 0.3, 5).unwrap();
        assert_eq!(result.apexes.len(), 1);
        let max = points.iter().map(|p| p.height).fold(f64::MIN, f64::max);
        assert_eq!(result.apexes[0].apex.height, max);
    }

    #[test]
    fn test_empty_is_clustering_error() {
        let err = SpatialDeduplicator
            .execute((Vec::new(), 0.3), DbscanParams::default())
            .unwrap_err();
        assert!(matches!(err, Error::Clustering(_)));
        assert!(err.is_recoverable());
    }
}
