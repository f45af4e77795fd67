//! DBSCAN density-based clustering of 2D points
//!
//! A point is a core point when at least `min_points` points (itself
//! included) lie within `eps`. Clusters are the closure of core points under
//! eps-reachability plus the border points they reach. Everything else is
//! noise.
//!
//! Reference:
//! Ester, M., Kriegel, H.-P., Sander, J., & Xu, X. (1996). A density-based
//! algorithm for discovering clusters in large spatial databases with noise.
//! KDD-96, 226-231.

use std::collections::VecDeque;

use canopy_core::{Algorithm, Error, Result};
use geo_types::Coord;

use super::kdtree::KdTree;

/// Parameters for DBSCAN
#[derive(Debug, Clone)]
pub struct DbscanParams {
    /// Neighbourhood radius in map units
    pub eps: f64,
    /// Minimum neighbourhood size for a core point, the point itself included
    pub min_points: usize,
}

impl Default for DbscanParams {
    fn default() -> Self {
        Self {
            eps: 0.3,
            min_points: 5,
        }
    }
}

/// Result of a DBSCAN run
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    /// Cluster label per input point, `None` for noise
    pub labels: Vec<Option<usize>>,
    /// Number of clusters; labels run `0..n_clusters`
    pub n_clusters: usize,
}

impl Clustering {
    /// Number of points labelled as noise
    pub fn noise_count(&self) -> usize {
        self.labels.iter().filter(|l| l.is_none()).count()
    }
}

/// DBSCAN algorithm
#[derive(Debug, Clone, Default)]
pub struct Dbscan;

impl Algorithm for Dbscan {
    type Input = Vec<Coord<f64>>;
    type Output = Clustering;
    type Params = DbscanParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "DBSCAN"
    }

    fn description(&self) -> &'static str {
        "Density-based spatial clustering with noise"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        dbscan(&input, &params)
    }
}

/// Cluster `points` with DBSCAN.
///
/// Cluster labels are assigned in order of discovery while scanning the
/// input, so the result depends only on the input order. A border point
/// reachable from several clusters joins the first one that reaches it.
pub fn dbscan(points: &[Coord<f64>], params: &DbscanParams) -> Result<Clustering> {
    if !(params.eps.is_finite() && params.eps > 0.0) {
        return Err(Error::InvalidParameter {
            name: "eps",
            value: params.eps.to_string(),
            reason: "clustering radius must be finite and positive".to_string(),
        });
    }
    if params.min_points == 0 {
        return Err(Error::InvalidParameter {
            name: "min_points",
            value: "0".to_string(),
            reason: "minimum neighbourhood size must be at least 1".to_string(),
        });
    }

    let tree = KdTree::build(points);
    let mut labels: Vec<Option<usize>> = vec![None; points.len()];
    let mut visited = vec![false; points.len()];
    // Each point enters the expansion queue at most once over the whole run
    let mut queued = vec![false; points.len()];
    let mut n_clusters = 0;
    let mut queue = VecDeque::new();

    for i in 0..points.len() {
        if visited[i] {
            continue;
        }
        visited[i] = true;

        let neighbors = tree.within_radius(points[i], params.eps);
        if neighbors.len() < params.min_points {
            continue;
        }

        let cluster = n_clusters;
        n_clusters += 1;
        labels[i] = Some(cluster);
        queued[i] = true;
        enqueue(&mut queue, &mut queued, neighbors);

        while let Some(j) = queue.pop_front() {
            if labels[j].is_none() {
                labels[j] = Some(cluster);
            }
            if visited[j] {
                continue;
            }
            visited[j] = true;

            let reach = tree.within_radius(points[j], params.eps);
            if reach.len() >= params.min_points {
                enqueue(&mut queue, &mut queued, reach);
            }
        }
    }

    Ok(Clustering { labels, n_clusters })
}

fn enqueue(queue: &mut VecDeque<usize>, queued: &mut [bool], indices: Vec<usize>) {
    for k in indices {
        if !queued[k] {
            queued[k] = true;
            queue.push_back(k);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(cx: f64, cy: f64, n: usize, step: f64) -> Vec<Coord<f64>> {
        let side = (n as f64).sqrt().ceil() as usize;
        (0..n)
            .map(|i| Coord {
                x: cx + (i % side) as f64 * step,
                y: cy + (i / side) as f64 * step,
            })
            .collect()
    }

    fn params(eps: f64, min_points: usize) -> DbscanParams {
        DbscanParams { eps, min_points }
    }

    #[test]
    fn test_two_blobs_and_noise() {
        let mut points = blob(0.0, 0.0, 25, 0.1);
        points.extend(blob(10.0, 10.0, 16, 0.1));
        points.push(Coord { x: 5.0, y: -5.0 });

        let result = dbscan(&points, &params(0.3, 5)).unwrap();
        assert_eq!(result.n_clusters, 2);
        assert!(result.labels[..25].iter().all(|&l| l == Some(0)));
        assert!(result.labels[25..41].iter().all(|&l| l == Some(1)));
        assert_eq!(result.labels[41], None);
        assert_eq!(result.noise_count(), 1);
    }

    #[test]
    fn test_sparse_points_are_noise() {
        let points: Vec<_> = (0..10).map(|i| Coord { x: i as f64 * 10.0, y: 0.0 }).collect();
        let result = dbscan(&points, &params(1.0, 2)).unwrap();
        assert_eq!(result.n_clusters, 0);
        assert_eq!(result.noise_count(), 10);
    }

    #[test]
    fn test_border_point_joins_cluster() {
        // A dense line with one point just within eps of its end
        let mut points: Vec<_> = (0..6).map(|i| Coord { x: i as f64, y: 0.0 }).collect();
        points.push(Coord { x: 7.9, y: 0.0 });
        let result = dbscan(&points, &params(3.0, 5)).unwrap();
        assert_eq!(result.n_clusters, 1);
        assert_eq!(result.labels[6], Some(0));
    }

    #[test]
    fn test_chain_of_core_points_is_one_cluster() {
        let points: Vec<_> = (0..100).map(|i| Coord { x: i as f64 * 0.1, y: 0.0 }).collect();
        let result = dbscan(&points, &params(0.25, 5)).unwrap();
        assert_eq!(result.n_clusters, 1);
        assert_eq!(result.noise_count(), 0);
    }

    /// Quadratic DBSCAN: cores by exhaustive counting, clusters as connected
    /// core components numbered by their lowest index, border points joining
    /// the lowest-numbered cluster with a core within reach.
    fn exhaustive_labels(points: &[Coord<f64>], eps: f64, min_points: usize) -> Vec<Option<usize>> {
        let n = points.len();
        let near = |a: usize, b: usize| {
            let (dx, dy) = (points[a].x - points[b].x, points[a].y - points[b].y);
            dx * dx + dy * dy <= eps * eps
        };
        let core: Vec<bool> = (0..n)
            .map(|i| (0..n).filter(|&k| near(i, k)).count() >= min_points)
            .collect();

        let mut labels = vec![None; n];
        let mut next = 0;
        for i in 0..n {
            if !core[i] || labels[i].is_some() {
                continue;
            }
            labels[i] = Some(next);
            let mut stack = vec![i];
            while let Some(j) = stack.pop() {
                for k in 0..n {
                    if core[k] && labels[k].is_none() && near(j, k) {
                        labels[k] = Some(next);
                        stack.push(k);
                    }
                }
            }
            next += 1;
        }

        for i in 0..n {
            if !core[i] {
                labels[i] = (0..n).filter(|&k| core[k] && near(i, k)).filter_map(|k| labels[k]).min();
            }
        }
        labels
    }

    #[test]
    fn test_matches_exhaustive_clustering() {
        let mut state: u64 = 42;
        let mut uniform = move || {
            state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
            (state >> 11) as f64 / (1u64 << 53) as f64
        };
        // Dense clumps on a sparse background
        let mut points = Vec::new();
        for clump in 0..6 {
            let (cx, cy) = (3.0 * clump as f64, (clump % 3) as f64 * 2.0);
            for _ in 0..40 {
                points.push(Coord { x: cx + uniform(), y: cy + uniform() });
            }
        }
        for _ in 0..80 {
            points.push(Coord { x: 18.0 * uniform(), y: 6.0 * uniform() });
        }

        for (eps, min_points) in [(0.2, 4), (0.35, 6), (0.6, 10), (1.5, 3)] {
            let result = dbscan(&points, &params(eps, min_points)).unwrap();
            let expected = exhaustive_labels(&points, eps, min_points);
            assert_eq!(result.labels, expected, "eps {} min_points {}", eps, min_points);
            assert_eq!(result.n_clusters, expected.iter().flatten().max().map_or(0, |m| m + 1));
        }
    }

    #[test]
    fn test_dense_blob_is_one_cluster() {
        let points = blob(0.0, 0.0, 2500, 0.01);
        let result = dbscan(&points, &params(0.5, 5)).unwrap();
        assert_eq!(result.n_clusters, 1);
        assert_eq!(result.noise_count(), 0);
    }

    #[test]
    fn test_empty_input() {
        let result = Dbscan.execute(Vec::new(), DbscanParams::default()).unwrap();
        assert_eq!(result.n_clusters, 0);
        assert!(result.labels.is_empty());
    }

    #[test]
    fn test_invalid_params() {
        assert!(dbscan(&[], &params(0.0, 5)).is_err());
        assert!(dbscan(&[], &params(f64::NAN, 5)).is_err());
        assert!(dbscan(&[], &params(1.0, 0)).is_err());
    }
}
