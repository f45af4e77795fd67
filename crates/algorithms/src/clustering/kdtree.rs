//! 2D k-d tree for spatial indexing of candidate points
//!
//! Provides fixed-radius queries, the region query behind DBSCAN.
//!
//! Reference:
//! Bentley, J.L. (1975). Multidimensional binary search trees used
//! for associative searching. CACM, 18(9).

use geo_types::Coord;

/// A 2D k-d tree over a borrowed point slice.
#[derive(Debug)]
pub struct KdTree<'a> {
    nodes: Vec<KdNode>,
    points: &'a [Coord<f64>],
}

#[derive(Debug)]
struct KdNode {
    /// Index into `points`
    point_idx: usize,
    /// Split dimension: 0 = x, 1 = y
    split_dim: u8,
    left: Option<usize>,
    right: Option<usize>,
}

impl<'a> KdTree<'a> {
    /// Build a k-d tree using median-of-coordinate splitting, O(n log n).
    pub fn build(points: &'a [Coord<f64>]) -> Self {
        let mut nodes = Vec::with_capacity(points.len());
        if !points.is_empty() {
            let mut indices: Vec<usize> = (0..points.len()).collect();
            build_recursive(points, &mut indices, 0, &mut nodes);
        }
        Self { nodes, points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Indices of all points within `radius` of `q` (boundary inclusive),
    /// in ascending index order.
    pub fn within_radius(&self, q: Coord<f64>, radius: f64) -> Vec<usize> {
        if self.nodes.is_empty() || radius < 0.0 {
            return Vec::new();
        }
        let mut results = Vec::new();
        self.radius_recursive(0, q, radius * radius, &mut results);
        results.sort_unstable();
        results
    }

    fn radius_recursive(&self, node_idx: usize, q: Coord<f64>, radius_sq: f64, results: &mut Vec<usize>) {
        let node = &self.nodes[node_idx];
        let p = self.points[node.point_idx];
        let (dx, dy) = (q.x - p.x, q.y - p.y);

        if dx * dx + dy * dy <= radius_sq {
            results.push(node.point_idx);
        }

        let diff = if node.split_dim == 0 { dx } else { dy };

        // Descend into a side when the query is on it or the split plane is within range
        if let Some(left) = node.left {
            if diff <= 0.0 || diff * diff <= radius_sq {
                self.radius_recursive(left, q, radius_sq, results);
            }
        }
        if let Some(right) = node.right {
            if diff >= 0.0 || diff * diff <= radius_sq {
                self.radius_recursive(right, q, radius_sq, results);
            }
        }
    }
}

fn build_recursive(points: &[Coord<f64>], indices: &mut [usize], depth: usize, nodes: &mut Vec<KdNode>) -> usize {
    let n = indices.len();
    let split_dim = (depth % 2) as u8;
    let key = |i: usize| if split_dim == 0 { points[i].x } else { points[i].y };

    indices.sort_by(|&a, &b| key(a).total_cmp(&key(b)).then(a.cmp(&b)));

    let median = n / 2;
    let node_idx = nodes.len();
    nodes.push(KdNode {
        point_idx: indices[median],
        split_dim,
        left: None,
        right: None,
    });

    if median > 0 {
        let left_idx = build_recursive(points, &mut indices[..median], depth + 1, nodes);
        nodes[node_idx].left = Some(left_idx);
    }
    if median + 1 < n {
        let right_idx = build_recursive(points, &mut indices[median + 1..], depth + 1, nodes);
        nodes[node_idx].right = Some(right_idx);
    }

    node_idx
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_points() -> Vec<Coord<f64>> {
        [(2.0, 3.0), (5.0, 4.0), (9.0, 6.0), (4.0, 7.0), (8.0, 1.0), (7.0, 2.0), (1.0, 8.0), (6.0, 5.0)]
            .iter()
            .map(|&(x, y)| Coord { x, y })
            .collect()
    }

    fn dist_sq(a: Coord<f64>, b: Coord<f64>) -> f64 {
        (a.x - b.x).powi(2) + (a.y - b.y).powi(2)
    }

    #[test]
    fn test_empty_tree() {
        let tree = KdTree::build(&[]);
        assert!(tree.is_empty());
        assert!(tree.within_radius(Coord { x: 0.0, y: 0.0 }, 10.0).is_empty());
    }

    #[test]
    fn test_within_radius_matches_brute_force() {
        let pts = sample_points();
        let tree = KdTree::build(&pts);
        assert_eq!(tree.len(), 8);

        for radius in [0.0, 1.0, 2.5, 4.0, 20.0] {
            let q = Coord { x: 5.0, y: 4.0 };
            let expected: Vec<usize> = (0..pts.len())
                .filter(|&i| dist_sq(pts[i], q) <= radius * radius)
                .collect();
            assert_eq!(tree.within_radius(q, radius), expected, "radius {}", radius);
        }
    }

    #[test]
    fn test_duplicate_points() {
        let pts = vec![Coord { x: 1.0, y: 1.0 }; 6];
        let tree = KdTree::build(&pts);
        assert_eq!(tree.within_radius(Coord { x: 1.0, y: 1.0 }, 0.0), vec![0, 1, 2, 3, 4, 5]);
    }
}
