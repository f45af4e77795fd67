//! Vector products: tree points and circular crown polygons
//!
//! Crowns are approximated as circles whose diameter is proportional to
//! tree height.

use std::f64::consts::TAU;

use canopy_core::vector::{Feature, FeatureCollection};
use canopy_core::{Error, Result, CRS};
use geo_types::{Coord, LineString, Point, Polygon};
use serde::{Deserialize, Serialize};

use super::registry::TreeRecord;

/// Parameters for crown polygon generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrownParams {
    /// Crown diameter per unit of tree height
    pub k: f64,
    /// Number of vertices of the circle approximation
    pub segments: usize,
}

impl Default for CrownParams {
    fn default() -> Self {
        Self { k: 0.15, segments: 36 }
    }
}

impl CrownParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.k.is_finite() && self.k > 0.0) {
            return Err(Error::InvalidParameter {
                name: "k",
                value: self.k.to_string(),
                reason: "crown coefficient must be finite and positive".to_string(),
            });
        }
        if self.segments < 3 {
            return Err(Error::InvalidParameter {
                name: "segments",
                value: self.segments.to_string(),
                reason: "a polygon needs at least 3 vertices".to_string(),
            });
        }
        Ok(())
    }

    /// Crown diameter for a tree of the given height
    pub fn diameter(&self, height: f64) -> f64 {
        self.k * height
    }
}

/// Circle of `segments` vertices around the tree apex
pub fn crown_polygon(tree: &TreeRecord, params: &CrownParams) -> Polygon<f64> {
    let radius = params.diameter(tree.height) / 2.0;
    let ring: Vec<Coord<f64>> = (0..params.segments)
        .map(|i| {
            let angle = TAU * i as f64 / params.segments as f64;
            Coord {
                x: tree.x + radius * angle.cos(),
                y: tree.y + radius * angle.sin(),
            }
        })
        .collect();
    Polygon::new(LineString::from(ring), Vec::new())
}

fn with_tree_attributes(feature: Feature, tree: &TreeRecord) -> Feature {
    feature
        .with_property("tree_id", tree.tree_id)
        .with_property("x_coord", tree.x)
        .with_property("y_coord", tree.y)
        .with_property("height", tree.height)
}

/// Point features with fields `tree_id`, `x_coord`, `y_coord`, `height`
pub fn tree_points(trees: &[TreeRecord], crs: Option<&CRS>) -> FeatureCollection {
    let mut collection: FeatureCollection = trees
        .iter()
        .map(|t| with_tree_attributes(Feature::new(Point::new(t.x, t.y)), t))
        .collect();
    collection.crs = crs.map(CRS::identifier);
    collection
}

/// Crown polygon features carrying the point fields plus `diameter`
pub fn crown_polygons(trees: &[TreeRecord], params: &CrownParams, crs: Option<&CRS>) -> Result<FeatureCollection> {
    params.validate()?;
    let mut collection: FeatureCollection = trees
        .iter()
        .map(|t| {
            with_tree_attributes(Feature::new(crown_polygon(t, params)), t)
                .with_property("diameter", params.diameter(t.height))
        })
        .collect();
    collection.crs = crs.map(CRS::identifier);
    Ok(collection)
}
