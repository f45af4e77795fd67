//! Vector features: tree points and crown polygons with attributes

use geo_types::Geometry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Int(v)
    }
}

impl From<u32> for AttributeValue {
    fn from(v: u32) -> Self {
        AttributeValue::Int(v as i64)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        if v.is_finite() { AttributeValue::Float(v) } else { AttributeValue::Null }
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::String(v.to_string())
    }
}

/// A geographic feature with geometry and attributes
///
/// Attributes are kept sorted by name so serialized output is stable.
#[derive(Debug, Clone)]
pub struct Feature {
    /// Feature geometry
    pub geometry: Option<Geometry<f64>>,
    /// Feature attributes
    pub properties: BTreeMap<String, AttributeValue>,
}

impl Feature {
    /// Create a new feature with geometry
    pub fn new(geometry: impl Into<Geometry<f64>>) -> Self {
        Self {
            geometry: Some(geometry.into()),
            properties: BTreeMap::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.set_property(key, value);
        self
    }

    /// Set an attribute
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Get an attribute
    pub fn get_property(&self, key: &str) -> Option<&AttributeValue> {
        self.properties.get(key)
    }
}

/// Collection of features sharing one coordinate system
#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
    /// Coordinate system identifier, e.g. `EPSG:32638`
    pub crs: Option<String>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().collect(),
            crs: None,
        }
    }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::Point;

    #[test]
    fn test_feature_properties() {
        let f = Feature::new(Point::new(1.0, 2.0))
            .with_property("tree_id", 7u32)
            .with_property("height", 12.5);
        assert_eq!(f.get_property("tree_id"), Some(&AttributeValue::Int(7)));
        assert_eq!(f.get_property("height"), Some(&AttributeValue::Float(12.5)));
        assert!(f.get_property("species").is_none());
    }

    #[test]
    fn test_non_finite_becomes_null() {
        assert_eq!(AttributeValue::from(f64::NAN), AttributeValue::Null);
    }

    #[test]
    fn test_collect() {
        let fc: FeatureCollection = (0..3)
            .map(|i| Feature::new(Point::new(i as f64, 0.0)))
            .collect();
        assert_eq!(fc.len(), 3);
        assert!(fc.crs.is_none());
    }
}
