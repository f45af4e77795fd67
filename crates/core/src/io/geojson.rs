//! GeoJSON output for feature collections

use crate::error::{Error, Result};
use crate::vector::FeatureCollection;
use geo_types::{Coord, Geometry, LineString, Polygon};
use serde_json::{json, Map, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

fn position(c: &Coord<f64>) -> Value {
    json!([c.x, c.y])
}

fn ring(line: &LineString<f64>) -> Value {
    Value::Array(line.coords().map(position).collect())
}

fn polygon_rings(polygon: &Polygon<f64>) -> Value {
    let mut rings = vec![ring(polygon.exterior())];
    rings.extend(polygon.interiors().iter().map(ring));
    Value::Array(rings)
}

fn geometry_value(geometry: &Geometry<f64>) -> Result<Value> {
    let value = match geometry {
        Geometry::Point(p) => json!({ "type": "Point", "coordinates": position(&p.0) }),
        Geometry::MultiPoint(mp) => json!({
            "type": "MultiPoint",
            "coordinates": mp.iter().map(|p| position(&p.0)).collect::<Vec<_>>(),
        }),
        Geometry::LineString(ls) => json!({ "type": "LineString", "coordinates": ring(ls) }),
        Geometry::Polygon(poly) => json!({ "type": "Polygon", "coordinates": polygon_rings(poly) }),
        Geometry::MultiPolygon(mp) => json!({
            "type": "MultiPolygon",
            "coordinates": mp.iter().map(polygon_rings).collect::<Vec<_>>(),
        }),
        other => {
            return Err(Error::UnsupportedDataType(format!(
                "GeoJSON output does not support {:?}",
                other
            )))
        }
    };
    Ok(value)
}

/// Convert a feature collection into a GeoJSON `FeatureCollection` value
pub fn to_geojson(collection: &FeatureCollection) -> Result<Value> {
    let mut features = Vec::with_capacity(collection.len());
    for feature in collection.iter() {
        let geometry = match &feature.geometry {
            Some(g) => geometry_value(g)?,
            None => Value::Null,
        };
        let properties: Map<String, Value> = feature
            .properties
            .iter()
            .map(|(k, v)| Ok((k.clone(), serde_json::to_value(v)?)))
            .collect::<Result<_>>()?;
        features.push(json!({
            "type": "Feature",
            "geometry": geometry,
            "properties": properties,
        }));
    }

    let mut root = json!({
        "type": "FeatureCollection",
        "features": features,
    });
    if let Some(crs) = &collection.crs {
        root["crs"] = json!({ "type": "name", "properties": { "name": crs } });
    }
    Ok(root)
}

/// Write a feature collection to a GeoJSON file
pub fn write_geojson<P: AsRef<Path>>(collection: &FeatureCollection, path: P) -> Result<()> {
    let value = to_geojson(collection)?;
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    serde_json::to_writer_pretty(&mut writer, &value)?;
    writer.flush()?;
    Ok(())
}
