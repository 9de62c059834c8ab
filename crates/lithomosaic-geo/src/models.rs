//! Conversions between GeoJSON geometry and `geo` polygons.
//!
//! Sources, caches and exports speak GeoJSON; every geometric operation
//! works on `geo::MultiPolygon<f64>`.

use geo::{Coord, LineString, MultiPolygon, Polygon};
use geojson::{Geometry as GeoJsonGeometry, Value};
use lithomosaic_core::error::{MosaicError, Result};

/// Convert polygonal GeoJSON geometry into a multipolygon.
///
/// Polygons, multipolygons and collections of them are accepted. Anything
/// else is an `InvalidGeometry` error for `feature_id`. Positions with fewer
/// than two ordinates become NaN so validation reports them.
pub fn to_multipolygon(feature_id: &str, geometry: &GeoJsonGeometry) -> Result<MultiPolygon<f64>> {
    match &geometry.value {
        Value::Polygon(rings) => Ok(MultiPolygon::new(vec![polygon_from_rings(rings)])),
        Value::MultiPolygon(polygons) => {
            Ok(MultiPolygon::new(polygons.iter().map(|p| polygon_from_rings(p)).collect()))
        }
        Value::GeometryCollection(members) => {
            let mut polygons = Vec::new();
            for member in members {
                polygons.extend(to_multipolygon(feature_id, member)?.0);
            }
            Ok(MultiPolygon::new(polygons))
        }
        other => Err(MosaicError::InvalidGeometry {
            feature_id: feature_id.to_string(),
            reason: format!("Expected polygonal geometry, found {}", value_kind(other)),
        }),
    }
}

/// Convert a multipolygon into GeoJSON `MultiPolygon` geometry
pub fn to_geojson(geometry: &MultiPolygon<f64>) -> GeoJsonGeometry {
    let polygons = geometry
        .iter()
        .map(|polygon| {
            let mut rings = Vec::with_capacity(polygon.interiors().len() + 1);
            rings.push(ring_positions(polygon.exterior()));
            for interior in polygon.interiors() {
                rings.push(ring_positions(interior));
            }
            rings
        })
        .collect();
    GeoJsonGeometry::new(Value::MultiPolygon(polygons))
}

fn polygon_from_rings(rings: &[Vec<Vec<f64>>]) -> Polygon<f64> {
    let mut rings = rings.iter().map(|ring| {
        let coords: Vec<Coord<f64>> = ring
            .iter()
            .map(|position| Coord {
                x: position.first().copied().unwrap_or(f64::NAN),
                y: position.get(1).copied().unwrap_or(f64::NAN),
            })
            .collect();
        LineString::new(coords)
    });
    match rings.next() {
        Some(exterior) => Polygon::new(exterior, rings.collect()),
        None => Polygon::new(LineString::new(vec![]), vec![]),
    }
}

fn ring_positions(ring: &LineString<f64>) -> Vec<Vec<f64>> {
    ring.coords().map(|c| vec![c.x, c.y]).collect()
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}
