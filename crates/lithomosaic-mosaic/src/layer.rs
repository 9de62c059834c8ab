//! The append-only output layer

use geo::MultiPolygon;
use geojson::{Feature, FeatureCollection};
use lithomosaic_core::models::{SourceBatch, UnitMetadata};
use lithomosaic_geo::models::to_geojson;
use lithomosaic_geo::ops;
use serde_json::Value;

/// One unit of the finished mosaic
#[derive(Debug, Clone, PartialEq)]
pub struct LayerRecord {
    pub source_id: String,
    pub priority: usize,
    pub feature_id: String,
    pub metadata: UnitMetadata,
    pub geometry: MultiPolygon<f64>,
}

/// Append-only sequence of merged units.
///
/// Records from different sources never overlap by more than the job's
/// tolerance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinalLayer {
    records: Vec<LayerRecord>,
}

impl FinalLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append every unit of a batch, returning how many were added
    pub fn append(&mut self, batch: &SourceBatch) -> usize {
        self.records.extend(batch.units.iter().map(|unit| LayerRecord {
            source_id: batch.source_id.clone(),
            priority: batch.priority,
            feature_id: unit.feature_id.clone(),
            metadata: unit.metadata.clone(),
            geometry: unit.geometry.clone(),
        }));
        batch.len()
    }

    pub fn records(&self) -> &[LayerRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &LayerRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn total_area(&self) -> f64 {
        self.records.iter().map(|r| ops::area(&r.geometry)).sum()
    }

    /// Records contributed by one source
    pub fn features_for(&self, source_id: &str) -> Vec<&LayerRecord> {
        self.records
            .iter()
            .filter(|r| r.source_id == source_id)
            .collect()
    }

    pub fn area_for(&self, source_id: &str) -> f64 {
        self.features_for(source_id)
            .iter()
            .map(|r| ops::area(&r.geometry))
            .sum()
    }

    /// Export as GeoJSON, with provenance and every metadata column as properties
    pub fn to_feature_collection(&self) -> FeatureCollection {
        let features = self
            .records
            .iter()
            .map(|record| {
                let mut properties = serde_json::Map::new();
                properties.insert("source".to_string(), Value::from(record.source_id.clone()));
                properties.insert("priority".to_string(), Value::from(record.priority));
                properties.insert("feature_id".to_string(), Value::from(record.feature_id.clone()));
                properties.extend(record.metadata.to_properties());

                Feature {
                    bbox: None,
                    geometry: Some(to_geojson(&record.geometry)),
                    id: None,
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;
    use lithomosaic_core::models::NormalizedUnit;

    fn square(x0: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: x0, y: 0.0),
            (x: x0 + size, y: 0.0),
            (x: x0 + size, y: size),
            (x: x0, y: size),
            (x: x0, y: 0.0),
        ]])
    }

    fn batch(source: &str, priority: usize, code: &str, geometry: MultiPolygon<f64>) -> SourceBatch {
        let metadata = UnitMetadata { code: Some(code.to_string()), ..Default::default() };
        SourceBatch::new(source, priority, vec![NormalizedUnit::new("f1", geometry, metadata)])
    }

    #[test]
    fn test_append_and_query() {
        let mut layer = FinalLayer::new();
        assert_eq!(layer.append(&batch("a", 0, "Kgr", square(0.0, 2.0))), 1);
        assert_eq!(layer.append(&batch("b", 1, "Tsh", square(5.0, 1.0))), 1);

        assert_eq!(layer.len(), 2);
        assert!((layer.total_area() - 5.0).abs() < 1e-9);
        assert_eq!(layer.features_for("a").len(), 1);
        assert!((layer.area_for("b") - 1.0).abs() < 1e-9);
        assert!(layer.features_for("missing").is_empty());
    }

    #[test]
    fn test_feature_collection_properties() {
        let mut layer = FinalLayer::new();
        layer.append(&batch("a", 0, "Kgr", square(0.0, 2.0)));

        let collection = layer.to_feature_collection();
        assert_eq!(collection.features.len(), 1);

        let feature = &collection.features[0];
        let properties = feature.properties.as_ref().unwrap();
        assert_eq!(properties["source"], "a");
        assert_eq!(properties["priority"], 0);
        assert_eq!(properties["code"], "Kgr");
        assert!(properties.contains_key("controlled_span"));
        assert!(matches!(
            feature.geometry.as_ref().map(|g| &g.value),
            Some(geojson::Value::MultiPolygon(_))
        ));
    }
}
