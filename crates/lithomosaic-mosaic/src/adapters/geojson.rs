//! GeoJSON directory adapter
//!
//! Each source is a file `<root>/<source_id>.geojson` (or `.json`).

use async_trait::async_trait;
use geojson::GeoJson;
use lithomosaic_core::error::{MosaicError, Result};
use lithomosaic_core::models::RawRecord;
use lithomosaic_core::ports::SourceAdapter;
use lithomosaic_geo::models::to_multipolygon;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

const EXTENSIONS: &[&str] = &["geojson", "json"];

/// Reads sources from GeoJSON files in one directory
#[derive(Debug, Clone)]
pub struct GeoJsonDirAdapter {
    root: PathBuf,
    skipped: Arc<RwLock<HashMap<String, u64>>>,
}

impl GeoJsonDirAdapter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            skipped: Arc::default(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn locate(&self, source_id: &str) -> Option<PathBuf> {
        EXTENSIONS
            .iter()
            .map(|ext| self.root.join(format!("{}.{}", source_id, ext)))
            .find(|path| path.is_file())
    }
}

#[async_trait]
impl SourceAdapter for GeoJsonDirAdapter {
    async fn fetch(&self, source_id: &str) -> Result<Vec<RawRecord>> {
        let path = self.locate(source_id).ok_or_else(|| MosaicError::SourceNotFound {
            source_id: source_id.to_string(),
        })?;

        let content = tokio::fs::read_to_string(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::Interrupted | std::io::ErrorKind::TimedOut => {
                MosaicError::transient(source_id, e.to_string())
            }
            _ => MosaicError::Io(e),
        })?;

        let geojson: GeoJson = content.parse().map_err(|e| {
            MosaicError::adapter(source_id, format!("Failed to parse GeoJSON: {}", e))
        })?;

        let (records, skipped) = extract_records(source_id, geojson);
        if let Ok(mut counts) = self.skipped.write() {
            counts.insert(source_id.to_string(), skipped);
        }
        tracing::debug!(
            source = source_id,
            path = %path.display(),
            records = records.len(),
            skipped,
            "Read GeoJSON source"
        );
        Ok(records)
    }

    fn skipped_features(&self, source_id: &str) -> u64 {
        self.skipped
            .read()
            .ok()
            .and_then(|counts| counts.get(source_id).copied())
            .unwrap_or(0)
    }

    fn name(&self) -> &str {
        "GeoJSON"
    }
}

/// Turn polygonal features into records.
///
/// Features without polygonal geometry cannot take part in a mosaic. They are
/// skipped with a warning and returned as a count next to the records.
fn extract_records(source_id: &str, geojson: GeoJson) -> (Vec<RawRecord>, u64) {
    let features = match geojson {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(geometry) => vec![geojson::Feature::from(geometry)],
    };

    let mut records = Vec::with_capacity(features.len());
    let mut skipped = 0;
    for (idx, feature) in features.into_iter().enumerate() {
        let feature_id = match &feature.id {
            Some(geojson::feature::Id::String(s)) => s.clone(),
            Some(geojson::feature::Id::Number(n)) => n.to_string(),
            None => idx.to_string(),
        };

        let Some(geometry) = feature.geometry.as_ref() else {
            tracing::warn!(source = source_id, feature = %feature_id, "Skipping feature without geometry");
            skipped += 1;
            continue;
        };
        let geometry = match to_multipolygon(&feature_id, geometry) {
            Ok(geometry) => geometry,
            Err(e) => {
                tracing::warn!(source = source_id, error = %e, "Skipping non-polygonal feature");
                skipped += 1;
                continue;
            }
        };

        let attributes: HashMap<String, Value> = feature
            .properties
            .map(|properties| properties.into_iter().collect())
            .unwrap_or_default();

        records.push(RawRecord::new(feature_id, geometry, attributes));
    }
    (records, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const LEGEND: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": "u1",
                "properties": {"PTYPE": "Qal", "title": "Alluvium"},
                "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}
            },
            {
                "type": "Feature",
                "id": 7,
                "properties": {"code": "Kgr"},
                "geometry": {"type": "MultiPolygon", "coordinates": [[[[2,2],[3,2],[3,3],[2,3],[2,2]]]]}
            },
            {
                "type": "Feature",
                "properties": {"code": "fault"},
                "geometry": {"type": "LineString", "coordinates": [[0,0],[5,5]]}
            },
            {
                "type": "Feature",
                "id": "note",
                "properties": {"code": "annotation"},
                "geometry": null
            }
        ]
    }"#;

    #[tokio::test]
    async fn test_reads_polygonal_features() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bay.geojson"), LEGEND).unwrap();
        let adapter = GeoJsonDirAdapter::new(dir.path());

        let records = adapter.fetch("bay").await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].feature_id, "u1");
        assert_eq!(records[0].attributes["PTYPE"], "Qal");
        assert_eq!(records[1].feature_id, "7");
        assert_eq!(records[1].geometry.0.len(), 1);
        assert_eq!(adapter.skipped_features("bay"), 2);
        assert_eq!(adapter.skipped_features("elsewhere"), 0);
    }

    #[tokio::test]
    async fn test_json_extension_is_accepted() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bay.json"), LEGEND).unwrap();

        let records = GeoJsonDirAdapter::new(dir.path()).fetch("bay").await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_source() {
        let dir = TempDir::new().unwrap();
        let err = GeoJsonDirAdapter::new(dir.path()).fetch("nope").await.unwrap_err();
        assert!(matches!(err, MosaicError::SourceNotFound { .. }));
    }

    #[tokio::test]
    async fn test_malformed_file_is_not_retryable() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.geojson"), "{\"type\": \"Feature\"").unwrap();

        let err = GeoJsonDirAdapter::new(dir.path()).fetch("broken").await.unwrap_err();
        assert!(matches!(err, MosaicError::Adapter { .. }));
        assert!(!err.is_retryable());
    }
}
