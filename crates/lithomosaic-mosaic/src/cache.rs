//! Per-source cache of self-resolved batches.
//!
//! Each source is stored as `<work_dir>/<source>.resolved.geojson`, a
//! FeatureCollection whose properties hold the normalized metadata. The
//! collection also records the source id and a fingerprint of the settings
//! that produced it. A re-run that finds a matching file skips fetching,
//! normalization and resolution.

use geojson::{Feature, FeatureCollection, GeoJson, JsonObject};
use lithomosaic_core::config::MosaicSettings;
use lithomosaic_core::error::{MosaicError, Result};
use lithomosaic_core::metadata::CodeConvention;
use lithomosaic_core::models::{NormalizedUnit, SourceBatch, UnitMetadata};
use lithomosaic_geo::models::{to_geojson, to_multipolygon};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

const CACHE_SUFFIX: &str = ".resolved.geojson";
const SOURCE_MEMBER: &str = "source_id";
const SETTINGS_MEMBER: &str = "settings";

/// Digest of every setting that changes a resolved batch.
///
/// Concurrency, retries and the work directory are left out; they never
/// alter what a source resolves to.
pub fn settings_fingerprint(settings: &MosaicSettings, convention: CodeConvention) -> String {
    format!(
        "tolerance={:?};metadata_key={};validity={:?};codes={:?}",
        settings.tolerance,
        settings.metadata_key.join(","),
        settings.geometry_validity,
        convention
    )
}

#[derive(Debug, Clone)]
pub struct WorkCache {
    dir: PathBuf,
    fingerprint: Option<String>,
}

impl WorkCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            fingerprint: None,
        }
    }

    /// Only reuse artifacts written under the same settings fingerprint
    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }

    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Location of a source's cached batch
    pub fn path_for(&self, source_id: &str) -> PathBuf {
        self.dir.join(format!("{}{}", file_stem(source_id), CACHE_SUFFIX))
    }

    pub fn contains(&self, source_id: &str) -> bool {
        self.path_for(source_id).is_file()
    }

    /// Load a cached batch, assigning it the given priority.
    ///
    /// Returns `Ok(None)` when the source has no cached artifact, or when the
    /// artifact belongs to another source or was written under other settings.
    pub fn load(&self, source_id: &str, priority: usize) -> Result<Option<SourceBatch>> {
        let path = self.path_for(source_id);
        if !path.is_file() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        let geojson: GeoJson = content.parse().map_err(|e| {
            MosaicError::Serialization(format!("Failed to parse cache file {}: {}", path.display(), e))
        })?;
        let GeoJson::FeatureCollection(collection) = geojson else {
            return Err(MosaicError::Serialization(format!(
                "Cache file {} is not a FeatureCollection",
                path.display()
            )));
        };

        let members = collection.foreign_members.as_ref();
        let stored_source = members.and_then(|m| m.get(SOURCE_MEMBER)).and_then(|v| v.as_str());
        if stored_source != Some(source_id) {
            tracing::debug!(source = source_id, stored = ?stored_source, "Cache entry belongs to another source");
            return Ok(None);
        }
        if let Some(expected) = &self.fingerprint {
            let stored = members.and_then(|m| m.get(SETTINGS_MEMBER)).and_then(|v| v.as_str());
            if stored != Some(expected.as_str()) {
                tracing::debug!(source = source_id, "Cache entry was written under other settings");
                return Ok(None);
            }
        }

        let mut units = Vec::with_capacity(collection.features.len());
        for (idx, feature) in collection.features.into_iter().enumerate() {
            units.push(unit_from_feature(feature, idx)?);
        }

        tracing::debug!(source = source_id, units = units.len(), "Loaded cached batch");
        Ok(Some(SourceBatch::new(source_id, priority, units)))
    }

    /// Write a batch, replacing any previous artifact for its source
    pub fn store(&self, batch: &SourceBatch) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let mut features = Vec::with_capacity(batch.len());
        for unit in &batch.units {
            let properties = match serde_json::to_value(&unit.metadata) {
                Ok(serde_json::Value::Object(map)) => map,
                Ok(_) => serde_json::Map::new(),
                Err(e) => {
                    return Err(MosaicError::Serialization(format!(
                        "Failed to serialize metadata of {}: {}",
                        unit.feature_id, e
                    )))
                }
            };
            features.push(Feature {
                bbox: None,
                geometry: Some(to_geojson(&unit.geometry)),
                id: Some(geojson::feature::Id::String(unit.feature_id.clone())),
                properties: Some(properties),
                foreign_members: None,
            });
        }

        let mut members = JsonObject::new();
        members.insert(SOURCE_MEMBER.to_string(), serde_json::json!(batch.source_id));
        if let Some(fingerprint) = &self.fingerprint {
            members.insert(SETTINGS_MEMBER.to_string(), serde_json::json!(fingerprint));
        }
        let collection = FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(members),
        };
        let content = serde_json::to_string(&collection)
            .map_err(|e| MosaicError::Serialization(format!("Failed to serialize batch: {}", e)))?;

        // Write then rename so an interrupted run never leaves a truncated file
        let path = self.path_for(&batch.source_id);
        let staging = path.with_extension("tmp");
        fs::write(&staging, content)?;
        fs::rename(&staging, &path)?;

        tracing::debug!(source = %batch.source_id, path = %path.display(), "Cached resolved batch");
        Ok(path)
    }

    /// Remove cached artifacts for the listed sources, returning how many existed
    pub fn clean(&self, source_ids: &[String]) -> Result<usize> {
        let mut removed = 0;
        for source_id in source_ids {
            let path = self.path_for(source_id);
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        tracing::info!(removed, "Cleaned work cache");
        Ok(removed)
    }
}

fn unit_from_feature(feature: Feature, idx: usize) -> Result<NormalizedUnit> {
    let feature_id = match &feature.id {
        Some(geojson::feature::Id::String(s)) => s.clone(),
        Some(geojson::feature::Id::Number(n)) => n.to_string(),
        None => idx.to_string(),
    };

    let geometry = feature.geometry.as_ref().ok_or_else(|| MosaicError::InvalidGeometry {
        feature_id: feature_id.clone(),
        reason: "Cached feature has no geometry".to_string(),
    })?;
    let geometry = to_multipolygon(&feature_id, geometry)?;

    let properties = serde_json::Value::Object(feature.properties.unwrap_or_default());
    let metadata: UnitMetadata = serde_json::from_value(properties).map_err(|e| {
        MosaicError::Serialization(format!("Invalid cached metadata for {}: {}", feature_id, e))
    })?;

    Ok(NormalizedUnit::new(feature_id, geometry, metadata))
}

/// File-system-safe form of a source identifier.
///
/// Every byte outside `[A-Za-z0-9-]` becomes `_XX` (hex), `_` included, so
/// distinct ids never share a file.
fn file_stem(source_id: &str) -> String {
    let mut stem = String::with_capacity(source_id.len());
    for byte in source_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            stem.push(byte as char);
        } else {
            let _ = write!(stem, "_{:02X}", byte);
        }
    }
    stem
}
