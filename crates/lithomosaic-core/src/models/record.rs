use geo::MultiPolygon;
use serde_json::Value;
use std::collections::HashMap;

use super::metadata::UnitMetadata;

/// A polygon feature with free-text attributes, as produced by a source adapter
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// Identifier within the source, used in logs and errors
    pub feature_id: String,

    /// Polygonal geometry in the job's shared CRS
    pub geometry: MultiPolygon<f64>,

    /// Attribute map as found in the source
    pub attributes: HashMap<String, Value>,
}

impl RawRecord {
    pub fn new(
        feature_id: impl Into<String>,
        geometry: MultiPolygon<f64>,
        attributes: HashMap<String, Value>,
    ) -> Self {
        Self {
            feature_id: feature_id.into(),
            geometry,
            attributes,
        }
    }
}

/// A record whose attributes went through metadata normalization
///
/// Geometry operations may replace `geometry`. The metadata stays fixed.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedUnit {
    pub feature_id: String,
    pub geometry: MultiPolygon<f64>,
    pub metadata: UnitMetadata,
}

impl NormalizedUnit {
    pub fn new(
        feature_id: impl Into<String>,
        geometry: MultiPolygon<f64>,
        metadata: UnitMetadata,
    ) -> Self {
        Self {
            feature_id: feature_id.into(),
            geometry,
            metadata,
        }
    }
}

/// Normalized units of one source, at one merge priority
#[derive(Debug, Clone, PartialEq)]
pub struct SourceBatch {
    pub source_id: String,

    /// Position in the caller's source list; lower merges first and wins
    pub priority: usize,

    pub units: Vec<NormalizedUnit>,
}

impl SourceBatch {
    pub fn new(source_id: impl Into<String>, priority: usize, units: Vec<NormalizedUnit>) -> Self {
        Self {
            source_id: source_id.into(),
            priority,
            units,
        }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
