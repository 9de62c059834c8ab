use chrono::{DateTime, Utc};
use geo::MultiPolygon;
use lithomosaic_core::models::SourceBatch;
use lithomosaic_geo::CounterSnapshot;
use serde::Serialize;
use uuid::Uuid;

use crate::layer::FinalLayer;

/// A self-resolved source ready to be merged
#[derive(Debug, Clone)]
pub struct PreparedSource {
    pub batch: SourceBatch,

    /// Records the adapter returned, before normalization and resolution
    pub input_features: usize,

    /// Drops and repairs that happened while preparing this source
    pub counters: CounterSnapshot,

    /// Whether the batch came from the work cache
    pub from_cache: bool,
}

impl PreparedSource {
    /// Wrap a batch that was prepared elsewhere
    pub fn new(batch: SourceBatch) -> Self {
        Self {
            input_features: batch.len(),
            batch,
            counters: CounterSnapshot::default(),
            from_cache: false,
        }
    }
}

/// What merging one source did to the mosaic
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceReport {
    pub source_id: String,
    pub priority: usize,
    pub input_features: usize,
    pub resolved_features: usize,
    pub appended_features: usize,
    pub appended_area: f64,
    /// Mask area after this source's footprint was added
    pub mask_area: f64,
    pub dropped: CounterSnapshot,
    pub from_cache: bool,
}

/// Result of a complete pipeline run
#[derive(Debug, Clone)]
pub struct MosaicOutput {
    pub run_id: Uuid,
    pub layer: FinalLayer,
    pub mask: MultiPolygon<f64>,
    pub reports: Vec<SourceReport>,
    /// Counter totals for the job, including resumed runs
    pub counters: CounterSnapshot,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl MosaicOutput {
    pub fn report_for(&self, source_id: &str) -> Option<&SourceReport> {
        self.reports.iter().find(|r| r.source_id == source_id)
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
