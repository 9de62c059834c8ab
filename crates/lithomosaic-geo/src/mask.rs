//! Running union of every footprint merged so far

use crate::ops;
use geo::{BooleanOps, MultiPolygon};
use lithomosaic_core::models::SourceBatch;

/// Accumulated coverage of all merged sources.
///
/// After each update the mask is closed (buffered out then in by the
/// tolerance) so slivers and gaps narrower than the tolerance do not survive
/// into the next clip.
#[derive(Debug, Clone)]
pub struct MaskAccumulator {
    geometry: MultiPolygon<f64>,
    tolerance: f64,
}

impl MaskAccumulator {
    pub fn new(tolerance: f64) -> Self {
        Self {
            geometry: ops::empty(),
            tolerance,
        }
    }

    /// Start the mask from the first merged source
    pub fn initialize(&mut self, batch: &SourceBatch) {
        let footprint = footprint(batch);
        self.geometry = ops::close(&footprint, self.tolerance);
        tracing::debug!(source = %batch.source_id, area = self.area(), "Initialized coverage mask");
    }

    /// Add a source's footprint to the mask
    pub fn update(&mut self, batch: &SourceBatch) {
        let footprint = footprint(batch);
        let merged = self.geometry.union(&footprint);
        self.geometry = ops::close(&merged, self.tolerance);
        tracing::debug!(source = %batch.source_id, area = self.area(), "Updated coverage mask");
    }

    pub fn geometry(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn area(&self) -> f64 {
        ops::area(&self.geometry)
    }

    pub fn is_empty(&self) -> bool {
        ops::is_degenerate(&self.geometry)
    }

    pub fn reset(&mut self) {
        self.geometry = ops::empty();
    }
}

fn footprint(batch: &SourceBatch) -> MultiPolygon<f64> {
    ops::union_all(batch.units.iter().map(|unit| unit.geometry.clone()))
}
