//! Clipping of a self-clean source against the coverage mask

use crate::counters::DropCounters;
use crate::index::SpatialIndex;
use crate::mask::MaskAccumulator;
use crate::ops;
use geo::{BooleanOps, MultiPolygon, Polygon};
use lithomosaic_core::config::MosaicSettings;
use lithomosaic_core::models::{NormalizedUnit, SourceBatch};
use rstar::AABB;
use std::collections::HashMap;
use std::sync::Arc;

/// Removes the parts of a batch that already-merged sources cover.
///
/// Residue left within the tolerance of the mask is treated as a sliver and
/// dropped, so appending the result cannot overlap existing output by more
/// than the tolerance.
pub struct CrossSourceClipper {
    metadata_key: Vec<String>,
    tolerance: f64,
    counters: Arc<DropCounters>,
}

impl CrossSourceClipper {
    pub fn new(settings: &MosaicSettings, counters: Arc<DropCounters>) -> Self {
        Self {
            metadata_key: settings.metadata_key.clone(),
            tolerance: settings.tolerance,
            counters,
        }
    }

    pub fn clip(&self, batch: &SourceBatch, mask: &MaskAccumulator) -> SourceBatch {
        if mask.is_empty() {
            return batch.clone();
        }

        let mask_parts = ops::dump(mask.geometry());
        let index = SpatialIndex::from_envelopes(
            mask_parts
                .iter()
                .enumerate()
                .filter_map(|(id, part)| ops::polygon_envelope(part).map(|env| (id, env)))
                .collect(),
        );

        let mut order: Vec<Vec<Option<String>>> = Vec::new();
        let mut groups: HashMap<Vec<Option<String>>, (&NormalizedUnit, Vec<Polygon<f64>>)> =
            HashMap::new();
        let mut clipped = 0usize;

        for unit in &batch.units {
            let key = unit.metadata.key(&self.metadata_key);
            for piece in ops::dump(&unit.geometry) {
                let kept = self.clip_piece(piece, &mask_parts, &index);
                if kept.is_empty() {
                    clipped += 1;
                    continue;
                }
                if !groups.contains_key(&key) {
                    order.push(key.clone());
                }
                groups.entry(key.clone()).or_insert_with(|| (unit, Vec::new())).1.extend(kept);
            }
        }

        let mut units = Vec::with_capacity(order.len());
        for key in order {
            let Some((first, polygons)) = groups.remove(&key) else {
                continue;
            };
            let geometry = MultiPolygon::new(polygons);
            if ops::is_degenerate(&geometry) {
                self.counters.record_degenerate();
                continue;
            }
            units.push(NormalizedUnit::new(first.feature_id.clone(), geometry, first.metadata.clone()));
        }

        tracing::info!(
            source = %batch.source_id,
            input_units = batch.len(),
            output_units = units.len(),
            pieces_removed = clipped,
            "Clipped source against mask"
        );

        SourceBatch::new(batch.source_id.clone(), batch.priority, units)
    }

    /// Subtract nearby mask polygons from one piece and drop sliver residue
    fn clip_piece(
        &self,
        piece: Polygon<f64>,
        mask_parts: &[Polygon<f64>],
        index: &SpatialIndex,
    ) -> Vec<Polygon<f64>> {
        let Some(envelope) = ops::polygon_envelope(&piece) else {
            return Vec::new();
        };
        let candidates = index.query(&grow(&envelope, self.tolerance));
        if candidates.is_empty() {
            return vec![piece];
        }

        let local = MultiPolygon::new(candidates.iter().map(|&id| mask_parts[id].clone()).collect());
        let residue = MultiPolygon::new(vec![piece]).difference(&local);
        if residue.0.is_empty() {
            self.counters.record_contained();
            return Vec::new();
        }

        let grown = ops::buffer(&local, self.tolerance);
        let sliver_area = self.tolerance * self.tolerance;
        let mut kept = Vec::with_capacity(residue.0.len());
        for part in residue.0 {
            let part = MultiPolygon::new(vec![part]);
            if ops::area(&part.difference(&grown)) <= sliver_area {
                self.counters.record_contained();
                tracing::debug!(area = ops::area(&part), "Dropping residue inside buffered mask");
                continue;
            }
            kept.extend(part.0);
        }
        kept
    }
}

fn grow(envelope: &AABB<[f64; 2]>, distance: f64) -> AABB<[f64; 2]> {
    let lower = envelope.lower();
    let upper = envelope.upper();
    AABB::from_corners(
        [lower[0] - distance, lower[1] - distance],
        [upper[0] + distance, upper[1] + distance],
    )
}
