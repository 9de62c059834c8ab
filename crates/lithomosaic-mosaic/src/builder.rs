//! Ordered merge of self-resolved sources into the final layer

use lithomosaic_core::config::MosaicSettings;
use lithomosaic_core::error::{MosaicError, Result};
use lithomosaic_core::models::SourceBatch;
use lithomosaic_geo::{CrossSourceClipper, DropCounters, MaskAccumulator, SelfOverlapResolver};
use serde::Serialize;
use std::sync::Arc;

use crate::layer::FinalLayer;
use crate::models::{PreparedSource, SourceReport};

/// Progress through the ordered source list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BuilderState {
    NotStarted,
    /// Waiting for the source at this priority
    ProcessingSource(usize),
    Done,
}

/// Merges sources one at a time in priority order.
///
/// The first source is appended whole and seeds the mask. Every later source
/// is clipped against the mask, appended, and then adds its full pre-clip
/// footprint to the mask. The builder doubles as the checkpoint of a job:
/// completed sources stay merged when a later one fails.
pub struct MosaicBuilder {
    sources: Vec<String>,
    state: BuilderState,
    layer: FinalLayer,
    mask: MaskAccumulator,
    resolver: SelfOverlapResolver,
    clipper: CrossSourceClipper,
    counters: Arc<DropCounters>,
    reports: Vec<SourceReport>,
}

impl MosaicBuilder {
    pub fn new(sources: Vec<String>, settings: &MosaicSettings, counters: Arc<DropCounters>) -> Self {
        Self {
            sources,
            state: BuilderState::NotStarted,
            layer: FinalLayer::new(),
            mask: MaskAccumulator::new(settings.tolerance),
            resolver: SelfOverlapResolver::new(settings, Arc::clone(&counters)),
            clipper: CrossSourceClipper::new(settings, Arc::clone(&counters)),
            counters,
            reports: Vec::new(),
        }
    }

    pub fn state(&self) -> BuilderState {
        self.state
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Priority of the next source to merge, if any remain
    pub fn next_index(&self) -> Option<usize> {
        let next = match self.state {
            BuilderState::NotStarted => 0,
            BuilderState::ProcessingSource(i) => i,
            BuilderState::Done => return None,
        };
        (next < self.sources.len()).then_some(next)
    }

    pub fn is_done(&self) -> bool {
        self.next_index().is_none()
    }

    pub fn layer(&self) -> &FinalLayer {
        &self.layer
    }

    pub fn mask(&self) -> &MaskAccumulator {
        &self.mask
    }

    pub fn reports(&self) -> &[SourceReport] {
        &self.reports
    }

    /// Self-resolve a normalized batch, then merge it
    pub fn push_source(&mut self, batch: SourceBatch) -> Result<SourceReport> {
        self.check_order(&batch)?;

        let before = self.counters.snapshot();
        let input_features = batch.len();
        let resolved = self.resolver.resolve(batch)?;

        let mut prepared = PreparedSource::new(resolved);
        prepared.input_features = input_features;
        prepared.counters = self.counters.snapshot() - before;
        self.merge(prepared)
    }

    /// Merge a batch that was already self-resolved
    pub fn push_resolved(&mut self, prepared: PreparedSource) -> Result<SourceReport> {
        self.merge(prepared)
    }

    /// Restart the job: empty the layer and the mask
    pub fn reset(&mut self) {
        self.state = BuilderState::NotStarted;
        self.layer.clear();
        self.mask.reset();
        self.reports.clear();
    }

    fn check_order(&self, batch: &SourceBatch) -> Result<usize> {
        let expected = self.next_index().ok_or(MosaicError::MosaicComplete)?;
        if batch.priority != expected {
            return Err(MosaicError::OutOfOrder {
                expected,
                found: batch.priority,
            });
        }
        if self.sources[expected] != batch.source_id {
            return match self.sources.iter().position(|s| *s == batch.source_id) {
                Some(found) => Err(MosaicError::OutOfOrder { expected, found }),
                None => Err(MosaicError::SourceNotFound {
                    source_id: batch.source_id.clone(),
                }),
            };
        }
        Ok(expected)
    }

    fn merge(&mut self, prepared: PreparedSource) -> Result<SourceReport> {
        let index = self.check_order(&prepared.batch)?;
        let PreparedSource {
            batch,
            input_features,
            counters: preparation_drops,
            from_cache,
        } = prepared;
        let before = self.counters.snapshot();

        let appended = if index == 0 {
            self.mask.initialize(&batch);
            batch.clone()
        } else {
            let clipped = self.clipper.clip(&batch, &self.mask);
            self.mask.update(&batch);
            clipped
        };
        let appended_features = self.layer.append(&appended);
        let appended_area: f64 = appended
            .units
            .iter()
            .map(|u| lithomosaic_geo::ops::area(&u.geometry))
            .sum();

        let report = SourceReport {
            source_id: batch.source_id.clone(),
            priority: index,
            input_features,
            resolved_features: batch.len(),
            appended_features,
            appended_area,
            mask_area: self.mask.area(),
            dropped: preparation_drops + (self.counters.snapshot() - before),
            from_cache,
        };

        tracing::info!(
            source = %report.source_id,
            priority = index,
            appended = appended_features,
            area = appended_area,
            mask_area = report.mask_area,
            "Merged source"
        );

        self.reports.push(report.clone());
        self.state = if index + 1 < self.sources.len() {
            BuilderState::ProcessingSource(index + 1)
        } else {
            BuilderState::Done
        };
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};
    use lithomosaic_core::models::{NormalizedUnit, UnitMetadata};

    fn rect(x0: f64, x1: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: x0, y: 0.0),
            (x: x1, y: 0.0),
            (x: x1, y: 10.0),
            (x: x0, y: 10.0),
            (x: x0, y: 0.0),
        ]])
    }

    fn batch(source: &str, priority: usize, x0: f64, x1: f64) -> SourceBatch {
        let metadata = UnitMetadata {
            code: Some(source.to_uppercase()),
            ..Default::default()
        };
        SourceBatch::new(source, priority, vec![NormalizedUnit::new("1", rect(x0, x1), metadata)])
    }

    fn builder(sources: &[&str]) -> MosaicBuilder {
        MosaicBuilder::new(
            sources.iter().map(|s| s.to_string()).collect(),
            &MosaicSettings::default(),
            Arc::new(DropCounters::new()),
        )
    }

    #[test]
    fn test_state_transitions() {
        let mut builder = builder(&["a", "b"]);
        assert_eq!(builder.state(), BuilderState::NotStarted);
        assert_eq!(builder.next_index(), Some(0));

        builder.push_source(batch("a", 0, 0.0, 10.0)).unwrap();
        assert_eq!(builder.state(), BuilderState::ProcessingSource(1));

        builder.push_source(batch("b", 1, 5.0, 15.0)).unwrap();
        assert_eq!(builder.state(), BuilderState::Done);
        assert!(builder.is_done());
    }

    #[test]
    fn test_out_of_order_is_rejected() {
        let mut builder = builder(&["a", "b"]);
        let err = builder.push_source(batch("b", 1, 0.0, 1.0)).unwrap_err();
        assert!(matches!(err, MosaicError::OutOfOrder { expected: 0, found: 1 }));
        assert_eq!(builder.state(), BuilderState::NotStarted);
    }

    #[test]
    fn test_unknown_source_is_rejected() {
        let mut builder = builder(&["a"]);
        let err = builder.push_source(batch("zzz", 0, 0.0, 1.0)).unwrap_err();
        assert!(matches!(err, MosaicError::SourceNotFound { .. }));
    }

    #[test]
    fn test_push_after_done_fails() {
        let mut builder = builder(&["a"]);
        builder.push_source(batch("a", 0, 0.0, 1.0)).unwrap();
        let err = builder.push_source(batch("a", 1, 0.0, 1.0)).unwrap_err();
        assert!(matches!(err, MosaicError::MosaicComplete));
    }

    #[test]
    fn test_later_source_is_clipped() {
        let mut builder = builder(&["a", "b"]);
        let first = builder.push_source(batch("a", 0, 0.0, 10.0)).unwrap();
        let second = builder.push_source(batch("b", 1, 5.0, 15.0)).unwrap();

        assert!((first.appended_area - 100.0).abs() < 1e-6);
        assert!((second.appended_area - 50.0).abs() < 1e-6);
        assert!((second.mask_area - 150.0).abs() < 1e-3);
        assert_eq!(builder.layer().len(), 2);
    }

    #[test]
    fn test_mask_uses_pre_clip_footprint() {
        let mut builder = builder(&["a", "b", "c"]);
        builder.push_source(batch("a", 0, 0.0, 10.0)).unwrap();
        // Entirely covered, contributes nothing to the layer
        let covered = builder.push_source(batch("b", 1, 2.0, 8.0)).unwrap();
        assert_eq!(covered.appended_features, 0);
        assert_eq!(covered.dropped.contained_dropped, 1);

        builder.push_source(batch("c", 2, 20.0, 21.0)).unwrap();
        assert!((builder.mask().area() - 110.0).abs() < 1e-3);
    }

    #[test]
    fn test_reset_clears_layer_and_mask() {
        let mut builder = builder(&["a"]);
        builder.push_source(batch("a", 0, 0.0, 10.0)).unwrap();
        builder.reset();

        assert_eq!(builder.state(), BuilderState::NotStarted);
        assert!(builder.layer().is_empty());
        assert!(builder.mask().is_empty());
        assert!(builder.reports().is_empty());
    }

    #[test]
    fn test_empty_source_list_is_done() {
        let builder = builder(&[]);
        assert!(builder.is_done());
    }
}
