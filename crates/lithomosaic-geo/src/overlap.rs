//! Self-overlap resolution within one source.
//!
//! Polygons are processed smallest first. Each one cuts itself out of every
//! intersecting polygon that comes later in that order, so small, specific
//! features win over large, general ones and a polygon is never shrunk by
//! something processed before it. Equal areas keep source order.

use crate::counters::DropCounters;
use crate::index::SpatialIndex;
use crate::ops;
use crate::validation::{make_valid, GeometryRepairer};
use geo::{BooleanOps, Intersects, MultiPolygon, Polygon};
use lithomosaic_core::config::MosaicSettings;
use lithomosaic_core::error::{MosaicError, Result};
use lithomosaic_core::models::{NormalizedUnit, SourceBatch, UnitMetadata};
use std::collections::HashMap;
use std::sync::Arc;

/// One simple polygon of a unit, with the area it had before any cutting
struct Piece {
    unit: usize,
    original_area: f64,
    geometry: MultiPolygon<f64>,
}

/// Units sharing one metadata key, in order of first appearance
struct Group<'a> {
    feature_id: &'a str,
    metadata: &'a UnitMetadata,
    polygons: Vec<Polygon<f64>>,
}

pub struct SelfOverlapResolver {
    metadata_key: Vec<String>,
    repairer: GeometryRepairer,
    counters: Arc<DropCounters>,
}

impl SelfOverlapResolver {
    pub fn new(settings: &MosaicSettings, counters: Arc<DropCounters>) -> Self {
        Self {
            metadata_key: settings.metadata_key.clone(),
            repairer: GeometryRepairer::new(settings.geometry_validity, Arc::clone(&counters)),
            counters,
        }
    }

    /// Make a batch internally non-overlapping and regroup it by metadata key
    pub fn resolve(&self, batch: SourceBatch) -> Result<SourceBatch> {
        let SourceBatch { source_id, priority, units } = batch;
        let input_units = units.len();

        let units = self.prepare(&source_id, units)?;
        let mut pieces = explode(&units);
        let cuts = cut_overlaps(&mut pieces);
        let resolved = self.regroup(&source_id, &units, pieces);

        tracing::info!(
            source = %source_id,
            input_units,
            resolved_units = resolved.len(),
            cuts,
            "Resolved self-overlaps"
        );

        Ok(SourceBatch::new(source_id, priority, resolved))
    }

    /// Drop units without a code and repair the rest
    fn prepare(&self, source_id: &str, units: Vec<NormalizedUnit>) -> Result<Vec<NormalizedUnit>> {
        let mut prepared = Vec::with_capacity(units.len());
        for mut unit in units {
            if unit.metadata.is_empty_unit() {
                self.counters.record_empty_unit();
                tracing::debug!(source = source_id, feature = %unit.feature_id, "Dropping unit without a code");
                continue;
            }
            if let Some(geometry) = self.repairer.repair(&unit.feature_id, &unit.geometry)? {
                unit.geometry = geometry;
                prepared.push(unit);
            }
        }
        Ok(prepared)
    }

    fn regroup(
        &self,
        source_id: &str,
        units: &[NormalizedUnit],
        pieces: Vec<Piece>,
    ) -> Vec<NormalizedUnit> {
        let mut groups: Vec<Group<'_>> = Vec::new();
        let mut by_key: HashMap<Vec<Option<String>>, usize> = HashMap::new();

        for piece in pieces {
            let unit = &units[piece.unit];
            if ops::is_degenerate(&piece.geometry) {
                self.counters.record_degenerate();
                let reason = MosaicError::DegenerateResult {
                    feature_id: unit.feature_id.clone(),
                    reason: "cut away by smaller overlapping polygons".to_string(),
                };
                tracing::debug!(source = source_id, "{}", reason);
                continue;
            }

            let key = unit.metadata.key(&self.metadata_key);
            let slot = *by_key.entry(key).or_insert_with(|| {
                groups.push(Group {
                    feature_id: &unit.feature_id,
                    metadata: &unit.metadata,
                    polygons: Vec::new(),
                });
                groups.len() - 1
            });
            groups[slot].polygons.extend(piece.geometry.0);
        }

        let mut resolved = Vec::with_capacity(groups.len());
        for group in groups {
            let geometry = make_valid(&MultiPolygon::new(group.polygons));
            if ops::is_degenerate(&geometry) {
                self.counters.record_degenerate();
                tracing::debug!(source = source_id, feature = group.feature_id, "Regrouped unit is empty");
                continue;
            }
            resolved.push(NormalizedUnit::new(group.feature_id, geometry, group.metadata.clone()));
        }
        resolved
    }
}

fn explode(units: &[NormalizedUnit]) -> Vec<Piece> {
    let mut pieces = Vec::new();
    for (unit, normalized) in units.iter().enumerate() {
        for polygon in ops::dump(&normalized.geometry) {
            let geometry = MultiPolygon::new(vec![polygon]);
            pieces.push(Piece {
                unit,
                original_area: ops::area(&geometry),
                geometry,
            });
        }
    }
    pieces
}

/// Cut every piece out of the intersecting pieces ranked after it.
///
/// Returns the number of cuts made.
fn cut_overlaps(pieces: &mut [Piece]) -> usize {
    let mut order: Vec<usize> = (0..pieces.len()).collect();
    // Stable, so equal areas keep source order
    order.sort_by(|&a, &b| pieces[a].original_area.total_cmp(&pieces[b].original_area));

    let mut rank = vec![0; pieces.len()];
    for (position, &piece) in order.iter().enumerate() {
        rank[piece] = position;
    }

    let index = SpatialIndex::from_envelopes(
        pieces
            .iter()
            .enumerate()
            .filter_map(|(id, piece)| ops::envelope(&piece.geometry).map(|env| (id, env)))
            .collect(),
    );

    let mut cuts = 0;
    for &cutter in &order {
        if ops::is_degenerate(&pieces[cutter].geometry) {
            continue;
        }
        let Some(envelope) = ops::envelope(&pieces[cutter].geometry) else {
            continue;
        };
        let blade = pieces[cutter].geometry.clone();

        for target in index.query(&envelope) {
            if rank[target] <= rank[cutter] || pieces[target].geometry.0.is_empty() {
                continue;
            }
            if !blade.intersects(&pieces[target].geometry) {
                continue;
            }
            pieces[target].geometry = pieces[target].geometry.difference(&blade);
            cuts += 1;
        }
    }
    cuts
}
