use crate::counters::DropCounters;
use crate::ops;
use geo::{BooleanOps, LineString, MultiPolygon, Polygon};
use lithomosaic_core::config::ValidityMode;
use lithomosaic_core::error::{MosaicError, Result};
use std::sync::Arc;

/// Relative area change above which a make-valid pass counts as a repair
const REPAIR_AREA_EPSILON: f64 = 1e-9;

/// Validation result with details
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

/// Validation error with location details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub location: String,
    pub reason: String,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        Self { is_valid: true, errors: Vec::new() }
    }

    /// Add an error to the result
    pub fn add_error(&mut self, location: String, reason: String) {
        self.is_valid = false;
        self.errors.push(ValidationError { location, reason });
    }

    /// Whether any error makes the geometry impossible to repair
    pub fn has_non_finite(&self) -> bool {
        self.errors.iter().any(|e| e.reason == NON_FINITE)
    }

    fn first_reason(&self) -> String {
        self.errors
            .first()
            .map(|e| format!("{}: {}", e.location, e.reason))
            .unwrap_or_else(|| "Invalid geometry".to_string())
    }
}

const NON_FINITE: &str = "Coordinates must be finite";

fn validate_ring(ring: &LineString<f64>, location: String, result: &mut ValidationResult) {
    if ring.0.len() < 4 {
        result.add_error(
            location.clone(),
            format!("Ring must have at least 4 points, found {}", ring.0.len()),
        );
    }

    if let (Some(first), Some(last)) = (ring.0.first(), ring.0.last()) {
        if first != last {
            result.add_error(
                location.clone(),
                "Ring must be closed (first point == last point)".to_string(),
            );
        }
    }

    if ring.0.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        result.add_error(location, NON_FINITE.to_string());
    }
}

/// Structural checks on one polygon
pub fn validate_polygon(polygon: &Polygon<f64>) -> ValidationResult {
    let mut result = ValidationResult::valid();

    validate_ring(polygon.exterior(), "Polygon exterior".to_string(), &mut result);
    for (i, interior) in polygon.interiors().iter().enumerate() {
        validate_ring(interior, format!("Polygon interior[{}]", i), &mut result);
    }

    result
}

/// Structural checks on every member of a multipolygon
pub fn validate_multipolygon(multipolygon: &MultiPolygon<f64>) -> ValidationResult {
    let mut result = ValidationResult::valid();

    if multipolygon.0.is_empty() {
        result.add_error("MultiPolygon".to_string(), "Geometry is empty".to_string());
    }

    for (i, polygon) in multipolygon.0.iter().enumerate() {
        let poly_result = validate_polygon(polygon);
        if !poly_result.is_valid {
            for error in poly_result.errors {
                result.add_error(format!("MultiPolygon[{}].{}", i, error.location), error.reason);
            }
        }
    }

    result
}

/// Rebuild polygon topology: self-intersections are split, overlapping
/// members merged, and rings re-oriented.
///
/// Input must have finite coordinates.
pub fn make_valid(geometry: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    if geometry.0.is_empty() {
        return ops::empty();
    }
    geometry.union(&ops::empty())
}

/// Applies make-valid under a validity policy and records the outcome
#[derive(Debug, Clone)]
pub struct GeometryRepairer {
    mode: ValidityMode,
    counters: Arc<DropCounters>,
}

impl GeometryRepairer {
    pub fn new(mode: ValidityMode, counters: Arc<DropCounters>) -> Self {
        Self { mode, counters }
    }

    /// Return a valid version of the geometry.
    ///
    /// `Ok(None)` means the feature was dropped under the lenient policy.
    /// Under the strict policy unrepairable geometry is an error.
    pub fn repair(
        &self,
        feature_id: &str,
        geometry: &MultiPolygon<f64>,
    ) -> Result<Option<MultiPolygon<f64>>> {
        let report = validate_multipolygon(geometry);
        if report.has_non_finite() || geometry.0.is_empty() {
            return self.unrepairable(feature_id, report.first_reason());
        }

        let repaired = make_valid(geometry);
        if ops::is_degenerate(&repaired) {
            return self.unrepairable(feature_id, "Repair produced no polygonal area".to_string());
        }

        let before = ops::area(geometry);
        let after = ops::area(&repaired);
        let changed = (after - before).abs() > REPAIR_AREA_EPSILON * before.max(1.0);
        if !report.is_valid || changed {
            self.counters.record_repaired();
            tracing::debug!(feature = feature_id, before, after, "Repaired invalid geometry");
        }

        Ok(Some(repaired))
    }

    fn unrepairable(&self, feature_id: &str, reason: String) -> Result<Option<MultiPolygon<f64>>> {
        match self.mode {
            ValidityMode::Strict => Err(MosaicError::InvalidGeometry {
                feature_id: feature_id.to_string(),
                reason,
            }),
            ValidityMode::Lenient => {
                self.counters.record_unrepairable();
                tracing::warn!(feature = feature_id, %reason, "Dropping unrepairable geometry");
                Ok(None)
            }
        }
    }
}
