//! End-to-end mosaic behavior over small synthetic sources

use geo::{polygon, MultiPolygon};
use lithomosaic_core::config::MosaicSettings;
use lithomosaic_core::models::RawRecord;
use lithomosaic_geo::ops;
use lithomosaic_mosaic::{MemoryAdapter, MosaicPipeline};
use serde_json::{json, Value};
use std::collections::HashMap;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
    MultiPolygon::new(vec![polygon![
        (x: x0, y: y0),
        (x: x1, y: y0),
        (x: x1, y: y1),
        (x: x0, y: y1),
        (x: x0, y: y0),
    ]])
}

fn record(id: &str, geometry: MultiPolygon<f64>, code: &str, title: &str) -> RawRecord {
    let attributes: HashMap<String, Value> =
        HashMap::from([("code".to_string(), json!(code)), ("title".to_string(), json!(title))]);
    RawRecord::new(id, geometry, attributes)
}

fn sources(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

/// Three sources sliding right: A [0,10], B [5,15], C [8,12]
fn staircase() -> MemoryAdapter {
    let adapter = MemoryAdapter::new();
    adapter.insert("a", vec![record("a1", rect(0.0, 0.0, 10.0, 10.0), "Kgr", "Cretaceous granite")]);
    adapter.insert("b", vec![record("b1", rect(5.0, 0.0, 15.0, 10.0), "Jsh", "Jurassic shale")]);
    adapter.insert("c", vec![record("c1", rect(8.0, 0.0, 12.0, 10.0), "Qs", "Quaternary sand")]);
    adapter
}

#[tokio::test]
async fn test_staircase_mosaic() {
    init_tracing();
    let mut pipeline = MosaicPipeline::new(staircase(), MosaicSettings::default());

    let output = pipeline.run(&sources(&["a", "b", "c"])).await.unwrap();

    let a = output.layer.features_for("a");
    assert_eq!(a.len(), 1);
    assert!((ops::area(&a[0].geometry) - 100.0).abs() < 1e-6);
    assert_eq!(a[0].metadata.lithology.as_deref(), Some("granite"));
    assert_eq!(a[0].metadata.controlled_span.as_deref(), Some("cretaceous"));

    let b = output.layer.features_for("b");
    assert_eq!(b.len(), 1);
    assert!((ops::area(&b[0].geometry) - 50.0).abs() < 1e-6);
    let bounds = geo::BoundingRect::bounding_rect(&b[0].geometry).unwrap();
    assert!((bounds.min().x - 10.0).abs() < 1e-6);
    assert!((bounds.max().x - 15.0).abs() < 1e-6);

    assert!(output.layer.features_for("c").is_empty());
    let c_report = output.report_for("c").unwrap();
    assert_eq!(c_report.input_features, 1);
    assert_eq!(c_report.appended_features, 0);
    assert!((c_report.mask_area - 150.0).abs() < 1e-3);
}

#[tokio::test]
async fn test_no_overlap_between_sources() {
    let adapter = staircase();
    adapter.insert(
        "d",
        vec![
            record("d1", rect(-5.0, -5.0, 3.0, 3.0), "Tv", "Tertiary volcanic rocks"),
            record("d2", rect(14.0, 8.0, 20.0, 20.0), "Tv", "Tertiary volcanic rocks"),
        ],
    );
    let mut pipeline = MosaicPipeline::new(adapter, MosaicSettings::default());
    let tolerance = pipeline.settings().tolerance;

    let output = pipeline.run(&sources(&["a", "b", "c", "d"])).await.unwrap();

    let records = output.layer.records();
    for (i, first) in records.iter().enumerate() {
        for second in &records[i + 1..] {
            if first.source_id != second.source_id {
                let overlap = ops::overlap_area(&first.geometry, &second.geometry);
                assert!(overlap < tolerance * tolerance, "{} vs {}: {}", first.source_id, second.source_id, overlap);
            }
        }
    }
}

#[tokio::test]
async fn test_priority_precedence() {
    let adapter = MemoryAdapter::new();
    adapter.insert("detailed", vec![record("1", rect(0.0, 0.0, 4.0, 4.0), "Kgr", "granite")]);
    adapter.insert("regional", vec![record("1", rect(0.0, 0.0, 20.0, 20.0), "Qal", "alluvium")]);
    let mut pipeline = MosaicPipeline::new(adapter, MosaicSettings::default());

    let output = pipeline.run(&sources(&["detailed", "regional"])).await.unwrap();

    let window = rect(1.0, 1.0, 2.0, 2.0);
    let owners: Vec<_> = output
        .layer
        .iter()
        .filter(|r| ops::overlap_area(&r.geometry, &window) > 0.0)
        .collect();
    assert_eq!(owners.len(), 1);
    assert_eq!(owners[0].metadata.code.as_deref(), Some("Kgr"));
    assert!((output.layer.area_for("regional") - 384.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_mask_area_tracks_native_footprints() {
    let mut pipeline = MosaicPipeline::new(staircase(), MosaicSettings::default());
    let output = pipeline.run(&sources(&["a", "b", "c"])).await.unwrap();

    let expected = [100.0, 150.0, 150.0];
    for (report, area) in output.reports.iter().zip(expected) {
        assert!((report.mask_area - area).abs() < 1e-3, "{}: {}", report.source_id, report.mask_area);
    }
    assert!((ops::area(&output.mask) - 150.0).abs() < 1e-3);
}

#[tokio::test]
async fn test_runs_are_idempotent() {
    let ids = sources(&["a", "b", "c"]);
    let mut pipeline = MosaicPipeline::new(staircase(), MosaicSettings::default());

    let first = pipeline.run(&ids).await.unwrap();
    let second = pipeline.run(&ids).await.unwrap();

    assert!((first.layer.total_area() - second.layer.total_area()).abs() < 0.01);
    for id in &ids {
        assert_eq!(first.layer.features_for(id).len(), second.layer.features_for(id).len());
    }
    assert_ne!(first.run_id, second.run_id);
}

#[tokio::test]
async fn test_self_overlap_resolved_before_merge() {
    let adapter = MemoryAdapter::new();
    adapter.insert(
        "messy",
        vec![
            record("big", rect(0.0, 0.0, 10.0, 10.0), "Qal", "alluvium"),
            record("small", rect(2.0, 2.0, 4.0, 4.0), "Tv", "basalt"),
            record("nameless", rect(20.0, 20.0, 21.0, 21.0), "", "water"),
        ],
    );
    let mut pipeline = MosaicPipeline::new(adapter, MosaicSettings::default());

    let output = pipeline.run(&sources(&["messy"])).await.unwrap();

    assert_eq!(output.layer.len(), 2);
    assert!((output.layer.total_area() - 100.0).abs() < 1e-6);
    assert_eq!(output.counters.empty_units_dropped, 1);
    let report = output.report_for("messy").unwrap();
    assert_eq!(report.input_features, 3);
    assert_eq!(report.resolved_features, 2);
    assert_eq!(report.dropped.empty_units_dropped, 1);
}

#[tokio::test]
async fn test_export_carries_source_and_metadata() {
    let mut pipeline = MosaicPipeline::new(staircase(), MosaicSettings::default());
    let output = pipeline.run(&sources(&["a", "b"])).await.unwrap();

    let collection = output.layer.to_feature_collection();
    assert_eq!(collection.features.len(), 2);
    let properties = collection.features[1].properties.as_ref().unwrap();
    assert_eq!(properties["source"], "b");
    assert_eq!(properties["lithology"], "shale");
    assert_eq!(properties["rock_type"], "sedimentary");
}
