//! Pipeline behavior: retries, caching, cancellation and resume

use async_trait::async_trait;
use geo::{polygon, MultiPolygon};
use lithomosaic_core::config::{MosaicSettings, ValidityMode};
use lithomosaic_core::error::{MosaicError, Result};
use lithomosaic_core::models::RawRecord;
use lithomosaic_core::ports::SourceAdapter;
use lithomosaic_mosaic::{
    BuilderState, CancellationFlag, GeoJsonDirAdapter, MemoryAdapter, MosaicPipeline, WorkCache,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

fn rect(x0: f64, x1: f64) -> MultiPolygon<f64> {
    MultiPolygon::new(vec![polygon![
        (x: x0, y: 0.0),
        (x: x1, y: 0.0),
        (x: x1, y: 10.0),
        (x: x0, y: 10.0),
        (x: x0, y: 0.0),
    ]])
}

fn record(id: &str, geometry: MultiPolygon<f64>, code: &str) -> RawRecord {
    RawRecord::new(id, geometry, HashMap::from([("code".to_string(), json!(code))]))
}

fn adapter() -> MemoryAdapter {
    let adapter = MemoryAdapter::new();
    adapter.insert("a", vec![record("1", rect(0.0, 10.0), "Kgr")]);
    adapter.insert("b", vec![record("1", rect(5.0, 15.0), "Jsh")]);
    adapter.insert("c", vec![record("1", rect(20.0, 25.0), "Qs")]);
    adapter
}

fn sources() -> Vec<String> {
    ["a", "b", "c"].iter().map(|s| s.to_string()).collect()
}

fn fast_settings() -> MosaicSettings {
    MosaicSettings {
        retry_base_delay: Duration::from_millis(1),
        ..Default::default()
    }
}

/// Counts fetches and fails the first `failures` of each source transiently
struct Flaky {
    inner: MemoryAdapter,
    failures: u32,
    calls: Mutex<HashMap<String, u32>>,
    total: AtomicU32,
}

impl Flaky {
    fn new(inner: MemoryAdapter, failures: u32) -> Self {
        Self {
            inner,
            failures,
            calls: Mutex::new(HashMap::new()),
            total: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl SourceAdapter for Flaky {
    async fn fetch(&self, source_id: &str) -> Result<Vec<RawRecord>> {
        self.total.fetch_add(1, Ordering::SeqCst);
        let call = {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(source_id.to_string()).or_insert(0);
            *count += 1;
            *count
        };
        if call <= self.failures {
            return Err(MosaicError::transient(source_id, "connection reset"));
        }
        self.inner.fetch(source_id).await
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

/// Cancels the run while fetching one source
struct CancelOn {
    inner: MemoryAdapter,
    trigger: String,
    flag: Mutex<Option<CancellationFlag>>,
}

#[async_trait]
impl SourceAdapter for CancelOn {
    async fn fetch(&self, source_id: &str) -> Result<Vec<RawRecord>> {
        if source_id == self.trigger {
            if let Some(flag) = self.flag.lock().unwrap().as_ref() {
                flag.cancel();
            }
        }
        self.inner.fetch(source_id).await
    }

    fn name(&self) -> &str {
        "cancel-on"
    }
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let mut pipeline = MosaicPipeline::new(Flaky::new(adapter(), 2), fast_settings());

    let output = pipeline.run(&sources()).await.unwrap();

    assert_eq!(output.layer.len(), 3);
    assert_eq!(pipeline.adapter().total.load(Ordering::SeqCst), 9);
}

#[tokio::test]
async fn test_exhausted_retries_fail_the_source() {
    let settings = MosaicSettings {
        max_retries: 1,
        ..fast_settings()
    };
    let mut pipeline = MosaicPipeline::new(Flaky::new(adapter(), 5), settings);

    let err = pipeline.run(&sources()).await.unwrap_err();

    assert!(err.is_retryable());
    let checkpoint = pipeline.checkpoint().unwrap();
    assert_eq!(checkpoint.state(), BuilderState::NotStarted);
    assert!(checkpoint.layer().is_empty());
}

#[tokio::test]
async fn test_failed_source_resumes_from_checkpoint() {
    let inner = adapter();
    let missing = inner.remove("b").unwrap();
    let mut pipeline = MosaicPipeline::new(inner.clone(), fast_settings());

    let err = pipeline.run(&sources()).await.unwrap_err();
    assert!(matches!(err, MosaicError::SourceNotFound { ref source_id } if source_id == "b"));
    let checkpoint = pipeline.checkpoint().unwrap();
    assert_eq!(checkpoint.state(), BuilderState::ProcessingSource(1));
    assert_eq!(checkpoint.layer().len(), 1);

    // Fix the source and run again; "a" is not merged twice
    inner.insert("b", missing);
    let output = pipeline.run(&sources()).await.unwrap();

    assert_eq!(output.layer.features_for("a").len(), 1);
    assert_eq!(output.layer.features_for("b").len(), 1);
    assert_eq!(output.reports.len(), 3);
    assert!(pipeline.checkpoint().is_none());
}

#[tokio::test]
async fn test_different_source_list_starts_fresh() {
    let inner = adapter();
    inner.remove("c");
    let mut pipeline = MosaicPipeline::new(inner.clone(), fast_settings());
    assert!(pipeline.run(&sources()).await.is_err());

    let output = pipeline.run(&["b".to_string(), "a".to_string()]).await.unwrap();

    assert_eq!(output.reports[0].source_id, "b");
    assert!((output.layer.area_for("b") - 100.0).abs() < 1e-6);
    assert!((output.layer.area_for("a") - 50.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_cancellation_stops_dispatch() {
    let adapter = CancelOn {
        inner: adapter(),
        trigger: "a".to_string(),
        flag: Mutex::new(None),
    };
    let settings = MosaicSettings {
        concurrency: 1,
        ..fast_settings()
    };
    let mut pipeline = MosaicPipeline::new(adapter, settings);
    let flag = pipeline.cancellation_flag();
    *pipeline.adapter().flag.lock().unwrap() = Some(flag.clone());

    let err = pipeline.run(&sources()).await.unwrap_err();

    assert!(matches!(err, MosaicError::Cancelled { ref source_id } if source_id == "b"));
    let checkpoint = pipeline.checkpoint().unwrap();
    assert_eq!(checkpoint.layer().len(), 1);
    assert_eq!(checkpoint.next_index(), Some(1));

    flag.clear();
    let output = pipeline.run(&sources()).await.unwrap();
    assert_eq!(output.layer.len(), 3);
}

#[tokio::test]
async fn test_cache_skips_fetching() {
    let dir = TempDir::new().unwrap();
    let settings = MosaicSettings {
        work_dir: Some(dir.path().to_path_buf()),
        ..fast_settings()
    };

    let mut first = MosaicPipeline::new(Flaky::new(adapter(), 0), settings.clone());
    let cold = first.run(&sources()).await.unwrap();
    assert_eq!(first.adapter().total.load(Ordering::SeqCst), 3);
    assert!(cold.reports.iter().all(|r| !r.from_cache));

    let mut second = MosaicPipeline::new(Flaky::new(adapter(), 0), settings);
    let warm = second.run(&sources()).await.unwrap();
    assert_eq!(second.adapter().total.load(Ordering::SeqCst), 0);
    assert!(warm.reports.iter().all(|r| r.from_cache));
    assert!((cold.layer.total_area() - warm.layer.total_area()).abs() < 1e-6);

    assert_eq!(second.clean_cache(&sources()).unwrap(), 3);
    assert!(!WorkCache::new(dir.path()).contains("a"));
}

#[tokio::test]
async fn test_cache_is_not_reused_under_other_settings() {
    let dir = TempDir::new().unwrap();
    let settings = MosaicSettings {
        work_dir: Some(dir.path().to_path_buf()),
        ..fast_settings()
    };

    let mut first = MosaicPipeline::new(Flaky::new(adapter(), 0), settings.clone());
    first.run(&sources()).await.unwrap();

    let retuned = MosaicSettings {
        tolerance: settings.tolerance * 10.0,
        ..settings.clone()
    };
    let mut second = MosaicPipeline::new(Flaky::new(adapter(), 0), retuned.clone());
    let output = second.run(&sources()).await.unwrap();
    assert_eq!(second.adapter().total.load(Ordering::SeqCst), 3);
    assert!(output.reports.iter().all(|r| !r.from_cache));

    // The refreshed entries now match the new settings
    let mut third = MosaicPipeline::new(Flaky::new(adapter(), 0), retuned);
    let warm = third.run(&sources()).await.unwrap();
    assert_eq!(third.adapter().total.load(Ordering::SeqCst), 0);
    assert!(warm.reports.iter().all(|r| r.from_cache));
}

#[tokio::test]
async fn test_strict_validity_aborts_on_unrepairable_geometry() {
    let inner = adapter();
    let broken = MultiPolygon::new(vec![polygon![
        (x: 0.0, y: 0.0),
        (x: f64::NAN, y: 0.0),
        (x: 1.0, y: 1.0),
        (x: 0.0, y: 0.0),
    ]]);
    inner.insert("b", vec![record("bad", broken, "Jsh")]);

    let strict = MosaicSettings {
        geometry_validity: ValidityMode::Strict,
        ..fast_settings()
    };
    let mut pipeline = MosaicPipeline::new(inner.clone(), strict);
    let err = pipeline.run(&sources()).await.unwrap_err();
    assert!(matches!(err, MosaicError::InvalidGeometry { .. }));

    let mut lenient = MosaicPipeline::new(inner, fast_settings());
    let output = lenient.run(&sources()).await.unwrap();
    assert!(output.layer.features_for("b").is_empty());
    assert_eq!(output.counters.unrepairable_dropped, 1);
}

#[tokio::test]
async fn test_reset_discards_checkpoint() {
    let inner = adapter();
    inner.remove("c");
    let mut pipeline = MosaicPipeline::new(inner, fast_settings());
    assert!(pipeline.run(&sources()).await.is_err());
    assert!(pipeline.checkpoint().is_some());

    pipeline.reset();

    assert!(pipeline.checkpoint().is_none());
    assert_eq!(pipeline.counters().snapshot().total_dropped(), 0);
}

#[tokio::test]
async fn test_geojson_directory_sources() {
    let dir = TempDir::new().unwrap();
    let write = |name: &str, x0: f64, x1: f64, title: &str| {
        let collection = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "id": format!("{name}-1"),
                "properties": {"PTYPE": name.to_uppercase(), "code": name.to_uppercase(), "title": title},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[x0, 0.0], [x1, 0.0], [x1, 10.0], [x0, 10.0], [x0, 0.0]]]
                }
            }]
        });
        std::fs::write(dir.path().join(format!("{name}.geojson")), collection.to_string()).unwrap();
    };
    write("north", 0.0, 10.0, "Franciscan Complex melange");
    write("south", 5.0, 15.0, "Monterey Formation shale");

    let mut pipeline = MosaicPipeline::new(GeoJsonDirAdapter::new(dir.path()), fast_settings());
    let output = pipeline
        .run(&["north".to_string(), "south".to_string()])
        .await
        .unwrap();

    let north = output.layer.features_for("north");
    assert_eq!(north[0].metadata.grouping.as_deref(), Some("Franciscan Complex"));
    assert_eq!(north[0].metadata.passthrough["PTYPE"], "NORTH");
    let south = output.layer.features_for("south");
    assert_eq!(south[0].metadata.formation.as_deref(), Some("Monterey Formation"));
    assert!((output.layer.area_for("south") - 50.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_geojson_features_without_polygons_are_counted() {
    let dir = TempDir::new().unwrap();
    let collection = json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": "u1",
                "properties": {"code": "Kgr", "title": "Granite"},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]]]
                }
            },
            {
                "type": "Feature",
                "id": "fault",
                "properties": {"code": "flt"},
                "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [10.0, 10.0]]}
            },
            {
                "type": "Feature",
                "id": "label",
                "properties": {"code": "lbl"},
                "geometry": null
            }
        ]
    });
    std::fs::write(dir.path().join("sheet.geojson"), collection.to_string()).unwrap();

    let mut pipeline = MosaicPipeline::new(GeoJsonDirAdapter::new(dir.path()), fast_settings());
    let output = pipeline.run(&["sheet".to_string()]).await.unwrap();

    let report = output.report_for("sheet").unwrap();
    assert_eq!(report.input_features, 3);
    assert_eq!(report.resolved_features, 1);
    assert_eq!(report.dropped.skipped_features, 2);
    assert_eq!(output.counters.skipped_features, 2);
}
