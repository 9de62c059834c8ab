//! Integration tests for layered configuration
//!
//! These tests verify that configuration loading follows the correct precedence:
//! Overrides > Environment variables > Config file > Defaults

use lithomosaic_core::config::{
    ConfigOverrides, ConfigSource, LayeredConfig, MosaicSettings, ValidityMode,
};
use lithomosaic_core::MosaicError;
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::NamedTempFile;

fn clear_env() {
    for key in [
        "LITHOMOSAIC_TOLERANCE",
        "LITHOMOSAIC_CONCURRENCY",
        "LITHOMOSAIC_METADATA_KEY",
        "LITHOMOSAIC_GEOMETRY_VALIDITY",
        "LITHOMOSAIC_MAX_RETRIES",
        "LITHOMOSAIC_WORK_DIR",
    ] {
        env::remove_var(key);
    }
}

#[test]
#[serial]
fn test_full_precedence_chain() {
    clear_env();

    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
tolerance = 0.5
concurrency = 2
max_retries = 5
geometry_validity = "strict"
"#
    )
    .unwrap();

    env::set_var("LITHOMOSAIC_CONCURRENCY", "6");
    env::set_var("LITHOMOSAIC_MAX_RETRIES", "1");

    let mut config = LayeredConfig::with_defaults()
        .load_from_file(file.path())
        .unwrap()
        .load_from_env();

    clear_env();

    config.apply_overrides(ConfigOverrides {
        max_retries: Some(0),
        ..Default::default()
    });

    assert_eq!(config.tolerance.value, 0.5);
    assert_eq!(config.tolerance.source, ConfigSource::File);
    assert_eq!(config.concurrency.value, 6);
    assert_eq!(config.concurrency.source, ConfigSource::Environment);
    assert_eq!(config.max_retries.value, 0);
    assert_eq!(config.max_retries.source, ConfigSource::Override);
    assert_eq!(config.geometry_validity.value, ValidityMode::Strict);
    assert_eq!(config.retry_base_delay_ms.source, ConfigSource::Default);
}

#[test]
#[serial]
fn test_invalid_env_values_are_ignored() {
    clear_env();
    env::set_var("LITHOMOSAIC_TOLERANCE", "-3");
    env::set_var("LITHOMOSAIC_GEOMETRY_VALIDITY", "sloppy");
    env::set_var("LITHOMOSAIC_METADATA_KEY", "code,favourite_colour");

    let config = LayeredConfig::with_defaults().load_from_env();

    clear_env();

    assert_eq!(config.tolerance.source, ConfigSource::Default);
    assert_eq!(config.geometry_validity.source, ConfigSource::Default);
    assert_eq!(config.metadata_key.source, ConfigSource::Default);
}

#[test]
#[serial]
fn test_settings_from_layers() {
    clear_env();
    env::set_var("LITHOMOSAIC_WORK_DIR", "/var/tmp/mosaic");

    let settings = LayeredConfig::with_defaults().load_from_env().settings().unwrap();

    clear_env();

    assert_eq!(settings.work_dir, Some(PathBuf::from("/var/tmp/mosaic")));
    assert_eq!(settings.retry_base_delay, Duration::from_millis(1000));
    assert_eq!(settings.metadata_key, MosaicSettings::default().metadata_key);
}

#[test]
fn test_unparseable_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "tolerance = [").unwrap();

    let result = LayeredConfig::with_defaults().load_from_file(file.path());
    assert!(matches!(result, Err(MosaicError::ConfigInvalid { .. })));
}
