use crate::error::{MosaicError, Result};
use crate::models::metadata::{DEFAULT_METADATA_KEY, METADATA_COLUMNS};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Set programmatically by the embedding application
    Override,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Override => 3,
        }
    }
}

/// How geometry that cannot be repaired is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidityMode {
    /// Unrepairable geometry aborts the source
    Strict,
    /// Unrepairable geometry is dropped and counted
    Lenient,
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has at least the current precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() >= self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for a mosaic job
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub tolerance: ConfigValue<f64>,
    pub concurrency: ConfigValue<usize>,
    pub metadata_key: ConfigValue<Vec<String>>,
    pub geometry_validity: ConfigValue<ValidityMode>,
    pub max_retries: ConfigValue<u32>,
    pub retry_base_delay_ms: ConfigValue<u64>,
    pub work_dir: ConfigValue<Option<PathBuf>>,
}

impl Default for LayeredConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            tolerance: ConfigValue::new(0.01, ConfigSource::Default),
            concurrency: ConfigValue::new(4, ConfigSource::Default),
            metadata_key: ConfigValue::new(
                DEFAULT_METADATA_KEY.iter().map(|c| c.to_string()).collect(),
                ConfigSource::Default,
            ),
            geometry_validity: ConfigValue::new(ValidityMode::Lenient, ConfigSource::Default),
            max_retries: ConfigValue::new(3, ConfigSource::Default),
            retry_base_delay_ms: ConfigValue::new(1000, ConfigSource::Default),
            work_dir: ConfigValue::new(None, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| MosaicError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| MosaicError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(tolerance) = file_config.tolerance {
            self.tolerance.update(parse_tolerance(&tolerance.to_string())?, ConfigSource::File);
        }

        if let Some(concurrency) = file_config.concurrency {
            self.concurrency
                .update(parse_concurrency(&concurrency.to_string())?, ConfigSource::File);
        }

        if let Some(columns) = file_config.metadata_key {
            self.metadata_key.update(validate_metadata_key(columns)?, ConfigSource::File);
        }

        if let Some(mode) = file_config.geometry_validity {
            self.geometry_validity.update(parse_validity_mode(&mode)?, ConfigSource::File);
        }

        if let Some(max_retries) = file_config.max_retries {
            self.max_retries.update(max_retries, ConfigSource::File);
        }

        if let Some(delay) = file_config.retry_base_delay_ms {
            self.retry_base_delay_ms.update(delay, ConfigSource::File);
        }

        if let Some(work_dir) = file_config.work_dir {
            self.work_dir.update(Some(work_dir), ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // LITHOMOSAIC_TOLERANCE
        if let Ok(raw) = env::var("LITHOMOSAIC_TOLERANCE") {
            match parse_tolerance(&raw) {
                Ok(tolerance) => self.tolerance.update(tolerance, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid LITHOMOSAIC_TOLERANCE value '{}': expected a positive number",
                    raw
                ),
            }
        }

        // LITHOMOSAIC_CONCURRENCY
        if let Ok(raw) = env::var("LITHOMOSAIC_CONCURRENCY") {
            match parse_concurrency(&raw) {
                Ok(workers) => self.concurrency.update(workers, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid LITHOMOSAIC_CONCURRENCY value '{}': expected a positive integer",
                    raw
                ),
            }
        }

        // LITHOMOSAIC_METADATA_KEY
        if let Ok(raw) = env::var("LITHOMOSAIC_METADATA_KEY") {
            let columns = raw
                .split(',')
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect();
            match validate_metadata_key(columns) {
                Ok(columns) => self.metadata_key.update(columns, ConfigSource::Environment),
                Err(e) => tracing::warn!("Invalid LITHOMOSAIC_METADATA_KEY value '{}': {}", raw, e),
            }
        }

        // LITHOMOSAIC_GEOMETRY_VALIDITY
        if let Ok(raw) = env::var("LITHOMOSAIC_GEOMETRY_VALIDITY") {
            match parse_validity_mode(&raw) {
                Ok(mode) => self.geometry_validity.update(mode, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid LITHOMOSAIC_GEOMETRY_VALIDITY value '{}': expected strict or lenient",
                    raw
                ),
            }
        }

        // LITHOMOSAIC_MAX_RETRIES
        if let Ok(raw) = env::var("LITHOMOSAIC_MAX_RETRIES") {
            match raw.trim().parse::<u32>() {
                Ok(retries) => self.max_retries.update(retries, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid LITHOMOSAIC_MAX_RETRIES value '{}': expected a non-negative integer",
                    raw
                ),
            }
        }

        // LITHOMOSAIC_WORK_DIR
        if let Ok(raw) = env::var("LITHOMOSAIC_WORK_DIR") {
            if raw.trim().is_empty() {
                tracing::warn!("Ignoring empty LITHOMOSAIC_WORK_DIR");
            } else {
                self.work_dir.update(Some(PathBuf::from(raw)), ConfigSource::Environment);
            }
        }

        self
    }

    /// Apply programmatic overrides, which take precedence over every other layer
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(tolerance) = overrides.tolerance {
            self.tolerance.update(tolerance, ConfigSource::Override);
        }

        if let Some(concurrency) = overrides.concurrency {
            self.concurrency.update(concurrency, ConfigSource::Override);
        }

        if let Some(columns) = overrides.metadata_key {
            self.metadata_key.update(columns, ConfigSource::Override);
        }

        if let Some(mode) = overrides.geometry_validity {
            self.geometry_validity.update(mode, ConfigSource::Override);
        }

        if let Some(max_retries) = overrides.max_retries {
            self.max_retries.update(max_retries, ConfigSource::Override);
        }

        if let Some(delay) = overrides.retry_base_delay_ms {
            self.retry_base_delay_ms.update(delay, ConfigSource::Override);
        }

        if let Some(work_dir) = overrides.work_dir {
            self.work_dir.update(Some(work_dir), ConfigSource::Override);
        }
    }

    /// Validate the merged layers and freeze them into job settings
    pub fn settings(&self) -> Result<MosaicSettings> {
        let tolerance = self.tolerance.value;
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(MosaicError::ConfigInvalid {
                key: "tolerance".to_string(),
                reason: format!("Tolerance must be a positive number, got {}", tolerance),
            });
        }

        if self.concurrency.value == 0 {
            return Err(MosaicError::ConfigInvalid {
                key: "concurrency".to_string(),
                reason: "At least one worker is required".to_string(),
            });
        }

        let metadata_key = validate_metadata_key(self.metadata_key.value.clone())?;

        Ok(MosaicSettings {
            tolerance,
            concurrency: self.concurrency.value,
            metadata_key,
            geometry_validity: self.geometry_validity.value,
            max_retries: self.max_retries.value,
            retry_base_delay: Duration::from_millis(self.retry_base_delay_ms.value),
            work_dir: self.work_dir.value.clone(),
        })
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "tolerance".to_string(),
            (self.tolerance.value.to_string(), self.tolerance.source),
        );

        map.insert(
            "concurrency".to_string(),
            (self.concurrency.value.to_string(), self.concurrency.source),
        );

        map.insert(
            "metadata_key".to_string(),
            (self.metadata_key.value.join(","), self.metadata_key.source),
        );

        map.insert(
            "geometry_validity".to_string(),
            (format!("{:?}", self.geometry_validity.value), self.geometry_validity.source),
        );

        map.insert(
            "max_retries".to_string(),
            (self.max_retries.value.to_string(), self.max_retries.source),
        );

        map.insert(
            "retry_base_delay_ms".to_string(),
            (self.retry_base_delay_ms.value.to_string(), self.retry_base_delay_ms.source),
        );

        let work_dir = match &self.work_dir.value {
            Some(path) => path.display().to_string(),
            None => "(none)".to_string(),
        };
        map.insert("work_dir".to_string(), (work_dir, self.work_dir.source));

        map
    }
}

/// Validated, immutable settings for one mosaic job
#[derive(Debug, Clone, PartialEq)]
pub struct MosaicSettings {
    /// Sliver tolerance in working-CRS units
    pub tolerance: f64,
    /// Number of sources resolved in parallel
    pub concurrency: usize,
    /// Metadata columns that define a unit type
    pub metadata_key: Vec<String>,
    pub geometry_validity: ValidityMode,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    /// Directory for cached per-source artifacts
    pub work_dir: Option<PathBuf>,
}

impl Default for MosaicSettings {
    fn default() -> Self {
        Self {
            tolerance: 0.01,
            concurrency: 4,
            metadata_key: DEFAULT_METADATA_KEY.iter().map(|c| c.to_string()).collect(),
            geometry_validity: ValidityMode::Lenient,
            max_retries: 3,
            retry_base_delay: Duration::from_millis(1000),
            work_dir: None,
        }
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    tolerance: Option<f64>,
    concurrency: Option<i64>,
    metadata_key: Option<Vec<String>>,
    geometry_validity: Option<String>,
    max_retries: Option<u32>,
    retry_base_delay_ms: Option<u64>,
    work_dir: Option<PathBuf>,
}

/// Programmatic configuration overrides
#[derive(Debug, Default)]
pub struct ConfigOverrides {
    pub tolerance: Option<f64>,
    pub concurrency: Option<usize>,
    pub metadata_key: Option<Vec<String>>,
    pub geometry_validity: Option<ValidityMode>,
    pub max_retries: Option<u32>,
    pub retry_base_delay_ms: Option<u64>,
    pub work_dir: Option<PathBuf>,
}

/// Parse a sliver tolerance from string
pub fn parse_tolerance(s: &str) -> Result<f64> {
    match s.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => Ok(value),
        _ => Err(MosaicError::ConfigInvalid {
            key: "tolerance".to_string(),
            reason: format!("Invalid tolerance: {}. Use a positive number", s),
        }),
    }
}

/// Parse a worker count from string
pub fn parse_concurrency(s: &str) -> Result<usize> {
    match s.trim().parse::<usize>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(MosaicError::ConfigInvalid {
            key: "concurrency".to_string(),
            reason: format!("Invalid concurrency: {}. Use a positive integer", s),
        }),
    }
}

/// Parse validity mode from string
pub fn parse_validity_mode(s: &str) -> Result<ValidityMode> {
    match s.trim().to_lowercase().as_str() {
        "strict" => Ok(ValidityMode::Strict),
        "lenient" => Ok(ValidityMode::Lenient),
        _ => Err(MosaicError::ConfigInvalid {
            key: "geometry_validity".to_string(),
            reason: format!("Invalid validity mode: {}. Use strict or lenient", s),
        }),
    }
}

/// Check that every metadata key column is a known metadata column
pub fn validate_metadata_key(columns: Vec<String>) -> Result<Vec<String>> {
    if columns.is_empty() {
        return Err(MosaicError::ConfigInvalid {
            key: "metadata_key".to_string(),
            reason: "At least one metadata column is required".to_string(),
        });
    }

    let columns: Vec<String> = columns.into_iter().map(|c| c.trim().to_lowercase()).collect();
    if let Some(unknown) = columns.iter().find(|c| !METADATA_COLUMNS.contains(&c.as_str())) {
        return Err(MosaicError::ConfigInvalid {
            key: "metadata_key".to_string(),
            reason: format!("Unknown metadata column: {}", unknown),
        });
    }

    Ok(columns)
}
