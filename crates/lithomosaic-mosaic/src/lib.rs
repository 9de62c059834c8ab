//! Lithomosaic Mosaic - Ordered merging of geological map sources
//!
//! This crate assembles self-resolved sources into one non-overlapping
//! layer. Sources are prepared in parallel and merged strictly in priority
//! order against an accumulated coverage mask.

pub mod adapters;
pub mod builder;
pub mod cache;
pub mod layer;
pub mod models;
pub mod pipeline;
pub mod retry;

pub use adapters::{GeoJsonDirAdapter, MemoryAdapter};
pub use builder::{BuilderState, MosaicBuilder};
pub use cache::{settings_fingerprint, WorkCache};
pub use layer::{FinalLayer, LayerRecord};
pub use models::{MosaicOutput, PreparedSource, SourceReport};
pub use pipeline::{CancellationFlag, MosaicPipeline};
pub use retry::RetryPolicy;
