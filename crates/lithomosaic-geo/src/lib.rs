//! Lithomosaic Geo - Polygon cleanup, masking, and clipping
//!
//! This crate holds the geometric half of mosaic building: validity repair,
//! self-overlap resolution within a source, the accumulated coverage mask,
//! and clipping of new sources against that mask.

pub mod clip;
pub mod counters;
pub mod index;
pub mod mask;
pub mod models;
pub mod ops;
pub mod overlap;
pub mod validation;

pub use clip::CrossSourceClipper;
pub use counters::{CounterSnapshot, DropCounters};
pub use mask::MaskAccumulator;
pub use overlap::SelfOverlapResolver;
