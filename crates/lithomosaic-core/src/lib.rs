//! Lithomosaic Core - Domain models, ontology, and configuration
//!
//! This crate contains the geologic metadata model, the time-span and
//! lithology ontologies, the metadata normalizer, and the port definitions
//! that source adapters implement.

pub mod config;
pub mod error;
pub mod lithology;
pub mod metadata;
pub mod models;
pub mod ontology;
pub mod ports;

pub use error::{MosaicError, Result};
