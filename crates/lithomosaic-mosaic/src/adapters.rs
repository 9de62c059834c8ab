//! Source adapters producing raw records

pub mod geojson;
pub mod memory;

pub use self::geojson::GeoJsonDirAdapter;
pub use self::memory::MemoryAdapter;
