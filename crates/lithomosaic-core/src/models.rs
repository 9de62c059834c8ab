pub mod metadata;
pub mod record;
pub mod span;

pub use metadata::{RockType, UnitMetadata, DEFAULT_METADATA_KEY, METADATA_COLUMNS};
pub use record::{NormalizedUnit, RawRecord, SourceBatch};
pub use span::{Ages, TimeSpan};
