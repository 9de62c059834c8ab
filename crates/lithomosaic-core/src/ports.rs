//! Port trait definitions
//!
//! These traits define the interfaces that source adapters must implement.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::RawRecord;

/// Port for turning a source identifier into raw polygon records
///
/// Adapters own everything format-specific: downloading, decompressing,
/// reprojecting into the job CRS and polygonizing. They hand the core
/// polygonal records with free-text attributes.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Fetch every record of a source
    ///
    /// Transient failures should be reported with
    /// [`MosaicError::transient`](crate::MosaicError::transient) so callers
    /// can retry them.
    async fn fetch(&self, source_id: &str) -> Result<Vec<RawRecord>>;

    /// Features the last successful `fetch` of a source left out because
    /// they had no polygonal geometry
    fn skipped_features(&self, _source_id: &str) -> u64 {
        0
    }

    /// Adapter name for logs
    fn name(&self) -> &str;
}
