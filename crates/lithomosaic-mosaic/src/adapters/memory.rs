//! In-memory adapter for tests and embedding callers

use async_trait::async_trait;
use lithomosaic_core::error::{MosaicError, Result};
use lithomosaic_core::models::RawRecord;
use lithomosaic_core::ports::SourceAdapter;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Serves records registered ahead of time
#[derive(Debug, Clone, Default)]
pub struct MemoryAdapter {
    sources: Arc<RwLock<HashMap<String, Vec<RawRecord>>>>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a source
    pub fn insert(&self, source_id: impl Into<String>, records: Vec<RawRecord>) {
        let mut sources = self.sources.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        sources.insert(source_id.into(), records);
    }

    pub fn remove(&self, source_id: &str) -> Option<Vec<RawRecord>> {
        let mut sources = self.sources.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        sources.remove(source_id)
    }
}

#[async_trait]
impl SourceAdapter for MemoryAdapter {
    async fn fetch(&self, source_id: &str) -> Result<Vec<RawRecord>> {
        let sources = self.sources.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        sources
            .get(source_id)
            .cloned()
            .ok_or_else(|| MosaicError::SourceNotFound {
                source_id: source_id.to_string(),
            })
    }

    fn name(&self) -> &str {
        "memory"
    }
}
