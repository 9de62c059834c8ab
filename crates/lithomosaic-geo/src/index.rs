use rstar::{RTree, RTreeObject, AABB};

/// Arena slot with its bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexedEnvelope {
    /// Position of the geometry in the caller's arena
    pub id: usize,

    envelope: AABB<[f64; 2]>,
}

impl IndexedEnvelope {
    pub fn new(id: usize, envelope: AABB<[f64; 2]>) -> Self {
        Self { id, envelope }
    }
}

impl RTreeObject for IndexedEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// R-tree over the bounding boxes of an arena of geometries
///
/// Envelopes are recorded once. Geometries that only ever shrink stay
/// inside their recorded box, so queries never miss them.
pub struct SpatialIndex {
    tree: RTree<IndexedEnvelope>,
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialIndex {
    /// Create a new empty spatial index
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Bulk-load an index from arena ids and their envelopes
    pub fn from_envelopes(envelopes: Vec<(usize, AABB<[f64; 2]>)>) -> Self {
        let indexed = envelopes
            .into_iter()
            .map(|(id, envelope)| IndexedEnvelope::new(id, envelope))
            .collect();
        Self { tree: RTree::bulk_load(indexed) }
    }

    pub fn insert(&mut self, id: usize, envelope: AABB<[f64; 2]>) {
        self.tree.insert(IndexedEnvelope::new(id, envelope));
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Ids whose envelope intersects `envelope`, ascending
    pub fn query(&self, envelope: &AABB<[f64; 2]>) -> Vec<usize> {
        let mut ids: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(envelope)
            .map(|entry| entry.id)
            .collect();
        ids.sort_unstable();
        ids
    }
}
