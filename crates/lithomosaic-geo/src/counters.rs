//! Drop and repair counters shared across workers.
//!
//! Every feature the pipeline discards or repairs is counted here so callers
//! can assert on losses instead of grepping logs.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe geometry outcome counters
#[derive(Debug, Default)]
pub struct DropCounters {
    /// Features whose geometry needed repair and got it
    repaired: AtomicU64,
    /// Features dropped because repair failed
    unrepairable_dropped: AtomicU64,
    /// Pieces dropped after cutting left nothing polygonal
    degenerate_dropped: AtomicU64,
    /// Pieces dropped as residue inside the buffered mask
    contained_dropped: AtomicU64,
    /// Units dropped for lacking a code
    empty_units_dropped: AtomicU64,
    /// Unparseable span or lithology text
    ontology_misses: AtomicU64,
    /// Source features without polygonal geometry, never turned into records
    skipped_features: AtomicU64,
}

impl DropCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_repaired(&self) {
        self.repaired.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unrepairable(&self) {
        self.unrepairable_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_degenerate(&self) {
        self.degenerate_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_contained(&self) {
        self.contained_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_empty_unit(&self) {
        self.empty_units_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ontology_misses(&self, count: u64) {
        self.ontology_misses.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_skipped(&self, count: u64) {
        self.skipped_features.fetch_add(count, Ordering::Relaxed);
    }

    /// Get a point-in-time copy of every counter
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            repaired: self.repaired.load(Ordering::Relaxed),
            unrepairable_dropped: self.unrepairable_dropped.load(Ordering::Relaxed),
            degenerate_dropped: self.degenerate_dropped.load(Ordering::Relaxed),
            contained_dropped: self.contained_dropped.load(Ordering::Relaxed),
            empty_units_dropped: self.empty_units_dropped.load(Ordering::Relaxed),
            ontology_misses: self.ontology_misses.load(Ordering::Relaxed),
            skipped_features: self.skipped_features.load(Ordering::Relaxed),
        }
    }

    /// Fold counts gathered elsewhere, such as a per-source worker, into these
    pub fn absorb(&self, counts: &CounterSnapshot) {
        self.repaired.fetch_add(counts.repaired, Ordering::Relaxed);
        self.unrepairable_dropped
            .fetch_add(counts.unrepairable_dropped, Ordering::Relaxed);
        self.degenerate_dropped
            .fetch_add(counts.degenerate_dropped, Ordering::Relaxed);
        self.contained_dropped
            .fetch_add(counts.contained_dropped, Ordering::Relaxed);
        self.empty_units_dropped
            .fetch_add(counts.empty_units_dropped, Ordering::Relaxed);
        self.ontology_misses
            .fetch_add(counts.ontology_misses, Ordering::Relaxed);
        self.skipped_features
            .fetch_add(counts.skipped_features, Ordering::Relaxed);
    }

    /// Zero every counter
    pub fn reset(&self) {
        for counter in [
            &self.repaired,
            &self.unrepairable_dropped,
            &self.degenerate_dropped,
            &self.contained_dropped,
            &self.empty_units_dropped,
            &self.ontology_misses,
            &self.skipped_features,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// Counter values at a point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    pub repaired: u64,
    pub unrepairable_dropped: u64,
    pub degenerate_dropped: u64,
    pub contained_dropped: u64,
    pub empty_units_dropped: u64,
    pub ontology_misses: u64,
    #[serde(default)]
    pub skipped_features: u64,
}

impl CounterSnapshot {
    /// Features lost to any drop condition
    pub fn total_dropped(&self) -> u64 {
        self.unrepairable_dropped
            + self.degenerate_dropped
            + self.contained_dropped
            + self.empty_units_dropped
            + self.skipped_features
    }
}

impl Add for CounterSnapshot {
    type Output = CounterSnapshot;

    fn add(self, other: CounterSnapshot) -> CounterSnapshot {
        CounterSnapshot {
            repaired: self.repaired + other.repaired,
            unrepairable_dropped: self.unrepairable_dropped + other.unrepairable_dropped,
            degenerate_dropped: self.degenerate_dropped + other.degenerate_dropped,
            contained_dropped: self.contained_dropped + other.contained_dropped,
            empty_units_dropped: self.empty_units_dropped + other.empty_units_dropped,
            ontology_misses: self.ontology_misses + other.ontology_misses,
            skipped_features: self.skipped_features + other.skipped_features,
        }
    }
}

impl Sub for CounterSnapshot {
    type Output = CounterSnapshot;

    fn sub(self, earlier: CounterSnapshot) -> CounterSnapshot {
        CounterSnapshot {
            repaired: self.repaired.saturating_sub(earlier.repaired),
            unrepairable_dropped: self
                .unrepairable_dropped
                .saturating_sub(earlier.unrepairable_dropped),
            degenerate_dropped: self.degenerate_dropped.saturating_sub(earlier.degenerate_dropped),
            contained_dropped: self.contained_dropped.saturating_sub(earlier.contained_dropped),
            empty_units_dropped: self
                .empty_units_dropped
                .saturating_sub(earlier.empty_units_dropped),
            ontology_misses: self.ontology_misses.saturating_sub(earlier.ontology_misses),
            skipped_features: self.skipped_features.saturating_sub(earlier.skipped_features),
        }
    }
}
