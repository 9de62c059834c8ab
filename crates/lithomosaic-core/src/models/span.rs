use serde::{Deserialize, Serialize};

/// Years in one million years (Ma)
pub const YEARS_PER_MA: f64 = 1_000_000.0;

/// A named geologic time interval
///
/// Ages are years before present, so `start_age > end_age` for every span
/// except the zero-length "present".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSpan {
    /// Canonical lowercase name, e.g. "upper cretaceous"
    pub name: String,

    /// Older bound in years before present
    pub start_age: f64,

    /// Younger bound in years before present
    pub end_age: f64,
}

impl TimeSpan {
    pub fn new(name: impl Into<String>, start_age: f64, end_age: f64) -> Self {
        Self {
            name: name.into(),
            start_age,
            end_age,
        }
    }

    /// Build a span from bounds given in millions of years
    pub fn from_ma(name: impl Into<String>, start_ma: f64, end_ma: f64) -> Self {
        Self::new(name, (start_ma * YEARS_PER_MA).round(), (end_ma * YEARS_PER_MA).round())
    }

    /// Length of the interval in years
    pub fn duration(&self) -> f64 {
        self.start_age - self.end_age
    }

    /// Whether `[min, max]` lies within this span
    pub fn covers(&self, min: f64, max: f64) -> bool {
        self.end_age <= min && max <= self.start_age
    }

    /// Whether `other` lies within this span
    pub fn contains_span(&self, other: &TimeSpan) -> bool {
        self.covers(other.end_age, other.start_age)
    }

    pub fn ages(&self) -> Ages {
        Ages::from_bounds(self.end_age, self.start_age)
    }
}

/// Resolved age range of a unit, years before present
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Ages {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub est: Option<f64>,
}

impl Ages {
    /// Ages for an interval, estimated at its midpoint
    pub fn from_bounds(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            est: Some(((min + max) / 2.0).trunc()),
        }
    }

    pub fn unresolved() -> Self {
        Self::default()
    }

    pub fn is_resolved(&self) -> bool {
        self.min.is_some() && self.max.is_some()
    }
}
