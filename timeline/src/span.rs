use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TimelineError;

/// Inclusive time interval. Zero-length spans are valid instantaneous events.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
pub struct TimeSpan {
    /// Inclusive start instant.
    pub start: DateTime<Utc>,
    /// Inclusive end instant.
    pub end: DateTime<Utc>,
}

impl TimeSpan {
    /// Creates a span, rejecting `start > end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, TimelineError> {
        if start > end {
            return Err(TimelineError::InvalidSpan { start, end });
        }
        Ok(Self { start, end })
    }

    /// Zero-length span at a single instant.
    #[must_use]
    pub const fn instant(at: DateTime<Utc>) -> Self {
        Self { start: at, end: at }
    }

    /// Elapsed time between start and end.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Whether the span covers a single instant.
    #[must_use]
    pub fn is_instant(&self) -> bool {
        self.start == self.end
    }

    /// Whether the instant lies inside the span (boundaries inclusive).
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }

    /// Whether `other` nests entirely inside this span.
    #[must_use]
    pub fn contains_span(&self, other: &Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Overlap of two spans, if any. Touching boundaries overlap at an instant.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then_some(Self { start, end })
    }

    /// Smallest span covering both operands.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}
