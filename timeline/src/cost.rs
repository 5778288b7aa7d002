use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TimelineError;
use crate::span::TimeSpan;

/// Time-sampled numeric function for one resource/cost dimension
/// (e.g. `power`, `consumables`).
///
/// Samples are strictly increasing in time. Values between samples are
/// linearly interpolated; the series is undefined (absent, not zero)
/// outside its own first/last sample.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostSeries {
    /// Cost dimension name.
    pub dimension: String,
    /// Ordered `(instant, value)` samples.
    pub samples: Vec<(DateTime<Utc>, f64)>,
}

impl CostSeries {
    /// Creates a series, rejecting samples that are not strictly increasing.
    pub fn new(
        dimension: impl Into<String>,
        samples: Vec<(DateTime<Utc>, f64)>,
    ) -> Result<Self, TimelineError> {
        let dimension = dimension.into();
        if samples.windows(2).any(|pair| pair[0].0 >= pair[1].0) {
            return Err(TimelineError::UnorderedSamples { dimension });
        }
        Ok(Self { dimension, samples })
    }

    /// Series with no samples.
    #[must_use]
    pub fn empty(dimension: impl Into<String>) -> Self {
        Self {
            dimension: dimension.into(),
            samples: Vec::new(),
        }
    }

    /// Internal constructor for samples already known to be ordered.
    pub(crate) const fn from_ordered(
        dimension: String,
        samples: Vec<(DateTime<Utc>, f64)>,
    ) -> Self {
        Self { dimension, samples }
    }

    /// Whether the series holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Span covered by the series' own samples, if any.
    #[must_use]
    pub fn span(&self) -> Option<TimeSpan> {
        let first = self.samples.first()?.0;
        let last = self.samples.last()?.0;
        Some(TimeSpan {
            start: first,
            end: last,
        })
    }

    /// Value at an instant: exact sample, or linear interpolation between
    /// the surrounding samples. `None` outside the series' own span
    /// (no extrapolation).
    #[must_use]
    pub fn value_at(&self, at: DateTime<Utc>) -> Option<f64> {
        let span = self.span()?;
        if !span.contains(at) {
            return None;
        }
        match self.samples.binary_search_by(|&(t, _)| t.cmp(&at)) {
            Ok(idx) => Some(self.samples[idx].1),
            Err(idx) => {
                // Inside the span, so idx has neighbors on both sides.
                let (t0, v0) = self.samples[idx - 1];
                let (t1, v1) = self.samples[idx];
                Some(lerp((t0, v0), (t1, v1), at))
            }
        }
    }

    /// Restriction of the series to `window`: samples within the window,
    /// plus interpolated boundary samples where a window edge falls inside
    /// the series' own span.
    #[must_use]
    pub fn slice(&self, window: &TimeSpan) -> Self {
        let mut samples = Vec::new();
        if let Some(value) = self.value_at(window.start) {
            samples.push((window.start, value));
        }
        for &(t, v) in &self.samples {
            if t > window.start && t < window.end {
                samples.push((t, v));
            }
        }
        if !window.is_instant() {
            if let Some(value) = self.value_at(window.end) {
                samples.push((window.end, value));
            }
        }
        Self::from_ordered(self.dimension.clone(), samples)
    }
}

fn lerp(a: (DateTime<Utc>, f64), b: (DateTime<Utc>, f64), at: DateTime<Utc>) -> f64 {
    let total = (b.0 - a.0).num_milliseconds();
    if total == 0 {
        return a.1;
    }
    let frac = (at - a.0).num_milliseconds() as f64 / total as f64;
    (b.1 - a.1).mul_add(frac, a.1)
}
