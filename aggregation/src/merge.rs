use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use chronoplan_timeline::CostSeries;
use indexmap::IndexMap;

/// Sums two series of the same dimension over the union of their time
/// grids. At a grid point contributed by only one series, the other
/// contributes a linearly interpolated value when the point lies inside
/// its own span and nothing at all when it lies outside (never a zero
/// fill), matching the series' own evaluation rules.
#[must_use]
pub fn combine(a: &CostSeries, b: &CostSeries) -> CostSeries {
    if a.is_empty() {
        return b.clone();
    }
    if b.is_empty() {
        return a.clone();
    }
    let grid: BTreeSet<DateTime<Utc>> = a
        .samples
        .iter()
        .chain(b.samples.iter())
        .map(|&(t, _)| t)
        .collect();
    let samples = grid
        .into_iter()
        .map(|t| {
            let value = a.value_at(t).unwrap_or(0.0) + b.value_at(t).unwrap_or(0.0);
            (t, value)
        })
        .collect();
    CostSeries {
        dimension: a.dimension.clone(),
        samples,
    }
}

/// Folds `incoming` per-dimension series into the accumulator.
pub fn merge_into(
    accumulator: &mut IndexMap<String, CostSeries>,
    incoming: IndexMap<String, CostSeries>,
) {
    for (dimension, series) in incoming {
        if series.is_empty() {
            continue;
        }
        match accumulator.get_mut(&dimension) {
            Some(existing) => *existing = combine(existing, &series),
            None => {
                accumulator.insert(dimension, series);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn series(points: &[(i64, f64)]) -> CostSeries {
        CostSeries::new(
            "power",
            points.iter().map(|&(t, v)| (at(t), v)).collect(),
        )
        .unwrap()
    }

    #[test]
    fn sums_on_the_union_grid() {
        let a = series(&[(0, 2.0), (10, 2.0)]);
        let b = series(&[(0, 1.0), (5, 3.0), (10, 1.0)]);
        let merged = combine(&a, &b);
        // a is interpolated at b's grid point t=5.
        assert_eq!(
            merged.samples,
            vec![(at(0), 3.0), (at(5), 5.0), (at(10), 3.0)]
        );
    }

    #[test]
    fn contributor_outside_its_span_is_omitted_not_zeroed() {
        let a = series(&[(0, 4.0), (4, 4.0)]);
        let b = series(&[(6, 1.0), (8, 1.0)]);
        let merged = combine(&a, &b);
        // No overlap: each keeps its own values, nothing is zero-filled.
        assert_eq!(
            merged.samples,
            vec![(at(0), 4.0), (at(4), 4.0), (at(6), 1.0), (at(8), 1.0)]
        );
    }

    #[test]
    fn shared_instants_are_not_double_counted() {
        let a = series(&[(0, 1.0), (5, 1.0)]);
        let b = series(&[(5, 2.0), (9, 2.0)]);
        let merged = combine(&a, &b);
        assert_eq!(
            merged.samples,
            vec![(at(0), 1.0), (at(5), 3.0), (at(9), 2.0)]
        );
    }

    #[test]
    fn empty_operand_is_identity() {
        let a = series(&[(0, 1.0), (5, 2.0)]);
        assert_eq!(combine(&a, &CostSeries::empty("power")), a);
        assert_eq!(combine(&CostSeries::empty("power"), &a), a);
    }

    #[test]
    fn merge_into_accumulates_per_dimension() {
        let mut acc = IndexMap::new();
        let mut incoming = IndexMap::new();
        incoming.insert("power".to_string(), series(&[(0, 1.0), (2, 1.0)]));
        merge_into(&mut acc, incoming);
        let mut more = IndexMap::new();
        more.insert("power".to_string(), series(&[(0, 2.0), (2, 2.0)]));
        more.insert("data".to_string(), CostSeries::empty("data"));
        merge_into(&mut acc, more);
        assert_eq!(acc.len(), 1);
        assert_eq!(acc["power"].samples, vec![(at(0), 3.0), (at(2), 3.0)]);
    }
}
