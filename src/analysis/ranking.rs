use std::cmp::Ordering;

use super::aggregate::AggregateEntry;

/// Orders entries slowest first. Equal averages fall back to descending name.
pub fn compare_by_average_duration(a: &AggregateEntry, b: &AggregateEntry) -> Ordering {
    b.average_nanos()
        .cmp(&a.average_nanos())
        .then_with(|| b.name.cmp(&a.name))
}

/// Orders entries by ascending failure rate, best first.
///
/// Rates are compared by cross-multiplication (`a.success * b.failure` against
/// `b.success * a.failure`) so no division is involved. The entry whose own
/// successes weigh more against the other's failures has the lower failure
/// rate. Equal rates fall back to descending name.
pub fn compare_by_failure_rate(a: &AggregateEntry, b: &AggregateEntry) -> Ordering {
    let a_weight = u128::from(a.success_count) * u128::from(b.failure_count);
    let b_weight = u128::from(b.success_count) * u128::from(a.failure_count);

    b_weight
        .cmp(&a_weight)
        .then_with(|| b.name.cmp(&a.name))
}

pub fn rank_by_duration<'a>(
    entries: impl IntoIterator<Item = &'a AggregateEntry>,
) -> Vec<&'a AggregateEntry> {
    let mut ranked: Vec<&AggregateEntry> = entries.into_iter().collect();
    ranked.sort_by(|a, b| compare_by_average_duration(a, b));
    ranked
}

pub fn rank_by_success_rate<'a>(
    entries: impl IntoIterator<Item = &'a AggregateEntry>,
) -> Vec<&'a AggregateEntry> {
    let mut ranked: Vec<&AggregateEntry> = entries.into_iter().collect();
    ranked.sort_by(|a, b| compare_by_failure_rate(a, b));
    ranked
}
