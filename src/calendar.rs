use chrono::{Datelike, Days, NaiveDate};

use crate::model::Weekday;

/// Map a calendar date to its Monday-first weekday.
///
/// This is the only place a date turns into a [`Weekday`] — call sites never
/// derive weekday numbering on their own.
pub fn weekday_of(date: NaiveDate) -> Weekday {
    Weekday::ALL[date.weekday().num_days_from_monday() as usize]
}

/// Every calendar date between two anchors, inclusive, earliest first.
///
/// The anchors may be given in either order; `date_range(a, b)` and
/// `date_range(b, a)` enumerate the same dates. Equal anchors yield exactly
/// one date. The iterator is cloneable, so callers can walk it more than
/// once.
pub fn date_range(a: NaiveDate, b: NaiveDate) -> impl Iterator<Item = NaiveDate> + Clone {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    lo.iter_days().take_while(move |d| *d <= hi)
}

/// The number of dates `date_range(a, b)` yields.
pub fn range_len(a: NaiveDate, b: NaiveDate) -> usize {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    (hi - lo).num_days() as usize + 1
}

/// A fixed 6-row × 7-column calendar grid for the month containing `date`,
/// starting on the Monday on or before the 1st. Always 42 dates; leading and
/// trailing cells spill into the neighboring months and stay fully
/// resolvable.
pub fn month_grid(date: NaiveDate) -> Vec<NaiveDate> {
    let first = date - Days::new(u64::from(date.day0()));
    let monday = first - Days::new(u64::from(first.weekday().num_days_from_monday()));
    monday.iter_days().take(42).collect()
}
