use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::calendar::{date_range, weekday_of};
use crate::model::{DaySchedule, ResolvedShift, StaffSchedule};

// ── Resolution Algorithm ──────────────────────────────────────────

/// Resolve one date for one staff member against the holiday calendar.
///
/// Precedence: holiday > override > weekly default > `Unscheduled`. A
/// facility-wide holiday wins even over an explicit `Working` override —
/// there is no per-staff holiday exemption.
///
/// Pure over its inputs: same schedule, calendar, and date always produce
/// the same answer. Missing data is a valid state (`Unscheduled`), never an
/// error.
pub fn resolve_day(
    schedule: &StaffSchedule,
    holidays: &BTreeSet<NaiveDate>,
    date: NaiveDate,
) -> ResolvedShift {
    if holidays.contains(&date) {
        return ResolvedShift::DayOff;
    }
    if let Some(entry) = schedule.override_for(date) {
        return entry.into();
    }
    match schedule.default_for(weekday_of(date)) {
        Some(entry) => entry.into(),
        None => ResolvedShift::Unscheduled,
    }
}

/// Resolve every date between the two anchors (inclusive, either order),
/// one entry per date in chronological order. Each date resolves
/// independently — no cross-date state.
pub fn resolve_range(
    schedule: &StaffSchedule,
    holidays: &BTreeSet<NaiveDate>,
    a: NaiveDate,
    b: NaiveDate,
) -> Vec<DaySchedule> {
    date_range(a, b)
        .map(|date| DaySchedule { date, shift: resolve_day(schedule, holidays, date) })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ShiftEntry, Weekday};
    use chrono::NaiveTime;
    use ulid::Ulid;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn schedule_with_wednesday_default() -> StaffSchedule {
        let mut ss = StaffSchedule::new(Ulid::new(), "Dr. Aalto".into(), None);
        ss.set_default(
            Weekday::Wednesday,
            ShiftEntry::Working { start: t(8, 0), end: t(16, 0) },
        );
        ss
    }

    #[test]
    fn default_applies_when_nothing_shadows_it() {
        let ss = schedule_with_wednesday_default();
        let shift = resolve_day(&ss, &BTreeSet::new(), d("2024-06-12"));
        assert_eq!(shift, ResolvedShift::Working { start: t(8, 0), end: t(16, 0) });
    }

    #[test]
    fn holiday_beats_override_and_default() {
        let mut ss = schedule_with_wednesday_default();
        // Even an explicit Working override loses to the holiday.
        ss.set_override(
            d("2024-06-12"),
            ShiftEntry::Working { start: t(9, 0), end: t(17, 0) },
        );
        let holidays: BTreeSet<NaiveDate> = [d("2024-06-12")].into();
        assert_eq!(resolve_day(&ss, &holidays, d("2024-06-12")), ResolvedShift::DayOff);
    }

    #[test]
    fn override_shadows_default() {
        let mut ss = schedule_with_wednesday_default();
        ss.set_override(d("2024-06-12"), ShiftEntry::DayOff);
        assert_eq!(
            resolve_day(&ss, &BTreeSet::new(), d("2024-06-12")),
            ResolvedShift::DayOff
        );

        ss.set_override(
            d("2024-06-12"),
            ShiftEntry::Working { start: t(10, 0), end: t(12, 0) },
        );
        assert_eq!(
            resolve_day(&ss, &BTreeSet::new(), d("2024-06-12")),
            ResolvedShift::Working { start: t(10, 0), end: t(12, 0) }
        );
    }

    #[test]
    fn nothing_on_record_is_unscheduled() {
        let ss = schedule_with_wednesday_default();
        // Thursday has no default and no override.
        assert_eq!(
            resolve_day(&ss, &BTreeSet::new(), d("2024-06-13")),
            ResolvedShift::Unscheduled
        );
    }

    #[test]
    fn holiday_on_unscheduled_day_is_still_day_off() {
        let ss = StaffSchedule::new(Ulid::new(), "Dr. Brandt".into(), None);
        let holidays: BTreeSet<NaiveDate> = [d("2024-06-13")].into();
        assert_eq!(resolve_day(&ss, &holidays, d("2024-06-13")), ResolvedShift::DayOff);
    }

    #[test]
    fn range_resolves_each_date_independently() {
        let mut ss = schedule_with_wednesday_default();
        ss.set_override(d("2024-06-13"), ShiftEntry::Working { start: t(9, 0), end: t(13, 0) });
        let holidays: BTreeSet<NaiveDate> = [d("2024-06-14")].into();

        let days = resolve_range(&ss, &holidays, d("2024-06-12"), d("2024-06-15"));
        assert_eq!(days.len(), 4);
        assert_eq!(days[0].shift, ResolvedShift::Working { start: t(8, 0), end: t(16, 0) });
        assert_eq!(days[1].shift, ResolvedShift::Working { start: t(9, 0), end: t(13, 0) });
        assert_eq!(days[2].shift, ResolvedShift::DayOff);
        assert_eq!(days[3].shift, ResolvedShift::Unscheduled);
    }

    #[test]
    fn range_anchor_order_does_not_matter() {
        let ss = schedule_with_wednesday_default();
        let holidays = BTreeSet::new();
        assert_eq!(
            resolve_range(&ss, &holidays, d("2024-06-10"), d("2024-06-14")),
            resolve_range(&ss, &holidays, d("2024-06-14"), d("2024-06-10"))
        );
    }
}
