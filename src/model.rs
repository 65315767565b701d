use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Staff members and departments are identified by ULIDs minted by user
/// management; this crate carries them but never creates them.
pub type StaffId = Ulid;
pub type DeptId = Ulid;

/// Day of the week, Monday-first.
///
/// Deliberately not `chrono::Weekday`: that type has no `Ord` and no fixed
/// week start. The one place a date becomes a `Weekday` is
/// [`crate::calendar::weekday_of`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// All seven days in Monday-first order.
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// 0 for Monday through 6 for Sunday.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
            Weekday::Sunday => "sunday",
        }
    }
}

impl std::fmt::Display for Weekday {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A stored schedule entry: a working interval `[start, end)` with
/// `start < end`, or an explicit day off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShiftEntry {
    Working { start: NaiveTime, end: NaiveTime },
    DayOff,
}

/// The outcome of resolving one (staff, date) pair.
///
/// `Unscheduled` means nothing is on record for that day — distinct from an
/// explicit `DayOff`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolvedShift {
    Working { start: NaiveTime, end: NaiveTime },
    DayOff,
    Unscheduled,
}

impl ResolvedShift {
    pub fn is_working(&self) -> bool {
        matches!(self, ResolvedShift::Working { .. })
    }
}

impl From<ShiftEntry> for ResolvedShift {
    fn from(entry: ShiftEntry) -> Self {
        match entry {
            ShiftEntry::Working { start, end } => ResolvedShift::Working { start, end },
            ShiftEntry::DayOff => ResolvedShift::DayOff,
        }
    }
}

/// One staff member's roster state: the weekly default pattern plus
/// date-specific overrides. Uniqueness per (weekday) and per (date) holds by
/// construction — writes to an occupied slot replace it.
#[derive(Debug, Clone)]
pub struct StaffSchedule {
    pub id: StaffId,
    pub name: String,
    pub department_id: Option<DeptId>,
    defaults: [Option<ShiftEntry>; 7],
    overrides: BTreeMap<NaiveDate, ShiftEntry>,
}

impl StaffSchedule {
    pub fn new(id: StaffId, name: String, department_id: Option<DeptId>) -> Self {
        Self {
            id,
            name,
            department_id,
            defaults: [None; 7],
            overrides: BTreeMap::new(),
        }
    }

    /// Replace the default entry for a weekday.
    pub fn set_default(&mut self, weekday: Weekday, entry: ShiftEntry) {
        self.defaults[weekday.index()] = Some(entry);
    }

    /// Remove a weekday from the weekly pattern entirely. Returns the
    /// previous entry, if any.
    pub fn clear_default(&mut self, weekday: Weekday) -> Option<ShiftEntry> {
        self.defaults[weekday.index()].take()
    }

    pub fn default_for(&self, weekday: Weekday) -> Option<ShiftEntry> {
        self.defaults[weekday.index()]
    }

    /// Populated weekdays in Monday-first order. Partial patterns are legal,
    /// so this yields anywhere from 0 to 7 entries.
    pub fn defaults(&self) -> impl Iterator<Item = (Weekday, ShiftEntry)> + '_ {
        Weekday::ALL
            .iter()
            .filter_map(|w| self.defaults[w.index()].map(|e| (*w, e)))
    }

    /// Upsert the override for a date, replacing any prior entry.
    pub fn set_override(&mut self, date: NaiveDate, entry: ShiftEntry) {
        self.overrides.insert(date, entry);
    }

    pub fn clear_override(&mut self, date: NaiveDate) -> Option<ShiftEntry> {
        self.overrides.remove(&date)
    }

    pub fn override_for(&self, date: NaiveDate) -> Option<ShiftEntry> {
        self.overrides.get(&date).copied()
    }

    /// Overrides within `[from, to]`, ascending by date.
    pub fn overrides_in(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> impl Iterator<Item = (NaiveDate, ShiftEntry)> + '_ {
        self.overrides.range(from..=to).map(|(d, e)| (*d, *e))
    }

    /// All overrides, ascending by date.
    pub fn overrides(&self) -> impl Iterator<Item = (NaiveDate, ShiftEntry)> + '_ {
        self.overrides.iter().map(|(d, e)| (*d, *e))
    }

    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }
}

/// The event types — flat, no nesting. This is the log record format and the
/// notification payload.
///
/// `OverridesAssigned` and `OverridesCleared` carry a whole date batch in one
/// record, which is what makes range edits atomic: the batch is either fully
/// on the log or not on it at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    StaffRegistered {
        id: StaffId,
        name: String,
        department_id: Option<DeptId>,
    },
    StaffUpdated {
        id: StaffId,
        name: String,
        department_id: Option<DeptId>,
    },
    StaffRemoved {
        id: StaffId,
    },
    DefaultSet {
        staff_id: StaffId,
        weekday: Weekday,
        entry: ShiftEntry,
    },
    DefaultCleared {
        staff_id: StaffId,
        weekday: Weekday,
    },
    OverridesAssigned {
        staff_id: StaffId,
        dates: Vec<NaiveDate>,
        entry: ShiftEntry,
    },
    OverridesCleared {
        staff_id: StaffId,
        dates: Vec<NaiveDate>,
    },
    HolidaysAdded {
        dates: Vec<NaiveDate>,
    },
    HolidaysRemoved {
        dates: Vec<NaiveDate>,
    },
}

// ── Query result types ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffInfo {
    pub id: StaffId,
    pub name: String,
    pub department_id: Option<DeptId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultEntry {
    pub weekday: Weekday,
    pub entry: ShiftEntry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverrideEntry {
    pub date: NaiveDate,
    pub entry: ShiftEntry,
}

/// One resolved date for one staff member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaySchedule {
    pub date: NaiveDate,
    pub shift: ResolvedShift,
}

/// One department member's resolved shift for one date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffDaySchedule {
    pub staff_id: StaffId,
    pub name: String,
    pub shift: ResolvedShift,
}

/// A department roster snapshot for one date, including members who are
/// `Unscheduled` that day — callers filter as needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentDaySchedule {
    pub date: NaiveDate,
    pub entries: Vec<StaffDaySchedule>,
}
