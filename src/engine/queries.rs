use chrono::NaiveDate;

use crate::calendar::date_range;
use crate::model::*;
use crate::observability;

use super::{Engine, EngineError, resolve};

impl Engine {
    /// Effective schedule for one staff member on one date. Unknown staff
    /// ids yield `Ok(None)` — existence checks belong to the boundary layer.
    pub async fn resolve_day(
        &self,
        staff_id: StaffId,
        date: NaiveDate,
    ) -> Result<Option<ResolvedShift>, EngineError> {
        let Some(ss) = self.get_schedule(&staff_id) else {
            return Ok(None);
        };
        let holidays = self.holidays.read().await;
        let guard = ss.read().await;
        metrics::counter!(observability::RESOLUTIONS_TOTAL).increment(1);
        Ok(Some(resolve::resolve_day(&guard, &holidays, date)))
    }

    /// Effective schedule for every date between the two anchors (inclusive,
    /// either order), one entry per date. Unknown staff ids yield an empty
    /// sequence.
    pub async fn resolve_range(
        &self,
        staff_id: StaffId,
        a: NaiveDate,
        b: NaiveDate,
    ) -> Result<Vec<DaySchedule>, EngineError> {
        let Some(ss) = self.get_schedule(&staff_id) else {
            return Ok(Vec::new());
        };
        let holidays = self.holidays.read().await;
        let guard = ss.read().await;
        Ok(resolve::resolve_range(&guard, &holidays, a, b))
    }

    /// Resolve one date for every member of a department, including members
    /// who are `Unscheduled` that day. Entries are sorted by display name
    /// ascending, ties by staff id, so output order is deterministic.
    /// Unknown departments yield an empty roster, not an error.
    pub async fn resolve_department_day(
        &self,
        department_id: DeptId,
        date: NaiveDate,
    ) -> Result<Vec<StaffDaySchedule>, EngineError> {
        let roster = self.department_members(&department_id);
        let holidays = self.holidays.read().await;
        let mut entries = Vec::with_capacity(roster.len());
        for staff_id in roster {
            let Some(ss) = self.get_schedule(&staff_id) else { continue };
            let guard = ss.read().await;
            entries.push(StaffDaySchedule {
                staff_id,
                name: guard.name.clone(),
                shift: resolve::resolve_day(&guard, &holidays, date),
            });
        }
        entries.sort_by(|x, y| x.name.cmp(&y.name).then(x.staff_id.cmp(&y.staff_id)));
        Ok(entries)
    }

    /// One department roster snapshot per date across the range. Cost is
    /// O(staff × dates); callers typically request one calendar month
    /// (≤ 42 dates) at a time.
    pub async fn resolve_department_range(
        &self,
        department_id: DeptId,
        a: NaiveDate,
        b: NaiveDate,
    ) -> Result<Vec<DepartmentDaySchedule>, EngineError> {
        let mut out = Vec::with_capacity(crate::calendar::range_len(a, b));
        for date in date_range(a, b) {
            out.push(DepartmentDaySchedule {
                date,
                entries: self.resolve_department_day(department_id, date).await?,
            });
        }
        Ok(out)
    }

    /// Department members whose resolved shift for the date is `Working`.
    pub async fn on_duty(
        &self,
        department_id: DeptId,
        date: NaiveDate,
    ) -> Result<Vec<StaffDaySchedule>, EngineError> {
        let mut entries = self.resolve_department_day(department_id, date).await?;
        entries.retain(|e| e.shift.is_working());
        Ok(entries)
    }

    // ── Store listings ───────────────────────────────────────

    /// All registered staff, sorted by name then id.
    pub async fn list_staff(&self) -> Vec<StaffInfo> {
        let ids: Vec<StaffId> = self.state.iter().map(|e| *e.key()).collect();
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(ss) = self.get_schedule(&id) {
                let guard = ss.read().await;
                out.push(StaffInfo {
                    id: guard.id,
                    name: guard.name.clone(),
                    department_id: guard.department_id,
                });
            }
        }
        out.sort_by(|x, y| x.name.cmp(&y.name).then(x.id.cmp(&y.id)));
        out
    }

    /// The weekly pattern for one staff member, Monday-first, up to 7
    /// entries. Unknown staff ids yield an empty list.
    pub async fn list_defaults(&self, staff_id: StaffId) -> Result<Vec<DefaultEntry>, EngineError> {
        let Some(ss) = self.get_schedule(&staff_id) else {
            return Ok(Vec::new());
        };
        let guard = ss.read().await;
        Ok(guard
            .defaults()
            .map(|(weekday, entry)| DefaultEntry { weekday, entry })
            .collect())
    }

    /// Overrides for one staff member within the date range (inclusive,
    /// either anchor order), ascending by date.
    pub async fn list_overrides(
        &self,
        staff_id: StaffId,
        a: NaiveDate,
        b: NaiveDate,
    ) -> Result<Vec<OverrideEntry>, EngineError> {
        let Some(ss) = self.get_schedule(&staff_id) else {
            return Ok(Vec::new());
        };
        let (from, to) = if a <= b { (a, b) } else { (b, a) };
        let guard = ss.read().await;
        Ok(guard
            .overrides_in(from, to)
            .map(|(date, entry)| OverrideEntry { date, entry })
            .collect())
    }

    /// Overrides for many staff members on one date — the department-view
    /// read. Staff without an override that date are absent from the result.
    pub async fn overrides_on(
        &self,
        staff_ids: &[StaffId],
        date: NaiveDate,
    ) -> Result<Vec<(StaffId, ShiftEntry)>, EngineError> {
        let mut out = Vec::new();
        for &staff_id in staff_ids {
            let Some(ss) = self.get_schedule(&staff_id) else { continue };
            let guard = ss.read().await;
            if let Some(entry) = guard.override_for(date) {
                out.push((staff_id, entry));
            }
        }
        Ok(out)
    }

    /// Holidays within the range (inclusive, either anchor order), sorted
    /// ascending.
    pub async fn holidays_between(&self, a: NaiveDate, b: NaiveDate) -> Vec<NaiveDate> {
        let (from, to) = if a <= b { (a, b) } else { (b, a) };
        let cal = self.holidays.read().await;
        cal.range(from..=to).copied().collect()
    }
}
