use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tokio::sync::RwLock;

use crate::limits::*;
use crate::model::*;

use super::{Engine, EngineError, apply_to_schedule};

/// Reject `Working` intervals that are empty or inverted.
fn validate_entry(entry: &ShiftEntry) -> Result<(), EngineError> {
    match entry {
        ShiftEntry::Working { start, end } if end <= start => {
            Err(EngineError::Validation("shift end must be after shift start"))
        }
        _ => Ok(()),
    }
}

/// Sort, dedup, and cap a caller-supplied date batch. Duplicate dates in one
/// batch collapse to a single write.
fn normalize_dates(dates: &[NaiveDate]) -> Result<Vec<NaiveDate>, EngineError> {
    if dates.is_empty() {
        return Err(EngineError::Validation("empty date set"));
    }
    if dates.len() > MAX_BATCH_DATES {
        return Err(EngineError::Validation("too many dates in one batch"));
    }
    let mut out = dates.to_vec();
    out.sort();
    out.dedup();
    Ok(out)
}

impl Engine {
    // ── Staff directory (replica of user management) ─────────

    pub async fn register_staff(
        &self,
        id: StaffId,
        name: String,
        department_id: Option<DeptId>,
    ) -> Result<(), EngineError> {
        if self.state.len() >= MAX_STAFF_PER_FACILITY {
            return Err(EngineError::Validation("too many staff members"));
        }
        if name.len() > MAX_NAME_LEN {
            return Err(EngineError::Validation("staff name too long"));
        }
        if self.state.contains_key(&id) {
            return Err(EngineError::AlreadyExists(id));
        }

        let event = Event::StaffRegistered { id, name: name.clone(), department_id };
        self.wal_append(&event).await?;
        let ss = StaffSchedule::new(id, name, department_id);
        self.state.insert(id, Arc::new(RwLock::new(ss)));
        if let Some(dept) = department_id {
            self.members.entry(dept).or_default().push(id);
        }
        self.record_mutation(&event);
        self.notify.send_staff(id, &event);
        Ok(())
    }

    pub async fn update_staff(
        &self,
        id: StaffId,
        name: String,
        department_id: Option<DeptId>,
    ) -> Result<(), EngineError> {
        if name.len() > MAX_NAME_LEN {
            return Err(EngineError::Validation("staff name too long"));
        }
        let ss = self.get_schedule(&id).ok_or(EngineError::NotFound(id))?;
        let mut guard = ss.write().await;
        let prev_dept = guard.department_id;

        let event = Event::StaffUpdated { id, name, department_id };
        self.wal_append(&event).await?;
        apply_to_schedule(&mut guard, &event);
        drop(guard);
        self.reindex_department(id, prev_dept, department_id);
        self.record_mutation(&event);
        self.notify.send_staff(id, &event);
        Ok(())
    }

    pub async fn remove_staff(&self, id: StaffId) -> Result<(), EngineError> {
        let ss = self.get_schedule(&id).ok_or(EngineError::NotFound(id))?;
        let dept = ss.read().await.department_id;

        let event = Event::StaffRemoved { id };
        self.wal_append(&event).await?;
        self.state.remove(&id);
        if let Some(dept) = dept
            && let Some(mut roster) = self.members.get_mut(&dept)
        {
            roster.retain(|s| *s != id);
        }
        self.record_mutation(&event);
        self.notify.send_staff(id, &event);
        self.notify.remove(&id);
        Ok(())
    }

    // ── Weekly default pattern ───────────────────────────────

    /// Replace the default entry for (staff, weekday). This is the one
    /// write path for the weekly pattern — a `DayOff` entry here is how a
    /// recurring day off is recorded.
    pub async fn set_default(
        &self,
        staff_id: StaffId,
        weekday: Weekday,
        entry: ShiftEntry,
    ) -> Result<(), EngineError> {
        validate_entry(&entry)?;
        let ss = self.get_schedule(&staff_id).ok_or(EngineError::NotFound(staff_id))?;
        let mut guard = ss.write().await;
        let event = Event::DefaultSet { staff_id, weekday, entry };
        self.persist_and_apply(staff_id, &mut guard, &event).await
    }

    /// Remove a weekday from the weekly pattern entirely. Resolution for
    /// that weekday falls through to `Unscheduled`, not `DayOff`. Clearing
    /// an unpopulated weekday is a no-op.
    pub async fn clear_default(&self, staff_id: StaffId, weekday: Weekday) -> Result<(), EngineError> {
        let ss = self.get_schedule(&staff_id).ok_or(EngineError::NotFound(staff_id))?;
        let mut guard = ss.write().await;
        if guard.default_for(weekday).is_none() {
            return Ok(());
        }
        let event = Event::DefaultCleared { staff_id, weekday };
        self.persist_and_apply(staff_id, &mut guard, &event).await
    }

    // ── Range edits (override layer) ─────────────────────────

    /// Upsert a `Working { start, end }` override for every date in the
    /// batch, replacing any prior override including a `DayOff`. The batch
    /// is one log record: either every date takes effect or none do.
    pub async fn assign_working_range(
        &self,
        staff_id: StaffId,
        dates: &[NaiveDate],
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<(), EngineError> {
        self.assign_override_range(staff_id, dates, ShiftEntry::Working { start, end })
            .await
    }

    /// Upsert a `DayOff` override for every date in the batch.
    pub async fn set_day_off_range(
        &self,
        staff_id: StaffId,
        dates: &[NaiveDate],
    ) -> Result<(), EngineError> {
        self.assign_override_range(staff_id, dates, ShiftEntry::DayOff).await
    }

    async fn assign_override_range(
        &self,
        staff_id: StaffId,
        dates: &[NaiveDate],
        entry: ShiftEntry,
    ) -> Result<(), EngineError> {
        validate_entry(&entry)?;
        let dates = normalize_dates(dates)?;
        let ss = self.get_schedule(&staff_id).ok_or(EngineError::NotFound(staff_id))?;
        let mut guard = ss.write().await;
        let event = Event::OverridesAssigned { staff_id, dates, entry };
        self.persist_and_apply(staff_id, &mut guard, &event).await
    }

    /// Delete the override (if any) for every date in the batch, reverting
    /// each date to whatever the default and holiday layers resolve to.
    /// Dates with no override are skipped, not errors.
    pub async fn clear_range(&self, staff_id: StaffId, dates: &[NaiveDate]) -> Result<(), EngineError> {
        let dates = normalize_dates(dates)?;
        let ss = self.get_schedule(&staff_id).ok_or(EngineError::NotFound(staff_id))?;
        let mut guard = ss.write().await;
        let dates: Vec<NaiveDate> = dates
            .into_iter()
            .filter(|d| guard.override_for(*d).is_some())
            .collect();
        if dates.is_empty() {
            return Ok(());
        }
        let event = Event::OverridesCleared { staff_id, dates };
        self.persist_and_apply(staff_id, &mut guard, &event).await
    }

    // ── Holiday calendar (facility-wide) ─────────────────────

    /// Mark dates as facility-wide holidays. Duplicates within the batch and
    /// dates already marked collapse to one entry each.
    pub async fn add_holidays(&self, dates: &[NaiveDate]) -> Result<(), EngineError> {
        let dates = normalize_dates(dates)?;
        let mut cal = self.holidays.write().await;
        let fresh: Vec<NaiveDate> = dates.into_iter().filter(|d| !cal.contains(d)).collect();
        if fresh.is_empty() {
            return Ok(());
        }
        let event = Event::HolidaysAdded { dates: fresh.clone() };
        self.wal_append(&event).await?;
        cal.extend(fresh);
        self.record_mutation(&event);
        self.notify.send_facility(&event);
        Ok(())
    }

    /// Unmark holidays. Dates that are not holidays are skipped, not errors.
    pub async fn remove_holidays(&self, dates: &[NaiveDate]) -> Result<(), EngineError> {
        let dates = normalize_dates(dates)?;
        let mut cal = self.holidays.write().await;
        let present: Vec<NaiveDate> = dates.into_iter().filter(|d| cal.contains(d)).collect();
        if present.is_empty() {
            return Ok(());
        }
        let event = Event::HolidaysRemoved { dates: present.clone() };
        self.wal_append(&event).await?;
        for date in &present {
            cal.remove(date);
        }
        self.record_mutation(&event);
        self.notify.send_facility(&event);
        Ok(())
    }
}
