mod error;
mod mutations;
mod queries;
mod resolve;

pub use error::EngineError;
pub use resolve::{resolve_day, resolve_range};

use std::collections::BTreeSet;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::DashMap;
use tokio::sync::{RwLock, mpsc, oneshot};

use crate::model::*;
use crate::notify::NotifyHub;
use crate::observability;
use crate::wal::{self, Wal, WalCommand};

pub type SharedStaffSchedule = Arc<RwLock<StaffSchedule>>;

/// One facility's duty-roster state: per-staff schedules, the holiday
/// calendar, and the department index, all rebuilt from the WAL on open.
///
/// The engine never reaches into ambient context — callers pass every id
/// they are authorized for explicitly.
#[derive(Debug)]
pub struct Engine {
    state: DashMap<StaffId, SharedStaffSchedule>,
    holidays: Arc<RwLock<BTreeSet<NaiveDate>>>,
    /// Department → member staff ids for O(1) roster lookups.
    members: DashMap<DeptId, Vec<StaffId>>,
    wal_tx: mpsc::Sender<WalCommand>,
    pub notify: Arc<NotifyHub>,
}

/// Apply a staff-scoped schedule event to one member's state (no locking —
/// the caller holds the lock).
fn apply_to_schedule(ss: &mut StaffSchedule, event: &Event) {
    match event {
        Event::DefaultSet { weekday, entry, .. } => ss.set_default(*weekday, *entry),
        Event::DefaultCleared { weekday, .. } => {
            ss.clear_default(*weekday);
        }
        Event::OverridesAssigned { dates, entry, .. } => {
            for date in dates {
                ss.set_override(*date, *entry);
            }
        }
        Event::OverridesCleared { dates, .. } => {
            for date in dates {
                ss.clear_override(*date);
            }
        }
        Event::StaffUpdated { name, department_id, .. } => {
            ss.name = name.clone();
            ss.department_id = *department_id;
        }
        // Directory lifecycle and holiday events are handled at the engine
        // level, not per schedule.
        _ => {}
    }
}

/// Extract the staff id from a schedule-scoped event.
fn event_staff_id(event: &Event) -> Option<StaffId> {
    match event {
        Event::DefaultSet { staff_id, .. }
        | Event::DefaultCleared { staff_id, .. }
        | Event::OverridesAssigned { staff_id, .. }
        | Event::OverridesCleared { staff_id, .. } => Some(*staff_id),
        Event::StaffUpdated { id, .. } => Some(*id),
        _ => None,
    }
}

impl Engine {
    pub fn open(wal_path: PathBuf, notify: Arc<NotifyHub>) -> io::Result<Self> {
        let events = Wal::replay(&wal_path)?;
        let wal = Wal::open(&wal_path)?;
        let wal_tx = wal::spawn_writer(wal);

        let engine = Self {
            state: DashMap::new(),
            holidays: Arc::new(RwLock::new(BTreeSet::new())),
            members: DashMap::new(),
            wal_tx,
            notify,
        };

        // Replay — we are the sole owner of every Arc here, so try_read/
        // try_write always succeed instantly. Never use blocking_read/
        // blocking_write here because this may run inside an async context
        // (lazy facility creation).
        for event in &events {
            engine.replay_event(event);
        }

        Ok(engine)
    }

    fn replay_event(&self, event: &Event) {
        match event {
            Event::StaffRegistered { id, name, department_id } => {
                let ss = StaffSchedule::new(*id, name.clone(), *department_id);
                self.state.insert(*id, Arc::new(RwLock::new(ss)));
                if let Some(dept) = department_id {
                    self.members.entry(*dept).or_default().push(*id);
                }
            }
            Event::StaffRemoved { id } => {
                if let Some((_, ss)) = self.state.remove(id) {
                    let guard = ss.try_read().expect("replay: uncontended read");
                    if let Some(dept) = guard.department_id
                        && let Some(mut roster) = self.members.get_mut(&dept)
                    {
                        roster.retain(|s| s != id);
                    }
                }
            }
            Event::HolidaysAdded { dates } => {
                let mut cal = self.holidays.try_write().expect("replay: uncontended write");
                cal.extend(dates.iter().copied());
            }
            Event::HolidaysRemoved { dates } => {
                let mut cal = self.holidays.try_write().expect("replay: uncontended write");
                for date in dates {
                    cal.remove(date);
                }
            }
            other => {
                if let Some(staff_id) = event_staff_id(other)
                    && let Some(entry) = self.state.get(&staff_id)
                {
                    let ss = entry.value().clone();
                    drop(entry);
                    let mut guard = ss.try_write().expect("replay: uncontended write");
                    let prev_dept = guard.department_id;
                    apply_to_schedule(&mut guard, other);
                    let next_dept = guard.department_id;
                    drop(guard);
                    self.reindex_department(staff_id, prev_dept, next_dept);
                }
            }
        }
    }

    /// Write an event to the WAL via the background group-commit writer.
    pub(super) async fn wal_append(&self, event: &Event) -> Result<(), EngineError> {
        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Append { event: event.clone(), response: tx })
            .await
            .map_err(|_| EngineError::Store("log writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::Store("log writer dropped response".into()))?
            .map_err(|e| EngineError::Store(e.to_string()))
    }

    pub fn get_schedule(&self, id: &StaffId) -> Option<SharedStaffSchedule> {
        self.state.get(id).map(|e| e.value().clone())
    }

    pub fn staff_count(&self) -> usize {
        self.state.len()
    }

    /// Current members of a department, in registration order. Unknown
    /// departments yield an empty roster.
    pub fn department_members(&self, department_id: &DeptId) -> Vec<StaffId> {
        self.members
            .get(department_id)
            .map(|e| e.value().clone())
            .unwrap_or_default()
    }

    /// WAL-append + apply + notify in one call, for staff-scoped events.
    pub(super) async fn persist_and_apply(
        &self,
        staff_id: StaffId,
        ss: &mut StaffSchedule,
        event: &Event,
    ) -> Result<(), EngineError> {
        self.wal_append(event).await?;
        apply_to_schedule(ss, event);
        self.record_mutation(event);
        self.notify.send_staff(staff_id, event);
        Ok(())
    }

    pub(super) fn record_mutation(&self, event: &Event) {
        metrics::counter!(observability::MUTATIONS_TOTAL, "op" => observability::event_label(event))
            .increment(1);
    }

    /// Move a staff member between department rosters. No-op when the
    /// department did not change.
    pub(super) fn reindex_department(
        &self,
        staff_id: StaffId,
        prev: Option<DeptId>,
        next: Option<DeptId>,
    ) {
        if prev == next {
            return;
        }
        if let Some(dept) = prev
            && let Some(mut roster) = self.members.get_mut(&dept)
        {
            roster.retain(|s| *s != staff_id);
        }
        if let Some(dept) = next {
            self.members.entry(dept).or_default().push(staff_id);
        }
    }

    /// Rewrite the WAL with only the events needed to recreate the current
    /// state: one registration per staff member, their surviving defaults
    /// and overrides, and the holiday calendar.
    pub async fn compact_wal(&self) -> Result<(), EngineError> {
        let mut events = Vec::new();
        let staff_ids: Vec<StaffId> = self.state.iter().map(|e| *e.key()).collect();
        for id in staff_ids {
            let Some(ss) = self.get_schedule(&id) else { continue };
            let guard = ss.read().await;
            events.push(Event::StaffRegistered {
                id: guard.id,
                name: guard.name.clone(),
                department_id: guard.department_id,
            });
            for (weekday, entry) in guard.defaults() {
                events.push(Event::DefaultSet { staff_id: guard.id, weekday, entry });
            }
            for (date, entry) in guard.overrides() {
                events.push(Event::OverridesAssigned {
                    staff_id: guard.id,
                    dates: vec![date],
                    entry,
                });
            }
        }
        {
            let cal = self.holidays.read().await;
            if !cal.is_empty() {
                events.push(Event::HolidaysAdded { dates: cal.iter().copied().collect() });
            }
        }

        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Compact { events, response: tx })
            .await
            .map_err(|_| EngineError::Store("log writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::Store("log writer dropped response".into()))?
            .map_err(|e| EngineError::Store(e.to_string()))
    }

    pub async fn wal_appends_since_compact(&self) -> u64 {
        let (tx, rx) = oneshot::channel();
        if self
            .wal_tx
            .send(WalCommand::AppendsSinceCompact { response: tx })
            .await
            .is_err()
        {
            return 0;
        }
        rx.await.unwrap_or(0)
    }
}
