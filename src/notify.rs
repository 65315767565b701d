use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::model::{Event, StaffId};

const CHANNEL_CAPACITY: usize = 256;

/// Broadcast hub for schedule-change notifications.
///
/// Each staff member gets a channel carrying their own schedule events; the
/// facility channel carries holiday changes, which affect every roster at
/// once. Delivery to devices is the boundary layer's problem — this is the
/// in-process hook it consumes.
pub struct NotifyHub {
    staff: DashMap<StaffId, broadcast::Sender<Event>>,
    facility: broadcast::Sender<Event>,
}

impl NotifyHub {
    pub fn new() -> Self {
        Self {
            staff: DashMap::new(),
            facility: broadcast::channel(CHANNEL_CAPACITY).0,
        }
    }

    /// Subscribe to one staff member's schedule changes. Creates the channel
    /// if needed.
    pub fn subscribe_staff(&self, staff_id: StaffId) -> broadcast::Receiver<Event> {
        self.staff
            .entry(staff_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Subscribe to facility-wide changes (the holiday calendar).
    pub fn subscribe_facility(&self) -> broadcast::Receiver<Event> {
        self.facility.subscribe()
    }

    /// Send a staff-scoped notification. No-op if nobody is listening.
    pub fn send_staff(&self, staff_id: StaffId, event: &Event) {
        if let Some(sender) = self.staff.get(&staff_id) {
            let _ = sender.send(event.clone());
        }
    }

    /// Send a facility-wide notification. No-op if nobody is listening.
    pub fn send_facility(&self, event: &Event) {
        let _ = self.facility.send(event.clone());
    }

    /// Drop a staff channel (e.g. when the member is removed).
    pub fn remove(&self, staff_id: &StaffId) {
        self.staff.remove(staff_id);
    }
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ulid::Ulid;

    #[tokio::test]
    async fn subscribe_and_receive_staff_event() {
        let hub = NotifyHub::new();
        let staff_id = Ulid::new();
        let mut rx = hub.subscribe_staff(staff_id);

        let event = Event::StaffRegistered {
            id: staff_id,
            name: "Dr. Aalto".into(),
            department_id: None,
        };
        hub.send_staff(staff_id, &event);

        assert_eq!(rx.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn facility_channel_carries_holiday_events() {
        let hub = NotifyHub::new();
        let mut rx = hub.subscribe_facility();

        let date: NaiveDate = "2025-01-01".parse().unwrap();
        let event = Event::HolidaysAdded { dates: vec![date] };
        hub.send_facility(&event);

        assert_eq!(rx.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn send_without_subscribers_is_noop() {
        let hub = NotifyHub::new();
        let staff_id = Ulid::new();
        hub.send_staff(staff_id, &Event::StaffRemoved { id: staff_id });
        hub.send_facility(&Event::HolidaysRemoved { dates: vec![] });
    }
}
