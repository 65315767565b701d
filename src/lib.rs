//! Duty-roster engine for hospital staff.
//!
//! Every staff member has a recurring weekly pattern plus date-specific
//! overrides; a facility-wide holiday calendar sits above both. The engine
//! answers, for any date or date range, exactly who works and from when to
//! when — precedence is holiday > override > default > unscheduled — and
//! exposes the atomic range edits a calendar UI is built on.
//!
//! State is in-memory per facility, rebuilt from an append-only event log on
//! open. The resolution paths are pure functions over that state.

pub mod calendar;
pub mod compactor;
pub mod engine;
pub mod facility;
pub mod limits;
pub mod model;
pub mod notify;
pub mod observability;
pub mod wal;
