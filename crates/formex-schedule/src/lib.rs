//! Recurring export schedules.
//!
//! A schedule pairs an export definition with a five-field [`Recurrence`].
//! The [`ScheduleManager`] scans for due schedules on a tick, drives each
//! one through the job service, records the outcome, and hands completed
//! artifacts to a [`Delivery`] implementation best-effort.

mod delivery;
mod error;
mod manager;
mod recurrence;
mod store;

pub use delivery::{Delivery, NoopDelivery};
pub use error::{Result, ScheduleError};
pub use manager::{NewSchedule, ScheduleManager, RERUN_GUARD_MINUTES};
pub use recurrence::{Field, Recurrence, RecurrenceError};
pub use store::{InMemoryScheduleStore, ScheduleStore};
