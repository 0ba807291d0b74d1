//! Schedule persistence seam.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use formex_model::ScheduledExport;

use crate::error::{Result, ScheduleError};

/// CRUD contract for schedule records.
pub trait ScheduleStore: Send + Sync {
    fn insert(&self, schedule: ScheduledExport) -> Result<()>;
    fn get(&self, schedule_id: &str) -> Result<ScheduledExport>;
    fn update(&self, schedule: &ScheduledExport) -> Result<()>;
    fn delete(&self, schedule_id: &str) -> Result<()>;
    /// All schedules, active or not, in id order.
    fn list(&self) -> Result<Vec<ScheduledExport>>;
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Map-backed store for tests and single-process use.
#[derive(Default)]
pub struct InMemoryScheduleStore {
    schedules: Mutex<BTreeMap<String, ScheduledExport>>,
}

impl InMemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScheduleStore for InMemoryScheduleStore {
    fn insert(&self, schedule: ScheduledExport) -> Result<()> {
        locked(&self.schedules).insert(schedule.id.clone(), schedule);
        Ok(())
    }

    fn get(&self, schedule_id: &str) -> Result<ScheduledExport> {
        locked(&self.schedules)
            .get(schedule_id)
            .cloned()
            .ok_or_else(|| ScheduleError::ScheduleNotFound(schedule_id.to_string()))
    }

    fn update(&self, schedule: &ScheduledExport) -> Result<()> {
        let mut schedules = locked(&self.schedules);
        if !schedules.contains_key(&schedule.id) {
            return Err(ScheduleError::ScheduleNotFound(schedule.id.clone()));
        }
        schedules.insert(schedule.id.clone(), schedule.clone());
        Ok(())
    }

    fn delete(&self, schedule_id: &str) -> Result<()> {
        locked(&self.schedules)
            .remove(schedule_id)
            .map(|_| ())
            .ok_or_else(|| ScheduleError::ScheduleNotFound(schedule_id.to_string()))
    }

    fn list(&self) -> Result<Vec<ScheduledExport>> {
        Ok(locked(&self.schedules).values().cloned().collect())
    }
}
