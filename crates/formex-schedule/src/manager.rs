//! The schedule manager: CRUD, due detection, and execution.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use formex_jobs::{ExportService, NewJob};
use formex_model::{
    ArtifactFormat, DeliveryConfig, ExportJob, ExportOptions, ExportType, ScheduleRunStatus,
    ScheduleTime, ScheduleType, ScheduledExport,
};

use crate::delivery::Delivery;
use crate::error::{Result, ScheduleError};
use crate::recurrence::Recurrence;
use crate::store::ScheduleStore;

/// A schedule that fired within this window is not fired again. Guards
/// against double delivery when ticks land inside the same matching minute
/// or a pass is retried shortly after.
pub const RERUN_GUARD_MINUTES: i64 = 50;

/// Request payload for a new schedule.
#[derive(Debug, Clone)]
pub struct NewSchedule {
    pub tenant_id: String,
    pub user_id: String,
    pub name: String,
    pub form_id: String,
    pub export_type: ExportType,
    /// Falls back to the export type's default format when absent.
    pub format: Option<ArtifactFormat>,
    pub schedule_type: ScheduleType,
    pub schedule_time: Option<ScheduleTime>,
    /// 0 = Sunday .. 6 = Saturday; weekly schedules only.
    pub day_of_week: Option<u32>,
    /// 1..=31; monthly schedules only.
    pub day_of_month: Option<u32>,
    /// Raw five-field expression; custom schedules only.
    pub custom_expression: Option<String>,
    pub options: ExportOptions,
    pub delivery: DeliveryConfig,
}

impl NewSchedule {
    pub fn new(
        tenant_id: impl Into<String>,
        user_id: impl Into<String>,
        name: impl Into<String>,
        form_id: impl Into<String>,
        export_type: ExportType,
        schedule_type: ScheduleType,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            user_id: user_id.into(),
            name: name.into(),
            form_id: form_id.into(),
            export_type,
            format: None,
            schedule_type,
            schedule_time: None,
            day_of_week: None,
            day_of_month: None,
            custom_expression: None,
            options: ExportOptions::default(),
            delivery: DeliveryConfig::default(),
        }
    }

    pub fn with_format(mut self, format: ArtifactFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_time(mut self, time: ScheduleTime) -> Self {
        self.schedule_time = Some(time);
        self
    }

    pub fn with_day_of_week(mut self, weekday: u32) -> Self {
        self.day_of_week = Some(weekday);
        self
    }

    pub fn with_day_of_month(mut self, day: u32) -> Self {
        self.day_of_month = Some(day);
        self
    }

    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        self.custom_expression = Some(expression.into());
        self
    }

    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_delivery(mut self, delivery: DeliveryConfig) -> Self {
        self.delivery = delivery;
        self
    }
}

/// Owns recurring exports: validates them at creation, finds the ones due
/// at a given instant, and drives each due export through the job service.
///
/// Cloning shares the stores and the single-flight flag.
#[derive(Clone)]
pub struct ScheduleManager {
    store: Arc<dyn ScheduleStore>,
    delivery: Arc<dyn Delivery>,
    service: ExportService,
    pass_running: Arc<AtomicBool>,
}

impl ScheduleManager {
    pub fn new(
        store: Arc<dyn ScheduleStore>,
        delivery: Arc<dyn Delivery>,
        service: ExportService,
    ) -> Self {
        Self {
            store,
            delivery,
            service,
            pass_running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Validate and persist a new schedule. Recurrence parameters are
    /// checked here; a stored schedule always carries a valid expression.
    pub fn create_schedule(&self, request: NewSchedule) -> Result<ScheduledExport> {
        let format = request
            .format
            .unwrap_or_else(|| request.export_type.default_format());
        request.export_type.check_format(format)?;

        let recurrence = self.build_recurrence(&request)?;
        let schedule = ScheduledExport {
            id: Uuid::new_v4().to_string(),
            tenant_id: request.tenant_id,
            user_id: request.user_id,
            name: request.name,
            form_id: request.form_id,
            export_type: request.export_type,
            format,
            schedule_type: request.schedule_type,
            recurrence_expression: recurrence.to_string(),
            schedule_time: request.schedule_time,
            day_of_week: request.day_of_week,
            day_of_month: request.day_of_month,
            options: request.options,
            delivery: request.delivery,
            is_active: true,
            last_run_at: None,
            last_status: None,
            last_error: None,
        };
        self.store.insert(schedule.clone())?;
        info!(
            schedule_id = %schedule.id,
            name = %schedule.name,
            expression = %schedule.recurrence_expression,
            "schedule created"
        );
        Ok(schedule)
    }

    fn build_recurrence(&self, request: &NewSchedule) -> Result<Recurrence> {
        let time = || {
            request
                .schedule_time
                .ok_or(ScheduleError::MissingParameter("schedule_time"))
        };
        let recurrence = match request.schedule_type {
            ScheduleType::Daily => Recurrence::daily(time()?)?,
            ScheduleType::Weekly => {
                let weekday = request
                    .day_of_week
                    .ok_or(ScheduleError::MissingParameter("day_of_week"))?;
                Recurrence::weekly(time()?, weekday)?
            }
            ScheduleType::Monthly => {
                let day = request
                    .day_of_month
                    .ok_or(ScheduleError::MissingParameter("day_of_month"))?;
                Recurrence::monthly(time()?, day)?
            }
            ScheduleType::Custom => request
                .custom_expression
                .as_deref()
                .ok_or(ScheduleError::MissingParameter("custom_expression"))?
                .parse()?,
        };
        Ok(recurrence)
    }

    pub fn get_schedule(&self, schedule_id: &str) -> Result<ScheduledExport> {
        self.store.get(schedule_id)
    }

    pub fn list_schedules(&self) -> Result<Vec<ScheduledExport>> {
        self.store.list()
    }

    /// Pause or resume a schedule without losing its run history.
    pub fn set_active(&self, schedule_id: &str, active: bool) -> Result<ScheduledExport> {
        let mut schedule = self.store.get(schedule_id)?;
        schedule.is_active = active;
        self.store.update(&schedule)?;
        Ok(schedule)
    }

    pub fn delete_schedule(&self, schedule_id: &str) -> Result<()> {
        self.store.delete(schedule_id)
    }

    /// Schedules that should fire at `now`: active, expression matches,
    /// and the last run is outside the rerun guard window.
    pub fn due_schedules(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledExport>> {
        let mut due = Vec::new();
        for schedule in self.store.list()? {
            if !schedule.is_active {
                continue;
            }
            let recurrence = match schedule.recurrence_expression.parse::<Recurrence>() {
                Ok(recurrence) => recurrence,
                Err(error) => {
                    warn!(
                        schedule_id = %schedule.id,
                        %error,
                        "stored recurrence expression is invalid, skipping"
                    );
                    continue;
                }
            };
            if !recurrence.matches(&now) {
                continue;
            }
            if let Some(last) = schedule.last_run_at {
                if now.signed_duration_since(last) < Duration::minutes(RERUN_GUARD_MINUTES) {
                    debug!(schedule_id = %schedule.id, "inside rerun guard window, skipping");
                    continue;
                }
            }
            due.push(schedule);
        }
        Ok(due)
    }

    /// Run one schedule now: create a job, process it synchronously, and
    /// record the outcome on the schedule. Delivery only happens for a
    /// completed export and its failures are logged, never returned.
    ///
    /// Due-ness is the caller's contract: this re-checks that the schedule
    /// is active and its stored expression still parses, but not that the
    /// expression matches `now`, so an operator can force an off-cycle run.
    /// [`ScheduleManager::due_schedules`] owns the matching and the rerun
    /// guard.
    pub fn execute_schedule(
        &self,
        schedule_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ExportJob> {
        let mut schedule = self.store.get(schedule_id)?;
        if !schedule.is_active {
            return Err(ScheduleError::ScheduleInactive(schedule.id));
        }
        schedule.recurrence_expression.parse::<Recurrence>()?;

        let request = NewJob::new(
            schedule.tenant_id.clone(),
            schedule.user_id.clone(),
            schedule.form_id.clone(),
            schedule.export_type,
        )
        .with_format(schedule.format)
        .with_options(schedule.options.clone());

        let job = self.service.create_job(request)?;
        let outcome = self.service.process(&job.id);

        schedule.last_run_at = Some(now);
        match &outcome {
            Ok(_) => {
                schedule.last_status = Some(ScheduleRunStatus::Completed);
                schedule.last_error = None;
            }
            Err(error) => {
                schedule.last_status = Some(ScheduleRunStatus::Failed);
                schedule.last_error = Some(error.to_string());
            }
        }
        self.store.update(&schedule)?;

        let job = outcome?;
        self.deliver(&schedule, &job);
        Ok(job)
    }

    /// One scan over all schedules. Single-flight: a pass that starts
    /// while another is in progress returns immediately. Failures of one
    /// schedule never stop the scan.
    pub fn run_due_pass(&self, now: DateTime<Utc>) -> Result<usize> {
        if self.pass_running.swap(true, Ordering::SeqCst) {
            debug!("scheduler pass already in flight, skipping");
            return Ok(0);
        }
        let result = self.due_pass_inner(now);
        self.pass_running.store(false, Ordering::SeqCst);
        result
    }

    fn due_pass_inner(&self, now: DateTime<Utc>) -> Result<usize> {
        let due = self.due_schedules(now)?;
        let total = due.len();
        let mut executed = 0;
        for schedule in due {
            match self.execute_schedule(&schedule.id, now) {
                Ok(job) => {
                    executed += 1;
                    info!(
                        schedule_id = %schedule.id,
                        job_id = %job.id,
                        "scheduled export completed"
                    );
                }
                Err(error) => {
                    warn!(schedule_id = %schedule.id, %error, "scheduled export failed");
                }
            }
        }
        if total > 0 {
            info!(due = total, executed, "scheduler pass finished");
        }
        Ok(executed)
    }

    /// Spawn the recurring tick loop. The handle never resolves on its
    /// own; drop it or abort it to stop ticking.
    pub fn start_ticker(&self, period: StdDuration) -> JoinHandle<()> {
        let manager = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let pass = manager.clone();
                let outcome =
                    tokio::task::spawn_blocking(move || pass.run_due_pass(Utc::now())).await;
                match outcome {
                    Ok(Ok(_)) => {}
                    Ok(Err(error)) => warn!(%error, "scheduler pass failed"),
                    Err(error) => warn!(%error, "scheduler pass panicked"),
                }
            }
        })
    }

    fn deliver(&self, schedule: &ScheduledExport, job: &ExportJob) {
        if schedule.delivery.is_empty() {
            return;
        }
        let Some(location) = job.file_location.as_deref() else {
            return;
        };
        let bytes = match self.service.read_artifact(location) {
            Ok(bytes) => bytes,
            Err(error) => {
                warn!(schedule_id = %schedule.id, %error, "artifact read failed, skipping delivery");
                return;
            }
        };
        let file_name = Path::new(location)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("export.bin");

        if !schedule.delivery.email_recipients.is_empty() {
            let subject = format!("Scheduled export: {}", schedule.name);
            if let Err(error) = self.delivery.send_email_with_attachment(
                &schedule.delivery.email_recipients,
                &subject,
                file_name,
                &bytes,
            ) {
                warn!(schedule_id = %schedule.id, %error, "email delivery failed");
            }
        }
        if let Some(target) = &schedule.delivery.cloud_target {
            if let Err(error) = self.delivery.upload_to_cloud(target, file_name, &bytes) {
                warn!(schedule_id = %schedule.id, %error, "cloud upload failed");
            }
        }
    }
}
