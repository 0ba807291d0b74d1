use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::job::{ArtifactFormat, ExportType, JobStatus};
use crate::options::ExportOptions;

/// Friendly recurrence shape a schedule was created from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleType {
    Daily,
    Weekly,
    Monthly,
    /// Caller supplies the raw five-field expression.
    Custom,
}

impl ScheduleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleType::Daily => "daily",
            ScheduleType::Weekly => "weekly",
            ScheduleType::Monthly => "monthly",
            ScheduleType::Custom => "custom",
        }
    }
}

impl fmt::Display for ScheduleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ScheduleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(ScheduleType::Daily),
            "weekly" => Ok(ScheduleType::Weekly),
            "monthly" => Ok(ScheduleType::Monthly),
            "custom" => Ok(ScheduleType::Custom),
            other => Err(format!("Unknown schedule type: {}", other)),
        }
    }
}

/// Wall-clock time of day a daily/weekly/monthly schedule fires at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleTime {
    pub hour: u32,
    pub minute: u32,
}

impl ScheduleTime {
    pub fn new(hour: u32, minute: u32) -> Self {
        Self { hour, minute }
    }
}

/// Where a completed scheduled export gets delivered. Both channels are
/// optional and best-effort.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    pub email_recipients: Vec<String>,
    pub cloud_target: Option<CloudTarget>,
}

impl DeliveryConfig {
    pub fn is_empty(&self) -> bool {
        self.email_recipients.is_empty() && self.cloud_target.is_none()
    }
}

/// Cloud-storage upload target; credentials are resolved by the caller and
/// passed per call, never held as process-wide state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudTarget {
    pub provider: String,
    pub folder: Option<String>,
}

/// Outcome of the most recent execution of a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleRunStatus {
    Completed,
    Failed,
}

impl ScheduleRunStatus {
    pub fn from_job_status(status: JobStatus) -> Self {
        if status == JobStatus::Completed {
            ScheduleRunStatus::Completed
        } else {
            ScheduleRunStatus::Failed
        }
    }
}

/// A recurring export definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledExport {
    pub id: String,
    pub tenant_id: String,
    pub user_id: String,
    pub name: String,
    pub form_id: String,
    pub export_type: ExportType,
    pub format: ArtifactFormat,
    pub schedule_type: ScheduleType,
    /// Derived five-field recurrence expression; see `formex-schedule`.
    pub recurrence_expression: String,
    pub schedule_time: Option<ScheduleTime>,
    /// 0 = Sunday .. 6 = Saturday; weekly schedules only.
    pub day_of_week: Option<u32>,
    /// 1..=31; monthly schedules only.
    pub day_of_month: Option<u32>,
    #[serde(default)]
    pub options: ExportOptions,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    pub is_active: bool,
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_status: Option<ScheduleRunStatus>,
    pub last_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_type_parses() {
        assert_eq!("Weekly".parse::<ScheduleType>().unwrap(), ScheduleType::Weekly);
        assert!("fortnightly".parse::<ScheduleType>().is_err());
    }

    #[test]
    fn run_status_from_job_status() {
        assert_eq!(
            ScheduleRunStatus::from_job_status(JobStatus::Completed),
            ScheduleRunStatus::Completed
        );
        assert_eq!(
            ScheduleRunStatus::from_job_status(JobStatus::Failed),
            ScheduleRunStatus::Failed
        );
    }
}
