use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;
use crate::filters::SubmissionFilters;
use crate::options::ExportOptions;

/// What kind of artifact a job produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportType {
    /// Flattened raw responses (spreadsheet/CSV).
    Raw,
    /// Aggregated statistics with charts (deck/document/workbook/PDF).
    Analytics,
    /// Statistical-package import bundle (syntax + data + readme).
    Spss,
    /// Relational SQL dump.
    Sql,
}

impl ExportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportType::Raw => "raw",
            ExportType::Analytics => "analytics",
            ExportType::Spss => "spss",
            ExportType::Sql => "sql",
        }
    }

    /// Formats this export type can render.
    pub fn supported_formats(&self) -> &'static [ArtifactFormat] {
        match self {
            ExportType::Raw => &[ArtifactFormat::Xlsx, ArtifactFormat::Csv],
            ExportType::Analytics => &[
                ArtifactFormat::Pptx,
                ArtifactFormat::Docx,
                ArtifactFormat::Xlsx,
                ArtifactFormat::Pdf,
            ],
            ExportType::Spss => &[ArtifactFormat::SpssBundle],
            ExportType::Sql => &[ArtifactFormat::Sql],
        }
    }

    /// Format used when the caller does not pick one.
    pub fn default_format(&self) -> ArtifactFormat {
        self.supported_formats()[0]
    }

    /// Validate a caller-selected format against this export type.
    pub fn check_format(&self, format: ArtifactFormat) -> Result<(), ModelError> {
        if self.supported_formats().contains(&format) {
            Ok(())
        } else {
            Err(ModelError::UnsupportedFormat {
                export_type: self.as_str().to_string(),
                format: format.as_str().to_string(),
            })
        }
    }
}

impl fmt::Display for ExportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ExportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "raw" => Ok(ExportType::Raw),
            "analytics" => Ok(ExportType::Analytics),
            "spss" => Ok(ExportType::Spss),
            "sql" => Ok(ExportType::Sql),
            other => Err(format!("Unknown export type: {}", other)),
        }
    }
}

/// Concrete output container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFormat {
    Xlsx,
    Csv,
    Pptx,
    Docx,
    Pdf,
    /// Zip bundle with syntax, data file, and readme.
    SpssBundle,
    Sql,
}

impl ArtifactFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactFormat::Xlsx => "xlsx",
            ArtifactFormat::Csv => "csv",
            ArtifactFormat::Pptx => "pptx",
            ArtifactFormat::Docx => "docx",
            ArtifactFormat::Pdf => "pdf",
            ArtifactFormat::SpssBundle => "spss-bundle",
            ArtifactFormat::Sql => "sql",
        }
    }

    /// File extension for the produced artifact.
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactFormat::Xlsx => "xlsx",
            ArtifactFormat::Csv => "csv",
            ArtifactFormat::Pptx => "pptx",
            ArtifactFormat::Docx => "docx",
            ArtifactFormat::Pdf => "pdf",
            ArtifactFormat::SpssBundle => "zip",
            ArtifactFormat::Sql => "sql",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ArtifactFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ArtifactFormat::Csv => "text/csv",
            ArtifactFormat::Pptx => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
            ArtifactFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            ArtifactFormat::Pdf => "application/pdf",
            ArtifactFormat::SpssBundle => "application/zip",
            ArtifactFormat::Sql => "application/sql",
        }
    }
}

impl fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ArtifactFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "xlsx" => Ok(ArtifactFormat::Xlsx),
            "csv" => Ok(ArtifactFormat::Csv),
            "pptx" => Ok(ArtifactFormat::Pptx),
            "docx" => Ok(ArtifactFormat::Docx),
            "pdf" => Ok(ArtifactFormat::Pdf),
            "spss-bundle" | "zip" | "sav" => Ok(ArtifactFormat::SpssBundle),
            "sql" => Ok(ArtifactFormat::Sql),
            other => Err(format!("Unknown artifact format: {}", other)),
        }
    }
}

/// A generated export artifact.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime_type: String,
}

impl Artifact {
    pub fn new(bytes: Vec<u8>, file_name: impl Into<String>, format: ArtifactFormat) -> Self {
        Self {
            bytes,
            file_name: file_name.into(),
            mime_type: format.mime_type().to_string(),
        }
    }
}

/// Job lifecycle state. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// True once the job can no longer change state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Monotonic forward transitions: pending -> processing -> completed|failed.
    /// A job never re-enters pending and terminal states never move.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        match (self, next) {
            (JobStatus::Pending, JobStatus::Processing) => true,
            (JobStatus::Pending, JobStatus::Failed) => true,
            (JobStatus::Processing, JobStatus::Completed) => true,
            (JobStatus::Processing, JobStatus::Failed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One export job record, owned by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportJob {
    pub id: String,
    pub tenant_id: String,
    pub form_id: String,
    pub user_id: String,
    pub export_type: ExportType,
    pub format: ArtifactFormat,
    #[serde(default)]
    pub options: ExportOptions,
    #[serde(default)]
    pub filters: SubmissionFilters,
    pub status: JobStatus,
    /// Set only on completed jobs.
    pub file_location: Option<String>,
    /// Set only on failed jobs; the generation error message verbatim.
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ExportJob {
    /// Attempt a status transition, rejecting anything non-monotonic.
    pub fn transition(&mut self, next: JobStatus) -> Result<(), ModelError> {
        if !self.status.can_transition_to(next) {
            return Err(ModelError::InvalidTransition {
                from: self.status.as_str().to_string(),
                to: next.as_str().to_string(),
            });
        }
        self.status = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_transitions_are_monotonic() {
        assert!(JobStatus::Pending.can_transition_to(JobStatus::Processing));
        assert!(JobStatus::Processing.can_transition_to(JobStatus::Completed));
        assert!(JobStatus::Processing.can_transition_to(JobStatus::Failed));
        assert!(!JobStatus::Completed.can_transition_to(JobStatus::Pending));
        assert!(!JobStatus::Failed.can_transition_to(JobStatus::Processing));
        assert!(!JobStatus::Pending.can_transition_to(JobStatus::Completed));
    }

    #[test]
    fn format_compatibility_per_export_type() {
        assert!(ExportType::Raw.check_format(ArtifactFormat::Csv).is_ok());
        assert!(ExportType::Raw.check_format(ArtifactFormat::Pptx).is_err());
        assert!(ExportType::Analytics.check_format(ArtifactFormat::Pdf).is_ok());
        assert_eq!(ExportType::Sql.default_format(), ArtifactFormat::Sql);
        assert_eq!(ExportType::Spss.default_format(), ArtifactFormat::SpssBundle);
    }

    #[test]
    fn export_type_parses() {
        assert_eq!("Analytics".parse::<ExportType>().unwrap(), ExportType::Analytics);
        assert!("yaml".parse::<ExportType>().is_err());
    }
}
