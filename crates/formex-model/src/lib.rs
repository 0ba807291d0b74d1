pub mod error;
pub mod filters;
pub mod form;
pub mod job;
pub mod options;
pub mod schedule;
pub mod submission;

pub use error::{ModelError, Result};
pub use filters::{FieldFilter, FilterOp, SubmissionFilters};
pub use form::{Choice, Form, Question, QuestionType, RawForm};
pub use job::{Artifact, ArtifactFormat, ExportJob, ExportType, JobStatus};
pub use options::ExportOptions;
pub use schedule::{
    CloudTarget, DeliveryConfig, ScheduleRunStatus, ScheduleTime, ScheduleType, ScheduledExport,
};
pub use submission::{ResponseValue, Submission, SubmissionStatus, TransformedSubmission};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn job_serializes() {
        let job = ExportJob {
            id: "j1".to_string(),
            tenant_id: "t1".to_string(),
            form_id: "f1".to_string(),
            user_id: "u1".to_string(),
            export_type: ExportType::Raw,
            format: ArtifactFormat::Csv,
            options: ExportOptions::default(),
            filters: SubmissionFilters::default(),
            status: JobStatus::Pending,
            file_location: None,
            error_message: None,
            created_at: Utc::now(),
            completed_at: None,
        };
        let json = serde_json::to_string(&job).expect("serialize job");
        let round: ExportJob = serde_json::from_str(&json).expect("deserialize job");
        assert_eq!(round.id, "j1");
        assert_eq!(round.status, JobStatus::Pending);
    }

    #[test]
    fn response_value_serializes_untagged() {
        let value = ResponseValue::Map(
            [
                ("a".to_string(), ResponseValue::number(1.0)),
                ("b".to_string(), ResponseValue::text("B text")),
            ]
            .into_iter()
            .collect(),
        );
        let json = serde_json::to_string(&value).expect("serialize response");
        assert_eq!(json, r#"{"a":1.0,"b":"B text"}"#);
    }
}
