use formex_model::{ArtifactFormat, ExportType, JobStatus};

/// Outcome of one `export` run, for the console summary.
#[derive(Debug)]
pub struct ExportRunResult {
    pub form_id: String,
    pub form_title: String,
    pub question_count: usize,
    pub submission_count: usize,
    pub export_type: ExportType,
    pub format: ArtifactFormat,
    pub status: JobStatus,
    pub file_location: Option<String>,
    pub error_message: Option<String>,
    pub duration_ms: u128,
}

impl ExportRunResult {
    pub fn failed(&self) -> bool {
        self.status != JobStatus::Completed
    }
}
