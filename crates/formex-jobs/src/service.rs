//! The export service: job creation, background processing, status reads.

use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use formex_model::{
    ArtifactFormat, ExportJob, ExportOptions, ExportType, JobStatus, SubmissionFilters,
};
use formex_transform::transform;

use crate::error::Result;
use crate::stores::{ContentStore, JobStore, SourceStore};

/// Request payload for a new export job.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub tenant_id: String,
    pub user_id: String,
    pub form_id: String,
    pub export_type: ExportType,
    /// Falls back to the export type's default format when absent.
    pub format: Option<ArtifactFormat>,
    pub options: ExportOptions,
    pub filters: SubmissionFilters,
}

impl NewJob {
    pub fn new(
        tenant_id: impl Into<String>,
        user_id: impl Into<String>,
        form_id: impl Into<String>,
        export_type: ExportType,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            user_id: user_id.into(),
            form_id: form_id.into(),
            export_type,
            format: None,
            options: ExportOptions::default(),
            filters: SubmissionFilters::default(),
        }
    }

    pub fn with_format(mut self, format: ArtifactFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_filters(mut self, filters: SubmissionFilters) -> Self {
        self.filters = filters;
        self
    }
}

/// Orchestrates export jobs over the three storage seams.
///
/// Cloning is cheap; every clone shares the underlying stores, so a clone
/// can be moved onto a background task while the caller keeps polling.
#[derive(Clone)]
pub struct ExportService {
    source: Arc<dyn SourceStore>,
    content: Arc<dyn ContentStore>,
    jobs: Arc<dyn JobStore>,
}

impl ExportService {
    pub fn new(
        source: Arc<dyn SourceStore>,
        content: Arc<dyn ContentStore>,
        jobs: Arc<dyn JobStore>,
    ) -> Self {
        Self {
            source,
            content,
            jobs,
        }
    }

    /// Validate and persist a new pending job. The format/type pairing is
    /// checked here so a bad request never reaches the background worker.
    pub fn create_job(&self, request: NewJob) -> Result<ExportJob> {
        let format = request
            .format
            .unwrap_or_else(|| request.export_type.default_format());
        request.export_type.check_format(format)?;

        let job = ExportJob {
            id: Uuid::new_v4().to_string(),
            tenant_id: request.tenant_id,
            form_id: request.form_id,
            user_id: request.user_id,
            export_type: request.export_type,
            format,
            options: request.options,
            filters: request.filters,
            status: JobStatus::Pending,
            file_location: None,
            error_message: None,
            created_at: Utc::now(),
            completed_at: None,
        };
        self.jobs.insert(job.clone())?;
        info!(
            job_id = %job.id,
            form_id = %job.form_id,
            export_type = %job.export_type,
            format = %job.format,
            "export job created"
        );
        Ok(job)
    }

    /// Run a job on a blocking worker thread. The outcome lands in the job
    /// record; the handle only signals that the attempt finished.
    pub fn spawn(&self, job_id: &str) -> JoinHandle<()> {
        let service = self.clone();
        let job_id = job_id.to_string();
        tokio::task::spawn_blocking(move || {
            if let Err(error) = service.process(&job_id) {
                warn!(%job_id, %error, "export job failed");
            }
        })
    }

    /// Drive one job through its lifecycle.
    ///
    /// The record is flipped to processing before any work starts, then to
    /// exactly one terminal state. A failed job keeps the generation error
    /// message verbatim and is never retried.
    pub fn process(&self, job_id: &str) -> Result<ExportJob> {
        let mut job = self.jobs.get(job_id)?;
        job.transition(JobStatus::Processing)?;
        self.jobs.update(&job)?;

        match self.generate(&job) {
            Ok(location) => {
                job.file_location = Some(location);
                job.completed_at = Some(Utc::now());
                job.transition(JobStatus::Completed)?;
                self.jobs.update(&job)?;
                info!(job_id = %job.id, location = ?job.file_location, "export job completed");
                Ok(job)
            }
            Err(error) => {
                job.error_message = Some(error.to_string());
                job.completed_at = Some(Utc::now());
                job.transition(JobStatus::Failed)?;
                self.jobs.update(&job)?;
                Err(error)
            }
        }
    }

    /// Current job record, terminal or not.
    pub fn get_status(&self, job_id: &str) -> Result<ExportJob> {
        self.jobs.get(job_id)
    }

    /// Read a completed job's artifact bytes back from the content store.
    pub fn read_artifact(&self, location: &str) -> Result<Vec<u8>> {
        self.content.read(location)
    }

    fn generate(&self, job: &ExportJob) -> Result<String> {
        let raw = self.source.fetch_form(&job.form_id)?;
        let submissions = self.source.fetch_submissions(&job.form_id, &job.filters)?;
        debug!(
            job_id = %job.id,
            submissions = submissions.len(),
            "source data fetched"
        );
        let model = transform(&raw, &submissions, &job.options);
        let artifact = formex_export::export(&model, job.export_type, job.format, &job.options)?;
        let key = format!("exports/{}/{}", job.id, artifact.file_name);
        let location = self.content.save(&key, &artifact.bytes)?;
        Ok(location)
    }
}
