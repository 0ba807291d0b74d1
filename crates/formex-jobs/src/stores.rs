//! Storage seams for the orchestrator.
//!
//! Three narrow traits keep the service testable: a [`SourceStore`] hands
//! back the form definition and its submissions, a [`ContentStore`] persists
//! finished artifacts, and a [`JobStore`] owns job records. In-memory
//! implementations back the tests; the filesystem and JSON-file variants
//! back the command line.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use formex_model::{ExportJob, RawForm, Submission, SubmissionFilters};

use crate::error::{JobError, Result};

/// Where forms and submissions come from.
pub trait SourceStore: Send + Sync {
    fn fetch_form(&self, form_id: &str) -> Result<RawForm>;

    /// Fetch submissions for a form with the job's filters already applied.
    fn fetch_submissions(
        &self,
        form_id: &str,
        filters: &SubmissionFilters,
    ) -> Result<Vec<Submission>>;
}

/// Where finished artifacts go.
pub trait ContentStore: Send + Sync {
    /// Persist bytes under a key and return the final location.
    fn save(&self, key: &str, bytes: &[u8]) -> Result<String>;
    fn read(&self, location: &str) -> Result<Vec<u8>>;
    fn delete(&self, location: &str) -> Result<()>;
}

/// Where job records live.
pub trait JobStore: Send + Sync {
    fn insert(&self, job: ExportJob) -> Result<()>;
    fn get(&self, job_id: &str) -> Result<ExportJob>;
    fn update(&self, job: &ExportJob) -> Result<()>;
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Source store seeded with parsed forms and submissions.
#[derive(Default)]
pub struct InMemorySourceStore {
    forms: Mutex<BTreeMap<String, RawForm>>,
    submissions: Mutex<BTreeMap<String, Vec<Submission>>>,
}

impl InMemorySourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_form(&self, form: RawForm) {
        locked(&self.forms).insert(form.id.clone(), form);
    }

    pub fn insert_submissions(&self, form_id: impl Into<String>, submissions: Vec<Submission>) {
        locked(&self.submissions).insert(form_id.into(), submissions);
    }
}

impl SourceStore for InMemorySourceStore {
    fn fetch_form(&self, form_id: &str) -> Result<RawForm> {
        locked(&self.forms)
            .get(form_id)
            .cloned()
            .ok_or_else(|| JobError::FormNotFound(form_id.to_string()))
    }

    fn fetch_submissions(
        &self,
        form_id: &str,
        filters: &SubmissionFilters,
    ) -> Result<Vec<Submission>> {
        let mut rows = locked(&self.submissions)
            .get(form_id)
            .cloned()
            .unwrap_or_default();
        rows.retain(|submission| filters.matches(submission));
        Ok(rows)
    }
}

/// Artifact store over a map; the key doubles as the location.
#[derive(Default)]
pub struct InMemoryContentStore {
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        locked(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        locked(&self.entries).is_empty()
    }
}

impl ContentStore for InMemoryContentStore {
    fn save(&self, key: &str, bytes: &[u8]) -> Result<String> {
        locked(&self.entries).insert(key.to_string(), bytes.to_vec());
        Ok(key.to_string())
    }

    fn read(&self, location: &str) -> Result<Vec<u8>> {
        locked(&self.entries)
            .get(location)
            .cloned()
            .ok_or_else(|| JobError::ContentNotFound(location.to_string()))
    }

    fn delete(&self, location: &str) -> Result<()> {
        locked(&self.entries)
            .remove(location)
            .map(|_| ())
            .ok_or_else(|| JobError::ContentNotFound(location.to_string()))
    }
}

/// Job store over a map keyed by job id.
#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: Mutex<BTreeMap<String, ExportJob>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobStore for InMemoryJobStore {
    fn insert(&self, job: ExportJob) -> Result<()> {
        locked(&self.jobs).insert(job.id.clone(), job);
        Ok(())
    }

    fn get(&self, job_id: &str) -> Result<ExportJob> {
        locked(&self.jobs)
            .get(job_id)
            .cloned()
            .ok_or_else(|| JobError::JobNotFound(job_id.to_string()))
    }

    fn update(&self, job: &ExportJob) -> Result<()> {
        let mut jobs = locked(&self.jobs);
        if !jobs.contains_key(&job.id) {
            return Err(JobError::JobNotFound(job.id.clone()));
        }
        jobs.insert(job.id.clone(), job.clone());
        Ok(())
    }
}

/// Content store writing artifacts under a root directory.
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ContentStore for FsContentStore {
    fn save(&self, key: &str, bytes: &[u8]) -> Result<String> {
        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        debug!(path = %path.display(), size = bytes.len(), "artifact written");
        Ok(path.display().to_string())
    }

    fn read(&self, location: &str) -> Result<Vec<u8>> {
        fs::read(location).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => JobError::ContentNotFound(location.to_string()),
            _ => JobError::Io(e),
        })
    }

    fn delete(&self, location: &str) -> Result<()> {
        fs::remove_file(location)?;
        Ok(())
    }
}

/// Source store reading a form definition and its submissions from two
/// JSON files. Filters are applied in memory after parsing.
pub struct JsonSourceStore {
    form_path: PathBuf,
    submissions_path: PathBuf,
}

impl JsonSourceStore {
    pub fn new(form_path: impl Into<PathBuf>, submissions_path: impl Into<PathBuf>) -> Self {
        Self {
            form_path: form_path.into(),
            submissions_path: submissions_path.into(),
        }
    }

    /// Parse the form file without checking its id. Used to discover the
    /// form id before a job exists.
    pub fn load_form(&self) -> Result<RawForm> {
        let raw = fs::read(&self.form_path)?;
        Ok(serde_json::from_slice(&raw)?)
    }
}

impl SourceStore for JsonSourceStore {
    fn fetch_form(&self, form_id: &str) -> Result<RawForm> {
        let form = self.load_form()?;
        if form.id != form_id {
            return Err(JobError::FormNotFound(form_id.to_string()));
        }
        Ok(form)
    }

    fn fetch_submissions(
        &self,
        _form_id: &str,
        filters: &SubmissionFilters,
    ) -> Result<Vec<Submission>> {
        let raw = fs::read(&self.submissions_path)?;
        let mut rows: Vec<Submission> = serde_json::from_slice(&raw)?;
        rows.retain(|submission| filters.matches(submission));
        Ok(rows)
    }
}
