//! Asynchronous export job orchestration.
//!
//! The [`ExportService`] owns the job lifecycle: a request becomes a pending
//! record, a background worker flips it to processing, renders the artifact
//! through the transformer and exporters, and parks the result (or the error
//! message) on the record. Callers poll [`ExportService::get_status`].
//!
//! Storage is abstracted behind three traits so the same service runs
//! against in-memory maps in tests and against the filesystem in the CLI.

mod error;
mod service;
mod stores;

pub use error::{JobError, Result};
pub use service::{ExportService, NewJob};
pub use stores::{
    ContentStore, FsContentStore, InMemoryContentStore, InMemoryJobStore, InMemorySourceStore,
    JobStore, JsonSourceStore, SourceStore,
};
