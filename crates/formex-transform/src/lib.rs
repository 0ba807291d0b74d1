//! Canonical model builder for survey exports.
//!
//! Turns a raw, user-authored form definition and its raw submissions into
//! the uniform [`CanonicalModel`] every exporter consumes: one ordered
//! question list and one normalized response map per submission.

pub mod answers;
pub mod definition;
mod transformer;

pub use answers::{empty_response, transform_answer};
pub use definition::parse_questions;
pub use transformer::{CanonicalModel, TransformMetadata, transform};
