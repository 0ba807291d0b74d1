//! Format exporters for the survey export pipeline.
//!
//! Every exporter consumes the canonical model produced by the transformer
//! and returns an in-memory [`Artifact`]:
//!
//! - **Tabular** (`raw`): flattened wide rows as CSV or a spreadsheet.
//! - **Analytics**: one shared statistics pass rendered as a slide deck,
//!   text document, workbook, or paginated PDF.
//! - **Statistical bundle** (`spss`): import syntax + data file + readme.
//! - **SQL**: schema and insert statements as plain text.

mod columns;
mod common;
mod deck;
mod document;
mod error;
mod pdf;
mod spss;
mod sql;
mod tabular;
mod workbook;

use tracing::info;

use formex_analytics::compute_analytics;
use formex_model::{Artifact, ArtifactFormat, ExportOptions, ExportType, ModelError};
use formex_transform::CanonicalModel;

pub use columns::{
    build_columns, row_values, single_choice_ordinal, Column, ColumnSource, IDENTITY_COLUMNS,
};
pub use deck::export_deck;
pub use document::export_document;
pub use error::{ExportError, Result};
pub use pdf::export_pdf;
pub use spss::export_spss;
pub use sql::export_sql;
pub use tabular::export_tabular;
pub use workbook::export_workbook;

/// Render the artifact for an export type and format.
///
/// The format must be one the export type supports; the orchestrator
/// validates this at job creation as well, so a mismatch here means a
/// corrupted job record.
pub fn export(
    model: &CanonicalModel,
    export_type: ExportType,
    format: ArtifactFormat,
    options: &ExportOptions,
) -> Result<Artifact> {
    export_type.check_format(format)?;
    info!(
        export_type = %export_type,
        %format,
        submissions = model.submissions.len(),
        "rendering export"
    );
    match export_type {
        ExportType::Raw => export_tabular(model, format, options),
        ExportType::Analytics => {
            let analytics = compute_analytics(model);
            match format {
                ArtifactFormat::Pptx => export_deck(&analytics, &model.form.id),
                ArtifactFormat::Docx => export_document(&analytics, &model.form.id),
                ArtifactFormat::Xlsx => export_workbook(&analytics, &model.form.id),
                ArtifactFormat::Pdf => export_pdf(&analytics, &model.form.id),
                other => Err(ModelError::UnsupportedFormat {
                    export_type: export_type.as_str().to_string(),
                    format: other.as_str().to_string(),
                }
                .into()),
            }
        }
        ExportType::Spss => export_spss(model),
        ExportType::Sql => export_sql(model),
    }
}
