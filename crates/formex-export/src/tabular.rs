//! Tabular exporter: flattened wide rows as CSV or a spreadsheet.

use tracing::debug;

use formex_model::{Artifact, ArtifactFormat, ExportOptions, ModelError};
use formex_ooxml::xlsx::{Cell, Sheet, Workbook};
use formex_transform::CanonicalModel;

use crate::columns::{build_columns, row_values, Column};
use crate::common::artifact_file_name;
use crate::error::Result;

/// UTF-8 byte-order mark; spreadsheet applications use it to pick the right
/// CSV decoding.
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Render the flattened raw-response table.
pub fn export_tabular(
    model: &CanonicalModel,
    format: ArtifactFormat,
    options: &ExportOptions,
) -> Result<Artifact> {
    let columns = build_columns(&model.form, options);
    debug!(
        columns = columns.len(),
        rows = model.submissions.len(),
        %format,
        "rendering tabular export"
    );
    match format {
        ArtifactFormat::Csv => export_csv(model, &columns),
        ArtifactFormat::Xlsx => export_xlsx(model, &columns, options),
        other => Err(ModelError::UnsupportedFormat {
            export_type: "raw".to_string(),
            format: other.as_str().to_string(),
        }
        .into()),
    }
}

/// Flattened rows only, UTF-8 with a byte-order mark.
fn export_csv(model: &CanonicalModel, columns: &[Column]) -> Result<Artifact> {
    let mut bytes = UTF8_BOM.to_vec();
    {
        let mut writer = csv::Writer::from_writer(&mut bytes);
        writer.write_record(columns.iter().map(|c| c.header.as_str()))?;
        for submission in &model.submissions {
            writer.write_record(row_values(columns, submission))?;
        }
        writer.flush()?;
    }
    Ok(Artifact::new(
        bytes,
        artifact_file_name(&model.form.id, "raw", ArtifactFormat::Csv),
        ArtifactFormat::Csv,
    ))
}

fn export_xlsx(
    model: &CanonicalModel,
    columns: &[Column],
    options: &ExportOptions,
) -> Result<Artifact> {
    let mut workbook = Workbook::new();

    let mut responses = Sheet::new("Responses")
        .with_frozen_header()
        .with_auto_filter();
    responses.push_row(
        columns
            .iter()
            .map(|c| Cell::text(c.header.clone()))
            .collect(),
    );
    for submission in &model.submissions {
        responses.push_row(
            row_values(columns, submission)
                .into_iter()
                .map(Cell::text)
                .collect(),
        );
    }
    workbook.add_sheet(responses);

    // The question dictionary ships regardless of options.
    workbook.add_sheet(dictionary_sheet(model));

    if options.report_labels {
        workbook.add_sheet(metadata_sheet(model, columns.len()));
    }

    Ok(Artifact::new(
        workbook.write_to_bytes()?,
        artifact_file_name(&model.form.id, "raw", ArtifactFormat::Xlsx),
        ArtifactFormat::Xlsx,
    ))
}

fn dictionary_sheet(model: &CanonicalModel) -> Sheet {
    let mut sheet = Sheet::new("Dictionary").with_frozen_header();
    sheet.push_row(vec![
        Cell::text("name"),
        Cell::text("title"),
        Cell::text("type"),
        Cell::text("required"),
        Cell::text("choices"),
    ]);
    for question in &model.form.questions {
        let choices = question
            .choices
            .iter()
            .map(|c| format!("{}={}", c.value, c.text))
            .collect::<Vec<_>>()
            .join("; ");
        sheet.push_row(vec![
            Cell::text(question.name.clone()),
            Cell::text(question.title()),
            Cell::text(question.question_type.as_str()),
            Cell::text(if question.is_required { "yes" } else { "no" }),
            Cell::text(choices),
        ]);
    }
    sheet
}

fn metadata_sheet(model: &CanonicalModel, column_count: usize) -> Sheet {
    let mut sheet = Sheet::new("Export Info");
    let rows: Vec<(&str, String)> = vec![
        ("Form id", model.form.id.clone()),
        ("Form title", model.form.title.clone()),
        ("Questions", model.metadata.question_count.to_string()),
        ("Submissions", model.metadata.submission_count.to_string()),
        ("Columns", column_count.to_string()),
    ];
    for (label, value) in rows {
        sheet.push_row(vec![Cell::text(label), Cell::text(value)]);
    }
    sheet
}
