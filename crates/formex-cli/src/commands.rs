use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use comfy_table::Table;
use tracing::{info, info_span, warn};

use formex_jobs::{
    ExportService, FsContentStore, InMemoryJobStore, JsonSourceStore, NewJob, SourceStore,
};
use formex_model::{
    ArtifactFormat, ExportOptions, ExportType, RawForm, SubmissionFilters, SubmissionStatus,
};
use formex_transform::transform;

use crate::cli::{ExportArgs, ExportTypeArg, FormatArg, QuestionsArgs};
use crate::summary::apply_table_style;
use crate::types::ExportRunResult;

pub fn run_questions(args: &QuestionsArgs) -> Result<()> {
    let raw = load_form(&args.form)?;
    let model = transform(&raw, &[], &ExportOptions::default());

    let mut table = Table::new();
    table.set_header(vec!["Name", "Title", "Type", "Required", "Choices"]);
    apply_table_style(&mut table);
    for question in &model.form.questions {
        let choices: Vec<&str> = question
            .choices
            .iter()
            .map(|choice| choice.text.as_str())
            .collect();
        table.add_row(vec![
            question.name.clone(),
            question.title().to_string(),
            question.question_type.as_str().to_string(),
            if question.is_required { "yes" } else { "no" }.to_string(),
            choices.join(", "),
        ]);
    }
    println!("Form: {} ({})", model.form.title, model.form.id);
    println!("{table}");
    Ok(())
}

pub fn run_export(args: &ExportArgs) -> Result<ExportRunResult> {
    let export_span = info_span!("export", form = %args.form.display());
    let _export_guard = export_span.enter();
    let started = Instant::now();

    let source = Arc::new(JsonSourceStore::new(&args.form, &args.submissions));
    let raw = source
        .load_form()
        .with_context(|| format!("load form {}", args.form.display()))?;
    let form_id = raw.id.clone();

    let options = build_options(args);
    let filters = build_filters(args)?;

    // Counted up front so the summary is available even for a failed run.
    let submissions = source
        .fetch_submissions(&form_id, &filters)
        .with_context(|| format!("load submissions {}", args.submissions.display()))?;
    let preview = transform(&raw, &submissions, &options);
    info!(
        form_id = %form_id,
        questions = preview.metadata.question_count,
        submissions = preview.metadata.submission_count,
        "input loaded"
    );

    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("exports"));
    let service = ExportService::new(
        source,
        Arc::new(FsContentStore::new(&output_dir)),
        Arc::new(InMemoryJobStore::new()),
    );

    let mut request = NewJob::new("local", "cli", &form_id, export_type(args.export_type))
        .with_options(options)
        .with_filters(filters);
    if let Some(format) = args.format {
        request = request.with_format(artifact_format(format));
    }

    let job = service.create_job(request).context("create export job")?;
    if let Err(error) = service.process(&job.id) {
        warn!(job_id = %job.id, %error, "export failed");
    }
    let record = service.get_status(&job.id).context("read job status")?;

    Ok(ExportRunResult {
        form_id,
        form_title: preview.form.title,
        question_count: preview.metadata.question_count,
        submission_count: preview.metadata.submission_count,
        export_type: record.export_type,
        format: record.format,
        status: record.status,
        file_location: record.file_location,
        error_message: record.error_message,
        duration_ms: started.elapsed().as_millis(),
    })
}

fn load_form(path: &std::path::Path) -> Result<RawForm> {
    let raw = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("parse form {}", path.display()))
}

fn build_options(args: &ExportArgs) -> ExportOptions {
    let mut options = if args.codes {
        ExportOptions::codes()
    } else {
        ExportOptions::values()
    };
    options.show_not_displayed = args.show_not_displayed;
    options.unselected_checkboxes = args.unselected_checkboxes;
    options.question_codes = args.question_codes;
    options.report_labels = args.report_labels;
    options
}

fn build_filters(args: &ExportArgs) -> Result<SubmissionFilters> {
    let mut filters = SubmissionFilters::default();
    if let Some(raw) = &args.submitted_after {
        filters.submitted_after =
            Some(parse_instant(raw).with_context(|| format!("parse --submitted-after {raw}"))?);
    }
    if let Some(raw) = &args.submitted_before {
        filters.submitted_before =
            Some(parse_instant(raw).with_context(|| format!("parse --submitted-before {raw}"))?);
    }
    if let Some(status) = &args.status {
        filters.status = Some(SubmissionStatus::from(status.clone()));
    }
    Ok(filters)
}

fn parse_instant(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}

fn export_type(arg: ExportTypeArg) -> ExportType {
    match arg {
        ExportTypeArg::Raw => ExportType::Raw,
        ExportTypeArg::Analytics => ExportType::Analytics,
        ExportTypeArg::Spss => ExportType::Spss,
        ExportTypeArg::Sql => ExportType::Sql,
    }
}

fn artifact_format(arg: FormatArg) -> ArtifactFormat {
    match arg {
        FormatArg::Xlsx => ArtifactFormat::Xlsx,
        FormatArg::Csv => ArtifactFormat::Csv,
        FormatArg::Pptx => ArtifactFormat::Pptx,
        FormatArg::Docx => ArtifactFormat::Docx,
        FormatArg::Pdf => ArtifactFormat::Pdf,
        FormatArg::Zip => ArtifactFormat::SpssBundle,
        FormatArg::Sql => ArtifactFormat::Sql,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn export_args(dir: &std::path::Path) -> ExportArgs {
        ExportArgs {
            form: dir.join("form.json"),
            submissions: dir.join("submissions.json"),
            export_type: ExportTypeArg::Raw,
            format: Some(FormatArg::Csv),
            output_dir: Some(dir.join("out")),
            codes: false,
            show_not_displayed: false,
            unselected_checkboxes: 0,
            question_codes: false,
            report_labels: false,
            status: None,
            submitted_after: None,
            submitted_before: None,
        }
    }

    fn write_fixtures(dir: &std::path::Path) {
        let mut form = std::fs::File::create(dir.join("form.json")).unwrap();
        form.write_all(
            br#"{
                "id": "form-1",
                "title": "Pulse",
                "definition": {
                    "elements": [
                        {"type": "text", "name": "who", "title": "Your name"}
                    ]
                }
            }"#,
        )
        .unwrap();
        let mut subs = std::fs::File::create(dir.join("submissions.json")).unwrap();
        subs.write_all(
            br#"[
                {"id": "s1", "submitted_at": "2026-03-01T09:00:00Z",
                 "answers": {"who": "Ada"}},
                {"id": "s2", "submitted_at": "2026-03-02T09:00:00Z",
                 "answers": {"who": "Grace"}}
            ]"#,
        )
        .unwrap();
    }

    #[test]
    fn export_run_writes_the_artifact_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        write_fixtures(dir.path());

        let result = run_export(&export_args(dir.path())).unwrap();
        assert!(!result.failed());
        assert_eq!(result.question_count, 1);
        assert_eq!(result.submission_count, 2);

        let location = result.file_location.unwrap();
        let bytes = std::fs::read(&location).unwrap();
        assert_eq!(&bytes[..3], [0xEF, 0xBB, 0xBF]);
    }

    #[test]
    fn date_filter_flags_narrow_the_run() {
        let dir = tempfile::tempdir().unwrap();
        write_fixtures(dir.path());

        let mut args = export_args(dir.path());
        args.submitted_after = Some("2026-03-02T00:00:00Z".to_string());
        let result = run_export(&args).unwrap();
        assert_eq!(result.submission_count, 1);
    }

    #[test]
    fn bad_timestamp_flags_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        write_fixtures(dir.path());

        let mut args = export_args(dir.path());
        args.submitted_after = Some("yesterday".to_string());
        let error = run_export(&args).unwrap_err();
        assert!(error.to_string().contains("--submitted-after"));
    }

    #[test]
    fn codes_flag_selects_the_code_preset() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = export_args(dir.path());
        args.codes = true;
        args.report_labels = true;
        let options = build_options(&args);
        assert!(options.display_answer_codes);
        assert!(!options.display_answer_values);
        assert!(options.report_labels);
    }
}
