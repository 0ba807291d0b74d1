//! CLI argument definitions for the survey exporter.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "formex",
    version,
    about = "Survey exporter - render form submissions as shareable artifacts",
    long_about = "Render survey form submissions as shareable artifacts.\n\n\
                  Supports raw tabular exports (XLSX/CSV), analytics reports\n\
                  (PPTX/DOCX/XLSX/PDF), SPSS import bundles, and SQL dumps."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Export form submissions to an artifact.
    Export(ExportArgs),

    /// List the questions a form definition parses into.
    Questions(QuestionsArgs),
}

#[derive(Parser)]
pub struct ExportArgs {
    /// Path to the form definition JSON file.
    #[arg(value_name = "FORM_JSON")]
    pub form: PathBuf,

    /// Path to the submissions JSON file (an array of submissions).
    #[arg(value_name = "SUBMISSIONS_JSON")]
    pub submissions: PathBuf,

    /// What to export.
    #[arg(long = "type", value_enum, default_value = "raw")]
    pub export_type: ExportTypeArg,

    /// Artifact format (default: the export type's first supported format).
    #[arg(long = "format", value_enum)]
    pub format: Option<FormatArg>,

    /// Directory artifacts are written into (default: ./exports).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Render stored answer codes instead of display text.
    #[arg(long = "codes")]
    pub codes: bool,

    /// Emit a type-appropriate empty placeholder for questions a respondent
    /// never saw, instead of leaving the cell blank.
    #[arg(long = "show-not-displayed")]
    pub show_not_displayed: bool,

    /// Sentinel written for unselected checkbox choices under code display.
    #[arg(long = "unselected-checkboxes", value_name = "N", default_value = "0")]
    pub unselected_checkboxes: i64,

    /// Use question names as column headers instead of titles.
    #[arg(long = "question-codes")]
    pub question_codes: bool,

    /// Include an export info sheet in spreadsheet outputs.
    #[arg(long = "report-labels")]
    pub report_labels: bool,

    /// Only include submissions with this status (completed, partial).
    #[arg(long = "status", value_name = "STATUS")]
    pub status: Option<String>,

    /// Only include submissions at or after this RFC 3339 instant.
    #[arg(long = "submitted-after", value_name = "TIMESTAMP")]
    pub submitted_after: Option<String>,

    /// Only include submissions at or before this RFC 3339 instant.
    #[arg(long = "submitted-before", value_name = "TIMESTAMP")]
    pub submitted_before: Option<String>,
}

#[derive(Parser)]
pub struct QuestionsArgs {
    /// Path to the form definition JSON file.
    #[arg(value_name = "FORM_JSON")]
    pub form: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ExportTypeArg {
    Raw,
    Analytics,
    Spss,
    Sql,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Xlsx,
    Csv,
    Pptx,
    Docx,
    Pdf,
    Zip,
    Sql,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parses_an_export_invocation() {
        let cli = Cli::try_parse_from([
            "formex",
            "export",
            "form.json",
            "subs.json",
            "--type",
            "analytics",
            "--format",
            "pdf",
            "--status",
            "completed",
            "-v",
        ])
        .unwrap();
        let Command::Export(args) = cli.command else {
            panic!("expected the export subcommand");
        };
        assert!(matches!(args.export_type, ExportTypeArg::Analytics));
        assert!(matches!(args.format, Some(FormatArg::Pdf)));
        assert_eq!(args.status.as_deref(), Some("completed"));
    }

    #[test]
    fn questions_takes_a_single_path() {
        let cli = Cli::try_parse_from(["formex", "questions", "form.json"]).unwrap();
        let Command::Questions(args) = cli.command else {
            panic!("expected the questions subcommand");
        };
        assert_eq!(args.form.to_str(), Some("form.json"));
    }
}
