//! Helpers shared across exporters.

use formex_analytics::{QuestionStats, StatsDetail};
use formex_model::ArtifactFormat;

/// Artifact file name: `<form-id>_<kind>.<ext>` with the id slugged down to
/// filesystem-safe characters.
pub(crate) fn artifact_file_name(form_id: &str, kind: &str, format: ArtifactFormat) -> String {
    let slug: String = form_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!("{slug}_{kind}.{}", format.extension())
}

/// Human-readable distribution lines for a question, shared by the deck,
/// document and PDF renderers so their numbers always agree.
pub(crate) fn distribution_lines(stats: &QuestionStats) -> Vec<String> {
    match &stats.detail {
        StatsDetail::Frequency(entries) => entries
            .iter()
            .map(|entry| {
                let label = entry.text.as_deref().unwrap_or(&entry.label);
                format!("{label}: {} ({}%)", entry.count, entry.percentage)
            })
            .collect(),
        StatsDetail::Rating { entries, average } => {
            let mut lines: Vec<String> = entries
                .iter()
                .map(|entry| format!("{}: {} ({}%)", entry.label, entry.count, entry.percentage))
                .collect();
            if let Some(average) = average {
                lines.push(format!("Average: {average:.2}"));
            }
            lines
        }
        StatsDetail::Matrix {
            rows,
            columns,
            counts,
        } => rows
            .iter()
            .zip(counts.iter())
            .map(|(row, row_counts)| {
                let cells: Vec<String> = columns
                    .iter()
                    .zip(row_counts.iter())
                    .map(|(column, count)| format!("{column}: {count}"))
                    .collect();
                format!("{row}: {}", cells.join(", "))
            })
            .collect(),
        StatsDetail::TextSamples(samples) => {
            vec![format!("{} text answers collected", samples.len())]
        }
    }
}

/// Response-rate line used under every question heading.
pub(crate) fn response_line(stats: &QuestionStats) -> String {
    format!(
        "{} responses ({}% response rate)",
        stats.response_count, stats.response_rate
    )
}
