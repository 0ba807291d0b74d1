//! Analytics workbook renderer.

use formex_analytics::{Analytics, QuestionStats, StatsDetail};
use formex_model::{Artifact, ArtifactFormat};
use formex_ooxml::xlsx::{Cell, Sheet, Workbook};

use crate::common::artifact_file_name;
use crate::error::Result;

/// Render the workbook: a Summary sheet plus one sheet per question.
pub fn export_workbook(analytics: &Analytics, form_id: &str) -> Result<Artifact> {
    let mut workbook = Workbook::new();
    workbook.add_sheet(summary_sheet(analytics));
    for stats in &analytics.questions {
        workbook.add_sheet(question_sheet(stats));
    }
    Ok(Artifact::new(
        workbook.write_to_bytes()?,
        artifact_file_name(form_id, "analytics", ArtifactFormat::Xlsx),
        ArtifactFormat::Xlsx,
    ))
}

fn summary_sheet(analytics: &Analytics) -> Sheet {
    let mut sheet = Sheet::new("Summary");
    let rows: Vec<(&str, String)> = vec![
        ("Form", analytics.form_title.clone()),
        ("Total submissions", analytics.total.to_string()),
        ("Completed", analytics.completed.to_string()),
        ("Partial", analytics.partial.to_string()),
        ("Questions", analytics.questions.len().to_string()),
    ];
    for (label, value) in rows {
        sheet.push_row(vec![Cell::text(label), Cell::text(value)]);
    }
    sheet
}

fn question_sheet(stats: &QuestionStats) -> Sheet {
    let mut sheet = Sheet::new(&stats.name).with_frozen_header();
    match &stats.detail {
        StatsDetail::Frequency(entries) => {
            sheet.push_row(vec![
                Cell::text("value"),
                Cell::text("text"),
                Cell::text("count"),
                Cell::text("percentage"),
            ]);
            for entry in entries {
                sheet.push_row(vec![
                    Cell::text(entry.label.clone()),
                    Cell::text(entry.text.clone().unwrap_or_default()),
                    Cell::number(entry.count as f64),
                    Cell::text(entry.percentage.clone()),
                ]);
            }
        }
        StatsDetail::Rating { entries, average } => {
            sheet.push_row(vec![
                Cell::text("value"),
                Cell::text("count"),
                Cell::text("percentage"),
            ]);
            for entry in entries {
                sheet.push_row(vec![
                    Cell::text(entry.label.clone()),
                    Cell::number(entry.count as f64),
                    Cell::text(entry.percentage.clone()),
                ]);
            }
            if let Some(average) = average {
                sheet.push_row(vec![Cell::text("average"), Cell::number(*average)]);
            }
        }
        StatsDetail::Matrix {
            rows,
            columns,
            counts,
        } => {
            let mut header = vec![Cell::text("row")];
            header.extend(columns.iter().map(|c| Cell::text(c.clone())));
            sheet.push_row(header);
            for (row, row_counts) in rows.iter().zip(counts.iter()) {
                let mut cells = vec![Cell::text(row.clone())];
                cells.extend(row_counts.iter().map(|c| Cell::number(*c as f64)));
                sheet.push_row(cells);
            }
        }
        StatsDetail::TextSamples(samples) => {
            sheet.push_row(vec![Cell::text("answer")]);
            for sample in samples {
                sheet.push_row(vec![Cell::text(sample.clone())]);
            }
        }
    }
    sheet
}

#[cfg(test)]
mod tests {
    use super::*;
    use formex_analytics::{ChartKind, FrequencyEntry};
    use formex_model::QuestionType;
    use std::io::Read;

    #[test]
    fn workbook_has_summary_plus_one_sheet_per_question() {
        let analytics = Analytics {
            form_id: "f1".to_string(),
            form_title: "Survey".to_string(),
            total: 3,
            completed: 2,
            partial: 1,
            questions: vec![QuestionStats {
                name: "plan".to_string(),
                title: "Which plan?".to_string(),
                question_type: QuestionType::SingleChoice,
                response_count: 3,
                response_rate: "100.00".to_string(),
                chart: ChartKind::Pie,
                detail: StatsDetail::Frequency(vec![FrequencyEntry {
                    label: "a".to_string(),
                    text: Some("A".to_string()),
                    count: 2,
                    percentage: "66.67".to_string(),
                }]),
            }],
        };
        let artifact = export_workbook(&analytics, "f1").unwrap();

        let mut archive =
            zip::ZipArchive::new(std::io::Cursor::new(artifact.bytes)).unwrap();
        let mut workbook_xml = String::new();
        archive
            .by_name("xl/workbook.xml")
            .unwrap()
            .read_to_string(&mut workbook_xml)
            .unwrap();
        assert!(workbook_xml.contains("name=\"Summary\""));
        assert!(workbook_xml.contains("name=\"plan\""));

        let mut sheet2 = String::new();
        archive
            .by_name("xl/worksheets/sheet2.xml")
            .unwrap()
            .read_to_string(&mut sheet2)
            .unwrap();
        assert!(sheet2.contains("66.67"));
    }
}
