//! Analytics text document renderer.

use formex_analytics::{Analytics, StatsDetail};
use formex_model::{Artifact, ArtifactFormat};
use formex_ooxml::docx::{Document, Paragraph};

use crate::common::{artifact_file_name, distribution_lines, response_line};
use crate::error::Result;

/// Free-text answers quoted per open question in the document.
const DOCUMENT_SAMPLE_LIMIT: usize = 5;

/// Render the document: headed sections with inline distribution lists, no
/// images.
pub fn export_document(analytics: &Analytics, form_id: &str) -> Result<Artifact> {
    let mut doc = Document::new();
    doc.push(Paragraph::heading1(analytics.form_title.clone()));
    doc.push(Paragraph::normal(format!(
        "Total submissions: {} ({} completed, {} partial)",
        analytics.total, analytics.completed, analytics.partial
    )));

    for stats in &analytics.questions {
        doc.push(Paragraph::heading2(stats.title.clone()));
        doc.push(Paragraph::normal(response_line(stats)));
        for line in distribution_lines(stats) {
            doc.push(Paragraph::normal(line));
        }
        if let StatsDetail::TextSamples(samples) = &stats.detail {
            for sample in samples.iter().take(DOCUMENT_SAMPLE_LIMIT) {
                doc.push(Paragraph::normal(format!("\u{201c}{sample}\u{201d}")));
            }
        }
    }

    Ok(Artifact::new(
        doc.write_to_bytes()?,
        artifact_file_name(form_id, "analytics", ArtifactFormat::Docx),
        ArtifactFormat::Docx,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use formex_analytics::{ChartKind, QuestionStats};
    use formex_model::QuestionType;
    use std::io::Read;

    #[test]
    fn document_sections_follow_question_order() {
        let analytics = Analytics {
            form_id: "f1".to_string(),
            form_title: "Survey".to_string(),
            total: 2,
            completed: 2,
            partial: 0,
            questions: vec![QuestionStats {
                name: "notes".to_string(),
                title: "Notes".to_string(),
                question_type: QuestionType::LongText,
                response_count: 2,
                response_rate: "100.00".to_string(),
                chart: ChartKind::None,
                detail: StatsDetail::TextSamples(vec![
                    "first".to_string(),
                    "second".to_string(),
                ]),
            }],
        };
        let artifact = export_document(&analytics, "f1").unwrap();

        let mut archive =
            zip::ZipArchive::new(std::io::Cursor::new(artifact.bytes)).unwrap();
        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut xml)
            .unwrap();
        assert!(xml.contains("Survey"));
        assert!(xml.contains("2 responses (100.00% response rate)"));
        assert!(xml.contains("\u{201c}first\u{201d}"));
    }
}
