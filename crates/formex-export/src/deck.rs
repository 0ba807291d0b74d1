//! Analytics slide deck renderer.

use formex_analytics::{render_chart, Analytics, ChartKind};
use formex_model::{Artifact, ArtifactFormat};
use formex_ooxml::pptx::{Deck, Slide};

use crate::common::{artifact_file_name, distribution_lines, response_line};
use crate::error::Result;

/// Render the deck: title slide, summary slide, one slide per chart-bearing
/// question.
pub fn export_deck(analytics: &Analytics, form_id: &str) -> Result<Artifact> {
    let mut deck = Deck::new();

    let mut title = Slide::new(analytics.form_title.clone());
    title.push_line("Response analytics");
    deck.add_slide(title);

    let mut summary = Slide::new("Summary");
    summary.push_line(format!("Total submissions: {}", analytics.total));
    summary.push_line(format!("Completed: {}", analytics.completed));
    summary.push_line(format!("Partial: {}", analytics.partial));
    summary.push_line(format!("Questions: {}", analytics.questions.len()));
    deck.add_slide(summary);

    for stats in &analytics.questions {
        if stats.chart == ChartKind::None {
            continue;
        }
        let Some(png) = render_chart(stats)? else {
            continue;
        };
        let mut slide = Slide::new(stats.title.clone());
        slide.push_line(response_line(stats));
        for line in distribution_lines(stats) {
            slide.push_line(line);
        }
        deck.add_slide(slide.with_image(png));
    }

    Ok(Artifact::new(
        deck.write_to_bytes()?,
        artifact_file_name(form_id, "analytics", ArtifactFormat::Pptx),
        ArtifactFormat::Pptx,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use formex_analytics::{FrequencyEntry, QuestionStats, StatsDetail};
    use formex_model::QuestionType;

    fn analytics() -> Analytics {
        Analytics {
            form_id: "f1".to_string(),
            form_title: "Survey".to_string(),
            total: 3,
            completed: 3,
            partial: 0,
            questions: vec![
                QuestionStats {
                    name: "plan".to_string(),
                    title: "Which plan?".to_string(),
                    question_type: QuestionType::SingleChoice,
                    response_count: 3,
                    response_rate: "100.00".to_string(),
                    chart: ChartKind::Pie,
                    detail: StatsDetail::Frequency(vec![FrequencyEntry {
                        label: "a".to_string(),
                        text: Some("A".to_string()),
                        count: 3,
                        percentage: "100.00".to_string(),
                    }]),
                },
                QuestionStats {
                    name: "notes".to_string(),
                    title: "Notes".to_string(),
                    question_type: QuestionType::LongText,
                    response_count: 1,
                    response_rate: "33.33".to_string(),
                    chart: ChartKind::None,
                    detail: StatsDetail::TextSamples(vec!["ok".to_string()]),
                },
            ],
        }
    }

    #[test]
    fn deck_has_title_summary_and_chart_slides_only() {
        let artifact = export_deck(&analytics(), "f1").unwrap();
        assert_eq!(artifact.file_name, "f1_analytics.pptx");
        let archive =
            zip::ZipArchive::new(std::io::Cursor::new(artifact.bytes)).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        // Two fixed slides plus one chart slide; the text question gets none.
        assert!(names.contains(&"ppt/slides/slide3.xml"));
        assert!(!names.contains(&"ppt/slides/slide4.xml"));
        assert!(names.contains(&"ppt/media/image3.png"));
    }
}
