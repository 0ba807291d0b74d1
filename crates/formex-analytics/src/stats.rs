//! Aggregated statistics over a canonical model.
//!
//! Every analytics artifact (deck, document, workbook, PDF) derives from the
//! single [`Analytics`] structure computed here; formats never recompute
//! statistics on their own.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use formex_model::{Question, QuestionType, ResponseValue, SubmissionStatus};
use formex_transform::CanonicalModel;

/// Number of free-text answers retained per open-ended question.
pub const TEXT_SAMPLE_LIMIT: usize = 100;

/// Format a percentage with two decimals, e.g. `"66.67"`.
pub fn format_percentage(count: u64, denominator: u64) -> String {
    if denominator == 0 {
        return "0.00".to_string();
    }
    format!("{:.2}", (count as f64) * 100.0 / (denominator as f64))
}

/// One frequency row of a distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyEntry {
    /// The stored value (choice value, rating value).
    pub label: String,
    /// Display text when the form defines one for this value.
    pub text: Option<String>,
    pub count: u64,
    /// Two-decimal percentage of this question's responses.
    pub percentage: String,
}

/// Per-question statistic shape, keyed by question type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatsDetail {
    /// Single-choice (one entry per chosen value) or multi-choice (one entry
    /// per defined choice, zero counts included).
    Frequency(Vec<FrequencyEntry>),
    /// Row-by-column count table.
    Matrix {
        rows: Vec<String>,
        columns: Vec<String>,
        counts: Vec<Vec<u64>>,
    },
    /// Frequency table plus the numeric average over parsable answers.
    Rating {
        entries: Vec<FrequencyEntry>,
        average: Option<f64>,
    },
    /// First answers verbatim, capped at [`TEXT_SAMPLE_LIMIT`]. No chart.
    TextSamples(Vec<String>),
}

/// Which chart a question's distribution renders to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartKind {
    Pie,
    Bar,
    None,
}

impl ChartKind {
    pub fn for_question_type(question_type: QuestionType) -> Self {
        match question_type {
            QuestionType::SingleChoice => ChartKind::Pie,
            QuestionType::MultiChoice | QuestionType::Rating => ChartKind::Bar,
            _ => ChartKind::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionStats {
    pub name: String,
    pub title: String,
    pub question_type: QuestionType,
    pub response_count: u64,
    /// Two-decimal percentage of submissions that answered this question.
    pub response_rate: String,
    pub chart: ChartKind,
    pub detail: StatsDetail,
}

/// Top-line counts plus one [`QuestionStats`] per question, in form order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analytics {
    pub form_id: String,
    pub form_title: String,
    pub total: u64,
    pub completed: u64,
    pub partial: u64,
    pub questions: Vec<QuestionStats>,
}

/// Compute the analytics structure for a canonical model.
pub fn compute_analytics(model: &CanonicalModel) -> Analytics {
    let total = model.submissions.len() as u64;
    let completed = model
        .submissions
        .iter()
        .filter(|s| s.status == SubmissionStatus::Completed)
        .count() as u64;
    let partial = model
        .submissions
        .iter()
        .filter(|s| s.status == SubmissionStatus::Partial)
        .count() as u64;

    let questions = model
        .form
        .questions
        .iter()
        .map(|question| question_stats(question, model, total))
        .collect();

    Analytics {
        form_id: model.form.id.clone(),
        form_title: model.form.title.clone(),
        total,
        completed,
        partial,
        questions,
    }
}

fn question_stats(question: &Question, model: &CanonicalModel, total: u64) -> QuestionStats {
    let responses: Vec<&ResponseValue> = model
        .submissions
        .iter()
        .filter_map(|s| s.response(&question.name))
        .collect();
    let response_count = responses.len() as u64;

    let detail = match question.question_type {
        QuestionType::SingleChoice => single_choice_detail(question, &responses),
        QuestionType::MultiChoice => {
            multi_choice_detail(question, &responses, model.options.unselected_checkboxes)
        }
        QuestionType::Matrix => matrix_detail(question, &responses),
        QuestionType::Rating => rating_detail(&responses),
        QuestionType::ShortText | QuestionType::LongText | QuestionType::Generic => {
            text_detail(&responses)
        }
    };

    QuestionStats {
        name: question.name.clone(),
        title: question.title().to_string(),
        question_type: question.question_type,
        response_count,
        response_rate: format_percentage(response_count, total),
        chart: ChartKind::for_question_type(question.question_type),
        detail,
    }
}

/// One entry per chosen value, in choice-list order, unknown values last.
///
/// Responses resolve back through the choice list (stored value, display
/// text, or ordinal code), so the entries come out the same whichever
/// display mode the model was transformed under.
fn single_choice_detail(question: &Question, responses: &[&ResponseValue]) -> StatsDetail {
    let mut choice_counts = vec![0u64; question.choices.len()];
    let mut unknown: BTreeMap<String, u64> = BTreeMap::new();
    for response in responses {
        if let Some(ordinal) = question.resolve_choice(response) {
            choice_counts[ordinal - 1] += 1;
            continue;
        }
        let value = scalar_key(response);
        if value.is_empty() {
            continue;
        }
        *unknown.entry(value).or_insert(0) += 1;
    }
    let denominator = responses.len() as u64;

    let mut entries = Vec::new();
    for (choice, count) in question.choices.iter().zip(choice_counts) {
        if count == 0 {
            continue;
        }
        entries.push(FrequencyEntry {
            label: choice.value.clone(),
            text: Some(choice.text.clone()),
            count,
            percentage: format_percentage(count, denominator),
        });
    }
    // Values outside the defined list still count.
    for (value, count) in unknown {
        entries.push(FrequencyEntry {
            percentage: format_percentage(count, denominator),
            label: value,
            text: None,
            count,
        });
    }
    StatsDetail::Frequency(entries)
}

/// One entry per *defined* choice, zero counts included.
fn multi_choice_detail(
    question: &Question,
    responses: &[&ResponseValue],
    unselected_sentinel: i64,
) -> StatsDetail {
    let denominator = responses.len() as u64;
    let entries = question
        .choices
        .iter()
        .map(|choice| {
            let count = responses
                .iter()
                .filter(|response| {
                    response
                        .as_map()
                        .and_then(|map| map.get(&choice.value))
                        .is_some_and(|v| v.is_selected(unselected_sentinel))
                })
                .count() as u64;
            FrequencyEntry {
                label: choice.value.clone(),
                text: Some(choice.text.clone()),
                count,
                percentage: format_percentage(count, denominator),
            }
        })
        .collect();
    StatsDetail::Frequency(entries)
}

fn matrix_detail(question: &Question, responses: &[&ResponseValue]) -> StatsDetail {
    let rows: Vec<String> = question.rows.iter().map(|r| r.text.clone()).collect();
    let columns: Vec<String> = question.columns.iter().map(|c| c.text.clone()).collect();
    let mut counts = vec![vec![0u64; question.columns.len()]; question.rows.len()];

    for response in responses {
        let Some(map) = response.as_map() else { continue };
        for (row_idx, row) in question.rows.iter().enumerate() {
            let Some(cell) = map.get(&row.value) else { continue };
            if let Some(col_idx) = column_index(question, cell) {
                counts[row_idx][col_idx] += 1;
            }
        }
    }
    StatsDetail::Matrix {
        rows,
        columns,
        counts,
    }
}

/// Resolve a matrix cell to a column index: by stored value first, then as a
/// 1-based ordinal for code-transformed models.
fn column_index(question: &Question, cell: &ResponseValue) -> Option<usize> {
    let key = scalar_key(cell);
    if key.is_empty() {
        return None;
    }
    if let Some(idx) = question.columns.iter().position(|c| c.value == key) {
        return Some(idx);
    }
    let ordinal = cell.as_number()? as usize;
    if ordinal >= 1 && ordinal <= question.columns.len() {
        Some(ordinal - 1)
    } else {
        None
    }
}

fn rating_detail(responses: &[&ResponseValue]) -> StatsDetail {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    let mut sum = 0.0;
    let mut numeric = 0u64;
    for response in responses {
        let key = scalar_key(response);
        if key.is_empty() {
            continue;
        }
        *counts.entry(key).or_insert(0) += 1;
        if let Some(n) = response.as_number() {
            sum += n;
            numeric += 1;
        }
    }
    let denominator = responses.len() as u64;
    let mut entries: Vec<FrequencyEntry> = counts
        .into_iter()
        .map(|(label, count)| FrequencyEntry {
            percentage: format_percentage(count, denominator),
            label,
            text: None,
            count,
        })
        .collect();
    // Numeric ordering where possible, lexical otherwise.
    entries.sort_by(|a, b| {
        match (a.label.parse::<f64>(), b.label.parse::<f64>()) {
            (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
            _ => a.label.cmp(&b.label),
        }
    });
    let average = (numeric > 0).then(|| sum / numeric as f64);
    StatsDetail::Rating { entries, average }
}

fn text_detail(responses: &[&ResponseValue]) -> StatsDetail {
    let samples = responses
        .iter()
        .filter_map(|r| r.as_text())
        .filter(|t| !t.trim().is_empty())
        .take(TEXT_SAMPLE_LIMIT)
        .map(str::to_string)
        .collect();
    StatsDetail::TextSamples(samples)
}

fn scalar_key(value: &ResponseValue) -> String {
    value.to_cell()
}
