//! Shared wide-column model for tabular formats.
//!
//! Every flattened output (CSV, spreadsheet, statistical data file) derives
//! its columns here so layouts cannot drift apart: fixed identity columns
//! first, then one column per scalar question, then one per choice/row for
//! multi-column questions, all in form order.

use formex_model::{
    ExportOptions, Form, Question, QuestionType, ResponseValue, TransformedSubmission,
};

/// Where a column's cell value comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnSource {
    SubmissionId,
    SubmittedAt,
    Status,
    Email,
    /// Scalar question response rendered as one cell.
    Scalar { question: String },
    /// One key of a multi-choice/matrix response map.
    Expanded { question: String, key: String },
}

/// One output column: header label plus value source.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub header: String,
    pub source: ColumnSource,
}

/// Number of fixed identity columns preceding question columns.
pub const IDENTITY_COLUMNS: usize = 4;

/// Build the full column list for a form.
///
/// `options.question_codes` switches headers between raw codes and human
/// titles; it never changes the column count or order.
pub fn build_columns(form: &Form, options: &ExportOptions) -> Vec<Column> {
    let mut columns = vec![
        Column {
            header: "submission_id".to_string(),
            source: ColumnSource::SubmissionId,
        },
        Column {
            header: "submitted_at".to_string(),
            source: ColumnSource::SubmittedAt,
        },
        Column {
            header: "status".to_string(),
            source: ColumnSource::Status,
        },
        Column {
            header: "respondent_email".to_string(),
            source: ColumnSource::Email,
        },
    ];

    for question in &form.questions {
        match question.question_type {
            QuestionType::MultiChoice => {
                for choice in &question.choices {
                    columns.push(Column {
                        header: expanded_header(question, &choice.value, &choice.text, options),
                        source: ColumnSource::Expanded {
                            question: question.name.clone(),
                            key: choice.value.clone(),
                        },
                    });
                }
            }
            QuestionType::Matrix => {
                for row in &question.rows {
                    columns.push(Column {
                        header: expanded_header(question, &row.value, &row.text, options),
                        source: ColumnSource::Expanded {
                            question: question.name.clone(),
                            key: row.value.clone(),
                        },
                    });
                }
            }
            _ => columns.push(Column {
                header: scalar_header(question, options),
                source: ColumnSource::Scalar {
                    question: question.name.clone(),
                },
            }),
        }
    }
    columns
}

fn scalar_header(question: &Question, options: &ExportOptions) -> String {
    if options.question_codes {
        question.name.clone()
    } else {
        question.title().to_string()
    }
}

fn expanded_header(
    question: &Question,
    key: &str,
    text: &str,
    options: &ExportOptions,
) -> String {
    if options.question_codes {
        format!("{}_{}", question.name, key)
    } else {
        format!("{} ({})", question.title(), text)
    }
}

/// Render one submission as cells matching `columns` positionally.
pub fn row_values(columns: &[Column], submission: &TransformedSubmission) -> Vec<String> {
    columns
        .iter()
        .map(|column| match &column.source {
            ColumnSource::SubmissionId => submission.id.clone(),
            ColumnSource::SubmittedAt => submission.submitted_at.to_rfc3339(),
            ColumnSource::Status => submission.status.as_str().to_string(),
            ColumnSource::Email => submission.respondent_email.clone().unwrap_or_default(),
            ColumnSource::Scalar { question } => submission
                .response(question)
                .map(ResponseValue::to_cell)
                .unwrap_or_default(),
            ColumnSource::Expanded { question, key } => submission
                .response(question)
                .and_then(ResponseValue::as_map)
                .and_then(|map| map.get(key))
                .map(ResponseValue::to_cell)
                .unwrap_or_default(),
        })
        .collect()
}

/// 1-based ordinal of a single-choice response, whatever display mode the
/// model was transformed under.
///
/// This is the one ordinal rule shared by the SQL score and the statistical
/// bundle's value labels; see [`Question::resolve_choice`].
pub fn single_choice_ordinal(question: &Question, response: &ResponseValue) -> Option<usize> {
    question.resolve_choice(response)
}

/// Number of selected entries of a multi-choice response map, given the
/// sentinel the model writes for unselected entries.
pub fn selected_count(response: &ResponseValue, unselected_sentinel: i64) -> usize {
    response
        .as_map()
        .map(|map| {
            map.values()
                .filter(|v| v.is_selected(unselected_sentinel))
                .count()
        })
        .unwrap_or(0)
}

/// 1-based ordinal of a matrix cell within the question's columns.
pub fn matrix_column_ordinal(question: &Question, cell: &ResponseValue) -> Option<usize> {
    if let Some(text) = cell.as_text() {
        if text.is_empty() {
            return None;
        }
        if let Some(ordinal) = question.column_ordinal(text) {
            return Some(ordinal);
        }
    }
    let code = cell.as_number()? as usize;
    (code >= 1 && code <= question.columns.len()).then_some(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use formex_model::Choice;

    fn plan_question() -> Question {
        let mut q = Question::scalar("plan", QuestionType::SingleChoice);
        q.title = Some("Which plan?".to_string());
        q.choices = vec![
            Choice::new("free", "Free"),
            Choice::new("pro", "Pro"),
            Choice::new("team", "Team"),
        ];
        q
    }

    fn features_question() -> Question {
        let mut q = Question::scalar("features", QuestionType::MultiChoice);
        q.choices = vec![Choice::new("api", "API"), Choice::new("sso", "SSO")];
        q
    }

    #[test]
    fn column_count_is_invariant_to_header_mode() {
        let mut form = Form::new("f1", "Form");
        form.questions = vec![plan_question(), features_question()];

        let titled = build_columns(&form, &ExportOptions::default());
        let coded = build_columns(
            &form,
            &ExportOptions {
                question_codes: true,
                ..ExportOptions::default()
            },
        );
        assert_eq!(titled.len(), coded.len());
        assert_eq!(titled.len(), IDENTITY_COLUMNS + 1 + 2);
        assert_eq!(titled[4].header, "Which plan?");
        assert_eq!(coded[4].header, "plan");
        assert_eq!(coded[5].header, "features_api");
        assert_eq!(titled[5].header, "features (API)");
    }

    #[test]
    fn ordinal_resolves_codes_values_and_raw() {
        let q = plan_question();
        assert_eq!(single_choice_ordinal(&q, &ResponseValue::number(2.0)), Some(2));
        assert_eq!(single_choice_ordinal(&q, &ResponseValue::text("pro")), Some(2));
        assert_eq!(single_choice_ordinal(&q, &ResponseValue::text("Pro")), Some(2));
        assert_eq!(single_choice_ordinal(&q, &ResponseValue::text("gone")), None);
        assert_eq!(single_choice_ordinal(&q, &ResponseValue::number(9.0)), None);
    }

    #[test]
    fn selected_count_ignores_sentinels() {
        let mut map = std::collections::BTreeMap::new();
        map.insert("api".to_string(), ResponseValue::number(1.0));
        map.insert("sso".to_string(), ResponseValue::number(0.0));
        map.insert("audit".to_string(), ResponseValue::text(""));
        assert_eq!(selected_count(&ResponseValue::Map(map), 0), 1);
    }

    #[test]
    fn selected_count_respects_a_nonzero_sentinel() {
        let mut map = std::collections::BTreeMap::new();
        map.insert("api".to_string(), ResponseValue::number(1.0));
        map.insert("sso".to_string(), ResponseValue::number(-9.0));
        map.insert("audit".to_string(), ResponseValue::number(-9.0));
        assert_eq!(selected_count(&ResponseValue::Map(map), -9), 1);
    }
}
