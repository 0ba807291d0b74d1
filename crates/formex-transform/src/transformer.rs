//! The canonical model builder.
//!
//! `transform` is a pure function of its inputs and options: same raw form,
//! same submissions, same options — structurally identical output. No clocks,
//! no randomness, and response maps are ordered (`BTreeMap`), so nothing
//! depends on hash iteration order.

use serde::{Deserialize, Serialize};
use tracing::warn;

use formex_model::{ExportOptions, Form, RawForm, Submission, TransformedSubmission};

use crate::answers::{empty_response, transform_answer};
use crate::definition::parse_questions;

/// Counts describing a transform run. Deliberately free of timestamps so the
/// canonical model stays idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformMetadata {
    pub question_count: usize,
    pub submission_count: usize,
}

/// The uniform in-memory representation every exporter consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalModel {
    pub form: Form,
    pub submissions: Vec<TransformedSubmission>,
    /// The options the model was transformed under. Consumers that must
    /// tell selected checkbox entries from unselected ones read the
    /// sentinel from here rather than assuming a fixed encoding.
    pub options: ExportOptions,
    pub metadata: TransformMetadata,
}

/// Build the canonical model from a raw form and its raw submissions.
pub fn transform(
    raw_form: &RawForm,
    submissions: &[Submission],
    options: &ExportOptions,
) -> CanonicalModel {
    let questions = parse_questions(&raw_form.definition);
    let mut form = Form::new(
        raw_form.id.clone(),
        raw_form.title.clone().unwrap_or_else(|| "Untitled form".to_string()),
    );
    form.created_at = raw_form.created_at;
    form.questions = questions;

    let duplicates = form.duplicate_names();
    if !duplicates.is_empty() {
        warn!(form_id = %form.id, ?duplicates, "duplicate question names; first occurrence wins");
    }

    let transformed = submissions
        .iter()
        .map(|submission| transform_submission(&form, submission, options))
        .collect::<Vec<_>>();

    let metadata = TransformMetadata {
        question_count: form.questions.len(),
        submission_count: transformed.len(),
    };
    CanonicalModel {
        form,
        submissions: transformed,
        options: options.clone(),
        metadata,
    }
}

fn transform_submission(
    form: &Form,
    submission: &Submission,
    options: &ExportOptions,
) -> TransformedSubmission {
    let mut out = TransformedSubmission::from_submission(submission);
    for question in &form.questions {
        match submission.answer(&question.name) {
            Some(raw) if !raw.is_null() => {
                out.responses.insert(
                    question.name.clone(),
                    transform_answer(question, raw, options),
                );
            }
            _ if options.show_not_displayed => {
                out.responses
                    .insert(question.name.clone(), empty_response(question, options));
            }
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn raw_form() -> RawForm {
        RawForm {
            id: "f1".to_string(),
            title: Some("Satisfaction".to_string()),
            created_at: None,
            definition: json!({
                "pages": [{"elements": [
                    {"type": "radiogroup", "name": "color", "choices": [
                        {"value": "r", "text": "Red"},
                        {"value": "g", "text": "Green"}
                    ]},
                    {"type": "checkbox", "name": "toppings", "choices": ["cheese", "ham"]},
                    {"type": "text", "name": "notes"}
                ]}]
            }),
        }
    }

    fn submission(id: &str, answers: serde_json::Value) -> Submission {
        let mut s = Submission::new(id, Utc.with_ymd_and_hms(2026, 1, 5, 10, 0, 0).unwrap());
        if let serde_json::Value::Object(map) = answers {
            s.answers = map.into_iter().collect();
        }
        s
    }

    #[test]
    fn absent_answers_are_omitted_by_default() {
        let model = transform(
            &raw_form(),
            &[submission("s1", json!({"color": "r"}))],
            &ExportOptions::default(),
        );
        let responses = &model.submissions[0].responses;
        assert!(responses.contains_key("color"));
        assert!(!responses.contains_key("notes"));
    }

    #[test]
    fn show_not_displayed_fills_placeholders() {
        let options = ExportOptions {
            show_not_displayed: true,
            ..ExportOptions::default()
        };
        let model = transform(&raw_form(), &[submission("s1", json!({}))], &options);
        let responses = &model.submissions[0].responses;
        assert_eq!(responses.len(), 3);
        // Checkbox placeholder keeps the full key set.
        assert_eq!(responses["toppings"].as_map().unwrap().len(), 2);
    }

    #[test]
    fn transform_is_idempotent() {
        let subs = vec![
            submission("s1", json!({"color": "r", "toppings": ["ham"]})),
            submission("s2", json!({"color": "g", "notes": "ok"})),
        ];
        let options = ExportOptions::codes();
        let a = transform(&raw_form(), &subs, &options);
        let b = transform(&raw_form(), &subs, &options);
        assert_eq!(
            serde_json::to_value(&a).unwrap(),
            serde_json::to_value(&b).unwrap()
        );
    }

    #[test]
    fn malformed_definition_degrades_to_empty_model() {
        let form = RawForm {
            id: "f1".to_string(),
            title: None,
            created_at: None,
            definition: json!(42),
        };
        let model = transform(&form, &[submission("s1", json!({"x": 1}))], &ExportOptions::default());
        assert!(model.form.questions.is_empty());
        assert!(model.submissions[0].responses.is_empty());
        assert_eq!(model.metadata.question_count, 0);
        assert_eq!(model.metadata.submission_count, 1);
    }
}
