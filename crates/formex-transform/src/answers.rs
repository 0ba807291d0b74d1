//! Per-type answer normalization rules.
//!
//! This is the single place that switches on the shape of a raw answer
//! (scalar, array, map) as declared by its question type. Unrecognized
//! shapes fail closed: the raw value passes through as a scalar.

use serde_json::Value;
use std::collections::BTreeMap;
use std::collections::BTreeSet;

use formex_model::{ExportOptions, Question, QuestionType, ResponseValue};

use crate::definition::scalar_to_string;

/// Normalize one raw answer for its question.
pub fn transform_answer(
    question: &Question,
    raw: &Value,
    options: &ExportOptions,
) -> ResponseValue {
    match question.question_type {
        QuestionType::SingleChoice => transform_single_choice(question, raw, options),
        QuestionType::MultiChoice => transform_multi_choice(question, raw, options),
        QuestionType::Matrix => transform_matrix(question, raw, options),
        QuestionType::Rating
        | QuestionType::ShortText
        | QuestionType::LongText
        | QuestionType::Generic => passthrough(raw),
    }
}

/// Placeholder for a question the respondent never saw, used when
/// `options.show_not_displayed` is set. Multi-column questions still produce
/// their full key set so tabular output stays fixed-width.
pub fn empty_response(question: &Question, options: &ExportOptions) -> ResponseValue {
    match question.question_type {
        QuestionType::MultiChoice => {
            build_checkbox_map(question, &BTreeSet::new(), options)
        }
        QuestionType::Matrix => {
            let map = question
                .rows
                .iter()
                .map(|row| (row.value.clone(), ResponseValue::text("")))
                .collect();
            ResponseValue::Map(map)
        }
        _ => ResponseValue::text(""),
    }
}

fn transform_single_choice(
    question: &Question,
    raw: &Value,
    options: &ExportOptions,
) -> ResponseValue {
    let value = scalar_to_string(raw);
    if options.display_answer_codes {
        match question.choice_ordinal(&value) {
            Some(code) => ResponseValue::number(code as f64),
            // Value not in the defined list (stale answer); pass through.
            None => passthrough(raw),
        }
    } else if options.display_answer_values {
        match question.choice(&value) {
            Some(choice) => ResponseValue::text(choice.text.clone()),
            None => passthrough(raw),
        }
    } else {
        passthrough(raw)
    }
}

fn transform_multi_choice(
    question: &Question,
    raw: &Value,
    options: &ExportOptions,
) -> ResponseValue {
    let selected = selected_values(raw);
    build_checkbox_map(question, &selected, options)
}

/// Map over *all* defined choices. Selected choices carry their ordinal code
/// (code display), display text (value display), or `1`; unselected choices
/// carry the configured sentinel or empty text. Every defined choice appears
/// as a key regardless of what was selected.
fn build_checkbox_map(
    question: &Question,
    selected: &BTreeSet<String>,
    options: &ExportOptions,
) -> ResponseValue {
    let mut map = BTreeMap::new();
    for (idx, choice) in question.choices.iter().enumerate() {
        let value = if selected.contains(&choice.value) {
            if options.display_answer_codes {
                ResponseValue::number((idx + 1) as f64)
            } else if options.display_answer_values {
                ResponseValue::text(choice.text.clone())
            } else {
                ResponseValue::number(1.0)
            }
        } else if options.display_answer_values {
            ResponseValue::text("")
        } else {
            ResponseValue::number(options.unselected_checkboxes as f64)
        };
        map.insert(choice.value.clone(), value);
    }
    ResponseValue::Map(map)
}

/// Checkbox answers arrive either as an array of selected values or as an
/// object keyed by choice value with truthy entries.
fn selected_values(raw: &Value) -> BTreeSet<String> {
    match raw {
        Value::Array(items) => items.iter().map(scalar_to_string).collect(),
        Value::Object(map) => map
            .iter()
            .filter(|(_, v)| is_truthy(v))
            .map(|(k, _)| k.clone())
            .collect(),
        Value::Null => BTreeSet::new(),
        scalar => {
            // A single selection stored as a scalar.
            let mut set = BTreeSet::new();
            set.insert(scalar_to_string(scalar));
            set
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => !s.is_empty() && s != "0" && !s.eq_ignore_ascii_case("false"),
        Value::Null => false,
        _ => true,
    }
}

/// Matrix answers arrive as an object keyed by row value, each entry naming
/// the selected column. Every defined row appears as a key; rows the
/// respondent skipped map to empty text.
fn transform_matrix(question: &Question, raw: &Value, options: &ExportOptions) -> ResponseValue {
    let cells = raw.as_object();
    let mut map = BTreeMap::new();
    for row in &question.rows {
        let cell = cells.and_then(|c| c.get(&row.value));
        let value = match cell {
            Some(cell_value) if !cell_value.is_null() => {
                let selected = scalar_to_string(cell_value);
                if options.display_answer_codes {
                    match question.column_ordinal(&selected) {
                        Some(code) => ResponseValue::number(code as f64),
                        None => ResponseValue::Text(selected),
                    }
                } else {
                    ResponseValue::Text(selected)
                }
            }
            _ => ResponseValue::text(""),
        };
        map.insert(row.value.clone(), value);
    }
    ResponseValue::Map(map)
}

/// Rating/text/generic answers pass through unchanged, keeping numbers
/// numeric. Compound shapes on scalar questions are stringified.
fn passthrough(raw: &Value) -> ResponseValue {
    match raw {
        Value::Number(n) => match n.as_f64() {
            Some(v) => ResponseValue::Number(v),
            None => ResponseValue::Text(n.to_string()),
        },
        other => ResponseValue::Text(scalar_to_string(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formex_model::Choice;
    use serde_json::json;

    fn single_choice() -> Question {
        let mut q = Question::scalar("color", QuestionType::SingleChoice);
        q.choices = vec![
            Choice::new("r", "Red"),
            Choice::new("g", "Green"),
            Choice::new("b", "Blue"),
        ];
        q
    }

    fn checkbox() -> Question {
        let mut q = Question::scalar("toppings", QuestionType::MultiChoice);
        q.choices = vec![
            Choice::new("cheese", "Cheese"),
            Choice::new("ham", "Ham"),
            Choice::new("olive", "Olive"),
        ];
        q
    }

    fn matrix() -> Question {
        let mut q = Question::scalar("satisfaction", QuestionType::Matrix);
        q.rows = vec![Choice::new("ui", "Interface"), Choice::new("docs", "Docs")];
        q.columns = vec![
            Choice::new("low", "Low"),
            Choice::new("mid", "Mid"),
            Choice::new("high", "High"),
        ];
        q
    }

    #[test]
    fn single_choice_codes_and_values_are_reciprocal() {
        let q = single_choice();
        let raw = json!("g");

        let coded = transform_answer(&q, &raw, &ExportOptions::codes());
        assert_eq!(coded, ResponseValue::number(2.0));

        let valued = transform_answer(&q, &raw, &ExportOptions::values());
        assert_eq!(valued, ResponseValue::text("Green"));

        // Mapping the code back through the choice list reproduces the text.
        let code = coded.as_number().unwrap() as usize;
        assert_eq!(q.choices[code - 1].text, "Green");
    }

    #[test]
    fn single_choice_passthrough_without_flags() {
        let q = single_choice();
        assert_eq!(
            transform_answer(&q, &json!("g"), &ExportOptions::default()),
            ResponseValue::text("g")
        );
    }

    #[test]
    fn single_choice_unknown_value_passes_through() {
        let q = single_choice();
        assert_eq!(
            transform_answer(&q, &json!("magenta"), &ExportOptions::codes()),
            ResponseValue::text("magenta")
        );
    }

    #[test]
    fn checkbox_map_covers_all_choices() {
        let q = checkbox();
        let raw = json!(["ham"]);
        let out = transform_answer(&q, &raw, &ExportOptions::default());
        let map = out.as_map().unwrap();
        assert_eq!(map.len(), q.choices.len());
        assert_eq!(map["ham"], ResponseValue::number(1.0));
        assert_eq!(map["cheese"], ResponseValue::number(0.0));
        assert_eq!(map["olive"], ResponseValue::number(0.0));
    }

    #[test]
    fn checkbox_custom_unselected_sentinel() {
        let q = checkbox();
        let options = ExportOptions {
            unselected_checkboxes: -9,
            ..ExportOptions::default()
        };
        let out = transform_answer(&q, &json!([]), &options);
        let map = out.as_map().unwrap();
        assert!(map.values().all(|v| *v == ResponseValue::number(-9.0)));
    }

    #[test]
    fn checkbox_value_display_uses_text_and_empty() {
        let q = checkbox();
        let out = transform_answer(&q, &json!(["cheese", "olive"]), &ExportOptions::values());
        let map = out.as_map().unwrap();
        assert_eq!(map["cheese"], ResponseValue::text("Cheese"));
        assert_eq!(map["ham"], ResponseValue::text(""));
        assert_eq!(map["olive"], ResponseValue::text("Olive"));
    }

    #[test]
    fn checkbox_code_display_uses_ordinals() {
        let q = checkbox();
        let out = transform_answer(&q, &json!(["olive"]), &ExportOptions::codes());
        let map = out.as_map().unwrap();
        assert_eq!(map["olive"], ResponseValue::number(3.0));
        assert_eq!(map["cheese"], ResponseValue::number(0.0));
    }

    #[test]
    fn checkbox_accepts_object_shape() {
        let q = checkbox();
        let raw = json!({"ham": true, "cheese": 0, "olive": "1"});
        let out = transform_answer(&q, &raw, &ExportOptions::default());
        let map = out.as_map().unwrap();
        assert_eq!(map["ham"], ResponseValue::number(1.0));
        assert_eq!(map["cheese"], ResponseValue::number(0.0));
        assert_eq!(map["olive"], ResponseValue::number(1.0));
    }

    #[test]
    fn matrix_rows_always_present() {
        let q = matrix();
        let raw = json!({"ui": "high"});
        let out = transform_answer(&q, &raw, &ExportOptions::default());
        let map = out.as_map().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["ui"], ResponseValue::text("high"));
        assert_eq!(map["docs"], ResponseValue::text(""));
    }

    #[test]
    fn matrix_code_display_uses_column_ordinal() {
        let q = matrix();
        let raw = json!({"ui": "high", "docs": "low"});
        let out = transform_answer(&q, &raw, &ExportOptions::codes());
        let map = out.as_map().unwrap();
        assert_eq!(map["ui"], ResponseValue::number(3.0));
        assert_eq!(map["docs"], ResponseValue::number(1.0));
    }

    #[test]
    fn rating_and_text_pass_through() {
        let rating = Question::scalar("nps", QuestionType::Rating);
        assert_eq!(
            transform_answer(&rating, &json!(7), &ExportOptions::codes()),
            ResponseValue::number(7.0)
        );
        let text = Question::scalar("notes", QuestionType::LongText);
        assert_eq!(
            transform_answer(&text, &json!("fine"), &ExportOptions::values()),
            ResponseValue::text("fine")
        );
    }

    #[test]
    fn empty_response_keeps_multi_column_width() {
        let q = checkbox();
        let out = empty_response(&q, &ExportOptions::default());
        assert_eq!(out.as_map().unwrap().len(), 3);

        let m = matrix();
        let out = empty_response(&m, &ExportOptions::default());
        assert_eq!(out.as_map().unwrap().len(), 2);
    }
}
