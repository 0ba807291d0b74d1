//! Raw form definition walking.
//!
//! Form definitions are user-authored JSON: a list of pages, each with an
//! `elements` array, where every element declares a `type` plus per-type
//! metadata (`choices`, `rows`/`columns`, rating bounds). The walker flattens
//! every page into one ordered question list. Structurally malformed input
//! degrades to an empty list so downstream exporters keep working.

use serde_json::Value;
use tracing::{debug, warn};

use formex_model::{Choice, Question, QuestionType};

/// Flatten every page's elements into one ordered question list.
///
/// Returns an empty list (never an error) when the definition is not an
/// object or carries no recognizable pages/elements.
pub fn parse_questions(definition: &Value) -> Vec<Question> {
    let Some(root) = definition.as_object() else {
        warn!("form definition is not an object; producing no questions");
        return Vec::new();
    };

    let mut questions = Vec::new();
    if let Some(pages) = root.get("pages").and_then(Value::as_array) {
        for page in pages {
            if let Some(elements) = page.get("elements").and_then(Value::as_array) {
                collect_elements(elements, &mut questions);
            }
        }
    } else if let Some(elements) = root.get("elements").and_then(Value::as_array) {
        // Single-page forms may carry elements at the top level.
        collect_elements(elements, &mut questions);
    }
    debug!(question_count = questions.len(), "parsed form definition");
    questions
}

fn collect_elements(elements: &[Value], out: &mut Vec<Question>) {
    for element in elements {
        if let Some(question) = parse_element(element) {
            out.push(question);
        }
    }
}

fn parse_element(element: &Value) -> Option<Question> {
    let obj = element.as_object()?;
    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .filter(|n| !n.trim().is_empty())?
        .to_string();

    let declared = obj.get("type").and_then(Value::as_str).unwrap_or("");
    let question_type = declared.parse::<QuestionType>().unwrap_or_else(|_| {
        debug!(question = %name, declared_type = %declared, "unsupported type, degrading to generic");
        QuestionType::Generic
    });

    let mut question = Question::scalar(name, question_type);
    question.title = obj
        .get("title")
        .and_then(Value::as_str)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    question.is_required = obj
        .get("isRequired")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    if question_type.has_choices() {
        question.choices = parse_choice_list(obj.get("choices"));
    }
    if question_type == QuestionType::Matrix {
        question.rows = parse_choice_list(obj.get("rows"));
        question.columns = parse_choice_list(obj.get("columns"));
    }
    if question_type == QuestionType::Rating {
        question.rate_min = obj.get("rateMin").and_then(Value::as_i64);
        question.rate_max = obj.get("rateMax").and_then(Value::as_i64);
        question.rate_step = obj.get("rateStep").and_then(Value::as_i64);
    }
    Some(question)
}

/// Choice lists accept both plain strings (`"a"`) and `{value, text}`
/// objects; text defaults to the value.
fn parse_choice_list(node: Option<&Value>) -> Vec<Choice> {
    let Some(items) = node.and_then(Value::as_array) else {
        return Vec::new();
    };
    let mut choices = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(s) => choices.push(Choice::new(s.clone(), s.clone())),
            Value::Number(n) => {
                let v = n.to_string();
                choices.push(Choice::new(v.clone(), v));
            }
            Value::Object(obj) => {
                let value = obj
                    .get("value")
                    .map(scalar_to_string)
                    .filter(|v| !v.is_empty());
                if let Some(value) = value {
                    let text = obj
                        .get("text")
                        .and_then(Value::as_str)
                        .filter(|t| !t.trim().is_empty())
                        .map(str::to_string)
                        .unwrap_or_else(|| value.clone());
                    choices.push(Choice::new(value, text));
                }
            }
            _ => {}
        }
    }
    choices
}

pub(crate) fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flattens_pages_in_order() {
        let definition = json!({
            "pages": [
                {"elements": [
                    {"type": "text", "name": "q1", "title": "First"},
                    {"type": "radiogroup", "name": "q2", "choices": ["a", "b"]}
                ]},
                {"elements": [
                    {"type": "rating", "name": "q3", "rateMin": 1, "rateMax": 5}
                ]}
            ]
        });
        let questions = parse_questions(&definition);
        let names: Vec<&str> = questions.iter().map(|q| q.name.as_str()).collect();
        assert_eq!(names, vec!["q1", "q2", "q3"]);
        assert_eq!(questions[1].choices.len(), 2);
        assert_eq!(questions[2].rate_max, Some(5));
    }

    #[test]
    fn top_level_elements_fallback() {
        let definition = json!({
            "elements": [{"type": "comment", "name": "feedback"}]
        });
        let questions = parse_questions(&definition);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].question_type, QuestionType::LongText);
    }

    #[test]
    fn malformed_definition_yields_empty_list() {
        assert!(parse_questions(&json!("not an object")).is_empty());
        assert!(parse_questions(&json!(null)).is_empty());
        assert!(parse_questions(&json!({"pages": "nope"})).is_empty());
    }

    #[test]
    fn unknown_type_degrades_to_generic() {
        let definition = json!({
            "elements": [{"type": "signaturepad", "name": "sig"}]
        });
        let questions = parse_questions(&definition);
        assert_eq!(questions[0].question_type, QuestionType::Generic);
    }

    #[test]
    fn choice_objects_and_strings_mix() {
        let definition = json!({
            "elements": [{
                "type": "checkbox",
                "name": "q",
                "choices": ["plain", {"value": "v", "text": "Visible"}, {"value": 3}]
            }]
        });
        let questions = parse_questions(&definition);
        let choices = &questions[0].choices;
        assert_eq!(choices.len(), 3);
        assert_eq!(choices[0].text, "plain");
        assert_eq!(choices[1].text, "Visible");
        assert_eq!(choices[2].value, "3");
        assert_eq!(choices[2].text, "3");
    }

    #[test]
    fn elements_without_names_are_skipped() {
        let definition = json!({
            "elements": [{"type": "text"}, {"type": "text", "name": "  "}]
        });
        assert!(parse_questions(&definition).is_empty());
    }
}
