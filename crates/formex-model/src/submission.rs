use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Completion state of a submission as reported by the data store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubmissionStatus {
    Completed,
    Partial,
    /// Anything the store reports that we do not classify; round-tripped as-is.
    Other(String),
}

impl Default for SubmissionStatus {
    fn default() -> Self {
        SubmissionStatus::Completed
    }
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            SubmissionStatus::Completed => "completed",
            SubmissionStatus::Partial => "partial",
            SubmissionStatus::Other(s) => s.as_str(),
        }
    }
}

impl From<String> for SubmissionStatus {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "completed" | "complete" => SubmissionStatus::Completed,
            "partial" | "incomplete" => SubmissionStatus::Partial,
            _ => SubmissionStatus::Other(value),
        }
    }
}

impl From<SubmissionStatus> for String {
    fn from(value: SubmissionStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One respondent's raw answer set, read-only to the pipeline.
///
/// Answer values keep the shape the data store produced: scalar for
/// text/rating, array for checkbox, object keyed by choice value for
/// checkbox/matrix-as-map. The transformer is the single place that switches
/// on those shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub submitted_at: DateTime<Utc>,
    /// Stores that do not track completion report everything as completed.
    #[serde(default)]
    pub status: SubmissionStatus,
    pub respondent_email: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
    /// Raw answers keyed by question name.
    #[serde(default)]
    pub answers: BTreeMap<String, Value>,
}

impl Submission {
    pub fn new(id: impl Into<String>, submitted_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            submitted_at,
            status: SubmissionStatus::Completed,
            respondent_email: None,
            metadata: BTreeMap::new(),
            answers: BTreeMap::new(),
        }
    }

    pub fn answer(&self, question_name: &str) -> Option<&Value> {
        self.answers.get(question_name)
    }
}

/// A normalized answer value produced by the transformer.
///
/// Exactly one level of nesting occurs in practice: checkbox and matrix
/// answers normalize to a map whose values are themselves scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseValue {
    Number(f64),
    Text(String),
    /// Map keyed by choice value (checkbox) or row value (matrix).
    Map(BTreeMap<String, ResponseValue>),
}

impl ResponseValue {
    pub fn text(value: impl Into<String>) -> Self {
        ResponseValue::Text(value.into())
    }

    pub fn number(value: impl Into<f64>) -> Self {
        ResponseValue::Number(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ResponseValue::Number(n) => Some(*n),
            ResponseValue::Text(s) => s.trim().parse().ok(),
            ResponseValue::Map(_) => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, ResponseValue>> {
        match self {
            ResponseValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Whether this checkbox-map entry marks its choice as selected.
    ///
    /// Unselected entries carry the configured numeric sentinel (code
    /// display, or the plain 0/1 encoding) or empty text (value display);
    /// any other value is a selection marker.
    pub fn is_selected(&self, unselected_sentinel: i64) -> bool {
        match self {
            ResponseValue::Number(n) => *n != unselected_sentinel as f64,
            ResponseValue::Text(t) => !t.is_empty(),
            ResponseValue::Map(_) => false,
        }
    }

    /// Render a scalar cell for tabular output. Maps are not scalar and
    /// render empty; exporters expand them to one cell per key instead.
    pub fn to_cell(&self) -> String {
        match self {
            ResponseValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            ResponseValue::Text(s) => s.clone(),
            ResponseValue::Map(_) => String::new(),
        }
    }
}

/// A submission with per-question normalized responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformedSubmission {
    pub id: String,
    pub submitted_at: DateTime<Utc>,
    pub status: SubmissionStatus,
    pub respondent_email: Option<String>,
    /// Normalized responses keyed by question name.
    pub responses: BTreeMap<String, ResponseValue>,
}

impl TransformedSubmission {
    /// Carry the identity fields over from a raw submission.
    pub fn from_submission(submission: &Submission) -> Self {
        Self {
            id: submission.id.clone(),
            submitted_at: submission.submitted_at,
            status: submission.status.clone(),
            respondent_email: submission.respondent_email.clone(),
            responses: BTreeMap::new(),
        }
    }

    pub fn response(&self, question_name: &str) -> Option<&ResponseValue> {
        self.responses.get(question_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classifies_and_round_trips() {
        assert_eq!(SubmissionStatus::from("Completed".to_string()), SubmissionStatus::Completed);
        assert_eq!(SubmissionStatus::from("incomplete".to_string()), SubmissionStatus::Partial);
        let odd = SubmissionStatus::from("quarantined".to_string());
        assert_eq!(odd.as_str(), "quarantined");
    }

    #[test]
    fn cell_rendering_drops_trailing_zero() {
        assert_eq!(ResponseValue::number(3.0).to_cell(), "3");
        assert_eq!(ResponseValue::number(2.5).to_cell(), "2.5");
        assert_eq!(ResponseValue::text("hi").to_cell(), "hi");
    }

    #[test]
    fn selection_follows_the_configured_sentinel() {
        assert!(ResponseValue::number(1.0).is_selected(0));
        assert!(!ResponseValue::number(0.0).is_selected(0));
        assert!(ResponseValue::number(2.0).is_selected(-9));
        assert!(!ResponseValue::number(-9.0).is_selected(-9));
        assert!(ResponseValue::text("Cheese").is_selected(0));
        assert!(!ResponseValue::text("").is_selected(-9));
    }

    #[test]
    fn number_coercion_from_text() {
        assert_eq!(ResponseValue::text(" 4 ").as_number(), Some(4.0));
        assert_eq!(ResponseValue::text("n/a").as_number(), None);
    }
}
