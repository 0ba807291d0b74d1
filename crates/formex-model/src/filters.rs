use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::submission::{Submission, SubmissionStatus};

/// Comparison operator for field-level predicates.
///
/// Source stores translate these to their native operators; the in-memory
/// evaluation below is the reference semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Contains,
}

/// One field-level predicate against a submission's metadata or answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldFilter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl FieldFilter {
    pub fn new(field: impl Into<String>, op: FilterOp, value: Value) -> Self {
        Self {
            field: field.into(),
            op,
            value,
        }
    }

    fn matches_value(&self, actual: Option<&Value>) -> bool {
        let Some(actual) = actual else {
            // Absent fields only satisfy not-equals.
            return self.op == FilterOp::Ne;
        };
        match self.op {
            FilterOp::Eq => loose_eq(actual, &self.value),
            FilterOp::Ne => !loose_eq(actual, &self.value),
            FilterOp::Gt => compare(actual, &self.value).is_some_and(|o| o.is_gt()),
            FilterOp::Lt => compare(actual, &self.value).is_some_and(|o| o.is_lt()),
            FilterOp::Contains => as_text(actual).contains(as_text(&self.value).as_str()),
        }
    }
}

/// Submission-level filters applied when fetching source data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionFilters {
    pub submitted_after: Option<DateTime<Utc>>,
    pub submitted_before: Option<DateTime<Utc>>,
    pub status: Option<SubmissionStatus>,
    pub fields: Vec<FieldFilter>,
}

impl SubmissionFilters {
    pub fn is_empty(&self) -> bool {
        self.submitted_after.is_none()
            && self.submitted_before.is_none()
            && self.status.is_none()
            && self.fields.is_empty()
    }

    /// Reference predicate over a raw submission. Field predicates look at
    /// metadata first, then raw answers.
    pub fn matches(&self, submission: &Submission) -> bool {
        if let Some(after) = self.submitted_after {
            if submission.submitted_at < after {
                return false;
            }
        }
        if let Some(before) = self.submitted_before {
            if submission.submitted_at > before {
                return false;
            }
        }
        if let Some(status) = &self.status {
            if &submission.status != status {
                return false;
            }
        }
        self.fields.iter().all(|filter| {
            let actual = submission
                .metadata
                .get(&filter.field)
                .or_else(|| submission.answers.get(&filter.field));
            filter.matches_value(actual)
        })
    }
}

/// Equality across the JSON scalar types a store may hand back
/// (e.g. `5` vs `"5"`).
fn loose_eq(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => as_text(a) == as_text(b),
    }
}

fn compare(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        return x.partial_cmp(&y);
    }
    Some(as_text(a).cmp(&as_text(b)))
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
