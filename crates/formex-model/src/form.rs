use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::submission::ResponseValue;

/// Question classification for the canonical model.
///
/// Raw form definitions declare types as free-form strings; everything the
/// pipeline does not recognize degrades to [`QuestionType::Generic`] and is
/// treated as a scalar pass-through question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// Single-line free text.
    ShortText,
    /// Multi-line free text (comment boxes).
    LongText,
    /// One selection from a fixed choice list (radio group, dropdown).
    SingleChoice,
    /// Any number of selections from a fixed choice list (checkboxes).
    MultiChoice,
    /// Numeric rating on a bounded scale.
    Rating,
    /// Grid of rows, each selecting one column.
    Matrix,
    /// Unrecognized declared type; treated as a scalar.
    Generic,
}

impl QuestionType {
    /// Returns the canonical type name used in dictionaries and summaries.
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::ShortText => "short_text",
            QuestionType::LongText => "long_text",
            QuestionType::SingleChoice => "single_choice",
            QuestionType::MultiChoice => "multi_choice",
            QuestionType::Rating => "rating",
            QuestionType::Matrix => "matrix",
            QuestionType::Generic => "generic",
        }
    }

    /// True for types whose answers expand to one column per choice/row.
    pub fn is_multi_column(&self) -> bool {
        matches!(self, QuestionType::MultiChoice | QuestionType::Matrix)
    }

    /// True for types with a defined choice list.
    pub fn has_choices(&self) -> bool {
        matches!(self, QuestionType::SingleChoice | QuestionType::MultiChoice)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = String;

    /// Parse a declared type string from a raw form definition.
    ///
    /// Accepts the common authoring spellings (case-insensitive). Unknown
    /// types are an error here; callers that must not fail map the error to
    /// [`QuestionType::Generic`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "short_text" | "shorttext" => Ok(QuestionType::ShortText),
            "comment" | "long_text" | "longtext" => Ok(QuestionType::LongText),
            "radiogroup" | "radio" | "dropdown" | "single_choice" => {
                Ok(QuestionType::SingleChoice)
            }
            "checkbox" | "multi_choice" => Ok(QuestionType::MultiChoice),
            "rating" => Ok(QuestionType::Rating),
            "matrix" => Ok(QuestionType::Matrix),
            other => Err(format!("Unknown question type: {}", other)),
        }
    }
}

/// One entry of a choice list (or a matrix row/column).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// Stored value, used as the stable key in raw answers.
    pub value: String,
    /// Display text shown to respondents.
    pub text: String,
}

impl Choice {
    pub fn new(value: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            text: text.into(),
        }
    }
}

/// One item of the source form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Unique key within the form; drives answer lookup and column order.
    pub name: String,
    /// Display label. Empty when the author gave none; see [`Question::title`].
    pub title: Option<String>,
    pub question_type: QuestionType,
    #[serde(default)]
    pub is_required: bool,
    /// Ordered choice list for choice types.
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Ordered rows, matrix type only.
    #[serde(default)]
    pub rows: Vec<Choice>,
    /// Ordered columns, matrix type only.
    #[serde(default)]
    pub columns: Vec<Choice>,
    /// Rating scale bounds, rating type only.
    pub rate_min: Option<i64>,
    pub rate_max: Option<i64>,
    pub rate_step: Option<i64>,
}

impl Question {
    /// Create a scalar question with no choice metadata.
    pub fn scalar(name: impl Into<String>, question_type: QuestionType) -> Self {
        Self {
            name: name.into(),
            title: None,
            question_type,
            is_required: false,
            choices: Vec::new(),
            rows: Vec::new(),
            columns: Vec::new(),
            rate_min: None,
            rate_max: None,
            rate_step: None,
        }
    }

    /// Display title, falling back to the question name.
    pub fn title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(&self.name)
    }

    /// Look up a choice by stored value.
    pub fn choice(&self, value: &str) -> Option<&Choice> {
        self.choices.iter().find(|c| c.value == value)
    }

    /// 1-based position of a choice value in the defined choice list.
    ///
    /// This ordinal is the shared "code" for single-choice answers across
    /// every exporter; SQL scores and statistical value labels must agree
    /// with it.
    pub fn choice_ordinal(&self, value: &str) -> Option<usize> {
        self.choices.iter().position(|c| c.value == value).map(|i| i + 1)
    }

    /// 1-based position of a matrix column value.
    pub fn column_ordinal(&self, value: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.value == value).map(|i| i + 1)
    }

    /// Resolve a normalized single-choice response back to its 1-based
    /// position in the choice list, whatever display mode the transformer
    /// ran under.
    ///
    /// A numeric response is already a code and must fall inside the list;
    /// a text response is matched by stored value first, then by display
    /// text. This is the one rule relating a transformed response to its
    /// defined choice, shared by exporters and analytics alike.
    pub fn resolve_choice(&self, response: &ResponseValue) -> Option<usize> {
        if let ResponseValue::Number(n) = response {
            let code = *n as usize;
            return (code >= 1 && code <= self.choices.len()).then_some(code);
        }
        let text = response.as_text()?;
        self.choice_ordinal(text).or_else(|| {
            self.choices
                .iter()
                .position(|c| c.text == text)
                .map(|i| i + 1)
        })
    }
}

/// A form as fetched from the source store: identity fields plus the raw,
/// user-authored definition JSON the transformer walks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawForm {
    pub id: String,
    pub title: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    /// Nested, possibly multi-page definition; consumed, never authored here.
    pub definition: serde_json::Value,
}

/// A loaded form definition: ordered questions, immutable for an export run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Form {
    pub id: String,
    pub title: String,
    pub created_at: Option<DateTime<Utc>>,
    /// Question order is significant and preserved end-to-end.
    pub questions: Vec<Question>,
}

impl Form {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            created_at: None,
            questions: Vec::new(),
        }
    }

    /// Look up a question by name.
    pub fn question(&self, name: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.name == name)
    }

    /// Question names that appear more than once (an authoring defect the
    /// transformer warns about; the first occurrence wins downstream).
    pub fn duplicate_names(&self) -> Vec<&str> {
        let mut seen = std::collections::BTreeSet::new();
        let mut dupes = Vec::new();
        for question in &self.questions {
            if !seen.insert(question.name.as_str()) {
                dupes.push(question.name.as_str());
            }
        }
        dupes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_declared_type_spellings() {
        assert_eq!("radiogroup".parse::<QuestionType>().unwrap(), QuestionType::SingleChoice);
        assert_eq!("Dropdown".parse::<QuestionType>().unwrap(), QuestionType::SingleChoice);
        assert_eq!("checkbox".parse::<QuestionType>().unwrap(), QuestionType::MultiChoice);
        assert_eq!("comment".parse::<QuestionType>().unwrap(), QuestionType::LongText);
        assert!("signaturepad".parse::<QuestionType>().is_err());
    }

    #[test]
    fn choice_ordinal_is_one_based() {
        let mut q = Question::scalar("q1", QuestionType::SingleChoice);
        q.choices = vec![Choice::new("a", "A"), Choice::new("b", "B"), Choice::new("c", "C")];
        assert_eq!(q.choice_ordinal("a"), Some(1));
        assert_eq!(q.choice_ordinal("c"), Some(3));
        assert_eq!(q.choice_ordinal("z"), None);
    }

    #[test]
    fn resolve_choice_accepts_value_text_and_code() {
        let mut q = Question::scalar("q1", QuestionType::SingleChoice);
        q.choices = vec![Choice::new("a", "Plan A"), Choice::new("b", "Plan B")];
        assert_eq!(q.resolve_choice(&ResponseValue::text("b")), Some(2));
        assert_eq!(q.resolve_choice(&ResponseValue::text("Plan B")), Some(2));
        assert_eq!(q.resolve_choice(&ResponseValue::number(2.0)), Some(2));
        assert_eq!(q.resolve_choice(&ResponseValue::text("z")), None);
        assert_eq!(q.resolve_choice(&ResponseValue::number(0.0)), None);
        assert_eq!(q.resolve_choice(&ResponseValue::number(3.0)), None);
    }

    #[test]
    fn title_falls_back_to_name() {
        let mut q = Question::scalar("q1", QuestionType::ShortText);
        assert_eq!(q.title(), "q1");
        q.title = Some("  ".to_string());
        assert_eq!(q.title(), "q1");
        q.title = Some("How satisfied are you?".to_string());
        assert_eq!(q.title(), "How satisfied are you?");
    }

    #[test]
    fn duplicate_names_detected() {
        let mut form = Form::new("f1", "Form");
        form.questions.push(Question::scalar("a", QuestionType::ShortText));
        form.questions.push(Question::scalar("b", QuestionType::ShortText));
        form.questions.push(Question::scalar("a", QuestionType::Rating));
        assert_eq!(form.duplicate_names(), vec!["a"]);
    }
}
