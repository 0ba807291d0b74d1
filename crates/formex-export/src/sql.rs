//! SQL dump exporter.
//!
//! Emits a self-contained script: schema for three normalized tables,
//! indexes, then inserts for the form, every submission, and every answered
//! question. Response rows carry a derived numeric score that uses the same
//! 1-based ordinal rule as the statistical bundle.

use tracing::debug;

use formex_model::{
    Artifact, ArtifactFormat, Question, QuestionType, ResponseValue, TransformedSubmission,
};
use formex_transform::CanonicalModel;

use crate::columns::{selected_count, single_choice_ordinal};
use crate::common::artifact_file_name;
use crate::error::Result;

/// Render the SQL script.
pub fn export_sql(model: &CanonicalModel) -> Result<Artifact> {
    let mut out = String::new();
    out.push_str(SCHEMA);

    out.push_str(&format!(
        "INSERT INTO forms (id, title, created_at) VALUES ({}, {}, {});\n\n",
        sql_string(Some(&model.form.id)),
        sql_string(Some(&model.form.title)),
        model
            .form
            .created_at
            .map(|t| sql_string(Some(&t.to_rfc3339())))
            .unwrap_or_else(|| "NULL".to_string())
    ));

    let mut response_id: u64 = 0;
    for submission in &model.submissions {
        out.push_str(&format!(
            "INSERT INTO submissions (id, form_id, submitted_at, status, respondent_email) \
             VALUES ({}, {}, {}, {}, {});\n",
            sql_string(Some(&submission.id)),
            sql_string(Some(&model.form.id)),
            sql_string(Some(&submission.submitted_at.to_rfc3339())),
            sql_string(Some(submission.status.as_str())),
            sql_string(submission.respondent_email.as_deref()),
        ));
        for question in &model.form.questions {
            let Some(response) = submission.response(&question.name) else {
                continue;
            };
            response_id += 1;
            out.push_str(&response_insert(
                response_id,
                submission,
                question,
                response,
                model.options.unselected_checkboxes,
            ));
        }
        out.push('\n');
    }

    debug!(rows = response_id, "rendered SQL dump");
    Ok(Artifact::new(
        out.into_bytes(),
        artifact_file_name(&model.form.id, "dump", ArtifactFormat::Sql),
        ArtifactFormat::Sql,
    ))
}

const SCHEMA: &str = "\
CREATE TABLE forms (
    id VARCHAR(64) PRIMARY KEY,
    title TEXT NOT NULL,
    created_at TIMESTAMP NULL
);

CREATE TABLE submissions (
    id VARCHAR(64) PRIMARY KEY,
    form_id VARCHAR(64) NOT NULL REFERENCES forms(id),
    submitted_at TIMESTAMP NOT NULL,
    status VARCHAR(32) NOT NULL,
    respondent_email VARCHAR(255) NULL
);

CREATE TABLE responses (
    id BIGINT PRIMARY KEY,
    submission_id VARCHAR(64) NOT NULL REFERENCES submissions(id),
    question_name VARCHAR(255) NOT NULL,
    question_title TEXT NOT NULL,
    answer_text TEXT NULL,
    score DOUBLE PRECISION NULL
);

CREATE INDEX idx_submissions_form_id ON submissions(form_id);
CREATE INDEX idx_responses_submission_id ON responses(submission_id);
CREATE INDEX idx_responses_question_name ON responses(question_name);

";

fn response_insert(
    id: u64,
    submission: &TransformedSubmission,
    question: &Question,
    response: &ResponseValue,
    unselected_sentinel: i64,
) -> String {
    let answer = answer_text(response);
    let score = derive_score(question, response, unselected_sentinel)
        .map(trim_float)
        .unwrap_or_else(|| "NULL".to_string());
    format!(
        "INSERT INTO responses (id, submission_id, question_name, question_title, answer_text, score) \
         VALUES ({id}, {}, {}, {}, {}, {score});\n",
        sql_string(Some(&submission.id)),
        sql_string(Some(&question.name)),
        sql_string(Some(question.title())),
        sql_string(answer.as_deref()),
    )
}

/// Scalar answers render as their cell text; map answers flatten to
/// `key=value` pairs. An empty rendering stays a value, absence was filtered
/// before this point.
fn answer_text(response: &ResponseValue) -> Option<String> {
    match response {
        ResponseValue::Map(map) => {
            let pairs: Vec<String> = map
                .iter()
                .map(|(key, value)| format!("{key}={}", value.to_cell()))
                .collect();
            Some(pairs.join("; "))
        }
        scalar => Some(scalar.to_cell()),
    }
}

/// Derived numeric score per question type.
///
/// rating: the numeric value; single-choice: 1-based choice ordinal;
/// multi-choice: count of selected options; everything else: none.
fn derive_score(
    question: &Question,
    response: &ResponseValue,
    unselected_sentinel: i64,
) -> Option<f64> {
    match question.question_type {
        QuestionType::Rating => response.as_number(),
        QuestionType::SingleChoice => {
            single_choice_ordinal(question, response).map(|o| o as f64)
        }
        QuestionType::MultiChoice => {
            Some(selected_count(response, unselected_sentinel) as f64)
        }
        _ => None,
    }
}

fn trim_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Quote a string for embedding in a SQL literal, or emit `NULL`.
///
/// Escapes backslash, both quote characters, and control characters; other
/// text passes through untouched.
pub(crate) fn sql_string(value: Option<&str>) -> String {
    let Some(value) = value else {
        return "NULL".to_string();
    };
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("''"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            c if c.is_control() => out.push(' '),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn strings_are_quoted_and_escaped() {
        assert_eq!(sql_string(None), "NULL");
        assert_eq!(sql_string(Some("plain")), "'plain'");
        assert_eq!(sql_string(Some("it's")), "'it''s'");
        assert_eq!(sql_string(Some("a\\b")), "'a\\\\b'");
        assert_eq!(sql_string(Some("line\nbreak")), "'line\\nbreak'");
        assert_eq!(sql_string(Some("say \"hi\"")), "'say \\\"hi\\\"'");
    }

    #[test]
    fn score_trims_integral_floats() {
        assert_eq!(trim_float(3.0), "3");
        assert_eq!(trim_float(2.5), "2.5");
    }

    proptest! {
        /// Escaped literals never contain raw control characters and every
        /// interior single quote is doubled.
        #[test]
        fn escaping_is_safe(input in ".*") {
            let quoted = sql_string(Some(&input));
            let inner = &quoted[1..quoted.len() - 1];
            prop_assert!(!inner.chars().any(|c| c.is_control()));
            let mut chars = inner.chars().peekable();
            while let Some(c) = chars.next() {
                if c == '\'' {
                    prop_assert_eq!(chars.next(), Some('\''));
                }
            }
        }
    }
}
