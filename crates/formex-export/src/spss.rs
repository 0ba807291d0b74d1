//! Statistical-package bundle exporter.
//!
//! Derives one variable per exportable column, then emits three files in
//! lockstep: an import-syntax script, a flat data file in declared variable
//! order, and a plain-text usage note, zipped together. The syntax and data
//! file are both driven by the same variable list, so they cannot drift.

use tracing::debug;

use formex_model::{
    Artifact, ArtifactFormat, Form, QuestionType, ResponseValue, TransformedSubmission,
};
use formex_ooxml::Package;
use formex_transform::CanonicalModel;

use crate::columns::{matrix_column_ordinal, single_choice_ordinal};
use crate::common::artifact_file_name;
use crate::error::Result;

/// Variable name cap enforced for syntax and data alike.
pub const VARIABLE_NAME_MAX: usize = 64;

/// Width declared for free-text variables.
const TEXT_WIDTH: usize = 255;

const DATA_FILE: &str = "data.csv";
const SYNTAX_FILE: &str = "import.sps";
const README_FILE: &str = "README.txt";

/// Declared type of one variable.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum VariableKind {
    /// Bounded string, `A<width>`.
    Text { width: usize },
    /// Continuous numeric, `F8.2`.
    Numeric,
    /// Coded numeric with value labels, `F8.0`.
    Categorical { labels: Vec<(usize, String)> },
    /// 0/1 selection flag, `F1.0`.
    Binary,
}

impl VariableKind {
    fn format_spec(&self) -> String {
        match self {
            VariableKind::Text { width } => format!("A{width}"),
            VariableKind::Numeric => "F8.2".to_string(),
            VariableKind::Categorical { .. } => "F8.0".to_string(),
            VariableKind::Binary => "F1.0".to_string(),
        }
    }
}

/// Where a variable's cell value comes from.
#[derive(Debug, Clone, PartialEq)]
enum VariableSource {
    SubmissionId,
    SubmittedAt,
    Status,
    SingleChoice { question: String },
    ChoiceFlag { question: String, key: String },
    Rating { question: String },
    MatrixRow { question: String, key: String },
    FreeText { question: String },
}

#[derive(Debug, Clone)]
pub(crate) struct Variable {
    pub(crate) name: String,
    label: String,
    pub(crate) kind: VariableKind,
    source: VariableSource,
}

/// Render the bundle.
pub fn export_spss(model: &CanonicalModel) -> Result<Artifact> {
    let variables = derive_variables(&model.form);
    debug!(variables = variables.len(), "rendering statistical bundle");

    let mut pkg = Package::new();
    pkg.add_part(SYNTAX_FILE, syntax_file(&model.form, &variables).as_bytes())?;
    pkg.add_part(DATA_FILE, data_file(model, &variables)?.as_slice())?;
    pkg.add_part(README_FILE, readme(&model.form).as_bytes())?;

    Ok(Artifact::new(
        pkg.finish()?,
        artifact_file_name(&model.form.id, "spss", ArtifactFormat::SpssBundle),
        ArtifactFormat::SpssBundle,
    ))
}

/// One variable per exportable column, in form order after the identity
/// variables.
pub(crate) fn derive_variables(form: &Form) -> Vec<Variable> {
    let mut seen = std::collections::BTreeSet::new();
    let mut variables = vec![
        Variable {
            name: sanitize_variable_name("response_id", &mut seen),
            label: "Submission id".to_string(),
            kind: VariableKind::Text { width: 40 },
            source: VariableSource::SubmissionId,
        },
        Variable {
            name: sanitize_variable_name("submitted_at", &mut seen),
            label: "Submission timestamp".to_string(),
            kind: VariableKind::Text { width: 32 },
            source: VariableSource::SubmittedAt,
        },
        Variable {
            name: sanitize_variable_name("status", &mut seen),
            label: "Submission status".to_string(),
            kind: VariableKind::Text { width: 16 },
            source: VariableSource::Status,
        },
    ];

    for question in &form.questions {
        match question.question_type {
            QuestionType::SingleChoice => {
                let labels = question
                    .choices
                    .iter()
                    .enumerate()
                    .map(|(idx, choice)| (idx + 1, choice.text.clone()))
                    .collect();
                variables.push(Variable {
                    name: sanitize_variable_name(&question.name, &mut seen),
                    label: question.title().to_string(),
                    kind: VariableKind::Categorical { labels },
                    source: VariableSource::SingleChoice {
                        question: question.name.clone(),
                    },
                });
            }
            QuestionType::MultiChoice => {
                for choice in &question.choices {
                    let raw = format!("{}_{}", question.name, choice.value);
                    variables.push(Variable {
                        name: sanitize_variable_name(&raw, &mut seen),
                        label: format!("{} ({})", question.title(), choice.text),
                        kind: VariableKind::Binary,
                        source: VariableSource::ChoiceFlag {
                            question: question.name.clone(),
                            key: choice.value.clone(),
                        },
                    });
                }
            }
            QuestionType::Rating => variables.push(Variable {
                name: sanitize_variable_name(&question.name, &mut seen),
                label: question.title().to_string(),
                kind: VariableKind::Numeric,
                source: VariableSource::Rating {
                    question: question.name.clone(),
                },
            }),
            QuestionType::Matrix => {
                for row in &question.rows {
                    let raw = format!("{}_{}", question.name, row.value);
                    let labels = question
                        .columns
                        .iter()
                        .enumerate()
                        .map(|(idx, column)| (idx + 1, column.text.clone()))
                        .collect();
                    variables.push(Variable {
                        name: sanitize_variable_name(&raw, &mut seen),
                        label: format!("{} ({})", question.title(), row.text),
                        kind: VariableKind::Categorical { labels },
                        source: VariableSource::MatrixRow {
                            question: question.name.clone(),
                            key: row.value.clone(),
                        },
                    });
                }
            }
            QuestionType::ShortText | QuestionType::LongText | QuestionType::Generic => {
                variables.push(Variable {
                    name: sanitize_variable_name(&question.name, &mut seen),
                    label: question.title().to_string(),
                    kind: VariableKind::Text { width: TEXT_WIDTH },
                    source: VariableSource::FreeText {
                        question: question.name.clone(),
                    },
                });
            }
        }
    }
    variables
}

/// Sanitize a raw name into a legal variable name: non-alphanumeric becomes
/// underscore, a leading non-letter gets a `v_` prefix, length is capped,
/// collisions get a numeric suffix.
pub(crate) fn sanitize_variable_name(
    raw: &str,
    seen: &mut std::collections::BTreeSet<String>,
) -> String {
    let mut name: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if !name.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
        name = format!("v_{name}");
    }
    name.truncate(VARIABLE_NAME_MAX);

    if seen.insert(name.clone()) {
        return name;
    }
    for n in 2.. {
        let suffix = format!("_{n}");
        let mut candidate = name.clone();
        candidate.truncate(VARIABLE_NAME_MAX - suffix.len());
        candidate.push_str(&suffix);
        if seen.insert(candidate.clone()) {
            return candidate;
        }
    }
    unreachable!("suffix counter exhausts before names do")
}

fn escape_label(label: &str) -> String {
    label.replace('\'', "''")
}

/// The import-syntax script: data shape, labels, missing values, baseline
/// statistics.
fn syntax_file(form: &Form, variables: &[Variable]) -> String {
    let mut out = String::new();
    out.push_str(&format!("* Import syntax for survey export.\n* Form: {}.\n\n", form.title));

    out.push_str("GET DATA\n  /TYPE=TXT\n  /FILE='data.csv'\n  /ENCODING='UTF8'\n");
    out.push_str("  /DELIMITERS=\",\"\n  /QUALIFIER='\"'\n  /ARRANGEMENT=DELIMITED\n");
    out.push_str("  /FIRSTCASE=2\n  /VARIABLES=\n");
    for variable in variables {
        out.push_str(&format!("    {} {}\n", variable.name, variable.kind.format_spec()));
    }
    out.push_str("  .\n\nVARIABLE LABELS\n");
    for variable in variables {
        out.push_str(&format!("  {} '{}'\n", variable.name, escape_label(&variable.label)));
    }
    out.push_str("  .\n");

    let mut any_labels = false;
    let mut value_labels = String::from("\nVALUE LABELS\n");
    for variable in variables {
        if let VariableKind::Categorical { labels } = &variable.kind {
            if labels.is_empty() {
                continue;
            }
            any_labels = true;
            value_labels.push_str(&format!("  /{}", variable.name));
            for (code, text) in labels {
                value_labels.push_str(&format!(" {code} '{}'", escape_label(text)));
            }
            value_labels.push('\n');
        }
    }
    if any_labels {
        out.push_str(&value_labels);
        out.push_str("  .\n");
    }

    let numeric_names: Vec<&str> = variables
        .iter()
        .filter(|v| !matches!(v.kind, VariableKind::Text { .. }))
        .map(|v| v.name.as_str())
        .collect();
    if !numeric_names.is_empty() {
        out.push_str(&format!(
            "\nMISSING VALUES {} (-9).\n",
            numeric_names.join(" ")
        ));
        out.push_str(&format!(
            "\nFREQUENCIES VARIABLES={}.\n",
            numeric_names.join(" ")
        ));
        let continuous: Vec<&str> = variables
            .iter()
            .filter(|v| v.kind == VariableKind::Numeric)
            .map(|v| v.name.as_str())
            .collect();
        if !continuous.is_empty() {
            out.push_str(&format!(
                "DESCRIPTIVES VARIABLES={}.\n",
                continuous.join(" ")
            ));
        }
    }
    out.push_str("\nEXECUTE.\n");
    out
}

/// The flat data file; column order matches the declared variable order.
fn data_file(model: &CanonicalModel, variables: &[Variable]) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut bytes);
        writer.write_record(variables.iter().map(|v| v.name.as_str()))?;
        for submission in &model.submissions {
            let record: Vec<String> = variables
                .iter()
                .map(|variable| variable_value(variable, submission, model))
                .collect();
            writer.write_record(&record)?;
        }
        writer.flush()?;
    }
    Ok(bytes)
}

fn variable_value(
    variable: &Variable,
    submission: &TransformedSubmission,
    model: &CanonicalModel,
) -> String {
    match &variable.source {
        VariableSource::SubmissionId => submission.id.clone(),
        VariableSource::SubmittedAt => submission.submitted_at.to_rfc3339(),
        VariableSource::Status => submission.status.as_str().to_string(),
        VariableSource::SingleChoice { question } => {
            let Some(q) = model.form.question(question) else {
                return String::new();
            };
            submission
                .response(question)
                .and_then(|r| single_choice_ordinal(q, r))
                .map(|o| o.to_string())
                .unwrap_or_default()
        }
        VariableSource::ChoiceFlag { question, key } => {
            let sentinel = model.options.unselected_checkboxes;
            submission
                .response(question)
                .and_then(ResponseValue::as_map)
                .and_then(|map| map.get(key))
                .map(|v| if v.is_selected(sentinel) { "1" } else { "0" }.to_string())
                .unwrap_or_default()
        }
        VariableSource::Rating { question } => submission
            .response(question)
            .and_then(ResponseValue::as_number)
            .map(|n| ResponseValue::number(n).to_cell())
            .unwrap_or_default(),
        VariableSource::MatrixRow { question, key } => {
            let Some(q) = model.form.question(question) else {
                return String::new();
            };
            submission
                .response(question)
                .and_then(ResponseValue::as_map)
                .and_then(|map| map.get(key))
                .and_then(|cell| matrix_column_ordinal(q, cell))
                .map(|o| o.to_string())
                .unwrap_or_default()
        }
        VariableSource::FreeText { question } => {
            let mut text = submission
                .response(question)
                .map(ResponseValue::to_cell)
                .unwrap_or_default();
            if text.chars().count() > TEXT_WIDTH {
                text = text.chars().take(TEXT_WIDTH).collect();
            }
            text
        }
    }
}

fn readme(form: &Form) -> String {
    format!(
        "Survey export bundle for \"{}\"\n\
         \n\
         Contents:\n\
         - {SYNTAX_FILE}: import syntax declaring the data shape, variable and\n\
         \u{20}  value labels, missing-value codes, and baseline statistics.\n\
         - {DATA_FILE}: flat data, one row per submission, columns in declared\n\
         \u{20}  variable order, first row is the header.\n\
         - {README_FILE}: this note.\n\
         \n\
         Usage: place both files in the same directory and run {SYNTAX_FILE}\n\
         from your statistical package. Unanswered questions are empty cells;\n\
         the numeric missing code is -9.\n",
        form.title
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use formex_model::{Choice, Question};

    fn seen() -> std::collections::BTreeSet<String> {
        std::collections::BTreeSet::new()
    }

    #[test]
    fn names_are_sanitized_prefixed_and_capped() {
        let mut s = seen();
        assert_eq!(sanitize_variable_name("plan-choice 1", &mut s), "plan_choice_1");
        assert_eq!(sanitize_variable_name("2nd", &mut s), "v_2nd");
        assert_eq!(sanitize_variable_name("_x", &mut s), "v__x");
        let long = "q".repeat(90);
        assert_eq!(sanitize_variable_name(&long, &mut s).len(), VARIABLE_NAME_MAX);
    }

    #[test]
    fn name_collisions_get_suffixes() {
        let mut s = seen();
        assert_eq!(sanitize_variable_name("score", &mut s), "score");
        assert_eq!(sanitize_variable_name("score", &mut s), "score_2");
        assert_eq!(sanitize_variable_name("score", &mut s), "score_3");
    }

    #[test]
    fn variable_order_follows_form_order() {
        let mut form = Form::new("f1", "Survey");
        let mut plan = Question::scalar("plan", QuestionType::SingleChoice);
        plan.choices = vec![Choice::new("a", "A"), Choice::new("b", "B")];
        let mut features = Question::scalar("features", QuestionType::MultiChoice);
        features.choices = vec![Choice::new("api", "API"), Choice::new("sso", "SSO")];
        form.questions = vec![plan, features, Question::scalar("nps", QuestionType::Rating)];

        let variables = derive_variables(&form);
        let names: Vec<&str> = variables.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "response_id",
                "submitted_at",
                "status",
                "plan",
                "features_api",
                "features_sso",
                "nps"
            ]
        );
    }

    #[test]
    fn syntax_declares_every_variable_exactly_once() {
        let mut form = Form::new("f1", "Survey");
        let mut plan = Question::scalar("plan", QuestionType::SingleChoice);
        plan.title = Some("Which plan?".to_string());
        plan.choices = vec![Choice::new("a", "It's A"), Choice::new("b", "B")];
        form.questions = vec![plan];

        let variables = derive_variables(&form);
        let syntax = syntax_file(&form, &variables);
        for variable in &variables {
            assert_eq!(
                syntax.matches(&format!("    {} ", variable.name)).count(),
                1,
                "{} declared once",
                variable.name
            );
        }
        // Value labels use the shared 1-based ordinal and escaped quotes.
        assert!(syntax.contains("/plan 1 'It''s A' 2 'B'"));
        assert!(syntax.contains("FIRSTCASE=2"));
    }
}
