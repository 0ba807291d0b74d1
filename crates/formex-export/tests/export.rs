//! Cross-format export properties over one realistic survey.

use std::io::Read;

use chrono::{TimeZone, Utc};
use serde_json::json;

use formex_export::{export, single_choice_ordinal};
use formex_model::{
    ArtifactFormat, ExportOptions, ExportType, RawForm, ResponseValue, Submission,
};
use formex_transform::{transform, CanonicalModel};

fn abc_form() -> RawForm {
    RawForm {
        id: "form-abc".to_string(),
        title: Some("Plan survey".to_string()),
        created_at: None,
        definition: json!({
            "elements": [
                {"type": "radiogroup", "name": "plan", "title": "Question", "choices": [
                    {"value": "A", "text": "A-text"},
                    {"value": "B", "text": "B-text"},
                    {"value": "C", "text": "C-text"}
                ]}
            ]
        }),
    }
}

fn abc_submissions() -> Vec<Submission> {
    ["A", "B", "A"]
        .iter()
        .enumerate()
        .map(|(idx, answer)| {
            let mut s = Submission::new(
                format!("s{}", idx + 1),
                Utc.with_ymd_and_hms(2026, 2, 1 + idx as u32, 9, 0, 0).unwrap(),
            );
            s.answers.insert("plan".to_string(), json!(answer));
            s
        })
        .collect()
}

fn abc_model(options: &ExportOptions) -> CanonicalModel {
    transform(&abc_form(), &abc_submissions(), options)
}

fn csv_body(bytes: &[u8]) -> String {
    // Strip the BOM.
    String::from_utf8(bytes[3..].to_vec()).unwrap()
}

fn read_zip_part(bytes: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes.to_vec())).unwrap();
    let mut part = archive.by_name(name).unwrap();
    let mut content = String::new();
    part.read_to_string(&mut content).unwrap();
    content
}

#[test]
fn tabular_values_column_in_submission_order() {
    let options = ExportOptions::values();
    let artifact = export(
        &abc_model(&options),
        ExportType::Raw,
        ArtifactFormat::Csv,
        &options,
    )
    .unwrap();
    let body = csv_body(&artifact.bytes);
    let column: Vec<&str> = body
        .lines()
        .skip(1)
        .map(|line| line.rsplit(',').next().unwrap())
        .collect();
    assert_eq!(column, vec!["A-text", "B-text", "A-text"]);
    assert!(body.lines().next().unwrap().ends_with("Question"));
}

#[test]
fn analytics_distribution_matches_the_expected_percentages() {
    let options = ExportOptions::default();
    let model = abc_model(&options);
    let analytics = formex_analytics::compute_analytics(&model);
    let formex_analytics::StatsDetail::Frequency(entries) = &analytics.questions[0].detail
    else {
        panic!("expected a frequency distribution");
    };
    assert_eq!(entries.len(), 2);
    assert_eq!((entries[0].label.as_str(), entries[0].count), ("A", 2));
    assert_eq!(entries[0].percentage, "66.67");
    assert_eq!((entries[1].label.as_str(), entries[1].count), ("B", 1));
    assert_eq!(entries[1].percentage, "33.33");
}

#[test]
fn sql_and_bundle_agree_on_the_choice_ordinal() {
    let options = ExportOptions::default();
    let model = abc_model(&options);
    let question = model.form.question("plan").unwrap();

    // The rule itself: B is the second defined choice.
    let response = model.submissions[1].response("plan").unwrap();
    assert_eq!(single_choice_ordinal(question, response), Some(2));

    let sql = export(&model, ExportType::Sql, ArtifactFormat::Sql, &options).unwrap();
    let script = String::from_utf8(sql.bytes).unwrap();
    assert!(script.contains("'s2', 'plan', 'Question', 'B', 2);"));

    let bundle = export(
        &model,
        ExportType::Spss,
        ArtifactFormat::SpssBundle,
        &options,
    )
    .unwrap();
    let syntax = read_zip_part(&bundle.bytes, "import.sps");
    assert!(syntax.contains("/plan 1 'A-text' 2 'B-text' 3 'C-text'"));
    let data = read_zip_part(&bundle.bytes, "data.csv");
    let plan_column: Vec<&str> = data
        .lines()
        .skip(1)
        .map(|line| line.rsplit(',').next().unwrap())
        .collect();
    assert_eq!(plan_column, vec!["1", "2", "1"]);
}

#[test]
fn nonzero_sentinel_never_counts_as_a_selection() {
    let form = RawForm {
        id: "form-top".to_string(),
        title: Some("Topping survey".to_string()),
        created_at: None,
        definition: json!({
            "elements": [
                {"type": "checkbox", "name": "toppings", "title": "Toppings",
                 "choices": ["cheese", "ham", "olive"]}
            ]
        }),
    };
    let mut submission = Submission::new(
        "s1",
        Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap(),
    );
    submission
        .answers
        .insert("toppings".to_string(), json!(["ham"]));
    let options = ExportOptions {
        unselected_checkboxes: -9,
        ..ExportOptions::codes()
    };
    let model = transform(&form, &[submission], &options);

    // One topping selected; the -9 entries are absence markers, not picks.
    let sql = export(&model, ExportType::Sql, ArtifactFormat::Sql, &options).unwrap();
    let script = String::from_utf8(sql.bytes).unwrap();
    assert!(script.contains("'toppings', 'Toppings', 'cheese=-9; ham=2; olive=-9', 1);"));

    let bundle = export(
        &model,
        ExportType::Spss,
        ArtifactFormat::SpssBundle,
        &options,
    )
    .unwrap();
    let data = read_zip_part(&bundle.bytes, "data.csv");
    let row = data.lines().nth(1).unwrap();
    assert!(row.ends_with("completed,0,1,0"), "flag columns in {row}");
}

#[test]
fn sql_script_emits_schema_before_inserts() {
    let options = ExportOptions::default();
    let artifact = export(
        &abc_model(&options),
        ExportType::Sql,
        ArtifactFormat::Sql,
        &options,
    )
    .unwrap();
    let script = String::from_utf8(artifact.bytes).unwrap();

    let schema_at = script.find("CREATE TABLE forms").unwrap();
    let index_at = script.find("CREATE INDEX").unwrap();
    let insert_at = script.find("INSERT INTO forms").unwrap();
    assert!(schema_at < index_at && index_at < insert_at);
    assert_eq!(script.matches("INSERT INTO submissions").count(), 3);
    assert_eq!(script.matches("INSERT INTO responses").count(), 3);
}

#[test]
fn every_analytics_format_renders_from_one_model() {
    let options = ExportOptions::default();
    let model = abc_model(&options);
    for format in [
        ArtifactFormat::Pptx,
        ArtifactFormat::Docx,
        ArtifactFormat::Xlsx,
        ArtifactFormat::Pdf,
    ] {
        let artifact = export(&model, ExportType::Analytics, format, &options).unwrap();
        assert!(!artifact.bytes.is_empty(), "{format} produced bytes");
        assert_eq!(artifact.mime_type, format.mime_type());
    }
}

#[test]
fn unsupported_format_pairs_are_rejected() {
    let options = ExportOptions::default();
    let model = abc_model(&options);
    assert!(export(&model, ExportType::Raw, ArtifactFormat::Sql, &options).is_err());
    assert!(export(&model, ExportType::Sql, ArtifactFormat::Csv, &options).is_err());
}

#[test]
fn bundle_readme_names_all_three_parts() {
    let options = ExportOptions::default();
    let bundle = export(
        &abc_model(&options),
        ExportType::Spss,
        ArtifactFormat::SpssBundle,
        &options,
    )
    .unwrap();
    let readme = read_zip_part(&bundle.bytes, "README.txt");
    insta::assert_snapshot!(readme, @r#"
    Survey export bundle for "Plan survey"

    Contents:
    - import.sps: import syntax declaring the data shape, variable and
       value labels, missing-value codes, and baseline statistics.
    - data.csv: flat data, one row per submission, columns in declared
       variable order, first row is the header.
    - README.txt: this note.

    Usage: place both files in the same directory and run import.sps
    from your statistical package. Unanswered questions are empty cells;
    the numeric missing code is -9.
    "#);
}
