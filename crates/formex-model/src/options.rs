use serde::{Deserialize, Serialize};

/// Caller-selectable knobs shared by the transformer and the exporters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Map single-choice/matrix answers to their 1-based ordinal code.
    pub display_answer_codes: bool,
    /// Map single-choice/multi-choice answers to their display text.
    /// Mutually exclusive with `display_answer_codes`; codes win when both
    /// are set.
    pub display_answer_values: bool,
    /// Fill a type-appropriate empty placeholder for questions a respondent
    /// never saw, instead of omitting the response.
    pub show_not_displayed: bool,
    /// Sentinel written for unselected checkbox choices under code display.
    pub unselected_checkboxes: i64,
    /// Use raw question/choice codes as tabular column headers instead of
    /// human titles.
    pub question_codes: bool,
    /// Emit the export-run metadata sheet in spreadsheet output.
    pub report_labels: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            display_answer_codes: false,
            display_answer_values: false,
            show_not_displayed: false,
            unselected_checkboxes: 0,
            question_codes: false,
            report_labels: false,
        }
    }
}

impl ExportOptions {
    /// Options preset that renders answer display text everywhere.
    pub fn values() -> Self {
        Self {
            display_answer_values: true,
            ..Self::default()
        }
    }

    /// Options preset that renders ordinal codes everywhere.
    pub fn codes() -> Self {
        Self {
            display_answer_codes: true,
            ..Self::default()
        }
    }
}
