use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use formex_model::JobStatus;

use crate::types::ExportRunResult;

pub fn print_summary(result: &ExportRunResult) {
    println!("Form: {} ({})", result.form_title, result.form_id);
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Export"),
        header_cell("Format"),
        header_cell("Questions"),
        header_cell("Submissions"),
        header_cell("Status"),
        header_cell("Artifact"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Center);
    table.add_row(vec![
        Cell::new(result.export_type.as_str())
            .fg(Color::Blue)
            .add_attribute(Attribute::Bold),
        Cell::new(result.format.as_str()),
        Cell::new(result.question_count),
        Cell::new(result.submission_count),
        status_cell(result.status),
        artifact_cell(result.file_location.as_deref()),
    ]);
    println!("{table}");
    println!("Finished in {} ms", result.duration_ms);
    if let Some(error) = &result.error_message {
        eprintln!("Error: {error}");
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn status_cell(status: JobStatus) -> Cell {
    match status {
        JobStatus::Completed => Cell::new("completed")
            .fg(Color::Green)
            .add_attribute(Attribute::Bold),
        JobStatus::Failed => Cell::new("failed")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        other => Cell::new(other.as_str()).fg(Color::Yellow),
    }
}

fn artifact_cell(location: Option<&str>) -> Cell {
    match location {
        Some(path) => Cell::new(path).fg(Color::Green),
        None => dim_cell("-"),
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
