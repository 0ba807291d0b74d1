//! SpreadsheetML workbook writer.
//!
//! Produces a minimal `.xlsx` package: inline strings only (no shared-string
//! table), one style for bold headers, optional frozen header row and
//! auto-filter per sheet.

use crate::error::{OoxmlError, Result};
use crate::package::{xml_escape, Package};

/// Excel caps sheet names at 31 characters.
pub const SHEET_NAME_MAX: usize = 31;

/// One worksheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn number(value: f64) -> Self {
        Cell::Number(value)
    }
}

/// One worksheet: a name plus rows of cells.
#[derive(Debug, Clone)]
pub struct Sheet {
    name: String,
    rows: Vec<Vec<Cell>>,
    freeze_header: bool,
    auto_filter: bool,
}

impl Sheet {
    /// Create a sheet; the name is sanitized to Excel's rules.
    pub fn new(name: &str) -> Self {
        Self {
            name: sanitize_sheet_name(name),
            rows: Vec::new(),
            freeze_header: false,
            auto_filter: false,
        }
    }

    /// Freeze the first row and render it bold.
    pub fn with_frozen_header(mut self) -> Self {
        self.freeze_header = true;
        self
    }

    /// Put an auto-filter over the used range.
    pub fn with_auto_filter(mut self) -> Self {
        self.auto_filter = true;
        self
    }

    pub fn push_row(&mut self, cells: Vec<Cell>) {
        self.rows.push(cells);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// A workbook of one or more sheets.
#[derive(Debug, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sheet, renaming it when the name collides with an earlier one.
    pub fn add_sheet(&mut self, mut sheet: Sheet) {
        sheet.name = self.unique_name(&sheet.name);
        self.sheets.push(sheet);
    }

    fn unique_name(&self, candidate: &str) -> String {
        if !self.sheets.iter().any(|s| s.name == candidate) {
            return candidate.to_string();
        }
        for n in 2.. {
            let suffix = format!(" {n}");
            let base: String = candidate
                .chars()
                .take(SHEET_NAME_MAX - suffix.chars().count())
                .collect();
            let renamed = format!("{base}{suffix}");
            if !self.sheets.iter().any(|s| s.name == renamed) {
                return renamed;
            }
        }
        unreachable!("counter exhausts before names do")
    }

    /// Serialize the workbook into `.xlsx` bytes.
    pub fn write_to_bytes(&self) -> Result<Vec<u8>> {
        if self.sheets.is_empty() {
            return Err(OoxmlError::Empty("workbook has no sheets"));
        }

        let mut pkg = Package::new();
        pkg.add_part("[Content_Types].xml", self.content_types().as_bytes())?;
        pkg.add_part("_rels/.rels", ROOT_RELS.as_bytes())?;
        pkg.add_part("xl/workbook.xml", self.workbook_xml().as_bytes())?;
        pkg.add_part("xl/_rels/workbook.xml.rels", self.workbook_rels().as_bytes())?;
        pkg.add_part("xl/styles.xml", STYLES.as_bytes())?;
        for (idx, sheet) in self.sheets.iter().enumerate() {
            let path = format!("xl/worksheets/sheet{}.xml", idx + 1);
            pkg.add_part(&path, sheet_xml(sheet).as_bytes())?;
        }
        pkg.finish()
    }

    fn content_types(&self) -> String {
        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
             <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
             <Default Extension=\"xml\" ContentType=\"application/xml\"/>\
             <Override PartName=\"/xl/workbook.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml\"/>\
             <Override PartName=\"/xl/styles.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml\"/>",
        );
        for idx in 1..=self.sheets.len() {
            xml.push_str(&format!(
                "<Override PartName=\"/xl/worksheets/sheet{idx}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>"
            ));
        }
        xml.push_str("</Types>");
        xml
    }

    fn workbook_xml(&self) -> String {
        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <workbook xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" \
             xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\"><sheets>",
        );
        for (idx, sheet) in self.sheets.iter().enumerate() {
            xml.push_str(&format!(
                "<sheet name=\"{}\" sheetId=\"{}\" r:id=\"rId{}\"/>",
                xml_escape(&sheet.name),
                idx + 1,
                idx + 1
            ));
        }
        xml.push_str("</sheets></workbook>");
        xml
    }

    fn workbook_rels(&self) -> String {
        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
        );
        for idx in 1..=self.sheets.len() {
            xml.push_str(&format!(
                "<Relationship Id=\"rId{idx}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet\" Target=\"worksheets/sheet{idx}.xml\"/>"
            ));
        }
        xml.push_str(&format!(
            "<Relationship Id=\"rId{}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles\" Target=\"styles.xml\"/>",
            self.sheets.len() + 1
        ));
        xml.push_str("</Relationships>");
        xml
    }
}

const ROOT_RELS: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"xl/workbook.xml\"/>\
</Relationships>";

/// Two cell formats: 0 default, 1 bold (header rows).
const STYLES: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<styleSheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\">\
<fonts count=\"2\"><font><sz val=\"11\"/><name val=\"Calibri\"/></font>\
<font><b/><sz val=\"11\"/><name val=\"Calibri\"/></font></fonts>\
<fills count=\"2\"><fill><patternFill patternType=\"none\"/></fill>\
<fill><patternFill patternType=\"gray125\"/></fill></fills>\
<borders count=\"1\"><border><left/><right/><top/><bottom/><diagonal/></border></borders>\
<cellStyleXfs count=\"1\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\"/></cellStyleXfs>\
<cellXfs count=\"2\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\" xfId=\"0\"/>\
<xf numFmtId=\"0\" fontId=\"1\" fillId=\"0\" borderId=\"0\" xfId=\"0\" applyFont=\"1\"/></cellXfs>\
</styleSheet>";

fn sheet_xml(sheet: &Sheet) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <worksheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\">",
    );
    if sheet.freeze_header {
        xml.push_str(
            "<sheetViews><sheetView workbookViewId=\"0\">\
             <pane ySplit=\"1\" topLeftCell=\"A2\" activePane=\"bottomLeft\" state=\"frozen\"/>\
             </sheetView></sheetViews>",
        );
    }
    xml.push_str("<sheetData>");
    for (row_idx, row) in sheet.rows.iter().enumerate() {
        let row_num = row_idx + 1;
        xml.push_str(&format!("<row r=\"{row_num}\">"));
        for (col_idx, cell) in row.iter().enumerate() {
            let reference = format!("{}{row_num}", column_ref(col_idx));
            let style = if sheet.freeze_header && row_idx == 0 {
                " s=\"1\""
            } else {
                ""
            };
            match cell {
                Cell::Empty => {}
                Cell::Text(text) => xml.push_str(&format!(
                    "<c r=\"{reference}\"{style} t=\"inlineStr\"><is><t xml:space=\"preserve\">{}</t></is></c>",
                    xml_escape(text)
                )),
                Cell::Number(n) => {
                    xml.push_str(&format!("<c r=\"{reference}\"{style}><v>{n}</v></c>"));
                }
            }
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData>");
    if sheet.auto_filter && !sheet.rows.is_empty() && sheet.column_count() > 0 {
        xml.push_str(&format!(
            "<autoFilter ref=\"A1:{}{}\"/>",
            column_ref(sheet.column_count() - 1),
            sheet.rows.len()
        ));
    }
    xml.push_str("</worksheet>");
    xml
}

/// Zero-based column index to its letter reference (`0 -> A`, `26 -> AA`).
fn column_ref(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Clamp a sheet name to Excel's rules: strip illegal characters, cap the
/// length, never empty.
pub fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '\\' | '/' | '?' | '*' | '[' | ']' | ':' => '_',
            other => other,
        })
        .take(SHEET_NAME_MAX)
        .collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        "Sheet".to_string()
    } else {
        trimmed.to_string()
    }
}
