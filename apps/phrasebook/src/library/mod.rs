//! The phrase library: one spreadsheet file, one sheet per section plus `Master`.
//!
//! The workbook is held in memory as typed cells and rewritten whole on
//! `save`. Numbers, booleans, dates and formulas already in the file are
//! written back as what they were. Only one process may have the file open
//! for writing at a time; nothing here locks it.

pub mod setup;
pub mod styles;

use std::path::{Path, PathBuf};

use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use rust_xlsxwriter::{ColNum, Format, Formula, RowNum, Workbook, Worksheet, XlsxError};
use tracing::{debug, info, warn};

use crate::errors::PipelineError;
use crate::models::phrase::PhraseRecord;
use crate::schema::{self, COLUMNS, MAX_CONTENT_LENGTH};

/// One cell as loaded from (or destined for) the file.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Excel serial date/time.
    DateTime(f64),
    /// Formula without the leading `=`, with the value last computed for it.
    Formula { formula: String, cached: String },
}

impl Cell {
    /// The cell as text, the way the Record Assembler reads it.
    pub fn text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) | Cell::DateTime(n) => number_text(*n),
            Cell::Bool(b) => b.to_string().to_uppercase(),
            Cell::Formula { cached, .. } => cached.clone(),
        }
    }

    fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value)
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Float(f) => Cell::Number(*f),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(dt) => Cell::DateTime(dt.as_f64()),
            // ISO date/duration strings and error values
            other => Cell::Text(other.to_string()),
        }
    }
}

/// Whole numbers print without a fraction, so a rating cell reads as `2`.
fn number_text(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    /// Header row first. Never ends in a blank row.
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    fn with_header(name: &str) -> Self {
        Self {
            name: name.to_string(),
            rows: vec![COLUMNS.iter().map(|c| Cell::Text(c.to_string())).collect()],
        }
    }

    pub fn header(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|row| row.iter().map(Cell::text).collect())
            .unwrap_or_default()
    }

    /// Data rows, header excluded.
    #[cfg(test)]
    pub fn data_rows(&self) -> &[Vec<Cell>] {
        self.rows.get(1..).unwrap_or_default()
    }

    /// Zero-based index of the row an append writes first.
    pub fn next_row(&self) -> usize {
        self.rows.len()
    }
}

pub struct Library {
    path: PathBuf,
    sheets: Vec<Sheet>,
}

impl Library {
    /// A fresh, unsaved library with `Master` and every section sheet.
    pub fn create(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            sheets: schema::all_sheets().map(Sheet::with_header).collect(),
        }
    }

    /// Loads every sheet of an existing library file, values and formulas.
    pub fn open(path: &Path) -> Result<Self, PipelineError> {
        if !path.exists() {
            return Err(PipelineError::DatabaseNotInitialized {
                path: path.to_path_buf(),
            });
        }

        let mut workbook: Xlsx<_> = open_workbook(path)?;
        let mut sheets = Vec::new();
        for name in workbook.sheet_names().to_vec() {
            let values = workbook.worksheet_range(&name)?;
            let formulas = workbook.worksheet_formula(&name)?;
            sheets.push(Sheet {
                rows: load_rows(&values, &formulas),
                name,
            });
        }

        debug!(path = %path.display(), sheets = sheets.len(), "Library loaded");
        Ok(Self {
            path: path.to_path_buf(),
            sheets,
        })
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    fn sheet_mut_or_create(&mut self, name: &str) -> &mut Sheet {
        let idx = match self.sheets.iter().position(|s| s.name == name) {
            Some(idx) => idx,
            None => {
                info!(sheet = name, "Creating missing sheet");
                self.sheets.push(Sheet::with_header(name));
                self.sheets.len() - 1
            }
        };
        let sheet = &mut self.sheets[idx];
        if sheet.rows.is_empty() {
            *sheet = Sheet::with_header(name);
        }
        sheet
    }

    /// Appends records below the last populated row of `sheet_name`, laying
    /// each one out under that sheet's own header. Returns the first row written.
    pub fn append(&mut self, sheet_name: &str, records: &[PhraseRecord]) -> usize {
        let sheet = self.sheet_mut_or_create(sheet_name);
        let start = sheet.next_row();
        let header = sheet.header();

        for record in records {
            let row = header
                .iter()
                .map(|column| {
                    let value = record.field(column);
                    if column == "Content" {
                        Cell::from(truncate_cell(value, &record.source_file))
                    } else {
                        Cell::from(value)
                    }
                })
                .collect();
            sheet.rows.push(row);
        }
        start
    }

    /// Appends each record to the sheet named by its `Section`, preserving
    /// first-seen sheet order. Returns `(sheet, rows appended)` per sheet.
    pub fn append_by_section(&mut self, records: &[PhraseRecord]) -> Vec<(String, usize)> {
        group_by_section(records)
            .into_iter()
            .map(|(sheet, group)| {
                self.append(&sheet, &group);
                (sheet, group.len())
            })
            .collect()
    }

    /// Reads a sheet's data rows back through the Record Assembler.
    #[cfg(test)]
    pub fn records(&self, sheet_name: &str) -> Vec<crate::models::phrase::Assembled> {
        let Some(sheet) = self.sheet(sheet_name) else {
            return Vec::new();
        };
        let header = sheet.header();
        sheet
            .data_rows()
            .iter()
            .map(|row| {
                let cells: Vec<String> = row.iter().map(Cell::text).collect();
                PhraseRecord::from_row(&header, &cells)
            })
            .collect()
    }

    /// Rewrites the whole file, re-applying header styling and validation.
    pub fn save(&self) -> Result<(), PipelineError> {
        let mut workbook = Workbook::new();
        let header_format = styles::header_format();
        let date_format = styles::date_format();

        for sheet in &self.sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(&sheet.name)?;

            for (row_idx, row) in sheet.rows.iter().enumerate() {
                let row_num = styles::row_num(row_idx)?;
                for (col_idx, cell) in row.iter().enumerate() {
                    let col_num = styles::col_num(col_idx)?;
                    match cell {
                        Cell::Text(value) if row_idx == 0 => {
                            worksheet.write_string_with_format(row_num, col_num, value, &header_format)?;
                        }
                        _ => write_cell(worksheet, row_num, col_num, cell, &date_format)?,
                    }
                }
            }

            styles::apply_layout(worksheet, &sheet.header())?;
        }

        let buffer = workbook.save_to_buffer()?;
        std::fs::write(&self.path, buffer)?;
        debug!(path = %self.path.display(), "Library saved");
        Ok(())
    }
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: RowNum,
    col: ColNum,
    cell: &Cell,
    date_format: &Format,
) -> Result<(), XlsxError> {
    match cell {
        Cell::Empty => {}
        Cell::Text(value) => {
            worksheet.write_string(row, col, value)?;
        }
        Cell::Number(value) => {
            worksheet.write_number(row, col, *value)?;
        }
        Cell::Bool(value) => {
            worksheet.write_boolean(row, col, *value)?;
        }
        Cell::DateTime(serial) => {
            worksheet.write_number_with_format(row, col, *serial, date_format)?;
        }
        Cell::Formula { formula, cached } => {
            worksheet.write_formula(row, col, Formula::new(formula).set_result(cached))?;
        }
    }
    Ok(())
}

/// Groups records by `Section` in first-seen order.
pub fn group_by_section(records: &[PhraseRecord]) -> Vec<(String, Vec<PhraseRecord>)> {
    let mut groups: Vec<(String, Vec<PhraseRecord>)> = Vec::new();
    for record in records {
        match groups.iter_mut().find(|(name, _)| *name == record.section) {
            Some((_, group)) => group.push(record.clone()),
            None => groups.push((record.section.clone(), vec![record.clone()])),
        }
    }
    groups
}

/// Lays calamine's value and formula ranges onto one grid anchored at A1.
/// A formula replaces the value at its position and keeps it as the cached
/// result. Trailing rows that are entirely blank are dropped.
fn load_rows(values: &Range<Data>, formulas: &Range<String>) -> Vec<Vec<Cell>> {
    let mut rows: Vec<Vec<Cell>> = Vec::new();

    if let Some((row0, col0)) = values.start() {
        for (r, c, data) in values.used_cells() {
            place(&mut rows, row0 as usize + r, col0 as usize + c, Cell::from(data));
        }
    }
    if let Some((row0, col0)) = formulas.start() {
        for (r, c, formula) in formulas.used_cells() {
            let (row, col) = (row0 as usize + r, col0 as usize + c);
            let cached = rows
                .get(row)
                .and_then(|cells| cells.get(col))
                .map(Cell::text)
                .unwrap_or_default();
            let formula = formula.trim_start_matches('=').to_string();
            place(&mut rows, row, col, Cell::Formula { formula, cached });
        }
    }

    while rows
        .last()
        .is_some_and(|row| row.iter().all(Cell::is_blank))
    {
        rows.pop();
    }
    rows
}

fn place(rows: &mut Vec<Vec<Cell>>, row: usize, col: usize, cell: Cell) {
    if rows.len() <= row {
        rows.resize_with(row + 1, Vec::new);
    }
    let cells = &mut rows[row];
    if cells.len() <= col {
        cells.resize(col + 1, Cell::Empty);
    }
    cells[col] = cell;
}

fn truncate_cell(value: String, source_file: &str) -> String {
    if value.chars().count() <= MAX_CONTENT_LENGTH {
        return value;
    }
    warn!(
        source_file,
        limit = MAX_CONTENT_LENGTH,
        "Content exceeds the cell limit and was truncated"
    );
    value.chars().take(MAX_CONTENT_LENGTH).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::phrase::{ConditionRating, PropertyAge, PropertyStyle};
    use crate::schema::MASTER_SHEET;

    fn record(section: &str, content: &str) -> PhraseRecord {
        PhraseRecord::harvested(section, "Roof", content, "Fast Texts.docx")
    }

    fn texts(row: &[Cell]) -> Vec<String> {
        row.iter().map(Cell::text).collect()
    }

    #[test]
    fn test_open_missing_file_is_not_initialized() {
        let dir = tempfile::tempdir().unwrap();
        let err = Library::open(&dir.path().join("missing.xlsx")).err().unwrap();
        assert!(matches!(err, PipelineError::DatabaseNotInitialized { .. }));
    }

    #[test]
    fn test_create_has_master_and_sections_with_headers() {
        let library = Library::create(Path::new("unused.xlsx"));
        assert_eq!(library.sheet_names()[0], MASTER_SHEET);
        for name in library.sheet_names() {
            let sheet = library.sheet(name).unwrap();
            assert_eq!(sheet.header(), COLUMNS.map(String::from).to_vec());
            assert_eq!(sheet.next_row(), 1);
        }
    }

    #[test]
    fn test_append_then_read_back_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("library.xlsx");
        Library::create(&path).save().unwrap();

        let mut rated = record(MASTER_SHEET, "The chimney stack leans noticeably.");
        rated.condition_rating = Some(ConditionRating::Poor);
        rated.property_style = Some(PropertyStyle::Terrace);
        rated.property_age = Some(PropertyAge::From1900To1918);
        rated.property_type = None;
        let written = vec![
            record(MASTER_SHEET, "The roof covering is in good condition."),
            rated,
            record(MASTER_SHEET, "Mortar joints show wear."),
        ];

        let mut library = Library::open(&path).unwrap();
        assert_eq!(library.append(MASTER_SHEET, &written), 1);
        library.save().unwrap();

        let reopened = Library::open(&path).unwrap();
        let read: Vec<_> = reopened
            .records(MASTER_SHEET)
            .into_iter()
            .map(|a| a.record)
            .collect();
        assert_eq!(read, written);
    }

    #[test]
    fn test_append_keeps_typed_cells_already_in_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("library.xlsx");

        // A sheet edited by hand: the rating picked from the dropdown is a
        // number, Source_File holds a formula.
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(MASTER_SHEET).unwrap();
        for (col, column) in COLUMNS.iter().enumerate() {
            worksheet.write_string(0, col as ColNum, *column).unwrap();
        }
        worksheet.write_string(1, 3, "Gutters are blocked with debris.").unwrap();
        worksheet.write_number(1, 4, 2.0).unwrap();
        worksheet.write_boolean(1, 5, true).unwrap();
        worksheet.write_formula(1, 8, "=LEN(D2)").unwrap();
        workbook.save(&path).unwrap();

        let mut library = Library::open(&path).unwrap();
        library.append(MASTER_SHEET, &[record(MASTER_SHEET, "Downpipes are cracked.")]);
        library.save().unwrap();

        let reopened = Library::open(&path).unwrap();
        let rows = &reopened.sheet(MASTER_SHEET).unwrap().rows;
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1][4], Cell::Number(2.0));
        assert_eq!(rows[1][5], Cell::Bool(true));
        assert!(
            matches!(&rows[1][8], Cell::Formula { formula, .. } if formula == "LEN(D2)"),
            "{:?}",
            rows[1][8]
        );
        assert_eq!(rows[2][3], Cell::Text("Downpipes are cracked.".to_string()));

        // The numeric rating still reads as an in-domain value.
        let first = &reopened.records(MASTER_SHEET)[0];
        assert_eq!(first.record.condition_rating, Some(ConditionRating::Fair));
    }

    #[test]
    fn test_second_append_lands_after_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("library.xlsx");
        Library::create(&path).save().unwrap();

        let mut library = Library::open(&path).unwrap();
        library.append("Section_D_External", &[record("Section_D_External", "First phrase here.")]);
        library.save().unwrap();

        let mut library = Library::open(&path).unwrap();
        let start = library.append(
            "Section_D_External",
            &[record("Section_D_External", "Second phrase here.")],
        );
        assert_eq!(start, 2);
        library.save().unwrap();

        let contents: Vec<_> = Library::open(&path)
            .unwrap()
            .records("Section_D_External")
            .into_iter()
            .map(|a| a.record.content)
            .collect();
        assert_eq!(contents, vec!["First phrase here.", "Second phrase here."]);
        // Untouched sheets stay header-only.
        let reopened = Library::open(&path).unwrap();
        assert_eq!(reopened.sheet("Section_E_Internal").unwrap().next_row(), 1);
    }

    #[test]
    fn test_append_creates_missing_sheet_with_header() {
        let mut library = Library::create(Path::new("unused.xlsx"));
        library.append("Overflow", &[record("Overflow", "Some phrase text.")]);
        let sheet = library.sheet("Overflow").unwrap();
        assert_eq!(sheet.header()[0], "Section");
        assert_eq!(sheet.data_rows().len(), 1);
    }

    #[test]
    fn test_append_aligns_to_existing_header_order() {
        let mut library = Library::create(Path::new("unused.xlsx"));
        library.sheets.push(Sheet {
            name: "Custom".to_string(),
            rows: vec![vec![
                Cell::Text("Content".to_string()),
                Cell::Text("Element".to_string()),
            ]],
        });
        library.append("Custom", &[record("Custom", "Flashings are loose.")]);
        let sheet = library.sheet("Custom").unwrap();
        assert_eq!(texts(&sheet.data_rows()[0]), vec!["Flashings are loose.", "Roof"]);
    }

    #[test]
    fn test_append_by_section_groups_in_first_seen_order() {
        let mut library = Library::create(Path::new("unused.xlsx"));
        let counts = library.append_by_section(&[
            record("Section_G_Grounds", "Fences are leaning."),
            record("Section_D_External", "Render is cracked."),
            record("Section_G_Grounds", "Paths are uneven."),
        ]);
        assert_eq!(
            counts,
            vec![
                ("Section_G_Grounds".to_string(), 2),
                ("Section_D_External".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_load_rows_drops_trailing_blank_rows() {
        let mut range = Range::new((0, 0), (2, 1));
        range.set_value((0, 0), Data::String("Section".to_string()));
        range.set_value((1, 0), Data::Float(2.0));
        let rows = load_rows(&range, &Range::empty());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][0], Cell::Number(2.0));
        assert_eq!(rows[1][0].text(), "2");
    }

    #[test]
    fn test_load_rows_anchors_offset_ranges_at_a1() {
        let mut range = Range::new((1, 1), (1, 1));
        range.set_value((1, 1), Data::String("x".to_string()));
        let rows = load_rows(&range, &Range::empty());
        assert_eq!(rows.len(), 2);
        assert_eq!(texts(&rows[1]), vec!["".to_string(), "x".to_string()]);
    }

    #[test]
    fn test_load_rows_overlays_formulas_on_values() {
        let mut values = Range::new((1, 0), (1, 1));
        values.set_value((1, 0), Data::Float(1.5));
        values.set_value((1, 1), Data::Float(3.0));
        let mut formulas = Range::new((1, 1), (1, 1));
        formulas.set_value((1, 1), "A2*2".to_string());

        let rows = load_rows(&values, &formulas);
        assert_eq!(rows[1][0], Cell::Number(1.5));
        assert_eq!(
            rows[1][1],
            Cell::Formula {
                formula: "A2*2".to_string(),
                cached: "3".to_string()
            }
        );
    }

    #[test]
    fn test_overlong_content_is_truncated() {
        let mut library = Library::create(Path::new("unused.xlsx"));
        let long = "a".repeat(MAX_CONTENT_LENGTH + 10);
        library.append(MASTER_SHEET, &[record(MASTER_SHEET, &long)]);
        let row = &library.sheet(MASTER_SHEET).unwrap().data_rows()[0];
        let content_idx = schema::column_index("Content").unwrap();
        assert_eq!(row[content_idx].text().chars().count(), MAX_CONTENT_LENGTH);
    }
}
