//! Loading and saving the report spreadsheet.
//!
//! The file is read whole into a [`Document`] and written back whole: every
//! worksheet in its original order, with formulas kept as formulas. Cell
//! styles are not carried over.

use std::path::Path;

use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use rust_xlsxwriter::Workbook;
use tracing::{debug, info};

use crate::error::WorkbookError;
use crate::sheet::{Cell, Document, Sheet};

const XLSX_MAX_ROWS: u32 = 1_048_576;
const XLSX_MAX_COLUMNS: u32 = 16_384;

/// Read every worksheet of `path`, or start a one-sheet document if the file does not exist.
pub fn load(path: &Path) -> Result<Document, WorkbookError> {
    if !path.exists() {
        info!(path = %path.display(), "Workbook not found, starting a new one");
        return Ok(Document::default());
    }

    let read_err = |source| WorkbookError::Read {
        path: path.to_path_buf(),
        source,
    };
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(read_err)?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let values = workbook.worksheet_range(&name).map_err(read_err)?;
        let formulas = workbook.worksheet_formula(&name).map_err(read_err)?;
        let sheet = read_sheet(name, &values, &formulas);
        debug!(
            sheet = %sheet.name,
            max_row = sheet.grid.max_row(),
            max_column = sheet.grid.max_column(),
            "Read worksheet"
        );
        sheets.push(sheet);
    }
    let document =
        Document::from_sheets(sheets).ok_or_else(|| WorkbookError::NoWorksheet(path.to_path_buf()))?;

    let active = document.active();
    info!(
        path = %path.display(),
        sheets = document.sheets().count(),
        active = %active.name,
        max_row = active.grid.max_row(),
        max_column = active.grid.max_column(),
        "Loaded workbook"
    );
    Ok(document)
}

fn read_sheet(name: String, values: &Range<Data>, formulas: &Range<String>) -> Sheet {
    let mut sheet = Sheet::new(name);
    if let Some((row0, col0)) = values.start() {
        for (r, c, data) in values.used_cells() {
            let cell = match data {
                Data::Empty => continue,
                Data::Int(i) => Cell::Number(*i as f64),
                Data::Float(f) => Cell::Number(*f),
                Data::String(s) => Cell::Text(s.clone()),
                other => Cell::Text(other.to_string()),
            };
            sheet.grid.set(row0 + r as u32 + 1, col0 + c as u32 + 1, cell);
        }
    }
    // A formula replaces the cached value read at the same address.
    if let Some((row0, col0)) = formulas.start() {
        for (r, c, formula) in formulas.used_cells() {
            sheet.grid.set(
                row0 + r as u32 + 1,
                col0 + c as u32 + 1,
                Cell::Formula(formula.clone()),
            );
        }
    }
    sheet
}

/// Write every sheet of `document` to `path` in order, replacing any existing file.
pub fn save(document: &Document, path: &Path) -> Result<(), WorkbookError> {
    let write_err = |source| WorkbookError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut workbook = Workbook::new();
    for sheet in document.sheets() {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name).map_err(write_err)?;

        for (row, column, cell) in sheet.grid.cells() {
            if row > XLSX_MAX_ROWS || column > XLSX_MAX_COLUMNS {
                return Err(WorkbookError::OutOfRange { row, column });
            }
            let (r, c) = (row - 1, (column - 1) as u16);
            let written = match cell {
                Cell::Text(s) => worksheet.write_string(r, c, s.as_str()),
                Cell::Number(n) => worksheet.write_number(r, c, *n),
                Cell::Formula(f) => worksheet.write_formula(r, c, f.as_str()),
            };
            written.map_err(write_err)?;
        }
        debug!(sheet = %sheet.name, cells = sheet.grid.cells().count(), "Worksheet written");
    }

    workbook.save(path).map_err(write_err)?;
    info!(path = %path.display(), sheets = document.sheets().count(), "Saved workbook");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::BucketRecord;
    use crate::sheet::upsert_bucket_snapshot;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_empty_default_sheet() {
        let dir = tempdir().unwrap();
        let doc = load(&dir.path().join("absent.xlsx")).unwrap();
        assert_eq!(doc.sheets().count(), 1);
        let sheet = doc.active();
        assert_eq!(sheet.name, "Sheet");
        assert!(sheet.grid.is_empty());
        assert_eq!(sheet.grid.max_row(), 0);
        assert_eq!(sheet.grid.max_column(), 0);
    }

    #[test]
    fn saved_sheet_reads_back_with_gaps_preserved() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.xlsx");

        let mut sheet = Sheet::new("Capacity");
        sheet.grid.set(1, 1, "Namespace");
        sheet.grid.set(1, 2, "Bucket");
        sheet.grid.set(1, 4, "02-Oct-2026 (06:00:00)");
        sheet.grid.set(3, 4, 6e9);
        save(&Document::from_sheets([sheet]).unwrap(), &path).unwrap();

        let loaded = load(&path).unwrap();
        let loaded = loaded.active();
        assert_eq!(loaded.name, "Capacity");
        assert_eq!(loaded.grid.max_row(), 3);
        assert_eq!(loaded.grid.max_column(), 4);
        assert_eq!(loaded.grid.get(3, 4), Some(&Cell::Number(6e9)));
        assert_eq!(loaded.grid.get(2, 1), None);
    }

    #[test]
    fn other_sheets_and_formulas_survive_a_merge() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.xlsx");

        let mut book = Workbook::new();
        let data = book.add_worksheet();
        data.set_name("Sheet1").unwrap();
        data.write_string(0, 0, "Namespace").unwrap();
        data.write_string(0, 1, "Bucket").unwrap();
        data.write_string(0, 2, "t1").unwrap();
        data.write_string(1, 0, "ns1").unwrap();
        data.write_string(1, 1, "b1").unwrap();
        data.write_number(1, 2, 5.0).unwrap();
        data.write_string(2, 0, "ns1").unwrap();
        data.write_string(2, 1, "b2").unwrap();
        data.write_number(2, 2, 7.0).unwrap();
        data.write_formula(5, 2, "=SUM(C2:C3)").unwrap();
        let notes = book.add_worksheet();
        notes.set_name("Notes").unwrap();
        notes.write_string(0, 0, "keep me").unwrap();
        book.save(&path).unwrap();

        let mut doc = load(&path).unwrap();
        let record = BucketRecord {
            namespace: "ns1".to_string(),
            bucket_name: "b1".to_string(),
            total_objects: 1,
            total_size: 6.0,
        };
        let outcome = upsert_bucket_snapshot(&mut doc.active_mut().grid, &[record], "t2");
        assert_eq!(outcome.updated_rows, 1);
        save(&doc, &path).unwrap();

        let reloaded = load(&path).unwrap();
        let names: Vec<&str> = reloaded.sheets().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Sheet1", "Notes"]);

        let notes = reloaded.sheet("Notes").expect("Notes sheet kept");
        assert_eq!(notes.grid.get(1, 1), Some(&Cell::Text("keep me".into())));
        assert_eq!(notes.grid.max_column(), 1);

        let active = reloaded.active();
        match active.grid.get(6, 3) {
            Some(Cell::Formula(f)) => assert!(f.contains("SUM(C2:C3)"), "formula was {f}"),
            other => panic!("expected the formula to survive, got {other:?}"),
        }
        assert_eq!(active.grid.get(2, 4), Some(&Cell::Number(6.0)));
        assert_eq!(active.grid.get(1, 4), Some(&Cell::Text("t2".into())));
    }

    #[test]
    fn garbage_file_is_a_read_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"not a zip archive").unwrap();
        assert!(matches!(load(&path), Err(WorkbookError::Read { .. })));
    }
}
