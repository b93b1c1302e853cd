//! Workbook loading: file bytes → fingerprint + Table + indices

use super::{CacheEntry, Fingerprint};
use crate::error::{RosterError, RosterResult};
use crate::index::TableIndexBuilder;
use crate::types::Table;
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Result of reading one sheet out of a workbook.
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(CacheEntry),
    /// The workbook opened but has no such sheet; carries the fingerprint of
    /// the bytes that were checked.
    SheetMissing(Fingerprint),
}

/// Read `path` once, fingerprint those bytes and parse `sheet` from them.
///
/// Blocking; callers on the async runtime go through `spawn_blocking`.
pub fn load_sheet(path: &Path, sheet: &str) -> RosterResult<LoadOutcome> {
    let modified = fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| RosterError::file_unavailable(path, e))?;
    let bytes = fs::read(path).map_err(|e| RosterError::file_unavailable(path, e))?;
    let fingerprint = Fingerprint::from_bytes(modified, &bytes);

    let table = match parse_sheet(path, bytes, sheet) {
        Ok(table) => table,
        Err(RosterError::SheetNotFound { .. }) => return Ok(LoadOutcome::SheetMissing(fingerprint)),
        Err(e) => return Err(e),
    };
    let index = TableIndexBuilder::new(&table).build();

    Ok(LoadOutcome::Loaded(CacheEntry {
        table: Arc::new(table),
        index,
        fingerprint,
        loaded_at: Instant::now(),
    }))
}

/// Like `load_sheet`, with a missing sheet reported as `SheetNotFound`.
pub fn load_entry(path: &Path, sheet: &str) -> RosterResult<CacheEntry> {
    match load_sheet(path, sheet)? {
        LoadOutcome::Loaded(entry) => Ok(entry),
        LoadOutcome::SheetMissing(_) => Err(RosterError::SheetNotFound {
            path: path.to_path_buf(),
            sheet: sheet.to_string(),
        }),
    }
}

/// Parse one sheet of an in-memory workbook (format auto-detected).
pub fn parse_sheet(path: &Path, bytes: Vec<u8>, sheet: &str) -> RosterResult<Table> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| RosterError::file_unavailable(path, format!("Failed to open workbook: {}", e)))?;

    if !workbook.sheet_names().iter().any(|name| name == sheet) {
        return Err(RosterError::SheetNotFound {
            path: path.to_path_buf(),
            sheet: sheet.to_string(),
        });
    }

    let range = workbook
        .worksheet_range(sheet)
        .map_err(|e| RosterError::file_unavailable(path, format!("Failed to read sheet '{}': {}", sheet, e)))?;

    Ok(table_from_range(sheet, &range))
}

/// Materialize a calamine range into absolute sheet coordinates.
pub fn table_from_range(sheet: &str, range: &Range<Data>) -> Table {
    let Some((start_row, start_col)) = range.start() else {
        return Table::new(sheet, Vec::new());
    };
    let (start_row, start_col) = (start_row as usize, start_col as usize);
    let height = start_row + range.height();
    let width = start_col + range.width();

    let mut rows = vec![vec![None; width]; height];
    for (row, col, cell) in range.cells() {
        rows[start_row + row][start_col + col] = cell_text(cell);
    }
    Table::new(sheet, rows)
}

/// Text form of a cell; integral floats lose their fractional part so day
/// headers typed as numbers read as `"1"`, not `"1.0"`.
fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty => return None,
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_text_conversions() {
        assert_eq!(cell_text(&Data::Empty), None);
        assert_eq!(cell_text(&Data::String(String::new())), None);
        assert_eq!(cell_text(&Data::String("В".to_string())), Some("В".to_string()));
        assert_eq!(cell_text(&Data::Float(1.0)), Some("1".to_string()));
        assert_eq!(cell_text(&Data::Float(0.5)), Some("0.5".to_string()));
        assert_eq!(cell_text(&Data::Int(31)), Some("31".to_string()));
    }

    #[test]
    fn test_table_from_range_keeps_offsets() {
        let mut range: Range<Data> = Range::new((1, 2), (2, 3));
        range.set_value((1, 2), Data::String("ИЮЛЬ".to_string()));
        range.set_value((2, 3), Data::Float(2.0));

        let table = table_from_range("ГРАФИК", &range);
        assert_eq!(table.height(), 3);
        assert_eq!(table.width(), 4);
        assert_eq!(table.cell(1, 2), "ИЮЛЬ");
        assert_eq!(table.cell(2, 3), "2");
        assert_eq!(table.cell(0, 0), "");
    }

    #[test]
    fn test_table_from_empty_range() {
        let range: Range<Data> = Range::empty();
        let table = table_from_range("ГРАФИК", &range);
        assert!(table.is_empty());
        assert_eq!(table.sheet_name(), "ГРАФИК");
    }

    #[test]
    fn test_load_sheet_reports_missing_sheet_with_fingerprint() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("duty.xlsx");
        let mut workbook = rust_xlsxwriter::Workbook::new();
        workbook
            .add_worksheet()
            .set_name("Дежурство Июль")
            .unwrap()
            .write_string(0, 0, "ФИО")
            .unwrap();
        workbook.save(&path).unwrap();

        match load_sheet(&path, "Дежурство Август").unwrap() {
            LoadOutcome::SheetMissing(fingerprint) => {
                let current = Fingerprint::probe(&path, true).unwrap();
                assert!(fingerprint.matches(&current));
            }
            LoadOutcome::Loaded(_) => panic!("expected a missing sheet"),
        }
        assert!(matches!(
            load_entry(&path, "Дежурство Август"),
            Err(RosterError::SheetNotFound { .. })
        ));
        assert!(matches!(
            load_sheet(&path, "Дежурство Июль").unwrap(),
            LoadOutcome::Loaded(_)
        ));
    }

    #[test]
    fn test_parse_sheet_rejects_garbage() {
        let result = parse_sheet(Path::new("junk.xlsx"), b"not a workbook".to_vec(), "ГРАФИК");
        assert!(matches!(result, Err(RosterError::FileUnavailable { .. })));
    }
}
