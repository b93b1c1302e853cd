//! Row and column indices over a loaded sheet
//!
//! Built once per cache entry:
//! - `NameIndex`: normalized full name → topmost row
//! - `DateIndex`: (month, day) → column, plus the month sections

use crate::header::{
    find_name_cell, normalize_name, parse_day_marker, Month, HEADER_SCAN_ROWS, NAME_SCAN_COLUMNS,
};
use crate::types::Table;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

//==============================================================================
// Name Index
//==============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NameIndex {
    rows: HashMap<String, usize>,
}

impl NameIndex {
    /// Row of `name`; the lookup is case and spacing insensitive.
    pub fn get(&self, name: &str) -> Option<usize> {
        self.rows.get(&normalize_name(name)).copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Record `name` at `row` unless an earlier row already holds it.
    fn insert_first(&mut self, name: &str, row: usize) {
        self.rows.entry(normalize_name(name)).or_insert(row);
    }
}

//==============================================================================
// Date Index
//==============================================================================

/// Contiguous, inclusive column range belonging to one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthSection {
    pub month: Month,
    pub start: usize,
    pub end: usize,
}

impl MonthSection {
    pub fn contains(&self, col: usize) -> bool {
        col >= self.start && col <= self.end
    }
}

/// A day header column inside a month section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayColumn {
    pub day: u8,
    pub label: String,
    pub column: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DateIndex {
    sections: Vec<MonthSection>,
    columns: HashMap<(Month, u8), usize>,
    days: HashMap<Month, Vec<DayColumn>>,
}

impl DateIndex {
    pub fn column(&self, month: Month, day: u8) -> Option<usize> {
        self.columns.get(&(month, day)).copied()
    }

    pub fn section(&self, month: Month) -> Option<&MonthSection> {
        self.sections.iter().find(|s| s.month == month)
    }

    pub fn sections(&self) -> &[MonthSection] {
        &self.sections
    }

    /// Day columns of `month` in column order; empty when the month has none.
    pub fn days(&self, month: Month) -> &[DayColumn] {
        self.days.get(&month).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All `((month, day), column)` pairs.
    pub fn entries(&self) -> impl Iterator<Item = ((Month, u8), usize)> + '_ {
        self.columns.iter().map(|(k, v)| (*k, *v))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

//==============================================================================
// Builder
//==============================================================================

/// Both indices of one sheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableIndex {
    pub names: NameIndex,
    pub dates: DateIndex,
}

/// Builds the indices of a freshly loaded table.
pub struct TableIndexBuilder<'a> {
    table: &'a Table,
    sheet_month: Option<Month>,
}

impl<'a> TableIndexBuilder<'a> {
    pub fn new(table: &'a Table) -> Self {
        Self {
            table,
            sheet_month: Month::detect(table.sheet_name()),
        }
    }

    /// Month assumed for the whole sheet when its header has no month marker.
    /// Defaults to the month named in the sheet name, if any.
    pub fn with_sheet_month(mut self, month: Option<Month>) -> Self {
        self.sheet_month = month;
        self
    }

    pub fn build(self) -> TableIndex {
        TableIndex {
            names: Self::build_name_index(self.table),
            dates: Self::build_date_index(self.table, self.sheet_month),
        }
    }

    /// Map every validated full name to the topmost row holding it.
    pub fn build_name_index(table: &Table) -> NameIndex {
        let mut index = NameIndex::default();
        for row in 0..table.height() {
            let cells = (0..NAME_SCAN_COLUMNS).map(|col| table.cell(row, col));
            if let Some((_, name)) = find_name_cell(cells) {
                index.insert_first(name, row);
            }
        }
        index
    }

    /// Locate month sections and their day columns in the header rows.
    ///
    /// Header rows are the top rows above the first named row. Day markers
    /// are read from a single row, the header row holding the most of them,
    /// so data cells never pass for day headers.
    pub fn build_date_index(table: &Table, sheet_month: Option<Month>) -> DateIndex {
        let width = table.width();
        if width == 0 {
            return DateIndex::default();
        }
        let header_rows = header_row_limit(table);
        let day_row = day_header_row(table, header_rows);

        // One marker per column, first occurrence per month
        let mut markers: Vec<(usize, Month)> = Vec::new();
        let mut seen = HashSet::new();
        for col in 0..width {
            for row in 0..header_rows {
                if let Some(month) = Month::detect(table.cell(row, col)) {
                    if seen.insert(month) {
                        markers.push((col, month));
                    }
                    break;
                }
            }
        }
        if markers.is_empty() {
            if let Some(month) = sheet_month {
                markers.push((0, month));
            }
        }

        let sections: Vec<MonthSection> = markers
            .iter()
            .enumerate()
            .map(|(i, &(start, month))| {
                let end = markers
                    .get(i + 1)
                    .map(|&(next, _)| next - 1)
                    .unwrap_or(width - 1);
                MonthSection { month, start, end }
            })
            .collect();

        let mut columns = HashMap::new();
        let mut days: HashMap<Month, Vec<DayColumn>> = HashMap::new();
        for section in &sections {
            let month_days = days.entry(section.month).or_default();
            for col in section.start..=section.end {
                let marker = day_row.and_then(|row| parse_day_marker(table.cell(row, col)));
                if let Some(marker) = marker {
                    if columns.contains_key(&(section.month, marker.day)) {
                        continue;
                    }
                    columns.insert((section.month, marker.day), col);
                    month_days.push(DayColumn {
                        day: marker.day,
                        label: marker.label(),
                        column: col,
                    });
                }
            }
        }

        DateIndex {
            sections,
            columns,
            days,
        }
    }
}

/// Number of leading rows that may hold headers: up to `HEADER_SCAN_ROWS`,
/// stopping at the first row that carries a person's name.
fn header_row_limit(table: &Table) -> usize {
    let scan = table.height().min(HEADER_SCAN_ROWS);
    (0..scan)
        .find(|&row| {
            let cells = (0..NAME_SCAN_COLUMNS).map(|col| table.cell(row, col));
            find_name_cell(cells).is_some()
        })
        .unwrap_or(scan)
}

/// Header row with the most day markers; ties go to the topmost row.
fn day_header_row(table: &Table, header_rows: usize) -> Option<usize> {
    (0..header_rows)
        .map(|row| {
            let count = (0..table.width())
                .filter(|&col| parse_day_marker(table.cell(row, col)).is_some())
                .count();
            (row, count)
        })
        .filter(|&(_, count)| count > 0)
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
        .map(|(row, _)| row)
}
