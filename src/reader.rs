//! Query façade over a cached sheet and its indices

use crate::analyzer::{is_no_schedule, DAY_OFF_MARKER};
use crate::cache::CacheEntry;
use crate::error::{RosterError, RosterResult};
use crate::header::{find_name_cell, normalize_name, Month, NAME_SCAN_COLUMNS};
use crate::index::{DateIndex, DayColumn, TableIndexBuilder};
use crate::types::{ScheduleDay, Table, UserSchedule};
use std::borrow::Cow;
use std::sync::Arc;

/// A row whose leading cells hold a valid full name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedRow {
    pub row: usize,
    pub name: String,
}

pub struct ScheduleReader {
    table: Arc<Table>,
    entry: Option<Arc<CacheEntry>>,
}

impl ScheduleReader {
    /// Reader backed by a cache entry's prebuilt indices.
    pub fn from_entry(entry: Arc<CacheEntry>) -> Self {
        Self {
            table: Arc::clone(&entry.table),
            entry: Some(entry),
        }
    }

    /// Reader over a bare table; every lookup falls back to a scan.
    pub fn from_table(table: Table) -> Self {
        Self {
            table: Arc::new(table),
            entry: None,
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.table.cell(row, col)
    }

    pub fn find_user_row(&self, name: &str) -> Option<usize> {
        match &self.entry {
            Some(entry) => entry.index.names.get(name),
            None => self.scan_user_row(name),
        }
    }

    pub fn find_date_column(&self, month: Month, day: u8) -> Option<usize> {
        self.dates().column(month, day)
    }

    /// Inclusive column range of the month's section.
    pub fn month_range(&self, month: Month) -> Option<(usize, usize)> {
        self.dates().section(month).map(|s| (s.start, s.end))
    }

    /// Day header columns of `month` in column order.
    pub fn day_columns(&self, month: Month) -> Vec<DayColumn> {
        self.dates().days(month).to_vec()
    }

    /// Every row carrying a valid name, top to bottom.
    pub fn named_rows(&self) -> Vec<NamedRow> {
        (0..self.table.height())
            .filter_map(|row| self.name_at(row).map(|name| NamedRow { row, name }))
            .collect()
    }

    /// Valid name in the leading cells of `row`, if any.
    pub fn name_at(&self, row: usize) -> Option<String> {
        let cells = (0..NAME_SCAN_COLUMNS).map(|col| self.table.cell(row, col));
        find_name_cell(cells).map(|(_, name)| name.to_string())
    }

    /// Day label → cell text for the user's row across the month's day
    /// columns. "No schedule" idioms come back as [`DAY_OFF_MARKER`].
    pub fn extract_user_schedule(&self, name: &str, month: Month) -> RosterResult<UserSchedule> {
        let row = self
            .find_user_row(name)
            .ok_or_else(|| RosterError::UserNotFound(name.to_string()))?;
        let dates = self.dates();
        let days = dates.days(month);
        if days.is_empty() {
            return Err(RosterError::MonthNotFound(month.to_string()));
        }

        let days = days
            .iter()
            .map(|day| {
                let raw = self.table.cell(row, day.column).trim();
                let text = if is_no_schedule(raw) {
                    DAY_OFF_MARKER.to_string()
                } else {
                    raw.to_string()
                };
                ScheduleDay {
                    day: day.day,
                    label: day.label.clone(),
                    text,
                }
            })
            .collect();

        Ok(UserSchedule { month, days })
    }

    fn dates(&self) -> Cow<'_, DateIndex> {
        match &self.entry {
            Some(entry) => Cow::Borrowed(&entry.index.dates),
            None => Cow::Owned(TableIndexBuilder::build_date_index(
                &self.table,
                Month::detect(self.table.sheet_name()),
            )),
        }
    }

    fn scan_user_row(&self, name: &str) -> Option<usize> {
        let wanted = normalize_name(name);
        (0..self.table.height()).find(|&row| {
            self.name_at(row)
                .map(|found| normalize_name(&found) == wanted)
                .unwrap_or(false)
        })
    }
}
