use crate::header::Month;
use serde::Serialize;
use std::fmt;

//==============================================================================
// Sheet Grid
//==============================================================================

/// An immutable, fully materialized text grid read from one (file, sheet) pair.
///
/// Rows are stored row-major; a missing or empty cell is `None`. Row and
/// column indices are absolute sheet coordinates (row 0 is the sheet's first
/// row even when it is blank).
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    sheet: String,
    rows: Vec<Vec<Option<String>>>,
    width: usize,
}

impl Table {
    pub fn new(sheet: impl Into<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        Self {
            sheet: sheet.into(),
            rows,
            width,
        }
    }

    /// Convenience constructor from plain strings; empty strings become `None`.
    pub fn from_rows<S: AsRef<str>>(sheet: impl Into<String>, rows: &[Vec<S>]) -> Self {
        let rows = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| {
                        let text = cell.as_ref();
                        if text.is_empty() {
                            None
                        } else {
                            Some(text.to_string())
                        }
                    })
                    .collect()
            })
            .collect();
        Self::new(sheet, rows)
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell text, or `""` when the cell is empty or out of range.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .and_then(|c| c.as_deref())
            .unwrap_or("")
    }
}

//==============================================================================
// Schedule Categories
//==============================================================================

/// Closed classification of a raw schedule cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Work,
    DayOff,
    Vacation,
    VacationUnpaid,
    Military,
    Sick,
    Missing,
}

impl Category {
    /// All categories in bucket order.
    pub const ALL: [Category; 7] = [
        Category::Work,
        Category::DayOff,
        Category::Vacation,
        Category::VacationUnpaid,
        Category::Military,
        Category::Sick,
        Category::Missing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Work => "work",
            Category::DayOff => "day_off",
            Category::Vacation => "vacation",
            Category::VacationUnpaid => "vacation_unpaid",
            Category::Military => "military",
            Category::Sick => "sick",
            Category::Missing => "missing",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One analyzed day of a user's schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayInfo {
    pub day: String,
    pub raw: String,
    pub hours: f64,
}

//==============================================================================
// Time Ranges
//==============================================================================

pub const MINUTES_PER_DAY: u16 = 1440;

/// A shift window in minutes from midnight. `start` is below 1440; `end` may
/// be 1440 for a shift closing at 24:00. `end < start` marks an overnight
/// shift that finishes on the following day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub struct TimeRange {
    pub start: u16,
    pub end: u16,
}

impl TimeRange {
    pub fn new(start: u16, end: u16) -> Self {
        Self { start, end }
    }

    pub fn is_overnight(&self) -> bool {
        self.end < self.start
    }

    pub fn duration_minutes(&self) -> u16 {
        if self.is_overnight() {
            self.end + MINUTES_PER_DAY - self.start
        } else {
            self.end - self.start
        }
    }

    /// Whether `minute` falls inside the part of the shift on its start day.
    pub fn covers(&self, minute: u16) -> bool {
        if self.is_overnight() {
            minute >= self.start
        } else {
            minute >= self.start && minute < self.end
        }
    }

    /// Whether `minute` of the following day falls inside an overnight shift.
    pub fn covers_spillover(&self, minute: u16) -> bool {
        self.is_overnight() && minute < self.end
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}-{:02}:{:02}",
            self.start / 60,
            self.start % 60,
            self.end / 60,
            self.end % 60
        )
    }
}

impl From<TimeRange> for String {
    fn from(range: TimeRange) -> Self {
        range.to_string()
    }
}

//==============================================================================
// User Schedules
//==============================================================================

/// One day column of a user's row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleDay {
    pub day: u8,
    pub label: String,
    pub text: String,
}

/// A user's raw schedule for one month, ordered by day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSchedule {
    pub month: Month,
    pub days: Vec<ScheduleDay>,
}

impl UserSchedule {
    pub fn empty(month: Month) -> Self {
        Self {
            month,
            days: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Text for a day label such as `"1(Вт)"`.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.days
            .iter()
            .find(|d| d.label == label)
            .map(|d| d.text.as_str())
    }

    /// Text for a day of the month.
    pub fn get_day(&self, day: u8) -> Option<&str> {
        self.days
            .iter()
            .find(|d| d.day == day)
            .map(|d| d.text.as_str())
    }

    /// `(label, text)` pairs in day order.
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        self.days
            .iter()
            .map(|d| (d.label.as_str(), d.text.as_str()))
            .collect()
    }
}

//==============================================================================
// Roster Entries
//==============================================================================

/// Role tag carried by a roster entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RosterRole {
    /// "С" marker on a duty sheet
    Senior,
    /// "П" marker on a duty sheet
    Helper,
    /// Duty cell with a time range and no marker
    Shift,
    /// Row on a head roster sheet
    Head,
    /// Member of a head's group on the schedule sheet
    Member,
}

/// One person's assignment for one day, produced per query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterEntry {
    pub name: String,
    pub row: usize,
    pub raw: String,
    pub role: RosterRole,
    pub time: Option<TimeRange>,
    pub category: Category,
    pub work_hours: f64,
}
