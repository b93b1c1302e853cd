//! Schedule cell classification and work-hour arithmetic
//!
//! Pure functions; nothing here touches the cache.

use crate::error::{RosterError, RosterResult};
use crate::types::{Category, DayInfo, TimeRange, UserSchedule, MINUTES_PER_DAY};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Text written in place of spreadsheet "no schedule" idioms.
pub const DAY_OFF_MARKER: &str = "Не указано";

/// Shifts at least this long carry a mandatory lunch break.
const LUNCH_THRESHOLD_HOURS: f64 = 8.0;
const LUNCH_HOURS: f64 = 1.0;

/// Classify a raw cell. Rules are applied in fixed priority order to the
/// trimmed uppercase text; every input maps to some category.
pub fn categorize(raw: &str) -> Category {
    let text = raw.trim().to_uppercase();
    match text.as_str() {
        "" | "НЕ УКАЗАНО" | "NAN" | "NONE" => Category::DayOff,
        "ОТПУСК" => Category::Vacation,
        "ОТПУСК БС" => Category::VacationUnpaid,
        "В" => Category::Military,
        t if t.contains("ЛНТС") => Category::Sick,
        "Н" => Category::Missing,
        // time ranges and everything else count as work
        _ => Category::Work,
    }
}

/// Spreadsheet idioms for "nothing scheduled".
pub fn is_no_schedule(raw: &str) -> bool {
    let text = raw.trim();
    text.is_empty()
        || text == "0"
        || text == "0.0"
        || text.eq_ignore_ascii_case("nan")
        || text.eq_ignore_ascii_case("none")
}

fn time_range_re() -> &'static Regex {
    static RANGE_RE: OnceLock<Regex> = OnceLock::new();
    RANGE_RE.get_or_init(|| {
        Regex::new(r"(\d{1,2}):(\d{2})\s*[-–—]\s*(\d{1,2}):(\d{2})")
            .expect("time range regex must compile")
    })
}

fn to_minutes(hours: &str, minutes: &str) -> RosterResult<u16> {
    let h: u16 = hours
        .parse()
        .map_err(|_| RosterError::Parse(format!("Invalid hour: {}", hours)))?;
    let m: u16 = minutes
        .parse()
        .map_err(|_| RosterError::Parse(format!("Invalid minute: {}", minutes)))?;
    if m > 59 || h > 24 || (h == 24 && m != 0) {
        return Err(RosterError::Parse(format!("Invalid time: {}:{}", hours, minutes)));
    }
    Ok(h * 60 + m)
}

/// Parse the first `HH:MM-HH:MM` range in `text`.
///
/// `Ok(None)` means no range is present; `Err(Parse)` means a range-shaped
/// substring holds an impossible time.
pub fn try_parse_time_range(text: &str) -> RosterResult<Option<TimeRange>> {
    let Some(caps) = time_range_re().captures(text) else {
        return Ok(None);
    };
    let start = to_minutes(&caps[1], &caps[2])? % MINUTES_PER_DAY;
    // An end of 24:00 stays 1440: the close of the start day
    let end = to_minutes(&caps[3], &caps[4])?;
    Ok(Some(TimeRange::new(start, end)))
}

/// Lenient form of [`try_parse_time_range`]: malformed ranges read as absent.
pub fn parse_time_range(text: &str) -> Option<TimeRange> {
    try_parse_time_range(text).ok().flatten()
}

/// Hours worked for one cell: range length, minus lunch for shifts of eight
/// hours or more, rounded to one decimal. Cells without a valid range give 0.
pub fn work_hours(raw: &str) -> f64 {
    match parse_time_range(raw) {
        Some(range) => hours_for_range(range),
        None => 0.0,
    }
}

pub fn hours_for_range(range: TimeRange) -> f64 {
    let mut hours = f64::from(range.duration_minutes()) / 60.0;
    if hours >= LUNCH_THRESHOLD_HOURS {
        hours -= LUNCH_HOURS;
    }
    (hours * 10.0).round() / 10.0
}

//==============================================================================
// Monthly Analysis
//==============================================================================

/// A month of days split into one bucket per category. Days keep their
/// original relative order inside each bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScheduleAnalysis {
    pub work: Vec<DayInfo>,
    pub day_off: Vec<DayInfo>,
    pub vacation: Vec<DayInfo>,
    pub vacation_unpaid: Vec<DayInfo>,
    pub military: Vec<DayInfo>,
    pub sick: Vec<DayInfo>,
    pub missing: Vec<DayInfo>,
}

impl ScheduleAnalysis {
    pub fn bucket(&self, category: Category) -> &[DayInfo] {
        match category {
            Category::Work => &self.work,
            Category::DayOff => &self.day_off,
            Category::Vacation => &self.vacation,
            Category::VacationUnpaid => &self.vacation_unpaid,
            Category::Military => &self.military,
            Category::Sick => &self.sick,
            Category::Missing => &self.missing,
        }
    }

    fn bucket_mut(&mut self, category: Category) -> &mut Vec<DayInfo> {
        match category {
            Category::Work => &mut self.work,
            Category::DayOff => &mut self.day_off,
            Category::Vacation => &mut self.vacation,
            Category::VacationUnpaid => &mut self.vacation_unpaid,
            Category::Military => &mut self.military,
            Category::Sick => &mut self.sick,
            Category::Missing => &mut self.missing,
        }
    }

    /// Total days across all buckets.
    pub fn len(&self) -> usize {
        Category::ALL.iter().map(|c| self.bucket(*c).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn total_work_hours(&self) -> f64 {
        let total: f64 = self.work.iter().map(|d| d.hours).sum();
        (total * 10.0).round() / 10.0
    }
}

/// Split `days` (label, raw text) into category buckets.
pub fn analyze<'a, I>(days: I) -> ScheduleAnalysis
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut analysis = ScheduleAnalysis::default();
    for (label, raw) in days {
        let category = categorize(raw);
        let hours = if category == Category::Work {
            work_hours(raw)
        } else {
            0.0
        };
        analysis.bucket_mut(category).push(DayInfo {
            day: label.to_string(),
            raw: raw.to_string(),
            hours,
        });
    }
    analysis
}

/// Analyze a user's extracted month.
pub fn analyze_schedule(schedule: &UserSchedule) -> ScheduleAnalysis {
    analyze(schedule.pairs())
}
