//! Head (seniority) roster sheets ("Старшие <Месяц>")

use crate::analyzer::{categorize, hours_for_range, is_no_schedule, parse_time_range};
use crate::header::{normalize_name, Month};
use crate::reader::ScheduleReader;
use crate::types::{Category, RosterEntry, RosterRole};
use std::collections::HashSet;

/// Heads working on the given day, in sheet order.
pub fn head_entries(reader: &ScheduleReader, month: Month, day: u8) -> Vec<RosterEntry> {
    let Some(col) = reader.find_date_column(month, day) else {
        return Vec::new();
    };
    reader
        .named_rows()
        .into_iter()
        .filter_map(|named| {
            let raw = reader.cell(named.row, col).trim();
            if is_no_schedule(raw) || categorize(raw) != Category::Work {
                return None;
            }
            let time = parse_time_range(raw);
            Some(RosterEntry {
                name: named.name,
                row: named.row,
                raw: raw.to_string(),
                role: RosterRole::Head,
                time,
                category: Category::Work,
                work_hours: time.map(hours_for_range).unwrap_or(0.0),
            })
        })
        .collect()
}

/// Normalized names of everyone listed on a head roster sheet.
pub fn head_names(reader: &ScheduleReader) -> HashSet<String> {
    reader
        .named_rows()
        .into_iter()
        .map(|named| normalize_name(&named.name))
        .collect()
}
