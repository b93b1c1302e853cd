//! Duty roster sheets ("Дежурство <Месяц>")
//!
//! Cell convention: a leading one-letter marker and a space tags the duty
//! role (`С` senior, `П` helper), followed by the time range. A bare time
//! range is a plain shift.

use crate::analyzer::{categorize, hours_for_range, parse_time_range};
use crate::header::Month;
use crate::reader::{NamedRow, ScheduleReader};
use crate::types::{Category, RosterEntry, RosterRole, TimeRange};
use std::collections::BTreeMap;

/// Split a role marker off the front of a duty cell.
fn split_marker(text: &str) -> (Option<RosterRole>, &str) {
    let mut chars = text.chars();
    let role = match chars.next() {
        // Latin C shows up as a typo for Cyrillic С
        Some('С' | 'с' | 'C' | 'c') => RosterRole::Senior,
        Some('П' | 'п') => RosterRole::Helper,
        _ => return (None, text),
    };
    let rest = chars.as_str();
    match rest.chars().next() {
        None => (Some(role), rest),
        Some(c) if c.is_whitespace() => (Some(role), rest.trim_start()),
        _ => (None, text),
    }
}

/// Role and time window of one duty cell; `None` when the cell holds no duty.
pub fn parse_duty_cell(raw: &str) -> Option<(RosterRole, Option<TimeRange>)> {
    let text = raw.trim();
    if categorize(text) != Category::Work {
        return None;
    }
    let (role, rest) = split_marker(text);
    let time = parse_time_range(rest);
    match (role, time) {
        (Some(role), time) => Some((role, time)),
        (None, Some(time)) => Some((RosterRole::Shift, Some(time))),
        (None, None) => None,
    }
}

/// Duty entries in column `col`, in sheet order.
pub fn duty_entries_at(reader: &ScheduleReader, col: usize) -> Vec<RosterEntry> {
    entries_in_column(reader, &reader.named_rows(), col)
}

fn entries_in_column(reader: &ScheduleReader, rows: &[NamedRow], col: usize) -> Vec<RosterEntry> {
    rows.iter()
        .filter_map(|named| {
            let raw = reader.cell(named.row, col).trim();
            let (role, time) = parse_duty_cell(raw)?;
            Some(RosterEntry {
                name: named.name.clone(),
                row: named.row,
                raw: raw.to_string(),
                role,
                time,
                category: Category::Work,
                work_hours: time.map(hours_for_range).unwrap_or(0.0),
            })
        })
        .collect()
}

/// Duty entries for one day; empty when the day has no column.
pub fn duty_entries(reader: &ScheduleReader, month: Month, day: u8) -> Vec<RosterEntry> {
    match reader.find_date_column(month, day) {
        Some(col) => duty_entries_at(reader, col),
        None => Vec::new(),
    }
}

/// Day of month → duty entries, for every day column of the month.
pub fn duty_month(reader: &ScheduleReader, month: Month) -> BTreeMap<u8, Vec<RosterEntry>> {
    let rows = reader.named_rows();
    reader
        .day_columns(month)
        .into_iter()
        .map(|day| (day.day, entries_in_column(reader, &rows, day.column)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Table;

    fn duty_table() -> Table {
        Table::from_rows(
            "Дежурство Июль",
            &[
                vec!["ФИО", "1", "2", "3"],
                vec!["Петров Петр", "С 09:00-21:00", "П 21:00-09:00", "отпуск"],
                vec!["Иванов Иван", "10:00-19:00", "", "П"],
                vec!["Стажеры общего ряда", "С 09:00-21:00", "", ""],
                vec!["Сидоров Семен", "учеба", "0", "с 08:00-20:00"],
            ],
        )
    }

    #[test]
    fn test_parse_duty_cell() {
        assert_eq!(
            parse_duty_cell("С 09:00-21:00"),
            Some((RosterRole::Senior, Some(TimeRange::new(540, 1260))))
        );
        assert_eq!(
            parse_duty_cell("п  21:00-09:00"),
            Some((RosterRole::Helper, Some(TimeRange::new(1260, 540))))
        );
        assert_eq!(
            parse_duty_cell("09:00-18:00"),
            Some((RosterRole::Shift, Some(TimeRange::new(540, 1080))))
        );
        assert_eq!(parse_duty_cell("П"), Some((RosterRole::Helper, None)));
        assert_eq!(parse_duty_cell("C 08:00-20:00").map(|d| d.0), Some(RosterRole::Senior));
        assert_eq!(parse_duty_cell("Сдача"), None);
        assert_eq!(parse_duty_cell("отпуск"), None);
        assert_eq!(parse_duty_cell("В"), None);
        assert_eq!(parse_duty_cell(""), None);
    }

    #[test]
    fn test_duty_entries_for_day() {
        let reader = ScheduleReader::from_table(duty_table());
        let entries = duty_entries(&reader, Month::July, 1);
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Петров Петр", "Иванов Иван"]);
        assert_eq!(entries[0].role, RosterRole::Senior);
        assert_eq!(entries[0].work_hours, 11.0);
        assert_eq!(entries[1].role, RosterRole::Shift);
        assert_eq!(entries[1].work_hours, 8.0);
    }

    #[test]
    fn test_duty_entries_missing_day() {
        let reader = ScheduleReader::from_table(duty_table());
        assert!(duty_entries(&reader, Month::July, 15).is_empty());
        assert!(duty_entries(&reader, Month::August, 1).is_empty());
    }

    #[test]
    fn test_duty_month() {
        let reader = ScheduleReader::from_table(duty_table());
        let month = duty_month(&reader, Month::July);
        assert_eq!(month.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(month[&2].len(), 1);
        assert_eq!(month[&2][0].role, RosterRole::Helper);
        assert_eq!(month[&2][0].work_hours, 11.0);
        let third: Vec<_> = month[&3].iter().map(|e| (e.name.as_str(), e.role)).collect();
        assert_eq!(
            third,
            vec![
                ("Иванов Иван", RosterRole::Helper),
                ("Сидоров Семен", RosterRole::Senior)
            ]
        );
    }

    #[test]
    fn test_duty_month_matches_daily_lookups() {
        let reader = ScheduleReader::from_table(duty_table());
        let month = duty_month(&reader, Month::July);
        for (day, entries) in &month {
            assert_eq!(entries, &duty_entries(&reader, Month::July, *day));
        }
    }
}
