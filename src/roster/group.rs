//! Group membership on the schedule sheet
//!
//! A head's group is the block of named rows directly below the head's own
//! row. The block ends at the first row without a valid name or at the next
//! row naming another known head.

use crate::analyzer::{categorize, is_no_schedule, parse_time_range, work_hours, DAY_OFF_MARKER};
use crate::header::{normalize_name, Month};
use crate::reader::ScheduleReader;
use crate::types::{RosterEntry, RosterRole};
use std::collections::HashSet;

/// Members of `head_name`'s group with their schedule cell for the day.
///
/// `known_heads` holds normalized names; an empty set leaves blank rows as
/// the only block separator.
pub fn group_members(
    reader: &ScheduleReader,
    head_name: &str,
    known_heads: &HashSet<String>,
    month: Month,
    day: u8,
) -> Vec<RosterEntry> {
    let Some(head_row) = reader.find_user_row(head_name) else {
        return Vec::new();
    };
    let Some(col) = reader.find_date_column(month, day) else {
        return Vec::new();
    };

    let mut members = Vec::new();
    for row in head_row + 1..reader.table().height() {
        let Some(name) = reader.name_at(row) else {
            break;
        };
        if known_heads.contains(&normalize_name(&name)) {
            break;
        }
        let cell = reader.cell(row, col).trim();
        let raw = if is_no_schedule(cell) {
            DAY_OFF_MARKER.to_string()
        } else {
            cell.to_string()
        };
        members.push(RosterEntry {
            name,
            row,
            role: RosterRole::Member,
            time: parse_time_range(&raw),
            category: categorize(&raw),
            work_hours: work_hours(&raw),
            raw,
        });
    }
    members
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, Table};

    fn schedule() -> Table {
        Table::from_rows(
            "ГРАФИК",
            &[
                vec!["", "ИЮЛЬ", ""],
                vec!["", "1Пн", "2Вт"],
                vec!["Орлова Ольга", "08:00-20:00", ""],
                vec!["Ким Анна", "09:00-18:00", "В"],
                vec!["Лис Петр", "", "отпуск"],
                vec!["Белов Борис", "09:00-18:00", ""],
                vec!["Зайцев Захар", "22:00-06:00", ""],
                vec!["", "", ""],
                vec!["Волков Виктор", "09:00-18:00", ""],
            ],
        )
    }

    fn heads() -> HashSet<String> {
        ["Орлова Ольга", "Белов Борис"]
            .iter()
            .map(|n| normalize_name(n))
            .collect()
    }

    #[test]
    fn test_group_stops_at_next_head() {
        let reader = ScheduleReader::from_table(schedule());
        let members = group_members(&reader, "Орлова Ольга", &heads(), Month::July, 1);
        let names: Vec<&str> = members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Ким Анна", "Лис Петр"]);
        assert_eq!(members[0].work_hours, 8.0);
        assert_eq!(members[1].raw, DAY_OFF_MARKER);
        assert_eq!(members[1].category, Category::DayOff);
        assert!(members.iter().all(|m| m.role == RosterRole::Member));
    }

    #[test]
    fn test_group_stops_at_blank_row() {
        let reader = ScheduleReader::from_table(schedule());
        let members = group_members(&reader, "Белов Борис", &heads(), Month::July, 1);
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].name, "Зайцев Захар");
        assert_eq!(members[0].work_hours, 7.0);
        assert!(members[0].time.unwrap().is_overnight());
    }

    #[test]
    fn test_group_without_known_heads() {
        let reader = ScheduleReader::from_table(schedule());
        let members = group_members(&reader, "Орлова Ольга", &HashSet::new(), Month::July, 2);
        assert_eq!(members.len(), 4);
        assert_eq!(members[0].category, Category::Military);
        assert_eq!(members[1].category, Category::Vacation);
    }

    #[test]
    fn test_group_lookup_misses() {
        let reader = ScheduleReader::from_table(schedule());
        assert!(group_members(&reader, "Нет Такого", &heads(), Month::July, 1).is_empty());
        assert!(group_members(&reader, "Орлова Ольга", &heads(), Month::July, 9).is_empty());
    }
}
