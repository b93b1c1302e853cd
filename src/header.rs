//! Sheet header classification
//!
//! One place for the text rules every index builder and roster parser shares:
//! month markers, day markers and the full-name validator.

use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Leading columns inspected for a person's name.
pub const NAME_SCAN_COLUMNS: usize = 4;

/// Leading rows inspected for month and day markers.
pub const HEADER_SCAN_ROWS: usize = 5;

/// Uppercase texts that look like names but are section captions or codes.
const NAME_DENYLIST: &[&str] = &[
    "СТАЖЕРЫ ОБЩЕГО РЯДА",
    "ОБЩИЙ РЯД",
    "ФИО СОТРУДНИКА",
    "ОТПУСК БС",
    "НЕ УКАЗАНО",
];

//==============================================================================
// Months
//==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    /// Calendar number, 1-based.
    pub fn number(self) -> u32 {
        self as u32 + 1
    }

    pub fn from_number(n: u32) -> Option<Month> {
        n.checked_sub(1)
            .and_then(|i| Self::ALL.get(i as usize))
            .copied()
    }

    /// Uppercase name as written in schedule headers, e.g. `ИЮЛЬ`.
    pub fn name(self) -> &'static str {
        match self {
            Month::January => "ЯНВАРЬ",
            Month::February => "ФЕВРАЛЬ",
            Month::March => "МАРТ",
            Month::April => "АПРЕЛЬ",
            Month::May => "МАЙ",
            Month::June => "ИЮНЬ",
            Month::July => "ИЮЛЬ",
            Month::August => "АВГУСТ",
            Month::September => "СЕНТЯБРЬ",
            Month::October => "ОКТЯБРЬ",
            Month::November => "НОЯБРЬ",
            Month::December => "ДЕКАБРЬ",
        }
    }

    /// Title-case name as used in roster sheet names, e.g. `Июль`.
    pub fn title(self) -> String {
        let mut chars = self.name().chars();
        match chars.next() {
            Some(first) => first.to_string() + &chars.as_str().to_lowercase(),
            None => String::new(),
        }
    }

    /// Find a month name among the words of `text`.
    pub fn detect(text: &str) -> Option<Month> {
        let upper = text.to_uppercase();
        upper
            .split(|c: char| !c.is_alphabetic())
            .filter(|word| !word.is_empty())
            .find_map(|word| Self::ALL.iter().copied().find(|m| m.name() == word))
    }
}

impl FromStr for Month {
    type Err = String;

    /// Accepts a month name in any case or a number 1-12.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(n) = trimmed.parse::<u32>() {
            return Month::from_number(n).ok_or_else(|| format!("Invalid month number: {}", n));
        }
        let upper = trimmed.to_uppercase();
        Month::ALL
            .iter()
            .copied()
            .find(|m| m.name() == upper)
            .ok_or_else(|| format!("Unknown month: {}", trimmed))
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

//==============================================================================
// Day Markers
//==============================================================================

/// A day-of-month header cell such as `1Вт` or `15`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayMarker {
    pub day: u8,
    pub weekday: Option<String>,
}

impl DayMarker {
    /// Display label: `1(Вт)` with a weekday, `1` without.
    pub fn label(&self) -> String {
        match &self.weekday {
            Some(w) => format!("{}({})", self.day, w),
            None => self.day.to_string(),
        }
    }
}

fn day_marker_re() -> &'static Regex {
    static DAY_RE: OnceLock<Regex> = OnceLock::new();
    DAY_RE.get_or_init(|| {
        Regex::new(r"^(\d{1,2})\s*([А-Яа-яЁё]{0,2})\.?$").expect("day marker regex must compile")
    })
}

/// Classify a header cell as a day marker.
pub fn parse_day_marker(text: &str) -> Option<DayMarker> {
    let caps = day_marker_re().captures(text.trim())?;
    let day: u8 = caps.get(1)?.as_str().parse().ok()?;
    if !(1..=31).contains(&day) {
        return None;
    }
    let weekday = caps
        .get(2)
        .map(|m| m.as_str())
        .filter(|w| !w.is_empty())
        .map(str::to_string);
    Some(DayMarker { day, weekday })
}

//==============================================================================
// Names
//==============================================================================

fn is_cyrillic(c: char) -> bool {
    matches!(c, '\u{0400}'..='\u{04FF}')
}

/// Canonical form used as a name-index key: trimmed, single-spaced,
/// uppercase, with `Ё` folded to `Е`.
pub fn normalize_name(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
        .replace('Ё', "Е")
}

/// Full-name validator shared by the name index and the roster scans.
pub fn is_full_name(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.split_whitespace().count() < 2 {
        return false;
    }
    if !trimmed.chars().any(is_cyrillic) {
        return false;
    }
    if trimmed.chars().any(|c| c.is_numeric()) {
        return false;
    }
    let normalized = normalize_name(trimmed);
    if NAME_DENYLIST.contains(&normalized.as_str()) {
        return false;
    }
    Month::detect(trimmed).is_none()
}

/// First cell among the leading columns of `cells` that passes the name
/// validator, with its column.
pub fn find_name_cell<'a, I>(cells: I) -> Option<(usize, &'a str)>
where
    I: IntoIterator<Item = &'a str>,
{
    cells
        .into_iter()
        .take(NAME_SCAN_COLUMNS)
        .enumerate()
        .find(|(_, text)| is_full_name(text))
        .map(|(col, text)| (col, text.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_detect() {
        assert_eq!(Month::detect("ИЮЛЬ"), Some(Month::July));
        assert_eq!(Month::detect("График на июль 2024"), Some(Month::July));
        assert_eq!(Month::detect("Дежурство Август"), Some(Month::August));
        assert_eq!(Month::detect("Майоров Иван"), None);
        assert_eq!(Month::detect("Мартынов"), None);
        assert_eq!(Month::detect(""), None);
    }

    #[test]
    fn test_month_parse_and_title() {
        assert_eq!("июль".parse::<Month>(), Ok(Month::July));
        assert_eq!("12".parse::<Month>(), Ok(Month::December));
        assert!("13".parse::<Month>().is_err());
        assert!("липень".parse::<Month>().is_err());
        assert_eq!(Month::July.title(), "Июль");
        assert_eq!(Month::from_number(1), Some(Month::January));
        assert_eq!(Month::from_number(0), None);
        assert_eq!(Month::September.number(), 9);
    }

    #[test]
    fn test_day_marker_with_weekday() {
        let marker = parse_day_marker("1Вт").unwrap();
        assert_eq!(marker.day, 1);
        assert_eq!(marker.weekday.as_deref(), Some("Вт"));
        assert_eq!(marker.label(), "1(Вт)");
        assert_eq!(parse_day_marker("15 ср").unwrap().label(), "15(ср)");
    }

    #[test]
    fn test_day_marker_bare_number() {
        assert_eq!(parse_day_marker("31").unwrap().label(), "31");
        assert_eq!(parse_day_marker(" 7 ").unwrap().day, 7);
        assert!(parse_day_marker("0").is_none());
        assert!(parse_day_marker("32").is_none());
        assert!(parse_day_marker("123").is_none());
        assert!(parse_day_marker("1Вто").is_none());
        assert!(parse_day_marker("09:00-18:00").is_none());
        assert!(parse_day_marker("").is_none());
    }

    #[test]
    fn test_full_name_validator() {
        assert!(is_full_name("Петров Петр Петрович"));
        assert!(is_full_name("  Иванова   Анна "));
        assert!(!is_full_name("Петров"));
        assert!(!is_full_name("John Smith"));
        assert!(!is_full_name("Петров 2"));
        assert!(!is_full_name("Стажеры общего ряда"));
        assert!(!is_full_name("отпуск бс"));
        assert!(!is_full_name("График июль"));
        assert!(!is_full_name(""));
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Пётр   Петров "), "ПЕТР ПЕТРОВ");
    }

    #[test]
    fn test_find_name_cell_first_valid_wins() {
        let row = ["1", "Сидоров Иван", "Петров Петр", "x"];
        assert_eq!(find_name_cell(row), Some((1, "Сидоров Иван")));

        let late = ["", "", "", "", "Петров Петр"];
        assert_eq!(find_name_cell(late), None);
    }
}
