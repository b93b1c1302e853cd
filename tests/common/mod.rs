//! Shared workbook fixtures for integration tests

#![allow(dead_code)]

use rust_xlsxwriter::Workbook;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub type Sheet<'a> = (&'a str, Vec<Vec<&'a str>>);

/// Write an .xlsx with the given sheets; empty strings stay blank cells.
pub fn write_workbook(path: &Path, sheets: &[Sheet]) {
    let mut workbook = Workbook::new();
    for (name, rows) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name).unwrap();
        for (r, row) in rows.iter().enumerate() {
            for (c, text) in row.iter().enumerate() {
                if !text.is_empty() {
                    worksheet.write_string(r as u32, c as u16, *text).unwrap();
                }
            }
        }
    }
    workbook.save(path).unwrap();
}

/// Two-month schedule sheet. Орлова and Белов are heads.
pub fn schedule_rows() -> Vec<Vec<&'static str>> {
    vec![
        vec!["", "", "ИЮЛЬ", "", "", "АВГУСТ"],
        vec!["ФИО сотрудника", "", "1Пн", "2Вт", "3Ср", "1Чт"],
        vec!["Орлова Ольга Олеговна", "", "08:00-20:00", "В", "", "09:00-18:00"],
        vec!["Ким Анна Сергеевна", "", "09:00-18:00", "отпуск", "20:00-08:00", ""],
        vec!["Лис Петр Иванович", "", "", "09:00-18:00", "ЛНТС", "0"],
        vec!["Белов Борис Борисович", "", "09:00-18:00", "", "", ""],
        vec!["Зайцев Захар Ильич", "", "22:00-06:00", "", "", ""],
    ]
}

pub fn duty_rows() -> Vec<Vec<&'static str>> {
    vec![
        vec!["ФИО", "1", "2", "3"],
        vec!["Петров Петр Петрович", "С 09:00-21:00", "П 21:00-09:00", ""],
        vec!["Иванов Иван Иванович", "П 21:00-09:00", "", "10:00-19:00"],
        vec!["Стажеры общего ряда", "С 09:00-21:00", "", ""],
    ]
}

pub fn head_rows() -> Vec<Vec<&'static str>> {
    vec![
        vec!["", "1Пн", "2Вт"],
        vec!["Орлова Ольга Олеговна", "08:00-20:00", "В"],
        vec!["Белов Борис Борисович", "", "20:00-08:00"],
    ]
}

/// A temp directory holding `schedule.xlsx`, `duty.xlsx` and `roster.yaml`
/// for a division named `support`.
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        write_workbook(
            &dir.path().join("schedule.xlsx"),
            &[("ГРАФИК", schedule_rows())],
        );
        write_workbook(
            &dir.path().join("duty.xlsx"),
            &[("Дежурство Июль", duty_rows()), ("Старшие Июль", head_rows())],
        );
        std::fs::write(
            dir.path().join("roster.yaml"),
            "divisions:\n  support:\n    schedule_file: schedule.xlsx\n    duty_file: duty.xlsx\n",
        )
        .unwrap();
        Self { dir }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn config_path(&self) -> PathBuf {
        self.path("roster.yaml")
    }
}
