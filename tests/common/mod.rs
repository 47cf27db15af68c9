//! In-memory T&E template fixtures
//!
//! Workbooks are written with rust_xlsxwriter and handed to the parser as
//! bytes, so every test exercises the real calamine read path.

#![allow(dead_code)]

use chrono::{Datelike, NaiveDate};
use keystone_te::excel::cells::CellRef;
use keystone_te::excel::layout;
use rust_xlsxwriter::Workbook;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
enum Value {
    Text(String),
    Number(f64),
}

/// Cells keyed by (zero-based row, column), per sheet, in workbook order
pub struct TemplateBuilder {
    sheets: Vec<(String, BTreeMap<(u32, u16), Value>)>,
}

impl TemplateBuilder {
    /// Every required sheet, header filled in for `year`/`month`
    pub fn new(year: i32, month: u32) -> Self {
        let mut builder = Self::blank();
        builder
            .text(layout::TIME_FIRST_HALF, layout::COMPANY_CELL, "The Keystone Group")
            .text(layout::TIME_FIRST_HALF, layout::EMPLOYEE_NAME_CELL, "Ada Lovelace")
            .number(layout::TIME_FIRST_HALF, layout::YEAR_CELL, f64::from(year))
            .number(layout::TIME_FIRST_HALF, layout::MONTH_CELL, f64::from(month))
            .number(layout::TIME_FIRST_HALF, layout::MID_MARKER_CELL, 15.0)
            .text(
                layout::TIME_FIRST_HALF,
                layout::TEMPLATE_VERSION_CELL,
                "Version 2024.1",
            );
        builder
    }

    /// Every required sheet, nothing written
    pub fn blank() -> Self {
        Self {
            sheets: layout::REQUIRED_SHEETS
                .iter()
                .map(|name| (name.to_string(), BTreeMap::new()))
                .collect(),
        }
    }

    pub fn without_sheet(&mut self, name: &str) -> &mut Self {
        self.sheets.retain(|(sheet, _)| sheet != name);
        self
    }

    pub fn text(&mut self, sheet: &str, a1: &str, value: &str) -> &mut Self {
        self.put(sheet, a1, Value::Text(value.to_string()))
    }

    pub fn number(&mut self, sheet: &str, a1: &str, value: f64) -> &mut Self {
        self.put(sheet, a1, Value::Number(value))
    }

    /// Remove a cell written earlier
    pub fn clear(&mut self, sheet: &str, a1: &str) -> &mut Self {
        let key = key(a1);
        if let Some((_, cells)) = self.sheets.iter_mut().find(|(s, _)| s == sheet) {
            cells.remove(&key);
        }
        self
    }

    fn put(&mut self, sheet: &str, a1: &str, value: Value) -> &mut Self {
        let key = key(a1);
        match self.sheets.iter_mut().find(|(s, _)| s == sheet) {
            Some((_, cells)) => {
                cells.insert(key, value);
            }
            None => {
                let mut cells = BTreeMap::new();
                cells.insert(key, value);
                self.sheets.push((sheet.to_string(), cells));
            }
        }
        self
    }

    //--------------------------------------------------------------------------
    // Time grid
    //--------------------------------------------------------------------------

    /// Client row with label and charge code on both halves
    pub fn client_line(&mut self, row: u32, label: &str, code: &str) -> &mut Self {
        for sheet in [layout::TIME_FIRST_HALF, layout::TIME_SECOND_HALF] {
            self.text(sheet, &format!("A{row}"), label);
            self.text(sheet, &format!("U{row}"), code);
        }
        self
    }

    pub fn internal_line(&mut self, row: u32, label: &str, code: &str) -> &mut Self {
        self.client_line(row, label, code)
    }

    /// Marketing row showing `category` on both halves
    pub fn marketing_line(&mut self, row: u32, category: &str) -> &mut Self {
        for sheet in [layout::TIME_FIRST_HALF, layout::TIME_SECOND_HALF] {
            self.text(sheet, &format!("A{row}"), category);
        }
        self
    }

    /// Category → base code entry on the Validations sheet
    pub fn validation(&mut self, row: u32, category: &str, base_code: &str) -> &mut Self {
        self.text(layout::VALIDATIONS, &format!("A{row}"), category);
        self.text(layout::VALIDATIONS, &format!("B{row}"), base_code)
    }

    /// Hours on `date`, placed on the right half's sheet and day column
    pub fn hours(&mut self, row: u32, date: NaiveDate, hours: f64) -> &mut Self {
        let sheet = if date.day() <= 15 {
            layout::TIME_FIRST_HALF
        } else {
            layout::TIME_SECOND_HALF
        };
        let a1 = format!("{}{}", layout::day_column(date), row);
        self.number(sheet, &a1, hours)
    }

    //--------------------------------------------------------------------------
    // Expenses and mileage
    //--------------------------------------------------------------------------

    /// One bucket amount on Expenses-Main
    pub fn expense(
        &mut self,
        row: u32,
        date: &str,
        description: &str,
        code: &str,
        bucket_column: &str,
        amount: f64,
    ) -> &mut Self {
        self.expense_on(layout::EXPENSES_MAIN, row, date, description, code, bucket_column, amount)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn expense_on(
        &mut self,
        sheet: &str,
        row: u32,
        date: &str,
        description: &str,
        code: &str,
        bucket_column: &str,
        amount: f64,
    ) -> &mut Self {
        if !date.is_empty() {
            self.text(sheet, &format!("{}{row}", layout::EXPENSE_DATE_COLUMN), date);
        }
        if !description.is_empty() {
            self.text(
                sheet,
                &format!("{}{row}", layout::EXPENSE_DESCRIPTION_COLUMN),
                description,
            );
        }
        if !code.is_empty() {
            self.text(
                sheet,
                &format!("{}{row}", layout::EXPENSE_CHARGE_CODE_COLUMN),
                code,
            );
        }
        self.number(sheet, &format!("{bucket_column}{row}"), amount)
    }

    pub fn client_billed(&mut self, sheet: &str, row: u32, amount: f64) -> &mut Self {
        self.number(
            sheet,
            &format!("{}{row}", layout::EXPENSE_CLIENT_BILLED_COLUMN),
            amount,
        )
    }

    pub fn mileage(
        &mut self,
        row: u32,
        date: &str,
        destination: &str,
        start: f64,
        end: f64,
        commute: f64,
    ) -> &mut Self {
        let sheet = layout::MILEAGE_LOG;
        self.text(sheet, &format!("{}{row}", layout::MILEAGE_DATE_COLUMN), date)
            .text(
                sheet,
                &format!("{}{row}", layout::MILEAGE_DESTINATION_COLUMN),
                destination,
            )
            .number(
                sheet,
                &format!("{}{row}", layout::MILEAGE_ODOMETER_START_COLUMN),
                start,
            )
            .number(
                sheet,
                &format!("{}{row}", layout::MILEAGE_ODOMETER_END_COLUMN),
                end,
            )
            .number(sheet, &format!("{}{row}", layout::MILEAGE_COMMUTE_COLUMN), commute)
    }

    //--------------------------------------------------------------------------
    // Output
    //--------------------------------------------------------------------------

    pub fn build(&self) -> Vec<u8> {
        let mut workbook = Workbook::new();
        for (name, cells) in &self.sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(name).unwrap();
            for (&(row, col), value) in cells {
                match value {
                    Value::Text(s) => {
                        worksheet.write_string(row, col, s).unwrap();
                    }
                    Value::Number(n) => {
                        worksheet.write_number(row, col, *n).unwrap();
                    }
                }
            }
        }
        workbook.save_to_buffer().unwrap()
    }

    pub fn write_to(&self, dir: &Path, file_name: &str) -> PathBuf {
        let path = dir.join(file_name);
        std::fs::write(&path, self.build()).unwrap();
        path
    }
}

fn key(a1: &str) -> (u32, u16) {
    let cell = CellRef::parse(a1).unwrap_or_else(|| panic!("bad cell reference {a1}"));
    (cell.row, u16::try_from(cell.col).unwrap())
}

pub fn jan(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, day).unwrap()
}

/// January 2026, one client line (8h on one day per half), one General
/// marketing line (1h), a $10 GEN-LEAD meal and a $25 ADM expense
pub fn happy_path() -> TemplateBuilder {
    let mut builder = TemplateBuilder::new(2026, 1);
    builder
        .client_line(6, "Client A", "CLIENT1")
        .hours(6, jan(5), 8.0)
        .hours(6, jan(20), 8.0)
        .marketing_line(16, "General")
        .validation(1, "General", "GEN")
        .hours(16, jan(6), 1.0)
        .expense(5, "01/05/2026", "Lunch with prospect", "GEN-LEAD", "E", 10.0)
        .expense(6, "01/06/2026", "Printer paper", "ADM", "M", 25.0);
    builder
}

/// Happy path with a full 8h on every first-half weekday
pub fn full_first_half() -> TemplateBuilder {
    let mut builder = happy_path();
    for day in 1..=15 {
        let date = jan(day);
        if date.weekday().number_from_monday() <= 5 {
            builder.hours(6, date, 8.0);
        }
    }
    builder
}
