//! Excel exporter: report tables → .xlsx
//!
//! One worksheet per [`ReportTable`]: title in A1, headers on row 3, data
//! below. Subtotal and total rows are bold.

use crate::core::reports::{Cell, ReportTable, RowKind};
use crate::error::{TimesheetError, TimesheetResult};
use chrono::Datelike;
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Color, ExcelDateTime, Format, Workbook, Worksheet, XlsxError};
use std::path::Path;

const HEADER_ROW: u32 = 2;
const MAX_SHEET_NAME: usize = 31;

pub struct ReportExporter {
    workbook: Workbook,
    sheet_names: Vec<String>,
}

impl Default for ReportExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportExporter {
    pub fn new() -> Self {
        Self {
            workbook: Workbook::new(),
            sheet_names: Vec::new(),
        }
    }

    /// Add `table` as a worksheet. The name is cleaned up to what Excel
    /// accepts and made unique within the workbook.
    pub fn add_table(&mut self, sheet_name: &str, table: &ReportTable) -> TimesheetResult<()> {
        let name = self.unique_name(sheet_name);
        let worksheet = self.workbook.add_worksheet();
        worksheet
            .set_name(&name)
            .map_err(|e| TimesheetError::Export(format!("Failed to set worksheet name: {}", e)))?;
        write_table(worksheet, table)?;
        self.sheet_names.push(name);
        Ok(())
    }

    pub fn sheet_names(&self) -> &[String] {
        &self.sheet_names
    }

    pub fn save(&mut self, path: &Path) -> TimesheetResult<()> {
        self.workbook
            .save(path)
            .map_err(|e| TimesheetError::Export(format!("Failed to save Excel file: {}", e)))
    }

    pub fn to_bytes(&mut self) -> TimesheetResult<Vec<u8>> {
        self.workbook
            .save_to_buffer()
            .map_err(|e| TimesheetError::Export(format!("Failed to render Excel file: {}", e)))
    }

    fn unique_name(&self, requested: &str) -> String {
        let base = sanitize_sheet_name(requested);
        if !self.sheet_names.contains(&base) {
            return base;
        }
        let mut n = 2;
        loop {
            let suffix = format!(" ({n})");
            let keep = MAX_SHEET_NAME.saturating_sub(suffix.chars().count());
            let candidate: String = base.chars().take(keep).chain(suffix.chars()).collect();
            if !self.sheet_names.contains(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

fn write_table(worksheet: &mut Worksheet, table: &ReportTable) -> TimesheetResult<()> {
    let err = |e: XlsxError| TimesheetError::Export(e.to_string());

    let bold = Format::new().set_bold();
    let header = Format::new().set_bold().set_background_color(Color::RGB(0xD9E1F2));
    let number = Format::new().set_num_format("#,##0.00");
    let bold_number = Format::new().set_bold().set_num_format("#,##0.00");
    let date = Format::new().set_num_format("yyyy-mm-dd");

    worksheet
        .write_string_with_format(0, 0, &table.title, &bold)
        .map_err(err)?;

    for (col, name) in table.columns.iter().enumerate() {
        worksheet
            .write_string_with_format(HEADER_ROW, col_index(col)?, name, &header)
            .map_err(err)?;
    }

    for (i, row) in table.rows.iter().enumerate() {
        let r = HEADER_ROW + 1 + i as u32;
        let emphasised = row.kind != RowKind::Detail;
        for (col, cell) in row.cells.iter().enumerate() {
            let c = col_index(col)?;
            match cell {
                Cell::Empty => {}
                Cell::Text(s) if emphasised => {
                    worksheet.write_string_with_format(r, c, s, &bold).map_err(err)?;
                }
                Cell::Text(s) => {
                    worksheet.write_string(r, c, s).map_err(err)?;
                }
                Cell::Number(n) => {
                    let format = if emphasised { &bold_number } else { &number };
                    worksheet
                        .write_number_with_format(r, c, n.to_f64().unwrap_or_default(), format)
                        .map_err(err)?;
                }
                Cell::Date(d) => {
                    let value = ExcelDateTime::from_ymd(d.year() as u16, d.month() as u8, d.day() as u8)
                        .map_err(err)?;
                    worksheet
                        .write_datetime_with_format(r, c, &value, &date)
                        .map_err(err)?;
                }
            }
        }
    }

    worksheet.set_column_width(0, 28).map_err(err)?;
    worksheet.set_freeze_panes(HEADER_ROW + 1, 0).map_err(err)?;
    Ok(())
}

fn col_index(col: usize) -> TimesheetResult<u16> {
    u16::try_from(col).map_err(|_| TimesheetError::Export(format!("Column {} out of range", col)))
}

/// Excel sheet names: at most 31 characters, none of `[]:*?/\`
pub fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '-',
            c => c,
        })
        .take(MAX_SHEET_NAME)
        .collect();
    let cleaned = cleaned.trim().trim_matches('\'').to_string();
    if cleaned.is_empty() {
        "Report".to_string()
    } else {
        cleaned
    }
}
