//! Workbook importer - T&E template (.xlsx) → ParsedWorkbook
//!
//! Import never fails on content: a missing sheet, band or cell yields empty
//! or zero structures and every judgment is left to the validator. The only
//! error surfaced is failing to read the file from disk.

use crate::error::TimesheetResult;
use crate::excel::cells::{self, CellRef, RawValue, SheetLookup};
use crate::excel::layout::{self, Band};
use crate::types::{
    saturating_sum, ExpenseItem, ExpenseSummary, Half, HalfMonthTime, LineGroup, MileageEntry,
    MileageSummary, ParsedWorkbook, Period, TimeLine, TimeSheets, WorkbookMetadata,
};
use calamine::{open_workbook_from_rs, Data, Range, Reader, Xlsx};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Computed values and formula text of one worksheet
#[derive(Debug, Clone)]
pub struct SheetData {
    values: Range<Data>,
    formulas: Option<Range<String>>,
}

impl SheetData {
    pub fn new(values: Range<Data>, formulas: Option<Range<String>>) -> Self {
        Self { values, formulas }
    }

    fn computed(&self, cell: CellRef) -> RawValue {
        self.values
            .get_value(cell.position())
            .map(RawValue::from)
            .unwrap_or(RawValue::Empty)
    }

    fn formula(&self, cell: CellRef) -> Option<&str> {
        self.formulas
            .as_ref()?
            .get_value(cell.position())
            .map(String::as_str)
    }

    /// 1-based number of the last row holding anything
    fn last_row(&self) -> u32 {
        self.values.end().map(|(row, _)| row + 1).unwrap_or(0)
    }
}

/// Every sheet of a workbook, loaded once in both read modes
#[derive(Debug, Clone, Default)]
pub struct WorkbookData {
    order: Vec<String>,
    sheets: HashMap<String, SheetData>,
}

impl WorkbookData {
    /// Load from raw bytes; `None` when the bytes are not an .xlsx container
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let mut workbook: Xlsx<_> = match open_workbook_from_rs(Cursor::new(bytes.to_vec())) {
            Ok(wb) => wb,
            Err(e) => {
                warn!("cannot open workbook container: {}", e);
                return None;
            }
        };

        let order = workbook.sheet_names().to_vec();
        let mut data = Self {
            order: Vec::with_capacity(order.len()),
            sheets: HashMap::new(),
        };
        for name in order {
            let values = match workbook.worksheet_range(&name) {
                Ok(range) => range,
                Err(e) => {
                    warn!(sheet = %name, "unreadable worksheet, treating as empty: {}", e);
                    Range::empty()
                }
            };
            let formulas = workbook.worksheet_formula(&name).ok();
            data.insert(&name, SheetData::new(values, formulas));
        }
        Some(data)
    }

    /// Add a sheet; later inserts replace earlier ones of the same name
    pub fn insert(&mut self, name: &str, sheet: SheetData) {
        if !self.sheets.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.sheets.insert(name.to_string(), sheet);
    }

    pub fn sheet_names(&self) -> &[String] {
        &self.order
    }

    fn sheet(&self, name: &str) -> Option<&SheetData> {
        self.sheets.get(name)
    }

    /// Logical value of a cell, following a single cross-sheet reference
    fn read(&self, sheet: &str, cell: CellRef) -> RawValue {
        let Some(data) = self.sheet(sheet) else {
            return RawValue::Empty;
        };
        cells::resolve(&data.computed(cell), data.formula(cell), self)
    }

    fn read_at(&self, sheet: &str, column: &str, row: u32) -> RawValue {
        match CellRef::at(column, row) {
            Some(cell) => self.read(sheet, cell),
            None => RawValue::Empty,
        }
    }

    fn read_a1(&self, sheet: &str, a1: &str) -> RawValue {
        match CellRef::parse(a1) {
            Some(cell) => self.read(sheet, cell),
            None => RawValue::Empty,
        }
    }
}

impl SheetLookup for WorkbookData {
    fn computed(&self, sheet: &str, cell: CellRef) -> Option<RawValue> {
        self.sheet(sheet).map(|s| s.computed(cell))
    }
}

/// Parse uploaded bytes. Never fails: unreadable input gives an empty workbook.
pub fn parse_workbook(bytes: &[u8]) -> ParsedWorkbook {
    match WorkbookData::from_bytes(bytes) {
        Some(data) => WorkbookParser::new(&data).parse(),
        None => ParsedWorkbook::default(),
    }
}

/// File-backed importer used by the CLI
pub struct WorkbookImporter {
    path: PathBuf,
}

impl WorkbookImporter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn import(&self) -> TimesheetResult<ParsedWorkbook> {
        let bytes = std::fs::read(&self.path)?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "importing workbook");
        Ok(parse_workbook(&bytes))
    }
}

//==============================================================================
// Parser
//==============================================================================

/// Walks the template geometry over already-loaded sheet data
pub struct WorkbookParser<'a> {
    data: &'a WorkbookData,
}

impl<'a> WorkbookParser<'a> {
    pub fn new(data: &'a WorkbookData) -> Self {
        Self { data }
    }

    pub fn parse(&self) -> ParsedWorkbook {
        let metadata = self.parse_metadata();
        let period = Period {
            year: metadata.year,
            month: metadata.month,
        };
        let validations = self.parse_validations_map();

        let time = TimeSheets {
            first_half: self.parse_time_half(Half::FirstHalf, period, &validations),
            second_half: self.parse_time_half(Half::SecondHalf, period, &validations),
        };

        ParsedWorkbook {
            sheets_present: self.data.sheet_names().to_vec(),
            metadata,
            period,
            time,
            expenses: self.parse_expenses(),
            mileage: self.parse_mileage(),
        }
    }

    fn parse_metadata(&self) -> WorkbookMetadata {
        let sheet = layout::TIME_FIRST_HALF;
        if self.data.sheet(sheet).is_none() {
            return WorkbookMetadata::default();
        }
        let text = |a1| self.data.read_a1(sheet, a1).text();
        let int = |a1| cells::to_int(&self.data.read_a1(sheet, a1));

        WorkbookMetadata {
            company: text(layout::COMPANY_CELL),
            employee_name: text(layout::EMPLOYEE_NAME_CELL),
            year: int(layout::YEAR_CELL).and_then(|y| i32::try_from(y).ok()),
            month: int(layout::MONTH_CELL).and_then(|m| u32::try_from(m).ok()),
            mid_marker: int(layout::MID_MARKER_CELL),
            template_version: text(layout::TEMPLATE_VERSION_CELL),
        }
    }

    /// Category label (A) → base code (B), from row 1 down
    fn parse_validations_map(&self) -> HashMap<String, String> {
        let sheet = layout::VALIDATIONS;
        let Some(data) = self.data.sheet(sheet) else {
            return HashMap::new();
        };
        let mut mapping = HashMap::new();
        for row in 1..=data.last_row() {
            let category = self.data.read_at(sheet, "A", row).text();
            let base_code = self.data.read_at(sheet, "B", row).text();
            if !category.is_empty() && !base_code.is_empty() {
                mapping.insert(category, base_code);
            }
        }
        debug!(entries = mapping.len(), "validations map");
        mapping
    }

    fn parse_time_half(
        &self,
        half: Half,
        period: Period,
        validations: &HashMap<String, String>,
    ) -> HalfMonthTime {
        let sheet = layout::time_sheet(half);
        let (Some(_), Some((year, month))) = (self.data.sheet(sheet), period.checked()) else {
            return HalfMonthTime::default();
        };

        let dates = layout::day_range(year, month, half);
        let columns = layout::day_columns(half, dates.len());
        let day_columns: Vec<(NaiveDate, &str)> = dates
            .iter()
            .copied()
            .zip(columns.iter().map(String::as_str))
            .collect();

        let mut time = HalfMonthTime {
            dates: dates.clone(),
            daily_totals: dates.iter().map(|d| (*d, Decimal::ZERO)).collect(),
            ..HalfMonthTime::default()
        };

        for band in layout::TIME_BANDS {
            for row in band.rows() {
                let line = self.parse_time_line(sheet, &band, row, &day_columns, validations);
                accumulate(&mut time, &line);
                time.lines.push(line);
            }
        }
        time.total_hours = saturating_sum(time.daily_totals.values());

        debug!(
            sheet,
            lines = time.lines.len(),
            total_hours = %time.total_hours,
            "parsed time sheet"
        );
        time
    }

    fn parse_time_line(
        &self,
        sheet: &str,
        band: &Band,
        row: u32,
        day_columns: &[(NaiveDate, &str)],
        validations: &HashMap<String, String>,
    ) -> TimeLine {
        let label = self.data.read_at(sheet, band.label_column, row).text();
        let (category, charge_code) = match band.code_column {
            Some(code_column) => (None, self.data.read_at(sheet, code_column, row).text()),
            None => {
                let base = validations.get(&label).cloned().unwrap_or_default();
                (Some(label.clone()), base)
            }
        };

        let mut hours_by_day = BTreeMap::new();
        let mut row_total = Decimal::ZERO;
        for (date, column) in day_columns {
            let hours = cells::to_decimal(&self.data.read_at(sheet, column, row))
                .unwrap_or(Decimal::ZERO);
            hours_by_day.insert(*date, hours);
            row_total = row_total.saturating_add(hours);
        }

        TimeLine {
            row,
            group: band.group,
            label,
            category,
            charge_code: Some(charge_code),
            hours_by_day,
            row_total,
        }
    }

    fn parse_expenses(&self) -> ExpenseSummary {
        let mut summary = ExpenseSummary {
            totals_by_bucket: layout::EXPENSE_BUCKETS
                .iter()
                .map(|(_, label)| (label.to_string(), Decimal::ZERO))
                .collect(),
            ..ExpenseSummary::default()
        };

        for sheet in layout::EXPENSE_SHEETS {
            if self.data.sheet(sheet).is_none() {
                continue;
            }
            for row in layout::EXPENSE_FIRST_ROW..=layout::EXPENSE_LAST_ROW {
                self.parse_expense_row(sheet, row, &mut summary);
            }
        }

        summary.total_expenses = summary
            .keystone_paid_total
            .saturating_add(summary.client_billed_total);
        debug!(
            items = summary.items.len(),
            total = %summary.total_expenses,
            "parsed expenses"
        );
        summary
    }

    fn parse_expense_row(&self, sheet: &str, row: u32, summary: &mut ExpenseSummary) {
        let read = |column| self.data.read_at(sheet, column, row);

        let date = cells::to_date(&read(layout::EXPENSE_DATE_COLUMN));
        let description = read(layout::EXPENSE_DESCRIPTION_COLUMN).text();
        let misc = read(layout::EXPENSE_MISC_COLUMN).text();
        let client_billed = cells::to_decimal(&read(layout::EXPENSE_CLIENT_BILLED_COLUMN));
        let charge_code = read(layout::EXPENSE_CHARGE_CODE_COLUMN).text();

        let mut amounts = Vec::new();
        let mut row_total = Decimal::ZERO;
        for (column, label) in layout::EXPENSE_BUCKETS {
            let amount = cells::to_decimal(&read(column)).unwrap_or(Decimal::ZERO);
            if amount <= Decimal::ZERO {
                continue;
            }
            add_into(&mut summary.totals_by_bucket, label, amount);
            summary.keystone_paid_total = summary.keystone_paid_total.saturating_add(amount);
            if layout::is_marketing_bucket(label) {
                summary.marketing_total = summary.marketing_total.saturating_add(amount);
            }
            row_total = row_total.saturating_add(amount);
            amounts.push((label, amount));
        }

        // Column D is summed whether or not the row is otherwise filled in
        if let Some(billed) = client_billed {
            summary.client_billed_total = summary.client_billed_total.saturating_add(billed);
        }

        let active = date.is_some()
            || !description.is_empty()
            || row_total > Decimal::ZERO
            || !charge_code.is_empty();
        if !active {
            return;
        }

        for (label, amount) in amounts {
            if !charge_code.is_empty() {
                add_into(&mut summary.totals_by_charge_code, &charge_code, amount);
            }
            summary.items.push(ExpenseItem {
                sheet: sheet.to_string(),
                row,
                date,
                description: description.clone(),
                charge_code: Some(charge_code.clone()),
                bucket: label.to_string(),
                amount,
                misc: misc.clone(),
                client_billed,
            });
        }
    }

    fn parse_mileage(&self) -> MileageSummary {
        let sheet = layout::MILEAGE_LOG;
        let Some(data) = self.data.sheet(sheet) else {
            return MileageSummary::default();
        };

        let mut summary = MileageSummary::default();
        for row in layout::MILEAGE_FIRST_ROW..=data.last_row() {
            let read = |column| self.data.read_at(sheet, column, row);

            let date = cells::to_date(&read(layout::MILEAGE_DATE_COLUMN));
            let destination = read(layout::MILEAGE_DESTINATION_COLUMN).text();
            let odometer_start = cells::to_decimal(&read(layout::MILEAGE_ODOMETER_START_COLUMN));
            let odometer_end = cells::to_decimal(&read(layout::MILEAGE_ODOMETER_END_COLUMN));
            let commute = cells::to_decimal(&read(layout::MILEAGE_COMMUTE_COLUMN))
                .unwrap_or(Decimal::ZERO);

            let has_signal = date.is_some()
                || !destination.is_empty()
                || odometer_start.is_some_and(|v| !v.is_zero())
                || odometer_end.is_some_and(|v| !v.is_zero())
                || !commute.is_zero();
            if !has_signal {
                continue;
            }

            let miles_driven = match (odometer_start, odometer_end) {
                (Some(start), Some(end)) => end.saturating_sub(start).max(Decimal::ZERO),
                _ => Decimal::ZERO,
            };
            let net_miles = miles_driven.saturating_sub(commute);

            summary.totals.miles_driven = summary.totals.miles_driven.saturating_add(miles_driven);
            summary.totals.net_miles = summary.totals.net_miles.saturating_add(net_miles);
            summary.entries.push(MileageEntry {
                row,
                date,
                destination,
                odometer_start,
                odometer_end,
                commute_miles: commute,
                miles_driven,
                net_miles,
            });
        }
        summary
    }
}

/// Fold one line into the half's daily and per-code totals
fn accumulate(time: &mut HalfMonthTime, line: &TimeLine) {
    for (date, hours) in &line.hours_by_day {
        let day = time.daily_totals.entry(*date).or_default();
        *day = day.saturating_add(*hours);
    }
    let Some(code) = line.code() else {
        return;
    };
    let totals = match line.group {
        LineGroup::Client => &mut time.totals_by_client_code,
        LineGroup::Marketing => &mut time.totals_by_marketing_bucket,
        LineGroup::Internal => &mut time.totals_by_other_hours,
    };
    add_into(totals, code, line.row_total);
}

fn add_into(totals: &mut BTreeMap<String, Decimal>, key: &str, amount: Decimal) {
    let slot = totals.entry(key.to_string()).or_default();
    *slot = slot.saturating_add(amount);
}
