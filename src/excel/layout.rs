//! Fixed geometry of the T&E template
//!
//! The template is a spreadsheet used as a database: meaning is encoded in
//! sheet names, row ranges and column letters. All of it lives here so the
//! importer and validator never carry bare coordinates.

use crate::types::{Half, LineGroup};
use chrono::{Datelike, NaiveDate};

pub const TIME_FIRST_HALF: &str = "Time-1st half of month";
pub const TIME_SECOND_HALF: &str = "Time-2nd half of month";
pub const EXPENSES_MAIN: &str = "Expenses-Main";
pub const EXPENSES_ADDITIONAL: &str = "Expenses-Additional";
pub const MILEAGE_LOG: &str = "Auto Log 655";
pub const VALIDATIONS: &str = "Validations";

pub const REQUIRED_SHEETS: [&str; 6] = [
    TIME_FIRST_HALF,
    TIME_SECOND_HALF,
    EXPENSES_MAIN,
    EXPENSES_ADDITIONAL,
    MILEAGE_LOG,
    VALIDATIONS,
];

pub const EXPENSE_SHEETS: [&str; 2] = [EXPENSES_MAIN, EXPENSES_ADDITIONAL];

/// Time sheet for a half
pub fn time_sheet(half: Half) -> &'static str {
    match half {
        Half::FirstHalf => TIME_FIRST_HALF,
        Half::SecondHalf => TIME_SECOND_HALF,
    }
}

//==============================================================================
// Header cells (first-half time sheet)
//==============================================================================

pub const COMPANY_CELL: &str = "A1";
pub const EMPLOYEE_NAME_CELL: &str = "L1";
pub const YEAR_CELL: &str = "T1";
pub const MONTH_CELL: &str = "V1";
pub const MID_MARKER_CELL: &str = "X1";
pub const TEMPLATE_VERSION_CELL: &str = "A39";

/// Text every current template carries in its version cell
pub const TEMPLATE_VERSION_MARKER: &str = "Version";

//==============================================================================
// Time bands
//==============================================================================

/// A contiguous run of rows with one meaning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub group: LineGroup,
    pub first_row: u32,
    pub last_row: u32,
    /// Label (client/internal) or category (marketing) column
    pub label_column: &'static str,
    /// Marketing rows take their code from the Validations lookup instead
    pub code_column: Option<&'static str>,
}

impl Band {
    pub fn rows(&self) -> std::ops::RangeInclusive<u32> {
        self.first_row..=self.last_row
    }
}

pub const CLIENT_BAND: Band = Band {
    group: LineGroup::Client,
    first_row: 6,
    last_row: 13,
    label_column: "A",
    code_column: Some("U"),
};

pub const MARKETING_BAND: Band = Band {
    group: LineGroup::Marketing,
    first_row: 16,
    last_row: 29,
    label_column: "A",
    code_column: None,
};

pub const INTERNAL_BAND: Band = Band {
    group: LineGroup::Internal,
    first_row: 30,
    last_row: 36,
    label_column: "A",
    code_column: Some("U"),
};

pub const TIME_BANDS: [Band; 3] = [CLIENT_BAND, MARKETING_BAND, INTERNAL_BAND];

/// Placeholder text of the marketing category dropdown
pub const CATEGORY_PLACEHOLDER: &str = "select category";

/// Zero-based index of the first day column (B)
const FIRST_DAY_COLUMN: u32 = 1;

/// Calendar days a half covers
pub fn day_range(year: i32, month: u32, half: Half) -> Vec<NaiveDate> {
    let Some(last) = last_day_of_month(year, month) else {
        return Vec::new();
    };
    let (start, end) = match half {
        Half::FirstHalf => (1, 15),
        Half::SecondHalf => (16, last),
    };
    (start..=end)
        .filter_map(|d| NaiveDate::from_ymd_opt(year, month, d))
        .collect()
}

/// Column letters holding each day of a half, in order.
///
/// Both halves start at column B. The first half always has 15 day columns;
/// the second half has one per remaining day (13 to 16 depending on month
/// length).
pub fn day_columns(half: Half, day_count: usize) -> Vec<String> {
    let count = match half {
        Half::FirstHalf => day_count.min(15),
        Half::SecondHalf => day_count.min(16),
    };
    (0..count as u32)
        .map(|i| super::cells::column_letter(FIRST_DAY_COLUMN + i))
        .collect()
}

/// Column letter a given date occupies on its half's sheet
pub fn day_column(date: NaiveDate) -> String {
    let offset = if date.day() <= 15 {
        date.day() - 1
    } else {
        date.day() - 16
    };
    super::cells::column_letter(FIRST_DAY_COLUMN + offset)
}

pub fn last_day_of_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((next - first).num_days() as u32)
}

//==============================================================================
// Expense sheets
//==============================================================================

pub const EXPENSE_FIRST_ROW: u32 = 5;
pub const EXPENSE_LAST_ROW: u32 = 38;

pub const EXPENSE_DATE_COLUMN: &str = "A";
pub const EXPENSE_DESCRIPTION_COLUMN: &str = "B";
pub const EXPENSE_MISC_COLUMN: &str = "C";
/// Billed straight to a client; not a bucket
pub const EXPENSE_CLIENT_BILLED_COLUMN: &str = "D";
pub const EXPENSE_CHARGE_CODE_COLUMN: &str = "V";

/// The sixteen bucket columns and their labels
pub const EXPENSE_BUCKETS: [(&str, &str); 16] = [
    ("E", "Marketing - Meals"),
    ("F", "Marketing - Entertainment"),
    ("G", "Marketing - General"),
    ("H", "Recruiting - Meals"),
    ("I", "Recruiting - Entertainment"),
    ("J", "Recruiting - General"),
    ("K", "Keystone - Meals"),
    ("L", "Keystone - Entertainment"),
    ("M", "Keystone - General"),
    ("N", "Travel"),
    ("O", "Office - Supplies"),
    ("P", "Computer - Expenses"),
    ("Q", "Training"),
    ("R", "Dues & Subscriptions"),
    ("S", "Telecom - Phone"),
    ("T", "Other"),
];

pub fn is_marketing_bucket(label: &str) -> bool {
    label.starts_with("Marketing")
}

pub fn is_expense_bucket(label: &str) -> bool {
    EXPENSE_BUCKETS.iter().any(|(_, known)| *known == label)
}

//==============================================================================
// Mileage log
//==============================================================================

pub const MILEAGE_FIRST_ROW: u32 = 7;
pub const MILEAGE_DATE_COLUMN: &str = "A";
pub const MILEAGE_DESTINATION_COLUMN: &str = "C";
pub const MILEAGE_ODOMETER_START_COLUMN: &str = "E";
pub const MILEAGE_ODOMETER_END_COLUMN: &str = "F";
pub const MILEAGE_COMMUTE_COLUMN: &str = "I";
