//! Cell resolution and coercion
//!
//! Every cell read goes through [`resolve`]: take the computed value when the
//! workbook cached one, otherwise follow a single-cell cross-sheet reference
//! (`='Sheet Name'!A16`) to its computed value. Nothing here evaluates
//! formulas; any other formula shape resolves to empty.

use calamine::Data;
use chrono::{Duration, NaiveDate};
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Typed value of a single cell
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Empty,
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    /// Spreadsheet serial date (1900 system)
    DateSerial(f64),
    /// ISO 8601 date/datetime text from the container
    DateIso(String),
}

impl RawValue {
    pub fn is_empty(&self) -> bool {
        match self {
            RawValue::Empty => true,
            RawValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Trimmed display text; empty for empty cells
    pub fn text(&self) -> String {
        match self {
            RawValue::Empty => String::new(),
            RawValue::Int(i) => i.to_string(),
            RawValue::Float(f) => format_float(*f),
            RawValue::Text(s) => s.trim().to_string(),
            RawValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            RawValue::DateSerial(f) => to_date(&RawValue::DateSerial(*f))
                .map(|d| d.to_string())
                .unwrap_or_default(),
            RawValue::DateIso(s) => s.trim().to_string(),
        }
    }
}

impl From<&Data> for RawValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty | Data::Error(_) => RawValue::Empty,
            Data::Int(i) => RawValue::Int(*i),
            Data::Float(f) => RawValue::Float(*f),
            Data::String(s) => RawValue::Text(s.clone()),
            Data::Bool(b) => RawValue::Bool(*b),
            Data::DateTime(dt) => RawValue::DateSerial(dt.as_f64()),
            Data::DateTimeIso(s) => RawValue::DateIso(s.clone()),
            Data::DurationIso(s) => RawValue::Text(s.clone()),
        }
    }
}

//==============================================================================
// A1 references
//==============================================================================

/// Zero-based cell coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Column letters plus a 1-based row number
    pub fn at(column: &str, row: u32) -> Option<Self> {
        Some(Self {
            row: row.checked_sub(1)?,
            col: column_index(column)?,
        })
    }

    /// Parse `B16` / `$B$16`
    pub fn parse(a1: &str) -> Option<Self> {
        let a1 = a1.trim();
        let split = a1.find(|c: char| c.is_ascii_digit())?;
        let (letters, digits) = a1.split_at(split);
        let letters = letters.replace('$', "");
        let row: u32 = digits.parse().ok()?;
        Self::at(&letters, row)
    }

    pub fn position(&self) -> (u32, u32) {
        (self.row, self.col)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letter(self.col), self.row + 1)
    }
}

/// Column letters to zero-based index (A→0, Z→25, AA→26)
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() || letters.len() > 3 {
        return None;
    }
    let mut index: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        index = index * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
    }
    Some(index - 1)
}

/// Zero-based index to column letters (0→A, 25→Z, 26→AA)
pub fn column_letter(index: u32) -> String {
    let mut result = String::new();
    let mut num = index;

    loop {
        let remainder = num % 26;
        result.insert(0, (b'A' + remainder as u8) as char);
        if num < 26 {
            break;
        }
        num = num / 26 - 1;
    }

    result
}

//==============================================================================
// Resolution
//==============================================================================

/// Computed-value access to every sheet of a workbook
pub trait SheetLookup {
    /// Cached value at `cell` of `sheet`, `None` when the sheet does not exist
    fn computed(&self, sheet: &str, cell: CellRef) -> Option<RawValue>;
}

/// A formula that is nothing but a reference to one cell on another sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossSheetRef {
    pub sheet: String,
    pub cell: CellRef,
}

fn cross_sheet_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // 'Sheet Name'!$A$16 or Sheet!A16, with or without the leading '='
        Regex::new(r"^=?\s*(?:'((?:[^']|'')+)'|([A-Za-z0-9_.]+))!\$?([A-Za-z]{1,3})\$?([0-9]+)\s*$")
            .expect("cross-sheet reference pattern is valid")
    })
}

/// Match a single-cell cross-sheet reference; anything else is `None`
pub fn parse_cross_sheet_ref(formula: &str) -> Option<CrossSheetRef> {
    let caps = cross_sheet_pattern().captures(formula.trim())?;
    let sheet = match (caps.get(1), caps.get(2)) {
        (Some(quoted), _) => quoted.as_str().replace("''", "'"),
        (None, Some(bare)) => bare.as_str().to_string(),
        (None, None) => return None,
    };
    let row: u32 = caps.get(4)?.as_str().parse().ok()?;
    let cell = CellRef::at(caps.get(3)?.as_str(), row)?;
    Some(CrossSheetRef { sheet, cell })
}

/// Resolve one logical cell value.
///
/// `primary` is the computed read, `formula` the formula-mode read of the same
/// cell. A referenced cell is read by its computed value only; references are
/// not chased further.
pub fn resolve(primary: &RawValue, formula: Option<&str>, sheets: &dyn SheetLookup) -> RawValue {
    if !primary.is_empty() {
        return primary.clone();
    }
    let Some(formula) = formula.map(str::trim).filter(|f| !f.is_empty()) else {
        return RawValue::Empty;
    };
    let Some(reference) = parse_cross_sheet_ref(formula) else {
        return RawValue::Empty;
    };
    match sheets.computed(&reference.sheet, reference.cell) {
        Some(value) if !value.is_empty() => value,
        _ => RawValue::Empty,
    }
}

//==============================================================================
// Coercion
//==============================================================================

/// Formula text or an apostrophe-prefixed literal, never a number or date
fn is_literal_text(s: &str) -> bool {
    s.starts_with('=') || s.starts_with('\'')
}

/// Largest magnitude a numeric cell may carry; anything beyond reads as empty
pub const MAX_CELL_MAGNITUDE: Decimal = dec!(1_000_000_000);

/// Exact decimal value of a cell, `None` when absent, not numeric or out of range
pub fn to_decimal(value: &RawValue) -> Option<Decimal> {
    let decimal = match value {
        RawValue::Int(i) => Some(Decimal::from(*i)),
        RawValue::Float(f) => float_to_decimal(*f),
        RawValue::Text(s) => {
            let s = s.trim();
            if s.is_empty() || is_literal_text(s) {
                return None;
            }
            parse_decimal(s)
        }
        _ => None,
    };
    decimal.filter(|d| d.abs() <= MAX_CELL_MAGNITUDE)
}

/// Whole number of a cell (header year/month). Fractions truncate.
pub fn to_int(value: &RawValue) -> Option<i64> {
    use rust_decimal::prelude::ToPrimitive;
    to_decimal(value).and_then(|d| d.trunc().to_i64())
}

/// Calendar date of a cell, `None` when absent or unparsable
pub fn to_date(value: &RawValue) -> Option<NaiveDate> {
    match value {
        RawValue::DateSerial(f) | RawValue::Float(f) => serial_to_date(*f),
        RawValue::Int(i) => serial_to_date(*i as f64),
        RawValue::DateIso(s) => parse_date_text(s),
        RawValue::Text(s) => {
            let s = s.trim();
            if s.is_empty() || is_literal_text(s) {
                return None;
            }
            parse_date_text(s)
        }
        _ => None,
    }
}

/// 1900 date system; serials below 61 sit before the phantom 1900-02-29
fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > 2_958_465.0 {
        return None;
    }
    let days = serial.trunc() as i64;
    let epoch = if days < 61 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    epoch.checked_add_signed(Duration::days(days))
}

fn parse_date_text(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let date_part = s.split(['T', ' ']).next().unwrap_or(s);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%m/%d/%Y"))
        .ok()
}

fn float_to_decimal(f: f64) -> Option<Decimal> {
    if !f.is_finite() {
        return None;
    }
    // Shortest round-trip text, so 7.1 stays 7.1 rather than its binary expansion
    parse_decimal(&f.to_string())
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
        .map(|d| d.normalize())
}

fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}
