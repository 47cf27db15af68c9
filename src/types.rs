use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

//==============================================================================
// Periods
//==============================================================================

/// One of the two reporting windows in a month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Half {
    /// Days 1-15
    FirstHalf,
    /// Days 16 through month end
    SecondHalf,
}

impl Half {
    pub const ALL: [Half; 2] = [Half::FirstHalf, Half::SecondHalf];

    /// Key used in persisted data (`first_half` / `second_half`)
    pub fn key(self) -> &'static str {
        match self {
            Half::FirstHalf => "first_half",
            Half::SecondHalf => "second_half",
        }
    }

    pub fn display(self) -> &'static str {
        match self {
            Half::FirstHalf => "1st-15th",
            Half::SecondHalf => "16th-end",
        }
    }
}

impl fmt::Display for Half {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Target month read from the template header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Period {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

impl Period {
    /// Both parts present and plausible (month 1-12, year 2000+)
    pub fn checked(&self) -> Option<(i32, u32)> {
        match (self.year, self.month) {
            (Some(y), Some(m)) if (1..=12).contains(&m) && y >= 2000 => Some((y, m)),
            _ => None,
        }
    }
}

//==============================================================================
// Parsed workbook
//==============================================================================

/// Structured view of one uploaded T&E workbook.
///
/// Persisted verbatim next to the upload and re-read later by the report
/// engine, so every field defaults when absent in stored JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsedWorkbook {
    /// Sheet names in workbook order
    pub sheets_present: Vec<String>,
    pub metadata: WorkbookMetadata,
    pub period: Period,
    pub time: TimeSheets,
    pub expenses: ExpenseSummary,
    pub mileage: MileageSummary,
}

impl ParsedWorkbook {
    pub fn has_sheet(&self, name: &str) -> bool {
        self.sheets_present.iter().any(|s| s == name)
    }

    pub fn half(&self, half: Half) -> &HalfMonthTime {
        self.time.get(half)
    }

    /// Hours across both halves
    pub fn total_hours(&self) -> Decimal {
        self.time
            .first_half
            .total_hours
            .saturating_add(self.time.second_half.total_hours)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkbookMetadata {
    pub company: String,
    pub employee_name: String,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub mid_marker: Option<i64>,
    pub template_version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeSheets {
    pub first_half: HalfMonthTime,
    pub second_half: HalfMonthTime,
}

impl TimeSheets {
    pub fn get(&self, half: Half) -> &HalfMonthTime {
        match half {
            Half::FirstHalf => &self.first_half,
            Half::SecondHalf => &self.second_half,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Half, &HalfMonthTime)> {
        Half::ALL.into_iter().map(move |h| (h, self.get(h)))
    }
}

/// Row band a time line belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineGroup {
    Client,
    Marketing,
    Internal,
}

impl LineGroup {
    pub fn as_str(self) -> &'static str {
        match self {
            LineGroup::Client => "client",
            LineGroup::Marketing => "marketing",
            LineGroup::Internal => "internal",
        }
    }
}

/// One row of a half-month time grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeLine {
    /// 1-based sheet row
    pub row: u32,
    pub group: LineGroup,
    pub label: String,
    /// Marketing rows only: the category picked from the dropdown
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub charge_code: Option<String>,
    #[serde(default)]
    pub hours_by_day: BTreeMap<NaiveDate, Decimal>,
    #[serde(default)]
    pub row_total: Decimal,
}

impl TimeLine {
    /// Charge code with blanks treated as missing
    pub fn code(&self) -> Option<&str> {
        non_blank(self.charge_code.as_deref())
    }

    pub fn category(&self) -> Option<&str> {
        non_blank(self.category.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HalfMonthTime {
    pub dates: Vec<NaiveDate>,
    pub lines: Vec<TimeLine>,
    pub daily_totals: BTreeMap<NaiveDate, Decimal>,
    pub totals_by_client_code: BTreeMap<String, Decimal>,
    pub totals_by_marketing_bucket: BTreeMap<String, Decimal>,
    pub totals_by_other_hours: BTreeMap<String, Decimal>,
    pub total_hours: Decimal,
}

impl HalfMonthTime {
    pub fn lines_in(&self, group: LineGroup) -> impl Iterator<Item = &TimeLine> {
        self.lines.iter().filter(move |l| l.group == group)
    }

    /// Sum of the three classification maps
    pub fn classified_hours(&self) -> Decimal {
        saturating_sum(
            self.totals_by_client_code
                .values()
                .chain(self.totals_by_marketing_bucket.values())
                .chain(self.totals_by_other_hours.values()),
        )
    }

    /// `total_hours`, the daily totals and the classified totals agree within `tolerance`
    pub fn is_reconciled(&self, tolerance: Decimal) -> bool {
        let daily = saturating_sum(self.daily_totals.values());
        self.total_hours.saturating_sub(daily).abs() <= tolerance
            && self.total_hours.saturating_sub(self.classified_hours()).abs() <= tolerance
    }
}

//==============================================================================
// Expenses and mileage
//==============================================================================

/// A single non-zero bucket amount on an expense row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseItem {
    #[serde(default)]
    pub sheet: String,
    #[serde(default)]
    pub row: u32,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub charge_code: Option<String>,
    pub bucket: String,
    pub amount: Decimal,
    #[serde(default)]
    pub misc: String,
    #[serde(default)]
    pub client_billed: Option<Decimal>,
}

impl ExpenseItem {
    pub fn code(&self) -> Option<&str> {
        non_blank(self.charge_code.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpenseSummary {
    pub items: Vec<ExpenseItem>,
    pub totals_by_bucket: BTreeMap<String, Decimal>,
    pub totals_by_charge_code: BTreeMap<String, Decimal>,
    pub marketing_total: Decimal,
    /// Reimbursed by the firm (every bucket amount)
    pub keystone_paid_total: Decimal,
    pub client_billed_total: Decimal,
    pub total_expenses: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MileageEntry {
    pub row: u32,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub odometer_start: Option<Decimal>,
    #[serde(default)]
    pub odometer_end: Option<Decimal>,
    #[serde(default)]
    pub commute_miles: Decimal,
    pub miles_driven: Decimal,
    pub net_miles: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MileageTotals {
    pub miles_driven: Decimal,
    pub net_miles: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MileageSummary {
    pub entries: Vec<MileageEntry>,
    pub totals: MileageTotals,
}

//==============================================================================
// Validation issues
//==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Blocks submission
    Error,
    /// Informational
    Warn,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("ERROR"),
            Severity::Warn => f.write_str("WARN"),
        }
    }
}

/// Stable machine-readable issue identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    StructureMissingSheet,
    StructureMissingCell,
    StructureInvalidPeriod,
    StructureUnknownTemplateVersion,
    PeriodOutsideSubmissionWindow,
    TimeMissingChargeCode,
    TimeMarketingCategoryNotSelected,
    TimeNegativeHours,
    TimeNonstandardIncrement,
    TimeDailyMinimumNotMet,
    TimeDayExceeds24,
    ExpenseMissingChargeCode,
    ExpenseMissingDate,
    ExpenseMissingDescription,
    ExpenseUnknownChargeCode,
    ExpenseMarketingAllocationMismatch,
    ExpenseClientBilledMismatch,
    ExpenseKeystonePaidMismatch,
    ExpenseTotalMismatch,
}

impl IssueCode {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueCode::StructureMissingSheet => "STRUCTURE_MISSING_SHEET",
            IssueCode::StructureMissingCell => "STRUCTURE_MISSING_CELL",
            IssueCode::StructureInvalidPeriod => "STRUCTURE_INVALID_PERIOD",
            IssueCode::StructureUnknownTemplateVersion => "STRUCTURE_UNKNOWN_TEMPLATE_VERSION",
            IssueCode::PeriodOutsideSubmissionWindow => "PERIOD_OUTSIDE_SUBMISSION_WINDOW",
            IssueCode::TimeMissingChargeCode => "TIME_MISSING_CHARGE_CODE",
            IssueCode::TimeMarketingCategoryNotSelected => "TIME_MARKETING_CATEGORY_NOT_SELECTED",
            IssueCode::TimeNegativeHours => "TIME_NEGATIVE_HOURS",
            IssueCode::TimeNonstandardIncrement => "TIME_NONSTANDARD_INCREMENT",
            IssueCode::TimeDailyMinimumNotMet => "TIME_DAILY_MINIMUM_NOT_MET",
            IssueCode::TimeDayExceeds24 => "TIME_DAY_EXCEEDS_24",
            IssueCode::ExpenseMissingChargeCode => "EXPENSE_MISSING_CHARGE_CODE",
            IssueCode::ExpenseMissingDate => "EXPENSE_MISSING_DATE",
            IssueCode::ExpenseMissingDescription => "EXPENSE_MISSING_DESCRIPTION",
            IssueCode::ExpenseUnknownChargeCode => "EXPENSE_UNKNOWN_CHARGE_CODE",
            IssueCode::ExpenseMarketingAllocationMismatch => {
                "EXPENSE_MARKETING_ALLOCATION_MISMATCH"
            }
            IssueCode::ExpenseClientBilledMismatch => "EXPENSE_CLIENT_BILLED_MISMATCH",
            IssueCode::ExpenseKeystonePaidMismatch => "EXPENSE_KEYSTONE_PAID_MISMATCH",
            IssueCode::ExpenseTotalMismatch => "EXPENSE_TOTAL_MISMATCH",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finding from the validator. Pure output; never feeds back into parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: IssueCode,
    pub message: String,
    /// `Sheet!Cell`-style pointer for the user
    pub location: String,
    pub hint: String,
}

impl ValidationIssue {
    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} at {}: {}",
            self.severity, self.code, self.location, self.message
        )
    }
}

/// Any ERROR-severity issue makes an upload non-submittable
pub fn has_blocking_errors(issues: &[ValidationIssue]) -> bool {
    issues.iter().any(ValidationIssue::is_blocking)
}

/// Sum that pins at `Decimal::MAX`/`MIN` instead of panicking. Persisted
/// parses arrive as JSON, so their magnitudes are not bounded by the reader.
pub fn saturating_sum<'a, I>(values: I) -> Decimal
where
    I: IntoIterator<Item = &'a Decimal>,
{
    values
        .into_iter()
        .fold(Decimal::ZERO, |acc, v| acc.saturating_add(*v))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
