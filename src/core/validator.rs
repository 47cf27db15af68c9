//! Business-rule validation of a parsed workbook
//!
//! Validation is pure: the workbook is only read, the result is a list of
//! issues, and "today" is an explicit input to [`Validator::validate_on`].

use crate::config::RulesConfig;
use crate::core::codes;
use crate::core::windows::{is_weekday, SubmissionWindows};
use crate::excel::layout;
use crate::types::{
    saturating_sum, Half, HalfMonthTime, IssueCode, LineGroup, ParsedWorkbook, Severity,
    ValidationIssue,
};
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use std::collections::BTreeSet;

const PERIOD_LOCATION: &str = "Time-1st half of month!T1/V1";
const RECONCILIATION_LOCATION: &str = "Expenses-Main/Additional";

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Checks a [`ParsedWorkbook`] against the configured rules
pub struct Validator<'a> {
    rules: &'a RulesConfig,
    windows: SubmissionWindows,
}

impl<'a> Validator<'a> {
    pub fn new(rules: &'a RulesConfig) -> Self {
        Self {
            rules,
            windows: SubmissionWindows::new(rules.upload_grace_calendar_days),
        }
    }

    /// Validate against the local calendar date
    pub fn validate(&self, parsed: &ParsedWorkbook) -> Vec<ValidationIssue> {
        self.validate_on(parsed, Local::now().date_naive())
    }

    /// Validate as if it were `today`
    pub fn validate_on(&self, parsed: &ParsedWorkbook, today: NaiveDate) -> Vec<ValidationIssue> {
        let mut issues = Issues::default();

        self.check_structure(parsed, today, &mut issues);

        let open_halves = parsed
            .period
            .checked()
            .map(|(year, month)| self.windows.open_halves(year, month, today))
            .unwrap_or_default();
        for (half, time) in parsed.time.iter() {
            self.check_time_half(half, time, open_halves.contains(&half), &mut issues);
        }

        self.check_expense_rows(parsed, &mut issues);
        self.check_reconciliation(parsed, &mut issues);

        issues.0
    }

    //==========================================================================
    // Structure and admission
    //==========================================================================

    fn check_structure(&self, parsed: &ParsedWorkbook, today: NaiveDate, issues: &mut Issues) {
        for name in layout::REQUIRED_SHEETS {
            if !parsed.has_sheet(name) {
                issues.push(
                    Severity::Error,
                    IssueCode::StructureMissingSheet,
                    format!("Missing required sheet: {name}"),
                    name.to_string(),
                    "Download a fresh template and re-upload.",
                );
            }
        }

        match (parsed.period.year, parsed.period.month) {
            (Some(year), Some(month)) if year != 0 && month != 0 => {
                match parsed.period.checked() {
                    None => issues.push(
                        Severity::Error,
                        IssueCode::StructureInvalidPeriod,
                        format!("Invalid period: {year}-{month}"),
                        PERIOD_LOCATION.to_string(),
                        "Ensure the month/year are correct in the template.",
                    ),
                    Some((year, month)) if !self.windows.is_valid_target(year, month, today) => {
                        issues.push(
                            Severity::Error,
                            IssueCode::PeriodOutsideSubmissionWindow,
                            format!(
                                "This workbook is for {} {}, which is outside the current submission window.",
                                month_name(month),
                                year
                            ),
                            PERIOD_LOCATION.to_string(),
                            "Upload the timesheet for the current period, or contact your office manager if you need a late submission.",
                        )
                    }
                    Some(_) => {}
                }
            }
            _ => issues.push(
                Severity::Error,
                IssueCode::StructureMissingCell,
                "Missing year or month in the template header.".to_string(),
                PERIOD_LOCATION.to_string(),
                "Check the template header cells and re-upload.",
            ),
        }

        let version = parsed.metadata.template_version.trim();
        if !version.is_empty() && !version.contains(layout::TEMPLATE_VERSION_MARKER) {
            issues.push(
                Severity::Warn,
                IssueCode::StructureUnknownTemplateVersion,
                "Template version does not look like a known signature.".to_string(),
                format!("{}!{}", layout::TIME_FIRST_HALF, layout::TEMPLATE_VERSION_CELL),
                "Confirm you used the latest template.",
            );
        }
    }

    //==========================================================================
    // Time grid
    //==========================================================================

    /// `enforce_minimums` is true while the half's submission window is open;
    /// outside it the attendance findings drop to WARN.
    fn check_time_half(
        &self,
        half: Half,
        time: &HalfMonthTime,
        enforce_minimums: bool,
        issues: &mut Issues,
    ) {
        let sheet = layout::time_sheet(half);
        let minimum_severity = if enforce_minimums {
            Severity::Error
        } else {
            Severity::Warn
        };
        let increment = self.rules.time_increment_minutes;

        for line in &time.lines {
            let has_hours = line.row_total > Decimal::ZERO;

            if line.group == LineGroup::Client && has_hours && line.code().is_none() {
                issues.push(
                    minimum_severity,
                    IssueCode::TimeMissingChargeCode,
                    "Hours entered without a client charge code.".to_string(),
                    format!("{sheet}!U{}", line.row),
                    "Add a charge code for this row.",
                );
            }

            if line.group == LineGroup::Marketing && has_hours {
                let selected = line
                    .category()
                    .filter(|c| !c.eq_ignore_ascii_case(layout::CATEGORY_PLACEHOLDER));
                if selected.is_none() {
                    issues.push(
                        minimum_severity,
                        IssueCode::TimeMarketingCategoryNotSelected,
                        "Marketing row has hours but no category selected.".to_string(),
                        format!("{sheet}!A{}", line.row),
                        "Select a marketing category from the dropdown.",
                    );
                }
            }

            for (date, hours) in &line.hours_by_day {
                let cell = format!("{sheet}!{}{}", layout::day_column(*date), line.row);
                if *hours < Decimal::ZERO {
                    issues.push(
                        Severity::Error,
                        IssueCode::TimeNegativeHours,
                        "Negative hours entered.".to_string(),
                        cell.clone(),
                        "Hours must be zero or positive.",
                    );
                }
                if !is_increment_multiple(*hours, increment) {
                    issues.push(
                        Severity::Warn,
                        IssueCode::TimeNonstandardIncrement,
                        format!("Hours not in {increment}-minute increments."),
                        cell,
                        format!("Use {increment}-minute increments where possible."),
                    );
                }
            }
        }

        let half_has_hours = time.total_hours > Decimal::ZERO;
        for (date, hours) in &time.daily_totals {
            if half_has_hours && is_weekday(*date) && *hours < self.rules.min_weekday_hours {
                issues.push(
                    minimum_severity,
                    IssueCode::TimeDailyMinimumNotMet,
                    format!("Weekday total is below minimum: {} hours.", hours.normalize()),
                    format!("{sheet}!{date}"),
                    "Ensure weekday hours meet the minimum requirement.",
                );
            }
            if *hours > Decimal::from(24) {
                issues.push(
                    Severity::Error,
                    IssueCode::TimeDayExceeds24,
                    "Daily total exceeds 24 hours.".to_string(),
                    format!("{sheet}!{date}"),
                    "Adjust hours so the daily total is realistic.",
                );
            }
        }
    }

    //==========================================================================
    // Expenses
    //==========================================================================

    fn check_expense_rows(&self, parsed: &ParsedWorkbook, issues: &mut Issues) {
        let known = known_codes(parsed);

        for item in &parsed.expenses.items {
            if item.amount <= Decimal::ZERO {
                continue;
            }
            if item.code().is_none() {
                issues.push(
                    Severity::Warn,
                    IssueCode::ExpenseMissingChargeCode,
                    "Expense amount entered without a charge code.".to_string(),
                    format!("{}!V{}", item.sheet, item.row),
                    "Add a charge code for this expense row.",
                );
            }
            if item.date.is_none() {
                issues.push(
                    Severity::Warn,
                    IssueCode::ExpenseMissingDate,
                    "Expense amount entered without a date.".to_string(),
                    format!("{}!A{}", item.sheet, item.row),
                    "Add a date for this expense row.",
                );
            }
            if item.description.trim().is_empty() {
                issues.push(
                    Severity::Warn,
                    IssueCode::ExpenseMissingDescription,
                    "Expense amount entered without a description.".to_string(),
                    format!("{}!B{}", item.sheet, item.row),
                    "Add a description for this expense row.",
                );
            }
            if let (Some(code), Some(known)) = (item.code(), known.as_ref()) {
                if !known.contains(code) {
                    issues.push(
                        Severity::Warn,
                        IssueCode::ExpenseUnknownChargeCode,
                        format!("Charge code {code} does not match any time sheet line."),
                        format!("{}!V{}", item.sheet, item.row),
                        "Use a charge code that appears in your time sheet.",
                    );
                }
            }
        }
    }

    /// One finding per rule, never per row
    fn check_reconciliation(&self, parsed: &ParsedWorkbook, issues: &mut Issues) {
        let expenses = &parsed.expenses;
        let tolerance = self.rules.aggregation_rounding_tolerance;
        let by_code = &expenses.totals_by_charge_code;
        let sum_of = |codes: &BTreeSet<String>| -> Decimal {
            saturating_sum(codes.iter().filter_map(|c| by_code.get(c)))
        };
        let off = |a: Decimal, b: Decimal| a.saturating_sub(b).abs() > tolerance;

        let marketing = codes::marketing_codes(parsed);
        if off(sum_of(&marketing), expenses.marketing_total) {
            issues.push(
                Severity::Warn,
                IssueCode::ExpenseMarketingAllocationMismatch,
                "Marketing expenses do not reconcile with marketing charge codes.".to_string(),
                RECONCILIATION_LOCATION.to_string(),
                "Ensure marketing expenses use *-LEAD or *-OTHER codes.",
            );
        }

        if expenses.client_billed_total > Decimal::ZERO
            && off(sum_of(&codes::client_codes(parsed)), expenses.client_billed_total)
        {
            issues.push(
                Severity::Warn,
                IssueCode::ExpenseClientBilledMismatch,
                "Client-billed expenses do not reconcile with client charge codes.".to_string(),
                RECONCILIATION_LOCATION.to_string(),
                "Code client-billed amounts to client charge codes.",
            );
        }

        let mut employer_paid = codes::internal_codes();
        employer_paid.extend(marketing);
        if off(sum_of(&employer_paid), expenses.keystone_paid_total) {
            issues.push(
                Severity::Warn,
                IssueCode::ExpenseKeystonePaidMismatch,
                "Keystone-paid expenses do not reconcile with internal codes.".to_string(),
                RECONCILIATION_LOCATION.to_string(),
                "Ensure internal expenses use ADM/MTG/REC/TRN/HOL/PTO/OFF or marketing codes.",
            );
        }

        let all_coded = saturating_sum(by_code.values());
        if off(all_coded, expenses.total_expenses) {
            issues.push(
                Severity::Warn,
                IssueCode::ExpenseTotalMismatch,
                "Total expenses do not reconcile with coded expenses.".to_string(),
                RECONCILIATION_LOCATION.to_string(),
                "Check for missing or mis-typed charge codes.",
            );
        }
    }
}

#[derive(Default)]
struct Issues(Vec<ValidationIssue>);

impl Issues {
    fn push(
        &mut self,
        severity: Severity,
        code: IssueCode,
        message: String,
        location: String,
        hint: impl Into<String>,
    ) {
        self.0.push(ValidationIssue {
            severity,
            code,
            message,
            location,
            hint: hint.into(),
        });
    }
}

/// Codes an expense row may legitimately carry. `None` when the time grid
/// references no code at all, which switches the unknown-code check off.
fn known_codes(parsed: &ParsedWorkbook) -> Option<BTreeSet<String>> {
    let mut referenced = codes::client_codes(parsed);
    referenced.extend(codes::internal_band_codes(parsed));
    referenced.extend(
        parsed
            .time
            .iter()
            .flat_map(|(_, half)| half.totals_by_marketing_bucket.keys())
            .filter(|c| !c.is_empty())
            .cloned(),
    );
    if referenced.is_empty() {
        return None;
    }
    referenced.extend(codes::marketing_codes(parsed));
    referenced.extend(codes::internal_codes());
    Some(referenced)
}

/// `hours` expressed in minutes is a whole multiple of `increment_minutes`.
/// A value too large to convert to minutes is never a multiple.
fn is_increment_multiple(hours: Decimal, increment_minutes: u32) -> bool {
    if increment_minutes == 0 {
        return true;
    }
    hours
        .checked_mul(Decimal::from(60))
        .and_then(|minutes| minutes.checked_rem(Decimal::from(increment_minutes)))
        .is_some_and(|rest| rest.is_zero())
}

fn month_name(month: u32) -> &'static str {
    MONTH_NAMES
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("Unknown month")
}
