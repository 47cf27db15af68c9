//! Payroll export: one wide row per employee
//!
//! Column groups, left to right:
//!
//! | Group     | Columns                                                  |
//! |-----------|----------------------------------------------------------|
//! | identity  | Employee #, Person, Initials, Status                     |
//! | marketing | one per target and effort (see `classify`), Unclassified |
//! | firm-paid | `TKG — {bucket}` for each non-marketing expense bucket   |
//! | other     | Client Billed, Mileage — Net Miles                       |
//! | derived   | Expenses — Total, Flags                                  |
//!
//! "Expenses — Total" is what the firm reimburses: marketing items plus the
//! non-marketing bucket totals. Client-billed amounts and mileage are shown
//! but not added in.

use super::classify::{self, UNCLASSIFIED_COLUMN};
use super::table::{Cell, ReportTable, RowKind};
use super::{employee_labels, ReportRequest};
use crate::config::RulesConfig;
use crate::excel::layout;
use crate::types::ParsedWorkbook;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

pub const EMPLOYEE_NUMBER: &str = "Employee #";
pub const PERSON: &str = "Person";
pub const INITIALS: &str = "Initials";
pub const STATUS: &str = "Status";
pub const CLIENT_BILLED: &str = "Client Billed";
pub const MILEAGE_NET: &str = "Mileage — Net Miles";
pub const EXPENSES_TOTAL: &str = "Expenses — Total";
pub const FLAGS: &str = "Flags";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    Submitted,
    MissingSubmission,
}

impl SubmissionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionStatus::Submitted => "SUBMITTED",
            SubmissionStatus::MissingSubmission => "MISSING_SUBMISSION",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayrollRow {
    pub employee_id: u64,
    pub employee_number: String,
    pub person: String,
    pub initials: String,
    pub status: SubmissionStatus,
    /// Dollar columns by header; every amount column is present
    pub amounts: BTreeMap<String, Decimal>,
    pub net_miles: Decimal,
    pub total_expenses: Decimal,
    pub flags: Vec<String>,
}

impl PayrollRow {
    pub fn amount(&self, column: &str) -> Decimal {
        self.amounts.get(column).copied().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayrollExport {
    pub columns: Vec<String>,
    pub rows: Vec<PayrollRow>,
    /// Every row's flags, prefixed with the person
    pub flags: Vec<String>,
}

impl PayrollExport {
    pub fn row_for(&self, person: &str) -> Option<&PayrollRow> {
        self.rows.iter().find(|r| r.person == person)
    }

    pub fn to_table(&self, title: impl Into<String>) -> ReportTable {
        let mut table = ReportTable::new(title, self.columns.clone());
        for row in &self.rows {
            let cells = self
                .columns
                .iter()
                .map(|column| match column.as_str() {
                    EMPLOYEE_NUMBER => Cell::text(row.employee_number.clone()),
                    PERSON => Cell::text(row.person.clone()),
                    INITIALS => Cell::text(row.initials.clone()),
                    STATUS => Cell::text(row.status.as_str()),
                    MILEAGE_NET => Cell::Number(row.net_miles),
                    EXPENSES_TOTAL => Cell::Number(row.total_expenses),
                    FLAGS => Cell::text(row.flags.join("; ")),
                    amount => Cell::Number(row.amount(amount)),
                })
                .collect();
            table.push(RowKind::Detail, cells);
        }
        table
    }
}

/// `TKG — {bucket}` columns, in bucket order
pub fn firm_paid_columns() -> Vec<String> {
    layout::EXPENSE_BUCKETS
        .iter()
        .filter(|(_, label)| !layout::is_marketing_bucket(label))
        .map(|(_, label)| firm_paid_column(label))
        .collect()
}

fn firm_paid_column(bucket: &str) -> String {
    format!("TKG — {bucket}")
}

/// Dollar columns the per-cell threshold applies to
fn amount_columns() -> Vec<String> {
    let mut columns = classify::all_columns();
    columns.push(UNCLASSIFIED_COLUMN.to_string());
    columns.extend(firm_paid_columns());
    columns.push(CLIENT_BILLED.to_string());
    columns
}

pub fn payroll_columns() -> Vec<String> {
    let mut columns: Vec<String> = [EMPLOYEE_NUMBER, PERSON, INITIALS, STATUS]
        .iter()
        .map(|c| c.to_string())
        .collect();
    columns.extend(amount_columns());
    columns.push(MILEAGE_NET.to_string());
    columns.push(EXPENSES_TOTAL.to_string());
    columns.push(FLAGS.to_string());
    columns
}

pub fn payroll_export(request: &ReportRequest, rules: &RulesConfig) -> PayrollExport {
    let amount_columns = amount_columns();
    let mut rows = Vec::new();
    let mut all_flags = Vec::new();

    let submissions = request.ordered_submissions();
    for (submission, person) in submissions.iter().zip(employee_labels(&submissions)) {
        let employee = &submission.employee;
        let mut row = PayrollRow {
            employee_id: employee.id,
            employee_number: employee.employee_number.clone(),
            person,
            initials: employee.initials.clone(),
            status: SubmissionStatus::MissingSubmission,
            amounts: amount_columns
                .iter()
                .map(|c| (c.clone(), Decimal::ZERO))
                .collect(),
            net_miles: Decimal::ZERO,
            total_expenses: Decimal::ZERO,
            flags: Vec::new(),
        };

        if let Some(workbook) = submission.workbook.as_ref() {
            row.status = SubmissionStatus::Submitted;
            fill_row(&mut row, workbook);
            flag_row(&mut row, &amount_columns, rules.payroll_flag_cell_threshold);
        }

        all_flags.extend(row.flags.iter().map(|f| format!("{}: {}", row.person, f)));
        rows.push(row);
    }

    info!(
        rows = rows.len(),
        flags = all_flags.len(),
        "built payroll export"
    );
    PayrollExport {
        columns: payroll_columns(),
        rows,
        flags: all_flags,
    }
}

fn fill_row(row: &mut PayrollRow, workbook: &ParsedWorkbook) {
    let expenses = &workbook.expenses;
    let mut marketing_total = Decimal::ZERO;

    for item in &expenses.items {
        if !layout::is_marketing_bucket(&item.bucket) {
            continue;
        }
        let column = match item.code().and_then(classify::classify_code) {
            Some((target, effort)) => target.column(effort),
            None => {
                row.flags.push(format!(
                    "Unclassified marketing code '{}' (${})",
                    item.code().unwrap_or_default(),
                    item.amount
                ));
                UNCLASSIFIED_COLUMN.to_string()
            }
        };
        add_to(&mut row.amounts, column, item.amount);
        marketing_total = marketing_total.saturating_add(item.amount);
    }

    let mut firm_paid_total = Decimal::ZERO;
    for (bucket, amount) in &expenses.totals_by_bucket {
        if layout::is_marketing_bucket(bucket) {
            continue;
        }
        // Only template buckets have a column
        if !layout::is_expense_bucket(bucket) {
            if !amount.is_zero() {
                row.flags
                    .push(format!("Unknown expense bucket '{bucket}' (${amount}) not exported"));
            }
            continue;
        }
        add_to(&mut row.amounts, firm_paid_column(bucket), *amount);
        firm_paid_total = firm_paid_total.saturating_add(*amount);
    }

    row.amounts
        .insert(CLIENT_BILLED.to_string(), expenses.client_billed_total);
    row.net_miles = workbook.mileage.totals.net_miles;
    row.total_expenses = marketing_total.saturating_add(firm_paid_total);
}

fn add_to(amounts: &mut BTreeMap<String, Decimal>, column: String, amount: Decimal) {
    let slot = amounts.entry(column).or_default();
    *slot = slot.saturating_add(amount);
}

fn flag_row(row: &mut PayrollRow, columns: &[String], threshold: Decimal) {
    for column in columns {
        let amount = row.amount(column);
        if amount > threshold {
            row.flags
                .push(format!("{column} ${amount} exceeds ${threshold} review threshold"));
        }
    }
}
