//! Category summary: hours per charge code (rows) per employee (columns)
//!
//! One matrix per half-month. Rows come in three bands, each closed by a
//! subtotal, and the table ends with a grand total:
//!
//! - client codes: mapped codes by display order, then unmapped codes
//!   alphabetically, then any saved managing-partner row order on top
//! - the fixed marketing targets plus an unclassified row
//! - the fixed internal codes plus an "Other Internal" row

use super::classify::{self, MarketingTarget};
use super::ordering::apply_saved_order;
use super::table::{Cell, ReportTable, RowKind};
use super::{employee_labels, ReportRequest};
use crate::core::codes::{self, INTERNAL_CODES};
use crate::types::{saturating_sum, Half, HalfMonthTime, LineGroup};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use tracing::info;

pub const CLIENT_SUBTOTAL: &str = "Client Subtotal";
pub const MARKETING_SUBTOTAL: &str = "Marketing Subtotal";
pub const INTERNAL_SUBTOTAL: &str = "Internal Subtotal";
pub const GRAND_TOTAL: &str = "Grand Total";
pub const MARKETING_UNCLASSIFIED: &str = "Marketing — Unclassified";
pub const OTHER_INTERNAL: &str = "Other Internal";

/// Both halves of the month
pub fn category_summaries(request: &ReportRequest) -> [ReportTable; 2] {
    [
        category_summary(request, Half::FirstHalf),
        category_summary(request, Half::SecondHalf),
    ]
}

pub fn category_summary(request: &ReportRequest, half: Half) -> ReportTable {
    let submissions = request.ordered_submissions();
    let halves: Vec<Option<&HalfMonthTime>> = submissions
        .iter()
        .map(|s| s.workbook.as_ref().map(|w| w.half(half)))
        .collect();

    let mut columns = vec!["Category".to_string(), "Code".to_string()];
    columns.extend(employee_labels(&submissions));
    columns.push("Total".to_string());

    let title = format!(
        "Category Summary {}-{:02} ({})",
        request.year,
        request.month,
        half.display()
    );
    let mut matrix = Matrix::new(ReportTable::new(title, columns), halves);

    // Client band
    for code in client_row_order(request, &matrix.halves) {
        let label = client_label(request, &matrix.halves, &code);
        matrix.detail(&label, &code, |h| {
            h.totals_by_client_code.get(&code).copied().unwrap_or_default()
        });
    }
    matrix.subtotal(CLIENT_SUBTOTAL);

    // Marketing band
    for target in classify::all_targets() {
        matrix.detail(&target.label(), &target.base_code(), |h| {
            marketing_hours(h, |t| t == Some(target))
        });
    }
    matrix.detail(MARKETING_UNCLASSIFIED, "", |h| {
        marketing_hours(h, |t| t.is_none())
    });
    matrix.subtotal(MARKETING_SUBTOTAL);

    // Internal band
    for (code, label) in INTERNAL_CODES {
        matrix.detail(label, code, |h| {
            h.totals_by_other_hours.get(code).copied().unwrap_or_default()
        });
    }
    matrix.detail(OTHER_INTERNAL, "", |h| {
        h.totals_by_other_hours
            .iter()
            .filter(|(code, _)| !codes::is_internal_code(code))
            .fold(Decimal::ZERO, |acc, (_, hours)| acc.saturating_add(*hours))
    });
    matrix.subtotal(INTERNAL_SUBTOTAL);

    matrix.grand_total();
    info!(
        half = half.key(),
        rows = matrix.table.rows.len(),
        "built category summary"
    );
    matrix.table
}

/// Accumulates detail rows and emits band subtotals and the grand total
struct Matrix<'a> {
    table: ReportTable,
    halves: Vec<Option<&'a HalfMonthTime>>,
    band: Vec<Decimal>,
    grand: Vec<Decimal>,
}

impl<'a> Matrix<'a> {
    fn new(table: ReportTable, halves: Vec<Option<&'a HalfMonthTime>>) -> Self {
        let width = halves.len();
        Self {
            table,
            halves,
            band: vec![Decimal::ZERO; width],
            grand: vec![Decimal::ZERO; width],
        }
    }

    fn detail<F>(&mut self, label: &str, code: &str, hours: F)
    where
        F: Fn(&HalfMonthTime) -> Decimal,
    {
        let mut cells = vec![Cell::text(label), Cell::text(code)];
        let mut total = Decimal::ZERO;
        for (i, half) in self.halves.iter().enumerate() {
            match half {
                Some(h) => {
                    let value = hours(h);
                    self.band[i] = self.band[i].saturating_add(value);
                    total = total.saturating_add(value);
                    cells.push(Cell::Number(value));
                }
                None => cells.push(Cell::Empty),
            }
        }
        cells.push(Cell::Number(total));
        self.table.push(RowKind::Detail, cells);
    }

    fn subtotal(&mut self, label: &str) {
        let row = self.totals_row(label, &self.band);
        for (grand, band) in self.grand.iter_mut().zip(&self.band) {
            *grand = grand.saturating_add(*band);
        }
        self.band.iter_mut().for_each(|v| *v = Decimal::ZERO);
        self.table.push(RowKind::Subtotal, row);
    }

    fn grand_total(&mut self) {
        let row = self.totals_row(GRAND_TOTAL, &self.grand);
        self.table.push(RowKind::Total, row);
    }

    fn totals_row(&self, label: &str, values: &[Decimal]) -> Vec<Cell> {
        let mut cells = vec![Cell::text(label), Cell::Empty];
        for (half, value) in self.halves.iter().zip(values) {
            cells.push(match half {
                Some(_) => Cell::Number(*value),
                None => Cell::Empty,
            });
        }
        cells.push(Cell::Number(saturating_sum(values)));
        cells
    }
}

fn marketing_hours<P>(half: &HalfMonthTime, matches: P) -> Decimal
where
    P: Fn(Option<MarketingTarget>) -> bool,
{
    half.totals_by_marketing_bucket
        .iter()
        .filter(|(base, _)| matches(classify::classify_base(base)))
        .fold(Decimal::ZERO, |acc, (_, hours)| acc.saturating_add(*hours))
}

/// Client codes with hours in this half, in display order
fn client_row_order(request: &ReportRequest, halves: &[Option<&HalfMonthTime>]) -> Vec<String> {
    let present: BTreeSet<&String> = halves
        .iter()
        .flatten()
        .flat_map(|h| h.totals_by_client_code.keys())
        .filter(|code| !code.is_empty())
        .collect();

    let mut mapped: Vec<(i32, String)> = Vec::new();
    let mut unmapped: Vec<String> = Vec::new();
    for code in present {
        match request.client_mapping(code) {
            Some(m) => mapped.push((m.sort_order, code.clone())),
            None => unmapped.push(code.clone()),
        }
    }
    mapped.sort();

    let default_order: Vec<String> = mapped
        .into_iter()
        .map(|(_, code)| code)
        .chain(unmapped)
        .collect();
    apply_saved_order(default_order, &request.layout.client_order, |code| code)
}

/// Mapping display name, else the first label an employee typed for the code
fn client_label(request: &ReportRequest, halves: &[Option<&HalfMonthTime>], code: &str) -> String {
    if let Some(mapping) = request.client_mapping(code) {
        return mapping.display_name.clone();
    }
    halves
        .iter()
        .flatten()
        .flat_map(|h| h.lines_in(LineGroup::Client))
        .find(|line| line.code() == Some(code) && !line.label.trim().is_empty())
        .map(|line| line.label.trim().to_string())
        .unwrap_or_else(|| code.to_string())
}
