//! Daily summary: one row per employee, one column per day of the month
//!
//! Flags are computed over the whole month with both halves merged, so an
//! ISO week that straddles the 15th/16th split is judged as one week.

use super::table::{Cell, ReportTable, RowKind};
use super::{employee_labels, Employee, ReportRequest};
use crate::config::RulesConfig;
use crate::core::windows::is_weekday;
use crate::excel::layout;
use crate::types::{Half, ParsedWorkbook};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DailyFlagKind {
    /// Too many long weekdays in one ISO week
    HighHoursWeek,
    /// A well-logged week totalling outside the weekly band
    WeeklyHoursOutOfBand,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyFlag {
    pub employee_id: u64,
    pub employee: String,
    pub kind: DailyFlagKind,
    pub iso_year: i32,
    pub iso_week: u32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    pub table: ReportTable,
    pub flags: Vec<DailyFlag>,
}

pub fn daily_summary(request: &ReportRequest, rules: &RulesConfig) -> DailySummary {
    let dates: Vec<NaiveDate> = Half::ALL
        .iter()
        .flat_map(|h| layout::day_range(request.year, request.month, *h))
        .collect();

    let mut columns = vec!["Employee".to_string()];
    columns.extend(dates.iter().map(|d| d.format("%m/%d").to_string()));
    columns.push("Total".to_string());
    columns.push("Flags".to_string());

    let title = format!("Daily Summary {}-{:02}", request.year, request.month);
    let mut table = ReportTable::new(title, columns);
    let mut flags = Vec::new();

    let submissions = request.ordered_submissions();
    for (submission, label) in submissions.iter().zip(employee_labels(&submissions)) {
        let employee = &submission.employee;
        let mut cells = vec![Cell::text(label.as_str())];

        let Some(workbook) = submission.workbook.as_ref() else {
            table.push(RowKind::Detail, cells);
            continue;
        };

        let hours = month_hours(workbook);
        let mut total = Decimal::ZERO;
        for date in &dates {
            let value = hours.get(date).copied().unwrap_or_default();
            total = total.saturating_add(value);
            cells.push(Cell::Number(value));
        }
        cells.push(Cell::Number(total));

        let employee_flags = week_flags(employee, &label, &hours, rules);
        let summary: Vec<&str> = employee_flags.iter().map(|f| f.message.as_str()).collect();
        cells.push(Cell::text(summary.join("; ")));
        flags.extend(employee_flags);

        table.push(RowKind::Detail, cells);
    }

    info!(
        employees = table.rows.len(),
        flags = flags.len(),
        "built daily summary"
    );
    DailySummary { table, flags }
}

/// Daily totals of both halves in one map
fn month_hours(workbook: &ParsedWorkbook) -> BTreeMap<NaiveDate, Decimal> {
    let mut hours = BTreeMap::new();
    for (_, half) in workbook.time.iter() {
        for (date, value) in &half.daily_totals {
            let day = hours.entry(*date).or_insert(Decimal::ZERO);
            *day = day.saturating_add(*value);
        }
    }
    hours
}

#[derive(Default)]
struct Week {
    total: Decimal,
    weekdays_logged: u32,
    long_days: u32,
}

fn week_flags(
    employee: &Employee,
    label: &str,
    hours: &BTreeMap<NaiveDate, Decimal>,
    rules: &RulesConfig,
) -> Vec<DailyFlag> {
    let mut weeks: BTreeMap<(i32, u32), Week> = BTreeMap::new();
    for (date, value) in hours {
        let iso = date.iso_week();
        let week = weeks.entry((iso.year(), iso.week())).or_default();
        week.total = week.total.saturating_add(*value);
        if is_weekday(*date) {
            if *value > Decimal::ZERO {
                week.weekdays_logged += 1;
            }
            if *value >= rules.high_hours_threshold {
                week.long_days += 1;
            }
        }
    }

    let mut flags = Vec::new();
    for ((iso_year, iso_week), week) in weeks {
        let flag = |kind, message: String| DailyFlag {
            employee_id: employee.id,
            employee: label.to_string(),
            kind,
            iso_year,
            iso_week,
            message,
        };

        if week.long_days > rules.high_hours_days_per_week_threshold {
            flags.push(flag(
                DailyFlagKind::HighHoursWeek,
                format!(
                    "Week {iso_week}: {} weekdays at or above {}h",
                    week.long_days, rules.high_hours_threshold
                ),
            ));
        }
        if week.weekdays_logged >= rules.weekly_min_days_logged
            && (week.total < rules.weekly_min_hours || week.total > rules.weekly_max_hours)
        {
            flags.push(flag(
                DailyFlagKind::WeeklyHoursOutOfBand,
                format!(
                    "Week {iso_week}: {}h outside {}-{}h",
                    week.total.normalize(),
                    rules.weekly_min_hours,
                    rules.weekly_max_hours
                ),
            ));
        }
    }
    flags
}
