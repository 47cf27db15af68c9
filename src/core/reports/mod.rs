//! Cross-employee reports for one target month
//!
//! Every report is a read-only fan-in over already-parsed workbooks. Employee
//! order is alphabetical unless a saved [`LayoutOrder`] says otherwise.

pub mod category;
pub mod classify;
pub mod daily;
pub mod ordering;
pub mod payroll;
pub mod table;

pub use category::{category_summaries, category_summary};
pub use classify::{classify_base, classify_code, Effort, MarketingTarget};
pub use daily::{daily_summary, DailyFlag, DailyFlagKind, DailySummary};
pub use ordering::{apply_saved_order, compare_employees, sort_employees, LayoutOrder};
pub use payroll::{payroll_export, PayrollExport, PayrollRow, SubmissionStatus};
pub use table::{Cell, ReportRow, ReportTable, RowKind};

use crate::config::RulesConfig;
use crate::error::{TimesheetError, TimesheetResult};
use crate::types::{Half, ParsedWorkbook};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub employee_number: String,
    #[serde(default)]
    pub initials: String,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

/// One employee's parsed workbook for the month, if they uploaded one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeSubmission {
    pub employee: Employee,
    #[serde(default)]
    pub workbook: Option<ParsedWorkbook>,
}

/// Row and column labels for `submissions`: the full name, with the employee
/// number (or id) appended when two people share a name
pub fn employee_labels(submissions: &[&EmployeeSubmission]) -> Vec<String> {
    let names: Vec<String> = submissions.iter().map(|s| s.employee.full_name()).collect();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for name in &names {
        *counts.entry(name.as_str()).or_default() += 1;
    }
    submissions
        .iter()
        .zip(&names)
        .map(|(submission, name)| {
            if counts[name.as_str()] < 2 {
                return name.clone();
            }
            let employee = &submission.employee;
            match employee.employee_number.trim() {
                "" => format!("{name} (#{})", employee.id),
                number => format!("{name} ({number})"),
            }
        })
        .collect()
}

/// Display label and sort position for a client charge code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientMapping {
    pub code: String,
    pub display_name: String,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Everything a report needs for one month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub year: i32,
    pub month: u32,
    pub submissions: Vec<EmployeeSubmission>,
    #[serde(default)]
    pub layout: LayoutOrder,
    #[serde(default)]
    pub client_mappings: Vec<ClientMapping>,
}

impl ReportRequest {
    /// Reject requests that name the same employee id twice
    pub fn check(&self) -> TimesheetResult<()> {
        let mut seen = HashSet::new();
        for submission in &self.submissions {
            let employee = &submission.employee;
            if !seen.insert(employee.id) {
                return Err(TimesheetError::Validation(format!(
                    "employee id {} is listed more than once ({})",
                    employee.id,
                    employee.full_name()
                )));
            }
        }
        Ok(())
    }

    /// Submissions in column order: alphabetical, then the saved layout applied
    pub fn ordered_submissions(&self) -> Vec<&EmployeeSubmission> {
        let mut alphabetical: Vec<&EmployeeSubmission> = self.submissions.iter().collect();
        alphabetical.sort_by(|a, b| compare_employees(&a.employee, &b.employee));
        apply_saved_order(alphabetical, &self.layout.employee_order, |s| &s.employee.id)
    }

    /// Active mapping for `code`, if any
    pub fn client_mapping(&self, code: &str) -> Option<&ClientMapping> {
        self.client_mappings
            .iter()
            .find(|m| m.active && m.code == code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Category,
    Daily,
    Payroll,
}

impl ReportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportKind::Category => "category",
            ReportKind::Daily => "daily",
            ReportKind::Payroll => "payroll",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "category" => Ok(ReportKind::Category),
            "daily" => Ok(ReportKind::Daily),
            "payroll" => Ok(ReportKind::Payroll),
            other => Err(format!(
                "unknown report '{}' (expected category, daily or payroll)",
                other
            )),
        }
    }
}

/// A worksheet-ready table with the tab name it should land on
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedTable {
    pub sheet: String,
    pub table: ReportTable,
}

/// Output of one report run: its tables plus any reviewer flags
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedReport {
    pub kind: ReportKind,
    pub year: i32,
    pub month: u32,
    pub sheets: Vec<NamedTable>,
    pub flags: Vec<String>,
}

/// Build `kind` for the request's month
pub fn render(kind: ReportKind, request: &ReportRequest, rules: &RulesConfig) -> RenderedReport {
    let period = format!("{}-{:02}", request.year, request.month);
    let (sheets, flags) = match kind {
        ReportKind::Category => {
            let sheets = Half::ALL
                .iter()
                .zip(category_summaries(request))
                .map(|(half, table)| NamedTable {
                    sheet: format!("Category {}", half.display()),
                    table,
                })
                .collect();
            (sheets, Vec::new())
        }
        ReportKind::Daily => {
            let summary = daily_summary(request, rules);
            let flags = summary
                .flags
                .iter()
                .map(|f| format!("{}: {}", f.employee, f.message))
                .collect();
            let sheet = NamedTable {
                sheet: format!("Daily {}", period),
                table: summary.table,
            };
            (vec![sheet], flags)
        }
        ReportKind::Payroll => {
            let export = payroll_export(request, rules);
            let sheet = NamedTable {
                sheet: format!("Payroll {}", period),
                table: export.to_table(format!("Payroll export {}", period)),
            };
            (vec![sheet], export.flags)
        }
    };
    RenderedReport {
        kind,
        year: request.year,
        month: request.month,
        sheets,
        flags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(id: u64, first: &str, last: &str) -> EmployeeSubmission {
        EmployeeSubmission {
            employee: Employee {
                id,
                first_name: first.to_string(),
                last_name: last.to_string(),
                employee_number: id.to_string(),
                initials: String::new(),
            },
            workbook: None,
        }
    }

    #[test]
    fn test_ordered_submissions_respects_layout() {
        let mut request = ReportRequest {
            year: 2026,
            month: 1,
            submissions: vec![
                submission(1, "Cara", "Young"),
                submission(2, "Abe", "Baker"),
                submission(3, "Dee", "Moss"),
            ],
            layout: LayoutOrder::default(),
            client_mappings: Vec::new(),
        };
        let ids = |r: &ReportRequest| -> Vec<u64> {
            r.ordered_submissions().iter().map(|s| s.employee.id).collect()
        };
        assert_eq!(ids(&request), vec![2, 3, 1]);

        // Saved order lists only one employee; the rest follow alphabetically
        request.layout.employee_order = vec![1];
        assert_eq!(ids(&request), vec![1, 2, 3]);
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let mut request = ReportRequest {
            year: 2026,
            month: 1,
            submissions: vec![submission(1, "Ada", "Lovelace"), submission(2, "Alan", "Turing")],
            layout: LayoutOrder::default(),
            client_mappings: Vec::new(),
        };
        assert!(request.check().is_ok());

        request.submissions.push(submission(1, "Grace", "Hopper"));
        let err = request.check().unwrap_err();
        assert!(matches!(err, TimesheetError::Validation(_)));
        assert!(err.to_string().contains("employee id 1"));

        // Each entry still lands exactly once
        let names: Vec<String> = request
            .ordered_submissions()
            .iter()
            .map(|s| s.employee.full_name())
            .collect();
        assert_eq!(names, vec!["Grace Hopper", "Ada Lovelace", "Alan Turing"]);
    }

    #[test]
    fn test_shared_names_get_distinct_labels() {
        let mut twin = submission(7, "Ada", "Lovelace");
        twin.employee.employee_number = String::new();
        let submissions = [
            submission(1, "Ada", "Lovelace"),
            twin,
            submission(2, "Alan", "Turing"),
        ];
        let refs: Vec<&EmployeeSubmission> = submissions.iter().collect();
        assert_eq!(
            employee_labels(&refs),
            vec!["Ada Lovelace (1)", "Ada Lovelace (#7)", "Alan Turing"]
        );
    }

    #[test]
    fn test_inactive_mapping_is_ignored() {
        let request = ReportRequest {
            year: 2026,
            month: 1,
            submissions: Vec::new(),
            layout: LayoutOrder::default(),
            client_mappings: vec![ClientMapping {
                code: "CLIENT1".into(),
                display_name: "Client One".into(),
                sort_order: 1,
                active: false,
            }],
        };
        assert!(request.client_mapping("CLIENT1").is_none());
    }

    #[test]
    fn test_report_kind_from_str() {
        assert_eq!("Payroll".parse::<ReportKind>(), Ok(ReportKind::Payroll));
        assert!("weekly".parse::<ReportKind>().is_err());
    }

    #[test]
    fn test_render_category_has_two_halves() {
        let request = ReportRequest {
            year: 2026,
            month: 2,
            submissions: vec![submission(1, "Ada", "Lovelace")],
            layout: LayoutOrder::default(),
            client_mappings: Vec::new(),
        };
        let report = render(ReportKind::Category, &request, &RulesConfig::default());
        let sheets: Vec<&str> = report.sheets.iter().map(|s| s.sheet.as_str()).collect();
        assert_eq!(sheets, vec!["Category 1st-15th", "Category 16th-end"]);
        assert!(report.flags.is_empty());
    }

    #[test]
    fn test_full_name() {
        let s = submission(1, "Test", "User");
        assert_eq!(s.employee.full_name(), "Test User");
    }
}
