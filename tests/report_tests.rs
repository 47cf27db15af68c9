mod common;

use calamine::{open_workbook, Data, Reader, Xlsx};
use common::{happy_path, jan, TemplateBuilder};
use keystone_te::config::RulesConfig;
use keystone_te::core::reports::{
    self, category, payroll, Cell, ClientMapping, DailyFlagKind, Employee, EmployeeSubmission,
    LayoutOrder, ReportKind, ReportRequest, RowKind, SubmissionStatus,
};
use keystone_te::excel::{parse_workbook, ReportExporter};
use keystone_te::types::Half;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tempfile::TempDir;

fn employee(id: u64, first: &str, last: &str) -> Employee {
    Employee {
        id,
        first_name: first.to_string(),
        last_name: last.to_string(),
        employee_number: format!("E{id:03}"),
        initials: format!("{}{}", &first[..1], &last[..1]),
    }
}

/// Three long days in ISO week 2 and a $600 Chicago banking lead dinner
fn long_week() -> TemplateBuilder {
    let mut builder = TemplateBuilder::new(2026, 1);
    builder
        .client_line(6, "Client B", "CLIENT2")
        .hours(6, jan(5), 10.0)
        .hours(6, jan(6), 10.0)
        .hours(6, jan(7), 10.0)
        .expense(5, "01/07/2026", "Bank dinner", "CHI-BNK-LEAD", "E", 600.0);
    builder
}

/// Ada (happy path), Alan (long week), Cara (nothing uploaded)
fn team() -> ReportRequest {
    ReportRequest {
        year: 2026,
        month: 1,
        submissions: vec![
            EmployeeSubmission {
                employee: employee(3, "Cara", "Young"),
                workbook: None,
            },
            EmployeeSubmission {
                employee: employee(2, "Alan", "Turing"),
                workbook: Some(parse_workbook(&long_week().build())),
            },
            EmployeeSubmission {
                employee: employee(1, "Ada", "Lovelace"),
                workbook: Some(parse_workbook(&happy_path().build())),
            },
        ],
        layout: LayoutOrder::default(),
        client_mappings: vec![ClientMapping {
            code: "CLIENT2".to_string(),
            display_name: "Beta Corp".to_string(),
            sort_order: 1,
            active: true,
        }],
    }
}

fn number(cell: Option<&Cell>) -> Decimal {
    cell.and_then(Cell::as_number)
        .unwrap_or_else(|| panic!("expected a number, got {cell:?}"))
}

#[test]
fn test_category_summary_first_half() {
    let table = reports::category_summary(&team(), Half::FirstHalf);

    assert_eq!(
        table.columns,
        vec!["Category", "Code", "Ada Lovelace", "Alan Turing", "Cara Young", "Total"]
    );

    // Mapped client first under its display name, then unmapped by label
    assert_eq!(table.rows[0].cells[0], Cell::text("Beta Corp"));
    assert_eq!(table.rows[0].cells[1], Cell::text("CLIENT2"));
    assert_eq!(table.rows[1].cells[0], Cell::text("Client A"));
    assert_eq!(number(table.get(0, "Alan Turing")), dec!(30));
    assert_eq!(number(table.get(1, "Ada Lovelace")), dec!(8));

    let subtotal = table.find_row(category::CLIENT_SUBTOTAL).unwrap();
    assert_eq!(table.rows[subtotal].kind, RowKind::Subtotal);
    assert_eq!(number(table.get(subtotal, "Total")), dec!(38));

    let general = table.find_row("Marketing General — General").unwrap();
    assert_eq!(table.rows[general].cells[1], Cell::text("GEN"));
    assert_eq!(number(table.get(general, "Ada Lovelace")), dec!(1));

    let grand = table.find_row(category::GRAND_TOTAL).unwrap();
    assert_eq!(grand, table.rows.len() - 1);
    assert_eq!(table.rows[grand].kind, RowKind::Total);
    assert_eq!(number(table.get(grand, "Ada Lovelace")), dec!(9));
    assert_eq!(number(table.get(grand, "Alan Turing")), dec!(30));
    assert_eq!(number(table.get(grand, "Total")), dec!(39));

    // No workbook, no numbers
    assert_eq!(table.get(grand, "Cara Young"), Some(&Cell::Empty));
}

#[test]
fn test_saved_layout_reorders_rows_and_columns() {
    let mut request = team();
    request.layout.set_client_order(vec!["CLIENT1".to_string()]);
    request.layout.set_employee_order(vec![3]);

    let table = reports::category_summary(&request, Half::FirstHalf);
    assert_eq!(table.columns[2], "Cara Young");
    assert_eq!(table.columns[3], "Ada Lovelace");
    assert_eq!(table.rows[0].cells[1], Cell::text("CLIENT1"));
    assert_eq!(table.rows[1].cells[1], Cell::text("CLIENT2"));
}

#[test]
fn test_daily_summary_and_flags() {
    let summary = reports::daily_summary(&team(), &RulesConfig::default());
    let table = &summary.table;

    // Employee, 31 days, Total, Flags
    assert_eq!(table.columns.len(), 34);
    assert_eq!(table.columns[1], "01/01");
    assert_eq!(table.columns[31], "01/31");

    assert_eq!(number(table.get(0, "01/05")), dec!(8));
    assert_eq!(number(table.get(0, "01/20")), dec!(8));
    assert_eq!(number(table.get(0, "Total")), dec!(17));
    assert_eq!(table.get(0, "Flags"), Some(&Cell::text("")));

    let kinds: Vec<DailyFlagKind> = summary.flags.iter().map(|f| f.kind).collect();
    assert_eq!(
        kinds,
        vec![DailyFlagKind::HighHoursWeek, DailyFlagKind::WeeklyHoursOutOfBand]
    );
    assert!(summary.flags.iter().all(|f| f.employee == "Alan Turing"));
    assert!(summary.flags.iter().all(|f| f.iso_week == 2));
    assert_eq!(summary.flags[0].message, "Week 2: 3 weekdays at or above 10h");

    let flags_cell = table.get(1, "Flags").and_then(Cell::as_text).unwrap();
    assert!(flags_cell.contains("Week 2: 3 weekdays"));

    assert_eq!(table.get(2, "Total"), Some(&Cell::Empty));
}

#[test]
fn test_payroll_export() {
    let export = reports::payroll_export(&team(), &RulesConfig::default());
    let people: Vec<&str> = export.rows.iter().map(|r| r.person.as_str()).collect();
    assert_eq!(people, vec!["Ada Lovelace", "Alan Turing", "Cara Young"]);

    let ada = export.row_for("Ada Lovelace").unwrap();
    assert_eq!(ada.status, SubmissionStatus::Submitted);
    assert_eq!(ada.initials, "AL");
    assert_eq!(ada.amount("MKT General — General-Lead"), dec!(10));
    assert_eq!(ada.amount("TKG — Keystone - General"), dec!(25));
    assert_eq!(ada.total_expenses, dec!(35));
    assert!(ada.flags.is_empty());

    let alan = export.row_for("Alan Turing").unwrap();
    assert_eq!(alan.amount("MKT Banking — Chicago-Lead"), dec!(600));
    assert_eq!(alan.total_expenses, dec!(600));
    assert_eq!(alan.flags.len(), 1);
    assert!(alan.flags[0].contains("exceeds $500"));

    let cara = export.row_for("Cara Young").unwrap();
    assert_eq!(cara.status, SubmissionStatus::MissingSubmission);
    assert_eq!(cara.total_expenses, Decimal::ZERO);

    assert_eq!(export.flags.len(), 1);
    assert!(export.flags[0].starts_with("Alan Turing: "));

    let table = export.to_table("Payroll");
    assert_eq!(table.columns, payroll::payroll_columns());
    assert_eq!(table.get(2, payroll::STATUS), Some(&Cell::text("MISSING_SUBMISSION")));
    assert_eq!(number(table.get(0, payroll::EXPENSES_TOTAL)), dec!(35));
}

#[test]
fn test_render_dispatch() {
    let rules = RulesConfig::default();
    let request = team();

    let category = reports::render(ReportKind::Category, &request, &rules);
    let names: Vec<&str> = category.sheets.iter().map(|s| s.sheet.as_str()).collect();
    assert_eq!(names, vec!["Category 1st-15th", "Category 16th-end"]);
    assert!(category.flags.is_empty());

    let daily = reports::render(ReportKind::Daily, &request, &rules);
    assert_eq!(daily.sheets[0].sheet, "Daily 2026-01");
    assert_eq!(daily.flags.len(), 2);
    assert!(daily.flags[0].starts_with("Alan Turing: Week 2"));

    let payroll = reports::render(ReportKind::Payroll, &request, &rules);
    assert_eq!(payroll.sheets[0].sheet, "Payroll 2026-01");
    assert_eq!(payroll.sheets[0].table.title, "Payroll export 2026-01");
    assert_eq!(payroll.flags.len(), 1);
}

#[test]
fn test_exported_workbook_reads_back() {
    let report = reports::render(ReportKind::Category, &team(), &RulesConfig::default());
    let mut exporter = ReportExporter::new();
    for sheet in &report.sheets {
        exporter.add_table(&sheet.sheet, &sheet.table).unwrap();
    }

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("category.xlsx");
    exporter.save(&path).unwrap();

    let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
    assert_eq!(
        workbook.sheet_names(),
        vec!["Category 1st-15th".to_string(), "Category 16th-end".to_string()]
    );

    let range = workbook.worksheet_range("Category 1st-15th").unwrap();
    assert_eq!(
        range.get_value((0, 0)),
        Some(&Data::String("Category Summary 2026-01 (1st-15th)".to_string()))
    );
    // Header row sits on row 3
    assert_eq!(range.get_value((2, 0)), Some(&Data::String("Category".to_string())));
    assert_eq!(range.get_value((3, 0)), Some(&Data::String("Beta Corp".to_string())));
    assert_eq!(range.get_value((3, 3)), Some(&Data::Float(30.0)));
}

#[test]
fn test_shared_names_get_their_own_columns() {
    let mut twin = employee(9, "Ada", "Lovelace");
    twin.employee_number = "E900".to_string();
    let request = ReportRequest {
        year: 2026,
        month: 1,
        submissions: vec![
            EmployeeSubmission {
                employee: employee(1, "Ada", "Lovelace"),
                workbook: Some(parse_workbook(&happy_path().build())),
            },
            EmployeeSubmission {
                employee: twin,
                workbook: Some(parse_workbook(&long_week().build())),
            },
        ],
        layout: LayoutOrder::default(),
        client_mappings: Vec::new(),
    };

    let table = reports::category_summary(&request, Half::FirstHalf);
    assert_eq!(
        table.columns,
        vec!["Category", "Code", "Ada Lovelace (E001)", "Ada Lovelace (E900)", "Total"]
    );
    let grand = table.find_row(category::GRAND_TOTAL).unwrap();
    assert_eq!(number(table.get(grand, "Ada Lovelace (E001)")), dec!(9));
    assert_eq!(number(table.get(grand, "Ada Lovelace (E900)")), dec!(30));

    let daily = reports::daily_summary(&request, &RulesConfig::default());
    assert_eq!(daily.table.rows[1].cells[0], Cell::text("Ada Lovelace (E900)"));
    assert!(daily.flags.iter().all(|f| f.employee == "Ada Lovelace (E900)"));

    let export = reports::payroll_export(&request, &RulesConfig::default());
    assert_eq!(export.row_for("Ada Lovelace (E001)").unwrap().total_expenses, dec!(35));
    assert_eq!(export.row_for("Ada Lovelace (E900)").unwrap().total_expenses, dec!(600));
}

#[test]
fn test_extreme_persisted_totals_saturate() {
    let mut heavy = parse_workbook(&long_week().build());
    heavy
        .time
        .first_half
        .totals_by_client_code
        .insert("CLIENT2".to_string(), Decimal::MAX);
    heavy.time.first_half.daily_totals.insert(jan(5), Decimal::MAX);

    let mut request = team();
    for submission in &mut request.submissions {
        submission.workbook = Some(heavy.clone());
    }

    let table = reports::category_summary(&request, Half::FirstHalf);
    let grand = table.find_row(category::GRAND_TOTAL).unwrap();
    assert_eq!(number(table.get(0, "Total")), Decimal::MAX);
    assert_eq!(number(table.get(grand, "Total")), Decimal::MAX);

    let daily = reports::daily_summary(&request, &RulesConfig::default());
    assert_eq!(number(daily.table.get(0, "01/05")), Decimal::MAX);
    assert_eq!(number(daily.table.get(0, "Total")), Decimal::MAX);
}
