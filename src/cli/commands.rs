use crate::config::RulesConfig;
use crate::core::reports::{self, ClientMapping, Employee, EmployeeSubmission, LayoutOrder};
use crate::core::reports::{RenderedReport, ReportKind, ReportRequest};
use crate::core::{SubmissionWindows, Validator};
use crate::error::{TimesheetError, TimesheetResult};
use crate::excel::{ReportExporter, WorkbookImporter};
use crate::types::{Half, ParsedWorkbook, Severity, ValidationIssue};
use chrono::{Local, NaiveDate};
use colored::Colorize;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Execute the parse command
pub fn parse(file: PathBuf, output: Option<PathBuf>) -> TimesheetResult<()> {
    let parsed = WorkbookImporter::new(&file).import()?;
    let json = serde_json::to_string_pretty(&parsed)?;

    match output {
        Some(path) => {
            fs::write(&path, json)?;
            println!("{}", "📖 Workbook parsed".bold().green());
            println!("   File:   {}", file.display());
            println!("   Output: {}", path.display());
            print_parse_summary(&parsed);
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn print_parse_summary(parsed: &ParsedWorkbook) {
    let period = match (parsed.period.year, parsed.period.month) {
        (Some(y), Some(m)) => format!("{y}-{m:02}"),
        _ => "unknown".to_string(),
    };
    println!("   Period: {}", period.bright_blue().bold());
    println!("   Sheets: {}", parsed.sheets_present.len());
    for half in Half::ALL {
        println!(
            "   Hours {}: {}",
            half.display(),
            parsed.half(half).total_hours.normalize().to_string().bold()
        );
    }
    println!(
        "   Expenses: {} ({} items)",
        parsed.expenses.total_expenses.normalize().to_string().bold(),
        parsed.expenses.items.len()
    );
    println!(
        "   Mileage: {} net miles",
        parsed.mileage.totals.net_miles.normalize()
    );
}

/// Execute the validate command over one or more workbooks.
///
/// Every file is reported; the command fails at the end if any file had
/// ERROR-severity findings.
pub fn validate(
    files: Vec<PathBuf>,
    today: Option<NaiveDate>,
    config: Option<PathBuf>,
) -> TimesheetResult<()> {
    let rules = RulesConfig::load(config.as_deref())?;
    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let validator = Validator::new(&rules);

    println!("{}", "✅ Validating T&E workbooks".bold().green());
    println!("   As of: {today}\n");

    let mut blocking = 0;
    for file in &files {
        println!("   📄 {}", file.display().to_string().bright_blue().bold());
        let parsed = WorkbookImporter::new(file).import()?;
        let issues = validator.validate_on(&parsed, today);
        print_issues(&issues);
        blocking += issues.iter().filter(|i| i.is_blocking()).count();
        println!();
    }

    if blocking == 0 {
        println!("{}", "✅ No blocking errors".bold().green());
        Ok(())
    } else {
        println!(
            "{}",
            format!("❌ {blocking} blocking error(s); fix before submitting")
                .bold()
                .red()
        );
        Err(TimesheetError::BlockingErrors(blocking))
    }
}

fn print_issues(issues: &[ValidationIssue]) {
    if issues.is_empty() {
        println!("      {}", "No issues".green());
        return;
    }
    for issue in issues {
        let tag = match issue.severity {
            Severity::Error => "ERROR".red().bold(),
            Severity::Warn => "WARN ".yellow().bold(),
        };
        println!(
            "      {} {} {}",
            tag,
            issue.code.as_str().cyan(),
            issue.location.dimmed()
        );
        println!("         {}", issue.message);
        if !issue.hint.is_empty() {
            println!("         {}", issue.hint.dimmed());
        }
    }
}

/// Execute the windows command: which months accept uploads on `today`
pub fn windows(today: Option<NaiveDate>, config: Option<PathBuf>) -> TimesheetResult<()> {
    let rules = RulesConfig::load(config.as_deref())?;
    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let calculator = SubmissionWindows::new(rules.upload_grace_calendar_days);

    println!("{}", "📅 Submission windows".bold().green());
    println!("   As of: {today}");
    println!("   Grace: {} calendar days\n", calculator.grace_days());

    let targets = calculator.valid_upload_targets(today);
    if targets.is_empty() {
        println!("{}", "   No month is open for upload".yellow());
        return Ok(());
    }

    for (year, month) in targets {
        println!("   {}", format!("{year}-{month:02}").bright_blue().bold());
        for window in calculator.windows(year, month)? {
            let state = if window.contains(today) {
                "open".green().bold()
            } else {
                "closed".dimmed()
            };
            println!(
                "      {:<9} {}  opens {}  due {}  closes {}",
                window.half.display(),
                state,
                window.opens,
                window.due,
                window.closes
            );
        }
    }
    Ok(())
}

//==============================================================================
// Reports
//==============================================================================

/// YAML manifest describing one month's report inputs
#[derive(Debug, Clone, Deserialize)]
pub struct ReportManifest {
    pub year: i32,
    pub month: u32,
    pub employees: Vec<ManifestEmployee>,
    #[serde(default)]
    pub layout: LayoutOrder,
    #[serde(default)]
    pub client_mappings: Vec<ClientMapping>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestEmployee {
    #[serde(flatten)]
    pub employee: Employee,
    /// `.xlsx` upload or a persisted `.json` parse; absent when nothing was submitted
    #[serde(default)]
    pub workbook: Option<PathBuf>,
}

/// Read a manifest and load every referenced workbook. Relative workbook
/// paths resolve against the manifest's directory.
pub fn load_manifest(path: &Path) -> TimesheetResult<ReportRequest> {
    let manifest: ReportManifest = serde_yaml::from_str(&fs::read_to_string(path)?)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));

    let submissions = manifest
        .employees
        .into_iter()
        .map(|entry| -> TimesheetResult<EmployeeSubmission> {
            let workbook = entry
                .workbook
                .map(|p| load_workbook(&base.join(p)))
                .transpose()?;
            Ok(EmployeeSubmission {
                employee: entry.employee,
                workbook,
            })
        })
        .collect::<TimesheetResult<Vec<_>>>()?;

    let request = ReportRequest {
        year: manifest.year,
        month: manifest.month,
        submissions,
        layout: manifest.layout,
        client_mappings: manifest.client_mappings,
    };
    request.check()?;
    Ok(request)
}

fn load_workbook(path: &Path) -> TimesheetResult<ParsedWorkbook> {
    if is_extension(path, "json") {
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    } else {
        WorkbookImporter::new(path).import()
    }
}

fn is_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// Execute the report command
pub fn report(
    kind: ReportKind,
    manifest: PathBuf,
    output: Option<PathBuf>,
    config: Option<PathBuf>,
) -> TimesheetResult<()> {
    let rules = RulesConfig::load(config.as_deref())?;
    let request = load_manifest(&manifest)?;
    let rendered = reports::render(kind, &request, &rules);

    let Some(path) = output else {
        println!("{}", serde_json::to_string_pretty(&rendered)?);
        return Ok(());
    };

    if is_extension(&path, "json") {
        fs::write(&path, serde_json::to_string_pretty(&rendered)?)?;
    } else {
        write_xlsx(&rendered, &path)?;
    }

    println!(
        "{}",
        format!("📊 {} report {}-{:02}", kind, request.year, request.month)
            .bold()
            .green()
    );
    println!("   Manifest:  {}", manifest.display());
    println!("   Employees: {}", request.submissions.len());
    println!("   Output:    {}", path.display());
    if !rendered.flags.is_empty() {
        println!("\n{}", format!("⚠️  {} flag(s)", rendered.flags.len()).yellow());
        for flag in &rendered.flags {
            println!("   {}", flag.yellow());
        }
    }
    Ok(())
}

fn write_xlsx(rendered: &RenderedReport, path: &Path) -> TimesheetResult<()> {
    let mut exporter = ReportExporter::new();
    for sheet in &rendered.sheets {
        exporter.add_table(&sheet.sheet, &sheet.table)?;
    }
    exporter.save(path)
}
