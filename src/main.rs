use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use keystone_te::cli;
use keystone_te::core::reports::ReportKind;
use keystone_te::error::TimesheetResult;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "keystone-te")]
#[command(about = "Parse, validate and report on monthly T&E workbooks")]
#[command(long_about = "Keystone T&E - monthly timesheet and expense workbooks

COMMANDS:
  parse     - Read a T&E workbook and print its structured form (JSON)
  validate  - Check workbooks against the firm's business rules
  windows   - Show which months are open for upload
  report    - Build the category, daily or payroll report for a month

EXAMPLES:
  keystone-te parse TE_2026_01.xlsx -o te.json
  keystone-te validate TE_2026_01.xlsx --today 2026-01-20
  keystone-te windows --today 2026-02-03
  keystone-te report payroll january.yaml -o payroll.xlsx

Business rules default to the firm's standard values. Override them with a
YAML file (--config) or environment variables such as MIN_WEEKDAY_HOURS.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a workbook into JSON
    Parse {
        /// Path to the .xlsx workbook
        file: PathBuf,

        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    #[command(long_about = "Validate one or more T&E workbooks.

Reports every finding with its severity, location and a hint. ERROR findings
block submission; WARN findings are informational.

The submission-window check depends on the current date. Pass --today to
validate as of another day.

Exits non-zero when any workbook has an ERROR finding.")]
    /// Validate workbooks against the business rules
    Validate {
        /// Workbook(s) to validate
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Validate as of this date (YYYY-MM-DD)
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Business-rules YAML file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show open submission windows
    Windows {
        /// Evaluate as of this date (YYYY-MM-DD)
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Business-rules YAML file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    #[command(long_about = "Build a cross-employee report for one month.

REPORTS:
  category  - Hours by charge code and employee, one sheet per half-month
  daily     - Hours per employee per day, with weekly flags
  payroll   - One row per employee with every expense column

MANIFEST (YAML):
  year: 2026
  month: 1
  employees:
    - id: 1
      first_name: Ada
      last_name: Lovelace
      employee_number: \"1001\"
      workbook: uploads/ada.xlsx     # or a saved .json parse
  client_mappings:
    - code: CLIENT1
      display_name: Client One
      sort_order: 1

OUTPUT:
  -o report.xlsx   one worksheet per table
  -o report.json   tables and flags as JSON
  (none)           JSON to stdout")]
    /// Build a category, daily or payroll report
    Report {
        /// category, daily or payroll
        kind: ReportKind,

        /// Manifest listing the month's employees and workbooks
        manifest: PathBuf,

        /// Output file (.xlsx or .json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Business-rules YAML file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> TimesheetResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse { file, output } => cli::parse(file, output),

        Commands::Validate {
            files,
            today,
            config,
        } => cli::validate(files, today, config),

        Commands::Windows { today, config } => cli::windows(today, config),

        Commands::Report {
            kind,
            manifest,
            output,
            config,
        } => cli::report(kind, manifest, output, config),
    }
}
