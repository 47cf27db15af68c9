//! Keystone T&E - timesheet and expense workbook engine
//!
//! Employees fill in a fixed-layout Excel template each month. This library
//! reads that workbook, validates it against the firm's business rules,
//! decides which months are open for upload, and builds the cross-employee
//! category, daily and payroll reports.
//!
//! # Example
//!
//! ```no_run
//! use keystone_te::config::RulesConfig;
//! use keystone_te::core::Validator;
//! use keystone_te::excel::WorkbookImporter;
//! use keystone_te::types::has_blocking_errors;
//!
//! let parsed = WorkbookImporter::new("TE_2026_01.xlsx").import()?;
//! let rules = RulesConfig::load(None)?;
//! let issues = Validator::new(&rules).validate(&parsed);
//!
//! println!("Hours: {}", parsed.total_hours());
//! println!("Blocking: {}", has_blocking_errors(&issues));
//! # Ok::<(), keystone_te::error::TimesheetError>(())
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod excel;
pub mod types;
pub mod upload;

// Re-export commonly used types
pub use config::RulesConfig;
pub use error::{TimesheetError, TimesheetResult};
pub use types::{ParsedWorkbook, Severity, ValidationIssue};
pub use upload::{Upload, UploadStatus, UploadSummary};
