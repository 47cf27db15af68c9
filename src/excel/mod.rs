//! Excel side of the engine
//!
//! - Import: T&E template (.xlsx) → [`ParsedWorkbook`](crate::types::ParsedWorkbook)
//! - Export: report tables → .xlsx

pub mod cells;
mod exporter;
mod importer;
pub mod layout;

pub use exporter::ReportExporter;
pub use importer::{parse_workbook, SheetData, WorkbookData, WorkbookImporter, WorkbookParser};
