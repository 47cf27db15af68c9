//! CLI command handlers

pub mod commands;

pub use commands::{load_manifest, parse, report, validate, windows, ReportManifest};
