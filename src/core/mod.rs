//! Rules engine: submission windows, validation and cross-employee reports

pub mod codes;
pub mod reports;
pub mod validator;
pub mod windows;

pub use validator::Validator;
pub use windows::{HalfWindow, SubmissionWindows};
