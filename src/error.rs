use thiserror::Error;

pub type TimesheetResult<T> = Result<T, TimesheetError>;

#[derive(Error, Debug)]
pub enum TimesheetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File is {size} bytes, which exceeds the {limit} byte upload limit")]
    FileTooLarge { size: usize, limit: usize },

    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    #[error("Cannot move upload from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Upload has {0} blocking error(s) and cannot be submitted")]
    BlockingErrors(usize),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Validation error: {0}")]
    Validation(String),
}
