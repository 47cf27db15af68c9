//! Upload record and its review lifecycle
//!
//! ```text
//! DRAFT ──submit──▶ SUBMITTED ──approve──▶ APPROVED
//!   ▲                   │
//!   └──re-upload── RETURNED ◀──return_for_revision
//! ```
//!
//! Storage is the caller's concern; this module only builds the record and
//! guards its transitions.

use crate::config::RulesConfig;
use crate::core::Validator;
use crate::error::{TimesheetError, TimesheetResult};
use crate::excel::parse_workbook;
use crate::types::{has_blocking_errors, ParsedWorkbook, Severity, ValidationIssue};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UploadStatus {
    Draft,
    Submitted,
    Approved,
    Returned,
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UploadStatus::Draft => "DRAFT",
            UploadStatus::Submitted => "SUBMITTED",
            UploadStatus::Approved => "APPROVED",
            UploadStatus::Returned => "RETURNED",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Upload {
    pub id: Uuid,
    pub employee_id: u64,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub file_name: String,
    pub size_bytes: usize,
    /// Hex SHA-256 of the raw file
    pub sha256: String,
    pub parsed: ParsedWorkbook,
    pub issues: Vec<ValidationIssue>,
    pub has_blocking_errors: bool,
    pub source_template_version: String,
    pub status: UploadStatus,
    #[serde(default)]
    pub review_comment: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    /// Blocking state when the employee submitted; kept for reviewers
    #[serde(default)]
    pub blocking_at_submission: Option<bool>,
}

impl Upload {
    /// Size-check, fingerprint, parse and validate a raw upload. Content
    /// problems become issues on the record; only an oversized file is an error.
    pub fn intake(
        employee_id: u64,
        file_name: &str,
        bytes: &[u8],
        rules: &RulesConfig,
        today: NaiveDate,
    ) -> TimesheetResult<Self> {
        let limit = rules.upload_max_bytes();
        if bytes.len() > limit {
            return Err(TimesheetError::FileTooLarge {
                size: bytes.len(),
                limit,
            });
        }

        let sha256 = fingerprint(bytes);
        let parsed = parse_workbook(bytes);
        let issues = Validator::new(rules).validate_on(&parsed, today);
        let blocking = has_blocking_errors(&issues);

        info!(
            employee_id,
            file_name,
            bytes = bytes.len(),
            issues = issues.len(),
            blocking,
            "upload intake"
        );

        Ok(Self {
            id: Uuid::new_v4(),
            employee_id,
            year: parsed.period.year,
            month: parsed.period.month,
            file_name: file_name.to_string(),
            size_bytes: bytes.len(),
            sha256,
            source_template_version: parsed.metadata.template_version.clone(),
            parsed,
            issues,
            has_blocking_errors: blocking,
            status: UploadStatus::Draft,
            review_comment: None,
            uploaded_at: Utc::now(),
            blocking_at_submission: None,
        })
    }

    /// A fresh DRAFT replacing this one. Allowed while still a draft or
    /// after being returned for revision.
    pub fn reupload(
        &self,
        file_name: &str,
        bytes: &[u8],
        rules: &RulesConfig,
        today: NaiveDate,
    ) -> TimesheetResult<Self> {
        match self.status {
            UploadStatus::Draft | UploadStatus::Returned => {
                Self::intake(self.employee_id, file_name, bytes, rules, today)
            }
            other => Err(TimesheetError::InvalidTransition {
                from: other.to_string(),
                to: UploadStatus::Draft.to_string(),
            }),
        }
    }

    pub fn submit(&mut self) -> TimesheetResult<()> {
        self.expect_status(UploadStatus::Draft, UploadStatus::Submitted)?;
        if self.has_blocking_errors {
            let count = self.issues.iter().filter(|i| i.is_blocking()).count();
            return Err(TimesheetError::BlockingErrors(count));
        }
        self.blocking_at_submission = Some(self.has_blocking_errors);
        self.status = UploadStatus::Submitted;
        Ok(())
    }

    pub fn approve(&mut self) -> TimesheetResult<()> {
        self.expect_status(UploadStatus::Submitted, UploadStatus::Approved)?;
        self.status = UploadStatus::Approved;
        Ok(())
    }

    pub fn return_for_revision(&mut self, comment: &str) -> TimesheetResult<()> {
        self.expect_status(UploadStatus::Submitted, UploadStatus::Returned)?;
        self.status = UploadStatus::Returned;
        self.review_comment = Some(comment.trim().to_string()).filter(|c| !c.is_empty());
        Ok(())
    }

    pub fn summary(&self) -> UploadSummary {
        UploadSummary::from(self)
    }

    fn expect_status(&self, required: UploadStatus, to: UploadStatus) -> TimesheetResult<()> {
        if self.status == required {
            Ok(())
        } else {
            Err(TimesheetError::InvalidTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            })
        }
    }
}

/// Hex SHA-256 of `bytes`
pub fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Compact per-upload figures for listing views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadSummary {
    pub id: Uuid,
    pub employee_id: u64,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub status: UploadStatus,
    pub first_half_hours: Decimal,
    pub second_half_hours: Decimal,
    pub total_expenses: Decimal,
    pub has_blocking_errors: bool,
    pub errors: usize,
    pub warnings: usize,
}

impl From<&Upload> for UploadSummary {
    fn from(upload: &Upload) -> Self {
        let count = |severity| upload.issues.iter().filter(|i| i.severity == severity).count();
        Self {
            id: upload.id,
            employee_id: upload.employee_id,
            year: upload.year,
            month: upload.month,
            status: upload.status,
            first_half_hours: upload.parsed.time.first_half.total_hours,
            second_half_hours: upload.parsed.time.second_half.total_hours,
            total_expenses: upload.parsed.expenses.total_expenses,
            has_blocking_errors: upload.has_blocking_errors,
            errors: count(Severity::Error),
            warnings: count(Severity::Warn),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 20).unwrap()
    }

    fn clean_draft() -> Upload {
        let mut upload =
            Upload::intake(1, "te.xlsx", b"not a workbook", &RulesConfig::default(), today()).unwrap();
        // Pretend the content was fine
        upload.issues.clear();
        upload.has_blocking_errors = false;
        upload
    }

    #[test]
    fn test_intake_of_garbage_is_blocked_draft() {
        let upload =
            Upload::intake(1, "te.xlsx", b"not a workbook", &RulesConfig::default(), today()).unwrap();
        assert_eq!(upload.status, UploadStatus::Draft);
        assert!(upload.has_blocking_errors);
        assert_eq!(upload.sha256.len(), 64);
        assert_eq!(upload.year, None);
    }

    #[test]
    fn test_intake_rejects_oversized_file() {
        let rules = RulesConfig {
            upload_max_mb: 0,
            ..RulesConfig::default()
        };
        let result = Upload::intake(1, "te.xlsx", b"x", &rules, today());
        assert!(matches!(
            result,
            Err(TimesheetError::FileTooLarge { size: 1, limit: 0 })
        ));
    }

    #[test]
    fn test_submit_refused_with_blocking_errors() {
        let mut upload =
            Upload::intake(1, "te.xlsx", b"junk", &RulesConfig::default(), today()).unwrap();
        let result = upload.submit();
        assert!(matches!(result, Err(TimesheetError::BlockingErrors(n)) if n > 0));
        assert_eq!(upload.status, UploadStatus::Draft);
    }

    #[test]
    fn test_review_lifecycle() {
        let mut upload = clean_draft();
        assert!(upload.approve().is_err());

        upload.submit().unwrap();
        assert_eq!(upload.status, UploadStatus::Submitted);
        assert_eq!(upload.blocking_at_submission, Some(false));
        assert!(upload.submit().is_err());

        upload.return_for_revision("Missing receipts").unwrap();
        assert_eq!(upload.status, UploadStatus::Returned);
        assert_eq!(upload.review_comment.as_deref(), Some("Missing receipts"));
        assert!(upload.approve().is_err());

        let fresh = upload
            .reupload("te-v2.xlsx", b"again", &RulesConfig::default(), today())
            .unwrap();
        assert_eq!(fresh.status, UploadStatus::Draft);
        assert_ne!(fresh.id, upload.id);
    }

    #[test]
    fn test_approved_upload_cannot_be_replaced() {
        let mut upload = clean_draft();
        upload.submit().unwrap();
        upload.approve().unwrap();
        let result = upload.reupload("x.xlsx", b"x", &RulesConfig::default(), today());
        assert!(matches!(result, Err(TimesheetError::InvalidTransition { .. })));
    }

    #[test]
    fn test_fingerprint_is_stable() {
        assert_eq!(
            fingerprint(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_summary_counts() {
        let upload =
            Upload::intake(1, "te.xlsx", b"junk", &RulesConfig::default(), today()).unwrap();
        let summary = upload.summary();
        assert_eq!(summary.errors + summary.warnings, upload.issues.len());
        assert!(summary.has_blocking_errors);
    }
}
