//! API request handlers

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::server::AppState;
use crate::core::reports::{self, ReportKind, ReportRequest};
use crate::core::{HalfWindow, SubmissionWindows, Validator};
use crate::error::TimesheetError;
use crate::types::{has_blocking_errors, Half, ParsedWorkbook, Severity, ValidationIssue};
use crate::upload::{Upload, UploadSummary};

/// Standard API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            request_id: Uuid::new_v4().to_string(),
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            request_id: Uuid::new_v4().to_string(),
            data: None,
            error: Some(message.into()),
        }
    }
}

fn today_or_local(today: Option<NaiveDate>) -> NaiveDate {
    today.unwrap_or_else(|| Local::now().date_naive())
}

/// Root endpoint response
#[derive(Serialize)]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Serialize)]
pub struct EndpointInfo {
    pub path: String,
    pub method: String,
    pub description: String,
}

fn endpoint(method: &str, path: &str, description: &str) -> EndpointInfo {
    EndpointInfo {
        path: path.to_string(),
        method: method.to_string(),
        description: description.to_string(),
    }
}

/// GET / - Root info
pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(RootResponse {
        name: "Keystone T&E API".to_string(),
        version: state.version.clone(),
        description: "Timesheet and expense workbook intake, validation and reporting".to_string(),
        endpoints: vec![
            endpoint("GET", "/health", "Health check endpoint"),
            endpoint("GET", "/version", "Get server version"),
            endpoint("POST", "/api/v1/uploads", "Upload a T&E workbook (raw .xlsx body)"),
            endpoint("POST", "/api/v1/validate", "Validate a parsed workbook"),
            endpoint("GET", "/api/v1/windows", "Months open for upload"),
            endpoint("POST", "/api/v1/reports/{kind}", "Category, daily or payroll report"),
        ],
    }))
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// GET /health - Health check
pub async fn health() -> impl IntoResponse {
    Json(ApiResponse::ok(HealthResponse {
        status: "healthy".to_string(),
    }))
}

/// Version response
#[derive(Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub features: Vec<String>,
}

/// GET /version - Server version
pub async fn version(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(VersionResponse {
        version: state.version.clone(),
        features: ["uploads", "validate", "windows", "reports"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    }))
}

//==============================================================================
// Uploads
//==============================================================================

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub employee_id: u64,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub today: Option<NaiveDate>,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub summary: UploadSummary,
    pub file_name: String,
    pub sha256: String,
    pub source_template_version: String,
    pub issues: Vec<ValidationIssue>,
}

/// POST /api/v1/uploads?employee_id=N - Intake a raw workbook
pub async fn upload(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> impl IntoResponse {
    let file_name = params.file_name.as_deref().unwrap_or("upload.xlsx");
    let today = today_or_local(params.today);

    match Upload::intake(params.employee_id, file_name, &body, &state.rules, today) {
        Ok(upload) => (
            StatusCode::OK,
            Json(ApiResponse::ok(UploadResponse {
                summary: upload.summary(),
                file_name: upload.file_name,
                sha256: upload.sha256,
                source_template_version: upload.source_template_version,
                issues: upload.issues,
            })),
        ),
        Err(e @ TimesheetError::FileTooLarge { .. }) => (
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(ApiResponse::err(e.to_string())),
        ),
        Err(e) => (StatusCode::BAD_REQUEST, Json(ApiResponse::err(e.to_string()))),
    }
}

//==============================================================================
// Validation
//==============================================================================

#[derive(Deserialize)]
pub struct ValidateRequest {
    pub workbook: ParsedWorkbook,
    #[serde(default)]
    pub today: Option<NaiveDate>,
}

#[derive(Serialize, Default)]
pub struct ValidateResponse {
    pub has_blocking_errors: bool,
    pub errors: usize,
    pub warnings: usize,
    pub issues: Vec<ValidationIssue>,
}

/// POST /api/v1/validate - Re-validate a persisted parse
pub async fn validate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ValidateRequest>,
) -> impl IntoResponse {
    let issues = Validator::new(&state.rules).validate_on(&req.workbook, today_or_local(req.today));
    let count = |severity| issues.iter().filter(|i| i.severity == severity).count();
    Json(ApiResponse::ok(ValidateResponse {
        has_blocking_errors: has_blocking_errors(&issues),
        errors: count(Severity::Error),
        warnings: count(Severity::Warn),
        issues,
    }))
}

//==============================================================================
// Windows
//==============================================================================

#[derive(Deserialize)]
pub struct WindowsParams {
    #[serde(default)]
    pub today: Option<NaiveDate>,
}

#[derive(Serialize)]
pub struct MonthWindows {
    pub year: i32,
    pub month: u32,
    pub open_halves: Vec<Half>,
    pub windows: Vec<HalfWindow>,
}

#[derive(Serialize)]
pub struct WindowsResponse {
    pub today: NaiveDate,
    pub grace_days: u32,
    pub targets: Vec<MonthWindows>,
}

/// GET /api/v1/windows?today=YYYY-MM-DD - Months accepting uploads
pub async fn windows(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WindowsParams>,
) -> impl IntoResponse {
    let today = today_or_local(params.today);
    let calculator = SubmissionWindows::new(state.rules.upload_grace_calendar_days);

    let targets: Result<Vec<MonthWindows>, TimesheetError> = calculator
        .valid_upload_targets(today)
        .into_iter()
        .map(|(year, month)| -> Result<MonthWindows, TimesheetError> {
            Ok(MonthWindows {
                year,
                month,
                open_halves: calculator.open_halves(year, month, today).into_iter().collect(),
                windows: calculator.windows(year, month)?.to_vec(),
            })
        })
        .collect();

    match targets {
        Ok(targets) => (
            StatusCode::OK,
            Json(ApiResponse::ok(WindowsResponse {
                today,
                grace_days: calculator.grace_days(),
                targets,
            })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::err(e.to_string())),
        ),
    }
}

//==============================================================================
// Reports
//==============================================================================

/// POST /api/v1/reports/{category|daily|payroll}
pub async fn report(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    Json(request): Json<ReportRequest>,
) -> impl IntoResponse {
    let kind = match kind.parse::<ReportKind>() {
        Ok(kind) => kind,
        Err(message) => return (StatusCode::NOT_FOUND, Json(ApiResponse::err(message))),
    };
    if let Err(e) = request.check() {
        return (StatusCode::BAD_REQUEST, Json(ApiResponse::err(e.to_string())));
    }
    (
        StatusCode::OK,
        Json(ApiResponse::ok(reports::render(kind, &request, &state.rules))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_ok_creates_success_response() {
        let response: ApiResponse<String> = ApiResponse::ok("test data".to_string());

        assert!(response.success);
        assert_eq!(response.data, Some("test data".to_string()));
        assert!(response.error.is_none());
        // UUID format (8-4-4-4-12)
        assert_eq!(response.request_id.len(), 36);
    }

    #[test]
    fn test_api_response_error_serializes_without_data() {
        let response: ApiResponse<String> = ApiResponse::err("error message");
        let json = serde_json::to_string(&response).unwrap();

        assert!(!json.contains("\"data\""));
        assert!(json.contains("\"success\":false"));
        assert!(json.contains("\"error\":\"error message\""));
    }

    #[test]
    fn test_api_response_request_id_is_unique() {
        let a: ApiResponse<String> = ApiResponse::ok("a".to_string());
        let b: ApiResponse<String> = ApiResponse::ok("b".to_string());
        assert_ne!(a.request_id, b.request_id);
    }

    #[test]
    fn test_validate_request_accepts_empty_workbook() {
        let json = r#"{"workbook": {}, "today": "2026-01-20"}"#;
        let req: ValidateRequest = serde_json::from_str(json).unwrap();
        assert!(req.workbook.sheets_present.is_empty());
        assert_eq!(req.today, NaiveDate::from_ymd_opt(2026, 1, 20));
    }

    #[test]
    fn test_upload_params_defaults() {
        let params: UploadParams = serde_json::from_str(r#"{"employee_id": 7}"#).unwrap();
        assert_eq!(params.employee_id, 7);
        assert!(params.file_name.is_none());
        assert!(params.today.is_none());
    }
}
