use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{CustomerId, LoanRequest};
use super::extraction::{SalaryDocument, SalaryExtractor};
use super::service::{LoanDecision, LoanDecisionService, LoanServiceError};
use super::store::LoanCaseStore;

/// Header carrying the caller identity resolved by the authentication layer.
pub const CUSTOMER_ID_HEADER: &str = "x-customer-id";
/// Optional header naming an uploaded document.
pub const FILE_NAME_HEADER: &str = "x-file-name";

#[derive(Debug, Deserialize)]
pub struct ApplyLoanPayload {
    pub customer_id: u64,
    pub loan_amount: i64,
    pub duration_months: i64,
}

impl ApplyLoanPayload {
    fn into_request(self) -> Result<(CustomerId, LoanRequest), LoanServiceError> {
        let principal = u64::try_from(self.loan_amount).map_err(|_| {
            LoanServiceError::InvalidInput("loan amount must be a positive integer".to_string())
        })?;
        let duration = match u32::try_from(self.duration_months) {
            Ok(months) => months,
            Err(_) if self.duration_months > 0 => {
                return Err(LoanServiceError::InvalidInput(format!(
                    "duration of {} months is out of range",
                    self.duration_months
                )));
            }
            Err(_) => {
                return Err(LoanServiceError::InvalidInput(
                    "duration must be a positive number of months".to_string(),
                ));
            }
        };
        Ok((
            CustomerId(self.customer_id),
            LoanRequest::new(principal, duration)?,
        ))
    }
}

/// Router builder exposing the application and verification endpoints.
pub fn loan_router<S, X>(service: Arc<LoanDecisionService<S, X>>) -> Router
where
    S: LoanCaseStore + 'static,
    X: SalaryExtractor + 'static,
{
    Router::new()
        .route("/api/v1/loans", post(apply_handler::<S, X>))
        .route("/api/v1/loans/:case_id", get(status_handler::<S, X>))
        .route(
            "/api/v1/loans/:case_id/salary-slip",
            post(salary_slip_handler::<S, X>),
        )
        .with_state(service)
}

pub(crate) async fn apply_handler<S, X>(
    State(service): State<Arc<LoanDecisionService<S, X>>>,
    payload: Result<Json<ApplyLoanPayload>, JsonRejection>,
) -> Response
where
    S: LoanCaseStore + 'static,
    X: SalaryExtractor + 'static,
{
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return LoanServiceError::InvalidInput(format!(
                "malformed application payload: {}",
                rejection.body_text()
            ))
            .into_response();
        }
    };

    let (customer_id, request) = match payload.into_request() {
        Ok(parsed) => parsed,
        Err(err) => return err.into_response(),
    };

    match service.apply(&customer_id, request).await {
        Ok(decision) => decision_response(decision, StatusCode::CREATED),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn salary_slip_handler<S, X>(
    State(service): State<Arc<LoanDecisionService<S, X>>>,
    Path(case_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    S: LoanCaseStore + 'static,
    X: SalaryExtractor + 'static,
{
    let customer_id = match customer_from_headers(&headers) {
        Ok(customer_id) => customer_id,
        Err(err) => return err.into_response(),
    };

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<mime::Mime>().ok())
        .unwrap_or(mime::APPLICATION_OCTET_STREAM);
    let file_name = headers
        .get(FILE_NAME_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("salary-slip")
        .to_string();

    let document = SalaryDocument {
        file_name,
        content_type,
        bytes: body.to_vec(),
    };

    match service
        .verify_salary(&customer_id, &case_id, document)
        .await
    {
        Ok(decision) => decision_response(decision, StatusCode::OK),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn status_handler<S, X>(
    State(service): State<Arc<LoanDecisionService<S, X>>>,
    Path(case_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: LoanCaseStore + 'static,
    X: SalaryExtractor + 'static,
{
    let customer_id = match customer_from_headers(&headers) {
        Ok(customer_id) => customer_id,
        Err(err) => return err.into_response(),
    };

    match service.case_view(&customer_id, &case_id).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => err.into_response(),
    }
}

fn customer_from_headers(headers: &HeaderMap) -> Result<CustomerId, LoanServiceError> {
    headers
        .get(CUSTOMER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(CustomerId)
        .ok_or_else(|| {
            LoanServiceError::InvalidInput(format!(
                "{CUSTOMER_ID_HEADER} header must carry a numeric customer id"
            ))
        })
}

/// Approved decisions return the sanction letter itself; everything else returns the case.
fn decision_response(decision: LoanDecision, status: StatusCode) -> Response {
    match decision.letter {
        Some(letter) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, letter.content_type.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", letter.file_name),
                ),
            ],
            letter.bytes,
        )
            .into_response(),
        None => (status, Json(decision.case.view(&decision.customer_name))).into_response(),
    }
}

impl IntoResponse for LoanServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            LoanServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            LoanServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            LoanServiceError::InvalidCaseStatus { .. } => StatusCode::CONFLICT,
            LoanServiceError::SalaryMismatch { .. } | LoanServiceError::DocumentInvalid => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            LoanServiceError::ExtractionUnavailable(_)
            | LoanServiceError::StoreUnavailable(_)
            | LoanServiceError::Archive(_) => StatusCode::SERVICE_UNAVAILABLE,
            LoanServiceError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = json!({
            "error": self.kind(),
            "message": self.to_string(),
            "retryable": self.is_retryable(),
        });
        (status, Json(payload)).into_response()
    }
}
