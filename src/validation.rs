use crate::error::AppError;
use rocket::Request;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use validator::Validate;

/// Machine-readable failure kind returned alongside every API error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Validation,
    TokenInvalid,
    TokenExpired,
    NotFound,
    Internal,
}

impl ErrorCode {
    /// The reset link can no longer be used and the user has to start over.
    pub fn is_dead_link(&self) -> bool {
        matches!(self, ErrorCode::TokenExpired | ErrorCode::TokenInvalid)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApiErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: ErrorCode,
}

impl ApiErrorResponse {
    pub fn new(code: ErrorCode, error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            code,
        }
    }
}

pub type ApiError = Custom<Json<ApiErrorResponse>>;

pub trait ToApiError {
    fn to_api_error(self) -> ApiError;
}

impl ToApiError for AppError {
    #[instrument]
    fn to_api_error(self) -> ApiError {
        self.log_and_record("API error");
        let status = self.status_code();

        let (code, message) = match &self {
            AppError::Database(_) | AppError::Internal(_) | AppError::ExternalService(_) => {
                (ErrorCode::Internal, "Internal server error".to_string())
            }
            AppError::NotFound(msg) => (ErrorCode::NotFound, msg.clone()),
            AppError::Validation(msg) => (ErrorCode::Validation, msg.clone()),
            AppError::TokenInvalid(msg) => (ErrorCode::TokenInvalid, msg.clone()),
            AppError::TokenExpired(msg) => (ErrorCode::TokenExpired, msg.clone()),
        };

        Custom(status, Json(ApiErrorResponse::new(code, message)))
    }
}

fn validation_message(errors: &validator::ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, field_errors)| {
            field_errors.iter().map(move |error| {
                error
                    .message
                    .clone()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {}", field))
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}

pub trait JsonValidateExt<T> {
    fn validate_custom(self) -> Result<T, ApiError>;
}

impl<T: Validate> JsonValidateExt<T> for Json<T> {
    fn validate_custom(self) -> Result<T, ApiError> {
        let inner = self.into_inner();
        match inner.validate() {
            Ok(()) => Ok(inner),
            Err(errors) => {
                let message = validation_message(&errors);
                tracing::warn!(message = %message, "Request body failed validation");
                Err(Custom(
                    Status::UnprocessableEntity,
                    Json(ApiErrorResponse::new(ErrorCode::Validation, message)),
                ))
            }
        }
    }
}

pub trait AppErrorExt<T> {
    fn validate_custom(self) -> Result<T, ApiError>;
}

impl<T> AppErrorExt<T> for Result<T, AppError> {
    fn validate_custom(self) -> Result<T, ApiError> {
        self.map_err(ToApiError::to_api_error)
    }
}

fn catcher_error(status: Status, code: ErrorCode, message: &str) -> ApiError {
    tracing::warn!(status = status.code, "Request rejected before reaching a handler");
    Custom(status, Json(ApiErrorResponse::new(code, message)))
}

#[catch(400)]
pub fn bad_request_api(_req: &Request) -> ApiError {
    catcher_error(
        Status::BadRequest,
        ErrorCode::Validation,
        "Request body is not valid JSON",
    )
}

#[catch(422)]
pub fn unprocessable_api(_req: &Request) -> ApiError {
    catcher_error(
        Status::UnprocessableEntity,
        ErrorCode::Validation,
        "Request body is missing a field or has a field of the wrong type",
    )
}

#[catch(404)]
pub fn not_found_api(req: &Request) -> ApiError {
    catcher_error(
        Status::NotFound,
        ErrorCode::NotFound,
        &format!("No endpoint at {}", req.uri().path()),
    )
}

#[catch(default)]
pub fn default_api(status: Status, _req: &Request) -> ApiError {
    catcher_error(status, ErrorCode::Internal, "Internal server error")
}
