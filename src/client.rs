use std::time::Duration;

use reqwest::StatusCode;
use tracing::{info, instrument, warn};

use crate::{
    api::{ForgotPasswordRequest, ForgotPasswordResponse, ResetPasswordRequest},
    error::AppError,
    validation::{ApiErrorResponse, ErrorCode},
};

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A failed reset as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetFailure {
    pub status: Option<u16>,
    pub code: Option<ErrorCode>,
    pub message: String,
}

impl ResetFailure {
    /// Decodes a non-200 reset-password response. Bodies that are not an
    /// [`ApiErrorResponse`] keep the raw text and carry no code.
    pub fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ApiErrorResponse>(body) {
            Ok(error) => Self {
                status: Some(status),
                code: Some(error.code),
                message: error.error,
            },
            Err(_) => Self {
                status: Some(status),
                code: None,
                message: format!("Unexpected response ({}): {}", status, body),
            },
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status: None,
            code: None,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    #[instrument(skip(self))]
    pub async fn forgot_password(&self, email: &str) -> Result<ForgotPasswordResponse, AppError> {
        info!("Requesting password reset link");
        let response = self
            .http
            .post(self.endpoint("forgot-password"))
            .json(&ForgotPasswordRequest {
                email: email.to_string(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "forgot-password returned {}: {}",
                status, body
            )));
        }

        Ok(response.json::<ForgotPasswordResponse>().await?)
    }

    #[instrument(skip_all, fields(email = %request.email))]
    pub async fn reset_password(&self, request: &ResetPasswordRequest) -> Result<(), ResetFailure> {
        info!("Submitting password reset");
        let response = self
            .http
            .post(self.endpoint("reset-password"))
            .json(request)
            .send()
            .await
            .map_err(|e| ResetFailure::network(format!("Network error: {}", e)))?;

        let status = response.status();
        if status == StatusCode::OK {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let failure = ResetFailure::from_response(status.as_u16(), &body);
        warn!(status = %status, code = ?failure.code, "Password reset rejected");

        Err(failure)
    }
}
