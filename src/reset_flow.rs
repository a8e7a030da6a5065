use tracing::{info, instrument};

use crate::{
    api::{ForgotPasswordResponse, ResetPasswordRequest},
    client::ApiClient,
    error::AppError,
    reset_link::ResetLink,
};

#[derive(Debug, Clone)]
pub struct ResetFlowReport {
    pub reset_link: String,
    pub token: String,
    pub email: String,
}

/// Pulls the token and email out of a forgot-password response.
pub fn extract_reset_link(response: &ForgotPasswordResponse) -> Result<ResetLink, AppError> {
    if !response.success {
        return Err(AppError::NotFound(
            "forgot-password did not succeed for this email".to_string(),
        ));
    }

    let link = response.reset_link.as_deref().ok_or_else(|| {
        AppError::ExternalService("forgot-password response has no resetLink".to_string())
    })?;

    ResetLink::parse(link)
}

/// Requests a reset link for `email`, then uses it to set `new_password`.
#[instrument(skip(client, new_password))]
pub async fn run_reset_flow(
    client: &ApiClient,
    email: &str,
    new_password: &str,
) -> Result<ResetFlowReport, AppError> {
    let forgot = client.forgot_password(email).await?;
    let link = extract_reset_link(&forgot)?;
    info!(token_length = link.token.len(), "Received reset link");

    let request = ResetPasswordRequest {
        email: link.email.clone(),
        token: link.token.clone(),
        new_password: new_password.to_string(),
    };

    client.reset_password(&request).await.map_err(|failure| {
        AppError::ExternalService(format!(
            "reset-password failed ({:?}): {}",
            failure.code, failure.message
        ))
    })?;

    Ok(ResetFlowReport {
        reset_link: forgot.reset_link.unwrap_or_default(),
        token: link.token,
        email: link.email,
    })
}
