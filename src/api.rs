use chrono::Utc;
use rocket::State;
use rocket::serde::{Deserialize, Serialize, json::Json};
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::env::Settings;
use crate::password_reset::{issue_reset, reset_password};
use crate::validation::{ApiError, AppErrorExt, JsonValidateExt};

#[derive(Serialize, Deserialize, Validate, Debug)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reset_link: Option<String>,
}

#[derive(Serialize, Deserialize, Validate, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Reset token is required"))]
    pub token: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub new_password: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct ResetPasswordResponse {
    pub success: bool,
}

#[post("/forgot-password", data = "<request>")]
pub async fn api_forgot_password(
    request: Json<ForgotPasswordRequest>,
    settings: &State<Settings>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<ForgotPasswordResponse>, ApiError> {
    let validated = request.validate_custom()?;

    let issued = issue_reset(db, &settings.base_url, &validated.email)
        .await
        .validate_custom()?;

    Ok(Json(ForgotPasswordResponse {
        success: issued.is_some(),
        reset_link: issued.map(|reset| reset.link),
    }))
}

#[post("/reset-password", data = "<request>")]
pub async fn api_reset_password(
    request: Json<ResetPasswordRequest>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<ResetPasswordResponse>, ApiError> {
    let validated = request.validate_custom()?;

    reset_password(
        db,
        &validated.email,
        &validated.token,
        &validated.new_password,
        Utc::now().timestamp_millis(),
    )
    .await
    .validate_custom()?;

    Ok(Json(ResetPasswordResponse { success: true }))
}

#[get("/health")]
pub fn health() -> &'static str {
    "OK"
}
