use sqlx::{Pool, Sqlite};
use tracing::{info, instrument, warn};

use crate::{
    db::{clear_reset_token, get_reset_state, get_user_by_email, store_reset_token, update_user_password},
    error::AppError,
    reset_link::ResetLink,
    reset_token::{ResetToken, verify_reset_token},
};

pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Clone)]
pub struct IssuedReset {
    pub user_id: i64,
    pub token: ResetToken,
    pub link: String,
}

pub fn check_password_policy(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Issues a reset token for `email` and returns the link pointing at
/// `base_url`. Unknown addresses yield `None`.
#[instrument(skip(pool))]
pub async fn issue_reset(
    pool: &Pool<Sqlite>,
    base_url: &str,
    email: &str,
) -> Result<Option<IssuedReset>, AppError> {
    let user = match get_user_by_email(pool, email).await? {
        Some(user) => user,
        None => {
            warn!("Password reset requested for unknown email");
            return Ok(None);
        }
    };

    let token = ResetToken::generate();
    store_reset_token(pool, user.id, &token.token, token.expires_at).await?;

    let link = ResetLink::new(base_url, &token.token, &user.email).to_url()?;
    info!(user_id = user.id, expires_at = token.expires_at, "Issued reset token");

    Ok(Some(IssuedReset {
        user_id: user.id,
        token,
        link,
    }))
}

/// Consumes a reset token: the password is replaced and the token cleared.
#[instrument(skip(pool, token, new_password))]
pub async fn reset_password(
    pool: &Pool<Sqlite>,
    email: &str,
    token: &str,
    new_password: &str,
    now_ms: i64,
) -> Result<(), AppError> {
    check_password_policy(new_password)?;

    let mut tx = pool.begin().await?;

    let state = get_reset_state(&mut *tx, email)
        .await?
        .ok_or_else(|| AppError::TokenInvalid("Invalid or already used reset link".to_string()))?;

    verify_reset_token(
        state.reset_token.as_deref(),
        state.reset_token_expiry,
        token,
        now_ms,
    )?;

    update_user_password(&mut *tx, state.id, new_password).await?;
    clear_reset_token(&mut *tx, state.id).await?;

    tx.commit().await?;
    info!(user_id = state.id, "Password reset completed");

    Ok(())
}
