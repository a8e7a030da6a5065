//! Password reset tokens: 32 random bytes rendered as hex, valid for one hour.

use chrono::Utc;
use rand::RngCore;

use crate::error::AppError;

pub const RESET_TOKEN_BYTES: usize = 32;
pub const RESET_TOKEN_TTL_MS: i64 = 60 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetToken {
    pub token: String,
    /// Absolute expiry in epoch milliseconds.
    pub expires_at: i64,
}

impl ResetToken {
    pub fn generate() -> Self {
        Self::issue_at(Utc::now().timestamp_millis())
    }

    pub fn issue_at(now_ms: i64) -> Self {
        let mut bytes = [0u8; RESET_TOKEN_BYTES];
        rand::rng().fill_bytes(&mut bytes);

        Self {
            token: hex::encode(bytes),
            expires_at: now_ms + RESET_TOKEN_TTL_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    Invalid,
    Expired,
}

impl From<TokenRejection> for AppError {
    fn from(rejection: TokenRejection) -> Self {
        match rejection {
            TokenRejection::Invalid => {
                AppError::TokenInvalid("Invalid or already used reset link".to_string())
            }
            TokenRejection::Expired => AppError::TokenExpired(
                "Reset link has expired, please request a new one".to_string(),
            ),
        }
    }
}

pub fn verify_reset_token(
    stored_token: Option<&str>,
    stored_expiry: Option<i64>,
    presented: &str,
    now_ms: i64,
) -> Result<(), TokenRejection> {
    let stored_token = match stored_token {
        Some(token) if !token.is_empty() => token,
        _ => return Err(TokenRejection::Invalid),
    };

    if !constant_time_eq(stored_token.as_bytes(), presented.as_bytes()) {
        return Err(TokenRejection::Invalid);
    }

    match stored_expiry {
        Some(expiry) if now_ms < expiry => Ok(()),
        _ => Err(TokenRejection::Expired),
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
