use chrono::Utc;
use serde::Serialize;
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument, warn};

use crate::{
    certificates::{VALIDITY_THRESHOLD, is_below_threshold},
    database::{RESET_COLUMNS, USERS_TABLE, table_columns},
    db::{get_certificates, get_quizzes},
    error::AppError,
    models::Certificate,
};

#[derive(Debug, Default, Serialize, PartialEq)]
pub struct CertificateSummary {
    pub total: usize,
    pub valid: usize,
    pub below_threshold: usize,
    pub mismatched: usize,
    pub orphaned: usize,
    pub average_percentage: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct QuizOverview {
    pub id: i64,
    pub title: String,
    pub score: Option<f64>,
    pub total_questions: i64,
    pub certificate_count: usize,
}

#[derive(Debug, Serialize)]
pub struct ResetTokenStatus {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub has_token: bool,
    pub expires_at: Option<i64>,
    pub expired: bool,
}

#[derive(sqlx::FromRow)]
struct DbResetRow {
    id: i64,
    name: Option<String>,
    email: Option<String>,
    reset_token: Option<String>,
    reset_token_expiry: Option<i64>,
}

pub fn summarize(certificates: &[Certificate]) -> CertificateSummary {
    let mut summary = CertificateSummary {
        total: certificates.len(),
        ..Default::default()
    };

    let mut percentage_sum = 0.0;
    let mut percentage_count = 0usize;

    for certificate in certificates {
        if let Some(percentage) = certificate.percentage {
            percentage_sum += percentage;
            percentage_count += 1;
        }

        if !certificate.quiz_exists {
            summary.orphaned += 1;
        }

        if is_below_threshold(certificate.percentage) {
            summary.below_threshold += 1;
        } else if !certificate.matches_quiz() {
            summary.mismatched += 1;
        } else if certificate.percentage.is_some() {
            summary.valid += 1;
        }
    }

    if percentage_count > 0 {
        summary.average_percentage = Some(percentage_sum / percentage_count as f64);
    }

    summary
}

#[instrument(skip(pool))]
pub async fn certificate_summary(pool: &Pool<Sqlite>) -> Result<CertificateSummary, AppError> {
    info!("Summarizing certificates");
    let certificates = get_certificates(pool).await?;
    Ok(summarize(&certificates))
}

#[instrument(skip(pool))]
pub async fn list_certificates(pool: &Pool<Sqlite>) -> Result<Vec<Certificate>, AppError> {
    get_certificates(pool).await
}

#[instrument(skip(pool))]
pub async fn quiz_overview(pool: &Pool<Sqlite>) -> Result<Vec<QuizOverview>, AppError> {
    info!("Building quiz overview");
    let quizzes = get_quizzes(pool).await?;
    let certificates = get_certificates(pool).await?;

    Ok(quizzes
        .into_iter()
        .map(|quiz| QuizOverview {
            certificate_count: certificates
                .iter()
                .filter(|c| c.quiz_id == Some(quiz.id))
                .count(),
            id: quiz.id,
            title: quiz.title,
            score: quiz.score,
            total_questions: quiz.total_questions,
        })
        .collect())
}

/// Reset token state per user. A database that has not had the reset
/// columns added yet reports every user without a token.
#[instrument(skip(pool))]
pub async fn reset_token_statuses(pool: &Pool<Sqlite>) -> Result<Vec<ResetTokenStatus>, AppError> {
    info!("Listing reset token statuses");
    let columns = table_columns(pool, USERS_TABLE).await?;
    let has_reset_columns = RESET_COLUMNS
        .iter()
        .all(|(column, _)| columns.iter().any(|c| c == column));

    let query = if has_reset_columns {
        "SELECT id, name, email, reset_token, reset_token_expiry FROM users ORDER BY id"
    } else {
        warn!("Reset columns missing from users table");
        "SELECT id, name, email, NULL AS reset_token, NULL AS reset_token_expiry FROM users ORDER BY id"
    };

    let rows = sqlx::query_as::<_, DbResetRow>(query)
        .fetch_all(pool)
        .await?;

    let now = Utc::now().timestamp_millis();

    Ok(rows
        .into_iter()
        .map(|row| ResetTokenStatus {
            id: row.id,
            name: row.name.unwrap_or_default(),
            email: row.email.unwrap_or_default(),
            has_token: row.reset_token.is_some_and(|t| !t.is_empty()),
            expires_at: row.reset_token_expiry,
            expired: row.reset_token_expiry.is_some_and(|expiry| now >= expiry),
        })
        .collect())
}

pub fn format_percentage(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{:.1}%", value),
        None => "-".to_string(),
    }
}

pub fn threshold_label() -> String {
    format!("{:.0}%", VALIDITY_THRESHOLD)
}
