use std::future::Future;

use crate::{
    error::AppError,
    models::{Certificate, DbCertificate, DbQuiz, DbUser, Quiz, User, UserResetState},
};
use sqlx::{Pool, Sqlite, sqlite::SqlitePoolOptions};
use tracing::{info, instrument, warn};

pub(crate) const CERTIFICATE_SELECT: &str = "SELECT c.id, c.certificate_id, c.user_id, c.quiz_id, c.quiz_title,
        c.percentage, c.score, q.score AS quiz_score, (q.id IS NOT NULL) AS quiz_exists
 FROM certificates c
 LEFT JOIN quizzes q ON q.id = c.quiz_id";

/// Opens a single-connection pool. Maintenance binaries never share the
/// database with concurrent writers of their own.
#[instrument(skip_all)]
pub async fn open_database(database_url: &str) -> Result<Pool<Sqlite>, AppError> {
    info!("Opening database");
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Runs `operation` against a freshly opened pool and closes the pool
/// afterwards, whether the operation succeeded or not.
pub async fn with_pool<F, Fut, T>(database_url: &str, operation: F) -> Result<T, AppError>
where
    F: FnOnce(Pool<Sqlite>) -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let pool = open_database(database_url).await?;

    let result = operation(pool.clone()).await;

    pool.close().await;
    if let Err(err) = &result {
        warn!(error = %err, "Operation failed, database connection closed");
    }

    result
}

#[instrument(skip_all)]
pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<(), AppError> {
    info!("Running database migrations");
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[cfg(test)]
#[instrument(skip_all, fields(email))]
pub async fn create_user(
    pool: &Pool<Sqlite>,
    name: &str,
    email: &str,
    password: &str,
) -> Result<i64, AppError> {
    info!("Creating new user");

    let existing_user = sqlx::query("SELECT id FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    if existing_user.is_some() {
        return Err(AppError::Validation(format!(
            "Email '{}' already registered",
            email
        )));
    }

    let hashed_password = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;

    let res = sqlx::query("INSERT INTO users (name, email, password) VALUES (?, ?, ?)")
        .bind(name)
        .bind(email)
        .bind(hashed_password)
        .execute(pool)
        .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(pool))]
pub async fn get_user_by_email(pool: &Pool<Sqlite>, email: &str) -> Result<Option<User>, AppError> {
    info!("Getting user by email");
    let row = sqlx::query_as::<_, DbUser>("SELECT id, name, email FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(User::from))
}

#[instrument(skip(executor))]
pub async fn get_reset_state(
    executor: impl sqlx::Executor<'_, Database = Sqlite>,
    email: &str,
) -> Result<Option<UserResetState>, AppError> {
    info!("Getting reset state");
    let row = sqlx::query_as::<_, UserResetState>(
        "SELECT id, email, reset_token, reset_token_expiry FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(executor)
    .await?;

    Ok(row)
}

#[instrument(skip(pool, token))]
pub async fn store_reset_token(
    pool: &Pool<Sqlite>,
    user_id: i64,
    token: &str,
    expires_at: i64,
) -> Result<(), AppError> {
    info!("Storing reset token");
    let res =
        sqlx::query("UPDATE users SET reset_token = ?, reset_token_expiry = ? WHERE id = ?")
            .bind(token)
            .bind(expires_at)
            .bind(user_id)
            .execute(pool)
            .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "User with id {} not found in database",
            user_id
        )));
    }

    Ok(())
}

#[instrument(skip(executor))]
pub async fn clear_reset_token(
    executor: impl sqlx::Executor<'_, Database = Sqlite>,
    user_id: i64,
) -> Result<(), AppError> {
    info!("Clearing reset token");
    sqlx::query("UPDATE users SET reset_token = NULL, reset_token_expiry = NULL WHERE id = ?")
        .bind(user_id)
        .execute(executor)
        .await?;

    Ok(())
}

#[instrument(skip_all, fields(user_id))]
pub async fn update_user_password(
    executor: impl sqlx::Executor<'_, Database = Sqlite>,
    user_id: i64,
    new_password: &str,
) -> Result<(), AppError> {
    info!("Updating user password");
    let hashed_password = bcrypt::hash(new_password, bcrypt::DEFAULT_COST)?;

    sqlx::query("UPDATE users SET password = ? WHERE id = ?")
        .bind(hashed_password)
        .bind(user_id)
        .execute(executor)
        .await?;

    Ok(())
}

#[cfg(test)]
#[instrument(skip_all, fields(email))]
pub async fn verify_user_password(
    pool: &Pool<Sqlite>,
    email: &str,
    password: &str,
) -> Result<bool, AppError> {
    let row: Option<(String,)> = sqlx::query_as("SELECT password FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    match row {
        Some((hash,)) => Ok(bcrypt::verify(password, &hash).unwrap_or(false)),
        None => Ok(false),
    }
}

#[instrument(skip(pool))]
pub async fn create_quiz(
    pool: &Pool<Sqlite>,
    title: &str,
    score: Option<f64>,
    total_questions: i64,
) -> Result<i64, AppError> {
    info!("Creating quiz");
    let res = sqlx::query("INSERT INTO quizzes (title, score, total_questions) VALUES (?, ?, ?)")
        .bind(title)
        .bind(score)
        .bind(total_questions)
        .execute(pool)
        .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(pool))]
pub async fn get_quizzes(pool: &Pool<Sqlite>) -> Result<Vec<Quiz>, AppError> {
    info!("Getting all quizzes");
    let rows = sqlx::query_as::<_, DbQuiz>(
        "SELECT id, title, score, total_questions FROM quizzes ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Quiz::from).collect())
}

#[derive(Debug, Clone)]
pub struct NewCertificate<'a> {
    pub certificate_id: &'a str,
    pub user_id: Option<i64>,
    pub quiz_id: i64,
    pub quiz_title: &'a str,
    pub percentage: f64,
    pub score: f64,
}

#[instrument(skip(pool))]
pub async fn create_certificate(
    pool: &Pool<Sqlite>,
    certificate: NewCertificate<'_>,
) -> Result<i64, AppError> {
    info!("Creating certificate");
    let res = sqlx::query(
        "INSERT INTO certificates (certificate_id, user_id, quiz_id, quiz_title, percentage, score)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(certificate.certificate_id)
    .bind(certificate.user_id)
    .bind(certificate.quiz_id)
    .bind(certificate.quiz_title)
    .bind(certificate.percentage)
    .bind(certificate.score)
    .execute(pool)
    .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(executor))]
pub async fn get_certificates(
    executor: impl sqlx::Executor<'_, Database = Sqlite>,
) -> Result<Vec<Certificate>, AppError> {
    info!("Getting all certificates");
    let query = format!("{} ORDER BY c.id", CERTIFICATE_SELECT);
    let rows = sqlx::query_as::<_, DbCertificate>(&query)
        .fetch_all(executor)
        .await?;

    Ok(rows.into_iter().map(Certificate::from).collect())
}
