use sqlx::{Pool, Row, Sqlite};
use std::fmt;
use tracing::{info, instrument};

use super::schema::{CERTIFICATE_TRIGGERS, RESET_COLUMNS, USERS_TABLE};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnOutcome {
    Added,
    AlreadyExists,
}

impl fmt::Display for ColumnOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnOutcome::Added => write!(f, "added"),
            ColumnOutcome::AlreadyExists => write!(f, "already exists"),
        }
    }
}

#[derive(Debug, Default)]
pub struct ColumnMigrationReport {
    pub columns: Vec<(String, ColumnOutcome)>,
}

impl ColumnMigrationReport {
    pub fn added(&self) -> usize {
        self.columns
            .iter()
            .filter(|(_, outcome)| *outcome == ColumnOutcome::Added)
            .count()
    }

    pub fn outcome(&self, column: &str) -> Option<ColumnOutcome> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, outcome)| *outcome)
    }
}

#[derive(Debug, Default)]
pub struct ConstraintReport {
    pub created: Vec<String>,
    pub already_present: Vec<String>,
}

#[instrument(skip(executor))]
pub async fn table_columns(
    executor: impl sqlx::Executor<'_, Database = Sqlite>,
    table_name: &str,
) -> Result<Vec<String>, AppError> {
    let rows = sqlx::query(&format!("PRAGMA table_info({})", table_name))
        .fetch_all(executor)
        .await?;

    Ok(rows.into_iter().map(|row| row.get::<String, _>(1)).collect())
}

async fn trigger_names(
    executor: impl sqlx::Executor<'_, Database = Sqlite>,
) -> Result<Vec<String>, AppError> {
    let rows = sqlx::query("SELECT name FROM sqlite_master WHERE type = 'trigger'")
        .fetch_all(executor)
        .await?;

    Ok(rows.into_iter().map(|row| row.get::<String, _>(0)).collect())
}

/// Adds the password reset columns to `users` when they are missing.
#[instrument(skip(pool))]
pub async fn add_reset_columns(pool: &Pool<Sqlite>) -> Result<ColumnMigrationReport, AppError> {
    info!("Checking reset columns on users table");

    let mut tx = pool.begin().await?;
    let existing = table_columns(&mut *tx, USERS_TABLE).await?;

    if existing.is_empty() {
        return Err(AppError::NotFound(format!(
            "Table {} does not exist",
            USERS_TABLE
        )));
    }

    let mut report = ColumnMigrationReport::default();
    for (column, column_type) in RESET_COLUMNS {
        if existing.iter().any(|name| name == column) {
            info!(column = %column, "Column already exists");
            report
                .columns
                .push((column.to_string(), ColumnOutcome::AlreadyExists));
            continue;
        }

        let sql = format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            USERS_TABLE, column, column_type
        );
        info!("Database migration: adding column with SQL:\n{}", sql);
        sqlx::query(&sql).execute(&mut *tx).await?;
        report.columns.push((column.to_string(), ColumnOutcome::Added));
    }

    tx.commit().await?;

    Ok(report)
}

/// Installs the certificate triggers. Existing rows are not checked, so the
/// repair pass should run first.
#[instrument(skip(pool))]
pub async fn install_certificate_constraints(
    pool: &Pool<Sqlite>,
) -> Result<ConstraintReport, AppError> {
    info!("Installing certificate constraints");

    let mut tx = pool.begin().await?;
    let existing = trigger_names(&mut *tx).await?;

    let mut report = ConstraintReport::default();
    for (name, sql) in CERTIFICATE_TRIGGERS {
        if existing.iter().any(|trigger| trigger == name) {
            report.already_present.push(name.to_string());
            continue;
        }

        info!(trigger = %name, "Creating trigger");
        sqlx::raw_sql(sql).execute(&mut *tx).await?;
        report.created.push(name.to_string());
    }

    tx.commit().await?;

    Ok(report)
}
