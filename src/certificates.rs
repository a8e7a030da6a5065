//! Certificate repair policy.
//!
//! A certificate is valid when its percentage is at least
//! [`VALIDITY_THRESHOLD`], and its percentage and score must both equal the
//! score of the quiz it references. Deletion is applied before correction, so
//! no correction ever writes a value below the threshold.

use serde::Serialize;
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::{db::get_certificates, error::AppError, models::Certificate};

pub const VALIDITY_THRESHOLD: f64 = 70.0;

const DELETE_BELOW_THRESHOLD: &str = "DELETE FROM certificates WHERE percentage < ?";

const DELETE_FAILING_QUIZ: &str = "DELETE FROM certificates
 WHERE quiz_id IN (SELECT id FROM quizzes WHERE score < ?)";

const CORRECT_FROM_QUIZ: &str = "UPDATE certificates
 SET percentage = (SELECT q.score FROM quizzes q WHERE q.id = certificates.quiz_id),
     score = (SELECT q.score FROM quizzes q WHERE q.id = certificates.quiz_id)
 WHERE EXISTS (
     SELECT 1 FROM quizzes q
     WHERE q.id = certificates.quiz_id
       AND q.score IS NOT NULL
       AND (certificates.percentage IS NOT q.score OR certificates.score IS NOT q.score)
 )";

// Without a quiz score the stored percentage is authoritative.
const ALIGN_SCORE_TO_PERCENTAGE: &str = "UPDATE certificates
 SET score = percentage
 WHERE percentage IS NOT NULL
   AND score IS NOT percentage
   AND NOT EXISTS (
       SELECT 1 FROM quizzes q
       WHERE q.id = certificates.quiz_id AND q.score IS NOT NULL
   )";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Correction {
    pub certificate: Certificate,
    pub target: f64,
}

/// What a repair pass would do, without doing it.
#[derive(Debug, Default, Serialize)]
pub struct RepairPlan {
    pub to_delete: Vec<Certificate>,
    pub to_correct: Vec<Correction>,
    /// Rows whose quiz score is itself below the threshold.
    pub to_delete_failing_quiz: Vec<Certificate>,
    pub orphaned: Vec<Certificate>,
}

impl RepairPlan {
    pub fn is_empty(&self) -> bool {
        self.to_delete.is_empty()
            && self.to_correct.is_empty()
            && self.to_delete_failing_quiz.is_empty()
    }
}

#[derive(Debug, Default, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct RepairReport {
    pub deleted_below_threshold: u64,
    pub deleted_failing_quiz: u64,
    pub corrected: u64,
    pub remaining: i64,
}

impl RepairReport {
    pub fn deleted(&self) -> u64 {
        self.deleted_below_threshold + self.deleted_failing_quiz
    }

    pub fn total_changes(&self) -> u64 {
        self.deleted() + self.corrected
    }
}

pub fn is_below_threshold(percentage: Option<f64>) -> bool {
    matches!(percentage, Some(p) if p < VALIDITY_THRESHOLD)
}

#[instrument(skip(pool))]
pub async fn plan_repair(pool: &Pool<Sqlite>) -> Result<RepairPlan, AppError> {
    info!("Planning certificate repair");
    let certificates = get_certificates(pool).await?;

    let mut plan = RepairPlan::default();
    for certificate in certificates {
        if is_below_threshold(certificate.percentage) {
            plan.to_delete.push(certificate);
            continue;
        }

        if !certificate.quiz_exists {
            plan.orphaned.push(certificate.clone());
        }

        if is_below_threshold(certificate.quiz_score) {
            plan.to_delete_failing_quiz.push(certificate);
        } else if let (false, Some(target)) = (certificate.matches_quiz(), certificate.target()) {
            plan.to_correct.push(Correction {
                certificate,
                target,
            });
        }
    }

    Ok(plan)
}

/// Deletes certificates below the threshold and those whose quiz score is
/// below it, then copies the quiz score into the rest. Rows without a quiz
/// score get their score aligned to their percentage. Runs in one
/// transaction.
#[instrument(skip(pool))]
pub async fn repair_certificates(pool: &Pool<Sqlite>) -> Result<RepairReport, AppError> {
    info!("Repairing certificates");
    let mut tx = pool.begin().await?;

    let deleted_below_threshold = sqlx::query(DELETE_BELOW_THRESHOLD)
        .bind(VALIDITY_THRESHOLD)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    info!(count = deleted_below_threshold, "Deleted certificates below threshold");

    let deleted_failing_quiz = sqlx::query(DELETE_FAILING_QUIZ)
        .bind(VALIDITY_THRESHOLD)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    if deleted_failing_quiz > 0 {
        info!(
            count = deleted_failing_quiz,
            "Deleted certificates whose quiz score is below threshold"
        );
    }

    let corrected_from_quiz = sqlx::query(CORRECT_FROM_QUIZ)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    info!(count = corrected_from_quiz, "Corrected certificates from quiz score");

    let aligned = sqlx::query(ALIGN_SCORE_TO_PERCENTAGE)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    if aligned > 0 {
        info!(count = aligned, "Aligned score to percentage where no quiz score exists");
    }

    let (remaining,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM certificates")
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(RepairReport {
        deleted_below_threshold,
        deleted_failing_quiz,
        corrected: corrected_from_quiz + aligned,
        remaining,
    })
}
