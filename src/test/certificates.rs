#[cfg(test)]
mod tests {
    use crate::certificates::{
        RepairReport, VALIDITY_THRESHOLD, is_below_threshold, plan_repair, repair_certificates,
    };
    use crate::db::get_certificates;
    use crate::test::test_utils::{TestDbBuilder, create_standard_test_db, random_certificate_id};
    use rocket::tokio;

    #[tokio::test]
    async fn test_plan_repair_classifies_certificates() {
        let test_db = create_standard_test_db().await;

        let plan = plan_repair(&test_db.pool).await.expect("Failed to plan repair");

        let ids = |certs: &[crate::models::Certificate]| -> Vec<String> {
            certs.iter().map(|c| c.certificate_id.clone()).collect()
        };

        assert_eq!(ids(&plan.to_delete), vec!["CERT-LOW"]);
        assert_eq!(ids(&plan.to_delete_failing_quiz), vec!["CERT-FAILED-QUIZ"]);
        assert_eq!(ids(&plan.orphaned), vec!["CERT-ORPHAN"]);

        assert_eq!(plan.to_correct.len(), 1);
        assert_eq!(plan.to_correct[0].certificate.certificate_id, "CERT-MISMATCH");
        assert_eq!(plan.to_correct[0].target, 92.5);
        assert!(!plan.is_empty());
    }

    #[tokio::test]
    async fn test_plan_repair_does_not_modify_rows() {
        let test_db = create_standard_test_db().await;
        let before = test_db.certificate_ids().await;

        plan_repair(&test_db.pool).await.expect("Failed to plan repair");

        assert_eq!(test_db.certificate_ids().await, before);
        assert_eq!(
            test_db.certificate_values("CERT-MISMATCH").await,
            (Some(80.0), Some(78.0))
        );
    }

    #[tokio::test]
    async fn test_repair_deletes_then_corrects() {
        let test_db = create_standard_test_db().await;

        let report = repair_certificates(&test_db.pool)
            .await
            .expect("Failed to repair certificates");

        assert_eq!(
            report,
            RepairReport {
                deleted_below_threshold: 1,
                deleted_failing_quiz: 1,
                corrected: 1,
                remaining: 3,
            }
        );
        assert_eq!(report.deleted(), 2);

        assert_eq!(
            test_db.certificate_ids().await,
            vec!["CERT-MISMATCH", "CERT-OK", "CERT-ORPHAN"]
        );
        assert_eq!(
            test_db.certificate_values("CERT-MISMATCH").await,
            (Some(92.5), Some(92.5))
        );
        assert_eq!(
            test_db.certificate_values("CERT-ORPHAN").await,
            (Some(88.0), Some(88.0))
        );
    }

    #[tokio::test]
    async fn test_repair_leaves_only_valid_matching_rows() {
        let test_db = create_standard_test_db().await;

        repair_certificates(&test_db.pool)
            .await
            .expect("Failed to repair certificates");

        let certificates = get_certificates(&test_db.pool)
            .await
            .expect("Failed to list certificates");

        for certificate in certificates {
            assert!(
                !is_below_threshold(certificate.percentage),
                "{} is below the threshold",
                certificate.certificate_id
            );
            if certificate.quiz_exists {
                assert_eq!(certificate.percentage, certificate.quiz_score);
                assert_eq!(certificate.score, certificate.quiz_score);
            }
        }
    }

    #[tokio::test]
    async fn test_repair_is_idempotent() {
        let test_db = create_standard_test_db().await;

        let first = repair_certificates(&test_db.pool)
            .await
            .expect("First repair failed");
        assert!(first.total_changes() > 0);

        let second = repair_certificates(&test_db.pool)
            .await
            .expect("Second repair failed");

        assert_eq!(second.total_changes(), 0);
        assert_eq!(second.remaining, first.remaining);

        let plan = plan_repair(&test_db.pool).await.expect("Failed to plan repair");
        assert!(plan.is_empty());
    }

    #[tokio::test]
    async fn test_threshold_boundary_is_kept() {
        let exact = random_certificate_id();
        let just_below = random_certificate_id();

        let test_db = TestDbBuilder::new()
            .quiz("Boundary", VALIDITY_THRESHOLD)
            .certificate(&exact, "Boundary", 70.0, 70.0)
            .certificate(&just_below, "Boundary", 69.9, 69.9)
            .build()
            .await
            .expect("Failed to build test database");

        let report = repair_certificates(&test_db.pool)
            .await
            .expect("Failed to repair certificates");

        assert_eq!(report.deleted_below_threshold, 1);
        assert_eq!(report.corrected, 0);
        assert_eq!(test_db.certificate_ids().await, vec![exact]);
    }

    #[tokio::test]
    async fn test_repair_on_empty_table() {
        let test_db = TestDbBuilder::new()
            .build()
            .await
            .expect("Failed to build test database");

        let report = repair_certificates(&test_db.pool)
            .await
            .expect("Failed to repair certificates");

        assert_eq!(report, RepairReport::default());
    }

    #[tokio::test]
    async fn test_plan_agrees_with_repair() {
        let test_db = create_standard_test_db().await;

        let plan = plan_repair(&test_db.pool).await.expect("Failed to plan repair");
        let report = repair_certificates(&test_db.pool)
            .await
            .expect("Failed to repair certificates");

        assert_eq!(report.deleted_below_threshold, plan.to_delete.len() as u64);
        assert_eq!(report.deleted_failing_quiz, plan.to_delete_failing_quiz.len() as u64);
        assert_eq!(report.corrected, plan.to_correct.len() as u64);
    }

    #[tokio::test]
    async fn test_score_aligned_when_quiz_has_no_score() {
        let test_db = create_standard_test_db().await;
        sqlx::query("UPDATE certificates SET score = 75 WHERE certificate_id = 'CERT-ORPHAN'")
            .execute(&test_db.pool)
            .await
            .expect("Failed to skew orphan score");

        let plan = plan_repair(&test_db.pool).await.expect("Failed to plan repair");
        let orphan_fix = plan
            .to_correct
            .iter()
            .find(|c| c.certificate.certificate_id == "CERT-ORPHAN")
            .expect("Orphan with mismatched score should be planned");
        assert_eq!(orphan_fix.target, 88.0);
        assert!(plan.orphaned.iter().any(|c| c.certificate_id == "CERT-ORPHAN"));

        let report = repair_certificates(&test_db.pool)
            .await
            .expect("Failed to repair certificates");

        assert_eq!(report.corrected, 2);
        assert_eq!(
            test_db.certificate_values("CERT-ORPHAN").await,
            (Some(88.0), Some(88.0))
        );
        assert!(plan_repair(&test_db.pool).await.unwrap().is_empty());
    }
}
