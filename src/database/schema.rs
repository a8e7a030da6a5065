pub const USERS_TABLE: &str = "users";

/// Nullable columns the password reset flow needs on `users`.
pub const RESET_COLUMNS: &[(&str, &str)] =
    &[("reset_token", "TEXT"), ("reset_token_expiry", "INTEGER")];

/// Triggers keeping `certificates.percentage == certificates.score ==
/// quizzes.score` and rejecting certificates below the passing threshold.
pub const CERTIFICATE_TRIGGERS: &[(&str, &str)] = &[
    (
        "certificates_reject_below_threshold_insert",
        r#"
CREATE TRIGGER IF NOT EXISTS certificates_reject_below_threshold_insert
BEFORE INSERT ON certificates
WHEN COALESCE((SELECT score FROM quizzes WHERE id = NEW.quiz_id), NEW.percentage) < 70
BEGIN
    SELECT RAISE(ABORT, 'certificate percentage below passing threshold');
END;
"#,
    ),
    (
        "certificates_reject_below_threshold_update",
        r#"
CREATE TRIGGER IF NOT EXISTS certificates_reject_below_threshold_update
BEFORE UPDATE OF percentage, score, quiz_id ON certificates
WHEN COALESCE((SELECT score FROM quizzes WHERE id = NEW.quiz_id), NEW.percentage) < 70
BEGIN
    SELECT RAISE(ABORT, 'certificate percentage below passing threshold');
END;
"#,
    ),
    (
        "certificates_sync_quiz_score_insert",
        r#"
CREATE TRIGGER IF NOT EXISTS certificates_sync_quiz_score_insert
AFTER INSERT ON certificates
WHEN (SELECT score FROM quizzes WHERE id = NEW.quiz_id) IS NOT NULL
BEGIN
    UPDATE certificates
    SET percentage = (SELECT score FROM quizzes WHERE id = NEW.quiz_id),
        score = (SELECT score FROM quizzes WHERE id = NEW.quiz_id)
    WHERE id = NEW.id;
END;
"#,
    ),
    (
        "certificates_sync_quiz_score_update",
        r#"
CREATE TRIGGER IF NOT EXISTS certificates_sync_quiz_score_update
AFTER UPDATE OF percentage, score, quiz_id ON certificates
WHEN (SELECT score FROM quizzes WHERE id = NEW.quiz_id) IS NOT NULL
BEGIN
    UPDATE certificates
    SET percentage = (SELECT score FROM quizzes WHERE id = NEW.quiz_id),
        score = (SELECT score FROM quizzes WHERE id = NEW.quiz_id)
    WHERE id = NEW.id;
END;
"#,
    ),
    (
        "quizzes_propagate_score",
        r#"
CREATE TRIGGER IF NOT EXISTS quizzes_propagate_score
AFTER UPDATE OF score ON quizzes
WHEN NEW.score IS NOT NULL
BEGIN
    DELETE FROM certificates WHERE quiz_id = NEW.id AND NEW.score < 70;
    UPDATE certificates SET percentage = NEW.score, score = NEW.score
    WHERE quiz_id = NEW.id;
END;
"#,
    ),
];
