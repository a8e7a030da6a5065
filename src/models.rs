use serde::Serialize;

#[derive(Debug, Serialize, Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbUser {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl From<DbUser> for User {
    fn from(user: DbUser) -> Self {
        Self {
            id: user.id.unwrap_or_default(),
            name: user.name.unwrap_or_default(),
            email: user.email.unwrap_or_default(),
        }
    }
}

/// Reset columns of a user row. Both are NULL when no reset is pending.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserResetState {
    pub id: i64,
    pub email: String,
    pub reset_token: Option<String>,
    pub reset_token_expiry: Option<i64>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Quiz {
    pub id: i64,
    pub title: String,
    pub score: Option<f64>,
    pub total_questions: i64,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbQuiz {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub score: Option<f64>,
    pub total_questions: Option<i64>,
}

impl From<DbQuiz> for Quiz {
    fn from(quiz: DbQuiz) -> Self {
        Self {
            id: quiz.id.unwrap_or_default(),
            title: quiz.title.unwrap_or_default(),
            score: quiz.score,
            total_questions: quiz.total_questions.unwrap_or_default(),
        }
    }
}

/// A certificate row joined with the score of the quiz it references.
/// `quiz_score` is `None` when the quiz row is missing or has no score.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Certificate {
    pub id: i64,
    pub certificate_id: String,
    pub user_id: Option<i64>,
    pub quiz_id: Option<i64>,
    pub quiz_title: String,
    pub percentage: Option<f64>,
    pub score: Option<f64>,
    pub quiz_score: Option<f64>,
    pub quiz_exists: bool,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbCertificate {
    pub id: Option<i64>,
    pub certificate_id: Option<String>,
    pub user_id: Option<i64>,
    pub quiz_id: Option<i64>,
    pub quiz_title: Option<String>,
    pub percentage: Option<f64>,
    pub score: Option<f64>,
    pub quiz_score: Option<f64>,
    pub quiz_exists: Option<i64>,
}

impl From<DbCertificate> for Certificate {
    fn from(db: DbCertificate) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            certificate_id: db.certificate_id.unwrap_or_default(),
            user_id: db.user_id,
            quiz_id: db.quiz_id,
            quiz_title: db.quiz_title.unwrap_or_default(),
            percentage: db.percentage,
            score: db.score,
            quiz_score: db.quiz_score,
            quiz_exists: db.quiz_exists.unwrap_or_default() != 0,
        }
    }
}

impl Certificate {
    /// Value both percentage and score should hold: the quiz score, or the
    /// stored percentage when there is no quiz score.
    pub fn target(&self) -> Option<f64> {
        self.quiz_score.or(self.percentage)
    }

    /// Stored percentage and score both equal [`Certificate::target`].
    pub fn matches_quiz(&self) -> bool {
        match self.target() {
            Some(target) => self.percentage == Some(target) && self.score == Some(target),
            None => true,
        }
    }
}
