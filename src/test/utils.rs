#[cfg(test)]
pub mod test_utils {
    use crate::database::add_reset_columns;
    use crate::db::{NewCertificate, create_certificate, create_quiz, create_user, run_migrations};
    use crate::env::Settings;
    use crate::error::AppError;
    use crate::init_rocket;
    use rocket::local::asynchronous::Client;
    use sqlx::{Pool, Sqlite, sqlite::SqlitePoolOptions};
    use std::collections::HashMap;
    use std::sync::Once;
    use uuid::Uuid;

    static INIT: Once = Once::new();
    pub static STANDARD_PASSWORD: &str = "password123";
    pub static TEST_BASE_URL: &str = "http://quiz.test";

    #[derive(Default)]
    pub struct TestDbBuilder {
        users: Vec<TestUser>,
        quizzes: Vec<TestQuiz>,
        certificates: Vec<TestCertificate>,
        skip_reset_columns: bool,
    }

    pub struct TestUser {
        pub name: String,
        pub email: String,
        pub password: String,
    }

    pub struct TestQuiz {
        pub title: String,
        pub score: Option<f64>,
        pub total_questions: i64,
    }

    pub struct TestCertificate {
        pub certificate_id: String,
        pub quiz: CertificateQuiz,
        pub percentage: f64,
        pub score: f64,
    }

    pub enum CertificateQuiz {
        Title(String),
        MissingId(i64),
    }

    impl TestDbBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn user(mut self, name: &str, email: &str) -> Self {
            self.users.push(TestUser {
                name: name.to_string(),
                email: email.to_string(),
                password: STANDARD_PASSWORD.to_string(),
            });
            self
        }

        pub fn quiz(mut self, title: &str, score: f64) -> Self {
            self.quizzes.push(TestQuiz {
                title: title.to_string(),
                score: Some(score),
                total_questions: 10,
            });
            self
        }

        pub fn certificate(
            mut self,
            certificate_id: &str,
            quiz_title: &str,
            percentage: f64,
            score: f64,
        ) -> Self {
            self.certificates.push(TestCertificate {
                certificate_id: certificate_id.to_string(),
                quiz: CertificateQuiz::Title(quiz_title.to_string()),
                percentage,
                score,
            });
            self
        }

        /// A certificate pointing at a quiz id with no row behind it.
        pub fn orphan_certificate(mut self, certificate_id: &str, quiz_id: i64, percentage: f64) -> Self {
            self.certificates.push(TestCertificate {
                certificate_id: certificate_id.to_string(),
                quiz: CertificateQuiz::MissingId(quiz_id),
                percentage,
                score: percentage,
            });
            self
        }

        pub fn without_reset_columns(mut self) -> Self {
            self.skip_reset_columns = true;
            self
        }

        pub async fn build(self) -> Result<TestDb, AppError> {
            INIT.call_once(|| {
                let _ = tracing_subscriber::fmt()
                    .with_env_filter("debug")
                    .with_test_writer()
                    .try_init();
            });

            // one connection so every query sees the same in-memory database
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .connect("sqlite::memory:")
                .await?;

            run_migrations(&pool).await?;
            if !self.skip_reset_columns {
                add_reset_columns(&pool).await?;
            }

            let mut user_id_map: HashMap<String, i64> = HashMap::new();
            let mut quiz_id_map: HashMap<String, i64> = HashMap::new();

            for user in &self.users {
                let user_id = create_user(&pool, &user.name, &user.email, &user.password).await?;
                user_id_map.insert(user.email.clone(), user_id);
            }

            for quiz in &self.quizzes {
                let quiz_id =
                    create_quiz(&pool, &quiz.title, quiz.score, quiz.total_questions).await?;
                quiz_id_map.insert(quiz.title.clone(), quiz_id);
            }

            let first_user = user_id_map.values().next().copied();
            for certificate in &self.certificates {
                let (quiz_id, quiz_title) = match &certificate.quiz {
                    CertificateQuiz::Title(title) => {
                        let id = quiz_id_map.get(title).copied().ok_or_else(|| {
                            AppError::NotFound(format!("Test quiz {} not declared", title))
                        })?;
                        (id, title.clone())
                    }
                    CertificateQuiz::MissingId(id) => (*id, "Deleted quiz".to_string()),
                };

                create_certificate(
                    &pool,
                    NewCertificate {
                        certificate_id: &certificate.certificate_id,
                        user_id: first_user,
                        quiz_id,
                        quiz_title: &quiz_title,
                        percentage: certificate.percentage,
                        score: certificate.score,
                    },
                )
                .await?;
            }

            Ok(TestDb {
                pool,
                user_id_map,
                quiz_id_map,
            })
        }
    }

    pub struct TestDb {
        pub pool: Pool<Sqlite>,
        pub user_id_map: HashMap<String, i64>,
        pub quiz_id_map: HashMap<String, i64>,
    }

    impl TestDb {
        pub fn user_id(&self, email: &str) -> Option<i64> {
            self.user_id_map.get(email).copied()
        }

        pub fn quiz_id(&self, title: &str) -> Option<i64> {
            self.quiz_id_map.get(title).copied()
        }

        pub async fn certificate_ids(&self) -> Vec<String> {
            sqlx::query_as::<_, (String,)>(
                "SELECT certificate_id FROM certificates ORDER BY certificate_id",
            )
            .fetch_all(&self.pool)
            .await
            .expect("Failed to list certificates")
            .into_iter()
            .map(|(id,)| id)
            .collect()
        }

        pub async fn certificate_values(&self, certificate_id: &str) -> (Option<f64>, Option<f64>) {
            sqlx::query_as::<_, (Option<f64>, Option<f64>)>(
                "SELECT percentage, score FROM certificates WHERE certificate_id = ?",
            )
            .bind(certificate_id)
            .fetch_one(&self.pool)
            .await
            .expect("Certificate not found")
        }

        pub async fn reset_columns(&self, email: &str) -> (Option<String>, Option<i64>) {
            sqlx::query_as::<_, (Option<String>, Option<i64>)>(
                "SELECT reset_token, reset_token_expiry FROM users WHERE email = ?",
            )
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .expect("User not found")
        }
    }

    pub fn random_certificate_id() -> String {
        format!("CERT-{}", Uuid::new_v4())
    }

    /// Two users, a passing quiz, a failing quiz and a mix of certificates
    /// needing deletion, correction, and nothing.
    pub async fn create_standard_test_db() -> TestDb {
        TestDbBuilder::new()
            .user("Jane Doe", "jane@example.com")
            .user("John Roe", "john@example.com")
            .quiz("Rust Basics", 85.0)
            .quiz("Ownership", 92.5)
            .quiz("Lifetimes", 60.0)
            .certificate("CERT-OK", "Rust Basics", 85.0, 85.0)
            .certificate("CERT-LOW", "Rust Basics", 55.0, 55.0)
            .certificate("CERT-MISMATCH", "Ownership", 80.0, 78.0)
            .certificate("CERT-FAILED-QUIZ", "Lifetimes", 75.0, 75.0)
            .orphan_certificate("CERT-ORPHAN", 999, 88.0)
            .build()
            .await
            .expect("Failed to build test database")
    }

    pub async fn setup_test_client(test_db: TestDb) -> (Client, TestDb) {
        let settings = Settings {
            database_url: "sqlite::memory:".to_string(),
            base_url: TEST_BASE_URL.to_string(),
        };

        let rocket = init_rocket(test_db.pool.clone(), settings);
        let client = Client::tracked(rocket)
            .await
            .expect("valid rocket instance");

        (client, test_db)
    }
}
