#[cfg(test)]
mod tests {
    use crate::db::verify_user_password;
    use crate::error::AppError;
    use crate::password_reset::{issue_reset, reset_password};
    use crate::reset_link::ResetLink;
    use crate::reset_token::{
        RESET_TOKEN_TTL_MS, ResetToken, TokenRejection, verify_reset_token,
    };
    use crate::test::test_utils::{STANDARD_PASSWORD, TEST_BASE_URL, TestDbBuilder};
    use chrono::Utc;
    use rocket::tokio;

    #[test]
    fn test_token_is_64_hex_characters() {
        let token = ResetToken::generate();

        assert_eq!(token.token.len(), 64);
        assert!(token.token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(token.token, token.token.to_lowercase());
    }

    #[test]
    fn test_expiry_is_one_hour_after_issue() {
        let issued_at = 1_700_000_000_000;
        let token = ResetToken::issue_at(issued_at);

        assert_eq!(token.expires_at - issued_at, 3_600_000);
        assert_eq!(RESET_TOKEN_TTL_MS, 3_600_000);
    }

    #[test]
    fn test_tokens_are_unique() {
        let first = ResetToken::generate();
        let second = ResetToken::generate();

        assert_ne!(first.token, second.token);
    }

    #[test]
    fn test_verify_reset_token() {
        let token = ResetToken::issue_at(1_000);
        let stored = Some(token.token.as_str());
        let expiry = Some(token.expires_at);

        assert_eq!(verify_reset_token(stored, expiry, &token.token, 1_001), Ok(()));
        assert_eq!(
            verify_reset_token(stored, expiry, &token.token, token.expires_at),
            Err(TokenRejection::Expired)
        );
        assert_eq!(
            verify_reset_token(stored, expiry, "not-the-token", 1_001),
            Err(TokenRejection::Invalid)
        );
        assert_eq!(
            verify_reset_token(None, None, &token.token, 1_001),
            Err(TokenRejection::Invalid)
        );
        assert_eq!(
            verify_reset_token(stored, None, &token.token, 1_001),
            Err(TokenRejection::Expired)
        );
    }

    #[test]
    fn test_reset_link_format() {
        let link = ResetLink::new("https://quiz.example.com/", "abc123", "jane+quiz@example.com")
            .to_url()
            .expect("Failed to build link");

        assert_eq!(
            link,
            "https://quiz.example.com/reset-password.html?token=abc123&email=jane%2Bquiz%40example.com"
        );

        let parsed = ResetLink::parse(&link).expect("Failed to parse link");
        assert_eq!(parsed.token, "abc123");
        assert_eq!(parsed.email, "jane+quiz@example.com");
        assert_eq!(parsed.base_url, "https://quiz.example.com");
    }

    #[test]
    fn test_reset_link_requires_token_and_email() {
        let missing_email = ResetLink::parse("http://localhost:3000/reset-password.html?token=abc");
        assert!(matches!(missing_email, Err(AppError::Validation(_))));

        let not_a_url = ResetLink::parse("reset-password.html?token=abc&email=a@b.c");
        assert!(not_a_url.is_err());
    }

    #[tokio::test]
    async fn test_issue_reset_persists_token() {
        let test_db = TestDbBuilder::new()
            .user("Jane Doe", "jane@example.com")
            .build()
            .await
            .expect("Failed to build test database");

        let before = Utc::now().timestamp_millis();
        let issued = issue_reset(&test_db.pool, TEST_BASE_URL, "jane@example.com")
            .await
            .expect("Failed to issue reset")
            .expect("User should exist");
        let after = Utc::now().timestamp_millis();

        let (stored_token, stored_expiry) = test_db.reset_columns("jane@example.com").await;
        assert_eq!(stored_token.as_deref(), Some(issued.token.token.as_str()));
        assert_eq!(stored_expiry, Some(issued.token.expires_at));
        assert!(issued.token.expires_at >= before + RESET_TOKEN_TTL_MS);
        assert!(issued.token.expires_at <= after + RESET_TOKEN_TTL_MS);

        assert!(issued.link.starts_with("http://quiz.test/reset-password.html?token="));
        assert!(issued.link.ends_with("&email=jane%40example.com"));
        assert_eq!(Some(issued.user_id), test_db.user_id("jane@example.com"));
    }

    #[tokio::test]
    async fn test_issue_reset_for_unknown_email() {
        let test_db = TestDbBuilder::new()
            .build()
            .await
            .expect("Failed to build test database");

        let issued = issue_reset(&test_db.pool, TEST_BASE_URL, "nobody@example.com")
            .await
            .expect("Lookup should not fail");

        assert!(issued.is_none());
    }

    #[tokio::test]
    async fn test_reset_password_consumes_token() {
        let test_db = TestDbBuilder::new()
            .user("Jane Doe", "jane@example.com")
            .build()
            .await
            .expect("Failed to build test database");

        let issued = issue_reset(&test_db.pool, TEST_BASE_URL, "jane@example.com")
            .await
            .unwrap()
            .unwrap();
        let now = Utc::now().timestamp_millis();

        reset_password(&test_db.pool, "jane@example.com", &issued.token.token, "brand-new", now)
            .await
            .expect("Reset should succeed");

        assert!(verify_user_password(&test_db.pool, "jane@example.com", "brand-new").await.unwrap());
        assert!(!verify_user_password(&test_db.pool, "jane@example.com", STANDARD_PASSWORD).await.unwrap());
        assert_eq!(test_db.reset_columns("jane@example.com").await, (None, None));

        let reused =
            reset_password(&test_db.pool, "jane@example.com", &issued.token.token, "another1", now)
                .await;
        assert!(matches!(reused, Err(AppError::TokenInvalid(_))));
    }

    #[tokio::test]
    async fn test_reset_password_rejects_expired_token() {
        let test_db = TestDbBuilder::new()
            .user("Jane Doe", "jane@example.com")
            .build()
            .await
            .expect("Failed to build test database");

        let issued = issue_reset(&test_db.pool, TEST_BASE_URL, "jane@example.com")
            .await
            .unwrap()
            .unwrap();

        let result = reset_password(
            &test_db.pool,
            "jane@example.com",
            &issued.token.token,
            "brand-new",
            issued.token.expires_at + 1,
        )
        .await;

        match result {
            Err(AppError::TokenExpired(msg)) => assert!(msg.contains("expired")),
            other => panic!("Expected TokenExpired, got {:?}", other),
        }
        assert!(verify_user_password(&test_db.pool, "jane@example.com", STANDARD_PASSWORD).await.unwrap());
    }

    #[tokio::test]
    async fn test_reset_password_enforces_length() {
        let test_db = TestDbBuilder::new()
            .user("Jane Doe", "jane@example.com")
            .build()
            .await
            .expect("Failed to build test database");

        let issued = issue_reset(&test_db.pool, TEST_BASE_URL, "jane@example.com")
            .await
            .unwrap()
            .unwrap();

        let result = reset_password(
            &test_db.pool,
            "jane@example.com",
            &issued.token.token,
            "short",
            Utc::now().timestamp_millis(),
        )
        .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        let (stored_token, _) = test_db.reset_columns("jane@example.com").await;
        assert!(stored_token.is_some(), "Token must survive a rejected attempt");
    }
}
