use reqwest::Url;

use crate::error::AppError;

pub const RESET_PAGE: &str = "reset-password.html";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetLink {
    pub base_url: String,
    pub token: String,
    pub email: String,
}

impl ResetLink {
    pub fn new(base_url: &str, token: &str, email: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            email: email.to_string(),
        }
    }

    /// `<base>/reset-password.html?token=<token>&email=<encoded email>`
    pub fn to_url(&self) -> Result<String, AppError> {
        let mut url = Url::parse(&format!("{}/{}", self.base_url, RESET_PAGE))
            .map_err(|e| AppError::Validation(format!("Invalid base URL: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("token", &self.token)
            .append_pair("email", &self.email);

        Ok(url.to_string())
    }

    pub fn parse(link: &str) -> Result<Self, AppError> {
        let url = Url::parse(link)
            .map_err(|e| AppError::Validation(format!("Invalid reset link: {}", e)))?;

        let mut token = None;
        let mut email = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "token" => token = Some(value.into_owned()),
                "email" => email = Some(value.into_owned()),
                _ => {}
            }
        }

        match (token, email) {
            (Some(token), Some(email)) if !token.is_empty() && !email.is_empty() => {
                let mut base = url.clone();
                base.set_query(None);
                base.set_fragment(None);
                if let Ok(mut segments) = base.path_segments_mut() {
                    segments.pop();
                }
                Ok(Self::new(base.as_str(), &token, &email))
            }
            _ => Err(AppError::Validation(
                "Reset link is missing the token or email".to_string(),
            )),
        }
    }
}
