//! Reset-password form behaviour: field validation, one request in flight,
//! and the notification/redirect the page shows afterwards.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::{
    api::ResetPasswordRequest,
    client::{ApiClient, ResetFailure},
    error::AppError,
    password_reset::MIN_PASSWORD_LENGTH,
    reset_link::ResetLink,
};

pub const LOGIN_PAGE: &str = "/login.html";
pub const SUCCESS_REDIRECT_DELAY: Duration = Duration::from_secs(2);
pub const DEAD_LINK_REDIRECT_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FormError {
    #[error("Please fill in both password fields")]
    MissingFields,
    #[error("Password must be at least {} characters long", MIN_PASSWORD_LENGTH)]
    TooShort,
    #[error("Passwords do not match")]
    Mismatch,
}

#[derive(Debug, Clone)]
pub struct ResetPasswordForm {
    pub email: String,
    pub token: String,
    pub password: String,
    pub confirm_password: String,
}

impl ResetPasswordForm {
    /// Reads token and email from the page URL; the password fields start empty.
    pub fn from_link(link: &str) -> Result<Self, AppError> {
        let link = ResetLink::parse(link)?;
        Ok(Self {
            email: link.email,
            token: link.token,
            password: String::new(),
            confirm_password: String::new(),
        })
    }

    pub fn with_passwords(mut self, password: &str, confirm_password: &str) -> Self {
        self.password = password.to_string();
        self.confirm_password = confirm_password.to_string();
        self
    }

    pub fn validate(&self) -> Result<(), FormError> {
        if self.password.is_empty() || self.confirm_password.is_empty() {
            return Err(FormError::MissingFields);
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(FormError::TooShort);
        }
        if self.password != self.confirm_password {
            return Err(FormError::Mismatch);
        }
        Ok(())
    }

    fn to_request(&self) -> ResetPasswordRequest {
        ResetPasswordRequest {
            email: self.email.clone(),
            token: self.token.clone(),
            new_password: self.password.clone(),
        }
    }
}

#[rocket::async_trait]
pub trait ResetApi: Send + Sync {
    async fn reset_password(&self, request: &ResetPasswordRequest) -> Result<(), ResetFailure>;
}

#[rocket::async_trait]
impl ResetApi for ApiClient {
    async fn reset_password(&self, request: &ResetPasswordRequest) -> Result<(), ResetFailure> {
        ApiClient::reset_password(self, request).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub to: &'static str,
    pub after: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A submission is already in flight; nothing was sent.
    Busy,
    /// Rejected before any request was made.
    Invalid(FormError),
    Succeeded {
        notification: Notification,
        redirect: Redirect,
    },
    Failed {
        notification: Notification,
        redirect: Option<Redirect>,
    },
}

impl SubmitOutcome {
    pub fn notification(&self) -> Option<Notification> {
        match self {
            SubmitOutcome::Busy => None,
            SubmitOutcome::Invalid(err) => Some(Notification::error(err.to_string())),
            SubmitOutcome::Succeeded { notification, .. }
            | SubmitOutcome::Failed { notification, .. } => Some(notification.clone()),
        }
    }

    pub fn redirect(&self) -> Option<&Redirect> {
        match self {
            SubmitOutcome::Succeeded { redirect, .. } => Some(redirect),
            SubmitOutcome::Failed { redirect, .. } => redirect.as_ref(),
            _ => None,
        }
    }
}

struct SubmittingGuard<'a>(&'a AtomicBool);

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct ResetFormController<A> {
    api: A,
    submitting: AtomicBool,
}

impl<A: ResetApi> ResetFormController<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            submitting: AtomicBool::new(false),
        }
    }

    /// Whether the submit control is currently disabled.
    pub fn submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub async fn submit(&self, form: &ResetPasswordForm) -> SubmitOutcome {
        if let Err(err) = form.validate() {
            warn!(error = %err, "Reset form rejected");
            return SubmitOutcome::Invalid(err);
        }

        if self
            .submitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return SubmitOutcome::Busy;
        }
        let _guard = SubmittingGuard(&self.submitting);

        match self.api.reset_password(&form.to_request()).await {
            Ok(()) => {
                info!("Password reset succeeded");
                SubmitOutcome::Succeeded {
                    notification: Notification::success(
                        "Password reset successfully! Redirecting to login...",
                    ),
                    redirect: Redirect {
                        to: LOGIN_PAGE,
                        after: SUCCESS_REDIRECT_DELAY,
                    },
                }
            }
            Err(failure) => {
                let dead_link = failure.code.is_some_and(|code| code.is_dead_link());
                SubmitOutcome::Failed {
                    notification: Notification::error(failure.message),
                    redirect: dead_link.then_some(Redirect {
                        to: LOGIN_PAGE,
                        after: DEAD_LINK_REDIRECT_DELAY,
                    }),
                }
            }
        }
    }
}
