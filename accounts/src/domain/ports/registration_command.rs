//! Driving port for account registration.
//!
//! The [`RegistrationCommand`] trait defines the inbound contract for creating
//! a new account from submitted form values. Implementations validate every
//! field, check username uniqueness, hash the password and persist the user.

use std::fmt;

use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::domain::forms::{AccountForm, SubmissionError};
use crate::domain::UserId;

/// Raw registration form values.
///
/// The password is zeroed on drop and never shown by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct RegistrationRequest {
    /// Account fields shared with the profile form.
    pub account: AccountForm,
    password: Zeroizing<String>,
}

impl RegistrationRequest {
    /// Bundle submitted account fields with the plaintext password.
    pub fn new(account: AccountForm, password: impl Into<String>) -> Self {
        Self {
            account,
            password: Zeroizing::new(password.into()),
        }
    }

    /// Plaintext password as submitted.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl fmt::Debug for RegistrationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationRequest")
            .field("account", &self.account)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Domain use-case port for creating accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegistrationCommand: Send + Sync {
    /// Create an account and return its identifier.
    ///
    /// Validation problems are returned together as
    /// [`SubmissionError::Invalid`]; nothing is stored in that case.
    async fn register(&self, request: &RegistrationRequest) -> Result<UserId, SubmissionError>;
}
