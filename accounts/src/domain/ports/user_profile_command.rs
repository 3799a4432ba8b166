//! Driving port for editing the current user's profile.

use async_trait::async_trait;

use crate::domain::forms::{AccountForm, SubmissionError};
use crate::domain::{User, UserId};

/// Request to replace the editable profile fields of one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdateRequest {
    /// The user whose profile is being edited.
    pub user_id: UserId,
    /// Submitted username, names and e-mail.
    pub account: AccountForm,
}

/// Domain use-case port for profile edits.
///
/// Field rules match registration, except that the password is untouched and
/// the username may stay the same as the user's own.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserProfileCommand: Send + Sync {
    /// Validate and persist the new profile values, returning the saved user.
    async fn update_profile(&self, request: &ProfileUpdateRequest)
    -> Result<User, SubmissionError>;
}
