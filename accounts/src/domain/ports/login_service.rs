//! Driving port for login and logout use-cases.
//!
//! Inbound adapters call this port to authenticate credentials without
//! knowing the backing infrastructure, so HTTP handler tests can substitute a
//! test double instead of wiring persistence.

use async_trait::async_trait;

use crate::domain::{Error, LoginCredentials, SessionUser, UserId};

/// Domain use-case port for authentication.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Validate credentials and return the identity to bind to the session.
    ///
    /// Unknown usernames, wrong passwords and inactive accounts all fail with
    /// the same [`crate::domain::ErrorCode::Unauthorized`] error.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<SessionUser, Error>;

    /// Revoke every session issued to the user so far.
    ///
    /// A user that no longer exists has no sessions left and succeeds.
    async fn end_sessions(&self, user_id: &UserId) -> Result<(), Error>;
}
