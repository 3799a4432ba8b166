//! Port abstraction for user persistence adapters and their errors.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{AccountDetails, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// Another user already holds the username.
        DuplicateUsername { username: String } => "username {username} is already taken",
        /// The user to modify does not exist.
        Missing { id: String } => "user {id} does not exist",
    }
}

/// Durable storage for [`User`] records.
///
/// Implementations enforce username uniqueness themselves and report
/// violations as [`UserPersistenceError::DuplicateUsername`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Store a new user.
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError>;

    /// Overwrite every stored attribute of an existing user.
    async fn update(&self, user: &User) -> Result<(), UserPersistenceError>;

    /// Write only the username, names and e-mail of an existing user.
    ///
    /// Credentials, flags and timestamps keep their stored values.
    async fn update_details(
        &self,
        id: &UserId,
        details: &AccountDetails,
    ) -> Result<(), UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch a user by exact username.
    async fn find_by_username(&self, username: &str)
    -> Result<Option<User>, UserPersistenceError>;

    /// Set `last_login` for a user.
    async fn record_login(
        &self,
        id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<(), UserPersistenceError>;

    /// Advance the user's session counter, invalidating issued sessions.
    async fn bump_session_version(&self, id: &UserId) -> Result<(), UserPersistenceError>;

    /// Number of stored users.
    async fn count(&self) -> Result<u64, UserPersistenceError>;
}
