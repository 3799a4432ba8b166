//! Authentication primitives such as login credentials.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to a port or service.

use std::fmt;

use zeroize::Zeroizing;

use super::forms::{FormErrors, field, messages};
use super::user::{User, UserId};

/// Validated login credentials used by authentication services.
///
/// ## Invariants
/// - `username` is trimmed and must not be empty after trimming.
/// - `password` is required to be non-empty but retains caller-provided
///   whitespace to avoid surprising credential comparisons.
///
/// # Examples
/// ```
/// use accounts::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" admin ", "password").unwrap();
/// assert_eq!(creds.username(), "admin");
/// assert_eq!(creds.password(), "password");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw username/password inputs.
    ///
    /// Both fields are checked; each missing one gets a "required" message.
    pub fn try_from_parts(username: &str, password: &str) -> Result<Self, FormErrors> {
        let normalized = username.trim();
        let mut errors = FormErrors::default();
        if normalized.is_empty() {
            errors.add(field::USERNAME, messages::REQUIRED);
        }
        if password.is_empty() {
            errors.add(field::PASSWORD, messages::REQUIRED);
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Self {
            username: normalized.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Username string suitable for user lookups.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Identity bound to a browser session by a successful login.
///
/// The session stays authenticated only while `session_version` matches the
/// user's stored counter; logging out advances the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionUser {
    pub user_id: UserId,
    pub session_version: i32,
}

impl SessionUser {
    /// Identity for the user's current session version.
    pub fn for_user(user: &User) -> Self {
        Self {
            user_id: *user.id(),
            session_version: user.session_version(),
        }
    }

    /// Whether this identity is still accepted for `user`.
    pub fn is_current_for(&self, user: &User) -> bool {
        self.user_id == *user.id() && self.session_version == user.session_version()
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
