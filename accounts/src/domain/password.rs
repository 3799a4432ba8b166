//! Credential hashing for stored user passwords.
//!
//! Hashes are Argon2id PHC strings with a fresh random salt per password. The
//! plaintext never leaves this module except as the caller's own borrow.

use std::fmt;
use std::sync::OnceLock;

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{
    PasswordHash as PhcString, PasswordHasher, PasswordVerifier, SaltString,
};
use tracing::warn;
use uuid::Uuid;

/// Prefix marking a hash that can never verify.
const UNUSABLE_PREFIX: char = '!';

/// Errors raised while hashing a credential.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasswordError {
    /// The hashing primitive rejected its input or parameters.
    #[error("password hashing failed: {message}")]
    Hashing { message: String },
}

/// Salted, irreversible password hash as stored alongside a user.
///
/// ## Invariants
/// - The stored string is either an Argon2 PHC string or an unusable marker
///   starting with `!`.
/// - `Debug` output never reveals the hash.
///
/// # Examples
/// ```
/// use accounts::domain::PasswordHash;
///
/// let hash = PasswordHash::from_plaintext("somepassword").expect("hash");
/// assert_ne!(hash.as_str(), "somepassword");
/// assert!(hash.verify("somepassword"));
/// assert!(!hash.verify("wrong"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hash `plaintext` with a new random salt.
    pub fn from_plaintext(plaintext: &str) -> Result<Self, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| Self(hash.to_string()))
            .map_err(|err| PasswordError::Hashing {
                message: err.to_string(),
            })
    }

    /// Rehydrate a hash read from storage.
    pub fn from_stored(stored: impl Into<String>) -> Self {
        Self(stored.into())
    }

    /// A marker that never verifies, for accounts created without a password.
    pub fn unusable() -> Self {
        Self(format!("{UNUSABLE_PREFIX}{}", Uuid::new_v4().simple()))
    }

    /// Whether this hash can ever verify a password.
    pub fn is_usable(&self) -> bool {
        !self.0.starts_with(UNUSABLE_PREFIX)
    }

    /// Check `plaintext` against the stored hash.
    ///
    /// Unusable markers and corrupt stored values verify as `false`.
    pub fn verify(&self, plaintext: &str) -> bool {
        if !self.is_usable() {
            return false;
        }
        match PhcString::new(&self.0) {
            Ok(parsed) => Argon2::default()
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok(),
            Err(error) => {
                warn!(%error, "stored password hash is not a valid PHC string");
                false
            }
        }
    }

    /// Run a verification against a throwaway hash.
    ///
    /// Login attempts for unknown usernames call this so they cost the same as
    /// attempts with a wrong password.
    pub fn verify_dummy(plaintext: &str) {
        static DUMMY: OnceLock<Option<PasswordHash>> = OnceLock::new();
        let dummy = DUMMY.get_or_init(|| Self::from_plaintext("dummy-password").ok());
        if let Some(hash) = dummy {
            let _ = hash.verify(plaintext);
        }
    }

    /// Stored representation.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}
