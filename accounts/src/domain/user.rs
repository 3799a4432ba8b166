//! User account data model.
//!
//! A [`User`] carries the standard authenticatable-user fields (credentials,
//! names, e-mail, activity and permission flags, timestamps) plus a profile
//! picture reference.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::ValidateEmail;

use super::password::{PasswordError, PasswordHash};

/// Maximum length of a username.
pub const USERNAME_MAX: usize = 150;
/// Maximum length of a first or last name.
pub const NAME_MAX: usize = 150;
/// Maximum length of an e-mail address.
pub const EMAIL_MAX: usize = 254;
/// Profile picture assigned to new accounts.
pub const DEFAULT_PROFILE_PICTURE: &str = "defpic.jpg";

/// Validation errors for user attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    /// The identifier is not a canonical UUID string.
    InvalidId,
    /// The username is blank after trimming.
    EmptyUsername,
    /// The username exceeds [`USERNAME_MAX`] characters.
    UsernameTooLong { max: usize, actual: usize },
    /// The username contains characters outside letters, digits and `@.+-_`.
    UsernameInvalidCharacters,
    /// The e-mail address exceeds [`EMAIL_MAX`] characters.
    EmailTooLong { max: usize, actual: usize },
    /// The e-mail address is malformed or its domain has no top-level label.
    InvalidEmail,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidId => write!(f, "user id must be a valid UUID"),
            Self::EmptyUsername => write!(f, "username must not be empty"),
            Self::UsernameTooLong { max, actual } => {
                write!(f, "username must be at most {max} characters (got {actual})")
            }
            Self::UsernameInvalidCharacters => write!(
                f,
                "username may only contain letters, numbers, and @/./+/-/_ characters",
            ),
            Self::EmailTooLong { max, actual } => {
                write!(f, "email must be at most {max} characters (got {actual})")
            }
            Self::InvalidEmail => write!(f, "email must be a valid address"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid);

impl UserId {
    /// Validate and construct a [`UserId`] from its string form.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let raw = id.as_ref();
        if raw.trim() != raw {
            return Err(UserValidationError::InvalidId);
        }
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId)
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID, e.g. one read from storage.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

static USERNAME_RE: OnceLock<Regex> = OnceLock::new();

fn username_regex() -> &'static Regex {
    USERNAME_RE.get_or_init(|| {
        // Length is enforced separately; this regex constrains allowed characters.
        let pattern = r"^[\w.@+-]+$";
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("username regex failed to compile: {error}"))
    })
}

/// Login name, unique across all users.
///
/// ## Invariants
/// - Trimmed, non-empty, at most [`USERNAME_MAX`] characters.
/// - Only letters, digits and `@ . + - _`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    /// Validate and construct a [`Username`]; surrounding whitespace is dropped.
    ///
    /// # Examples
    /// ```
    /// use accounts::domain::Username;
    ///
    /// assert_eq!(Username::new("  boburjon ").unwrap().as_ref(), "boburjon");
    /// assert!(Username::new("no spaces").is_err());
    /// ```
    pub fn new(username: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let username = username.as_ref().trim();
        if username.is_empty() {
            return Err(UserValidationError::EmptyUsername);
        }
        let actual = username.chars().count();
        if actual > USERNAME_MAX {
            return Err(UserValidationError::UsernameTooLong {
                max: USERNAME_MAX,
                actual,
            });
        }
        if !username_regex().is_match(username) {
            return Err(UserValidationError::UsernameInvalidCharacters);
        }
        Ok(Self(username.to_owned()))
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Whether the domain part is `localhost`, an address literal, or a dotted
/// name ending in a label of 2 to 63 letters, digits or hyphens.
fn has_qualified_domain(email: &str) -> bool {
    let Some((_, domain)) = email.rsplit_once('@') else {
        return false;
    };
    if domain.eq_ignore_ascii_case("localhost") || domain.starts_with('[') {
        return true;
    }
    let Some((_, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    (2..=63).contains(&tld.chars().count())
        && !tld.ends_with('-')
        && tld.chars().all(|c| c.is_alphanumeric() || c == '-')
}

/// Syntactically valid e-mail address.
///
/// Single-label domains are rejected unless the domain is `localhost`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and construct an [`EmailAddress`]; surrounding whitespace is dropped.
    ///
    /// # Examples
    /// ```
    /// use accounts::domain::EmailAddress;
    ///
    /// assert!(EmailAddress::new("user@example.com").is_ok());
    /// assert!(EmailAddress::new("user@localhost").is_ok());
    /// assert!(EmailAddress::new("user@example").is_err());
    /// ```
    pub fn new(email: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let email = email.as_ref().trim();
        let actual = email.chars().count();
        if actual > EMAIL_MAX {
            return Err(UserValidationError::EmailTooLong {
                max: EMAIL_MAX,
                actual,
            });
        }
        if !email.validate_email() || !has_qualified_domain(email) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(email.to_owned()))
    }

    /// Parse an optional address where blank input means "no address".
    pub fn parse_optional(email: &str) -> Result<Option<Self>, UserValidationError> {
        if email.trim().is_empty() {
            Ok(None)
        } else {
            Self::new(email).map(Some)
        }
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Reference to the user's profile image, relative to the media root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilePicture(String);

impl ProfilePicture {
    /// Wrap a stored image reference.
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Public URL of the image under `media_url`.
    ///
    /// # Examples
    /// ```
    /// use accounts::domain::ProfilePicture;
    ///
    /// assert_eq!(ProfilePicture::default().url("/media/"), "/media/defpic.jpg");
    /// assert_eq!(ProfilePicture::default().url("/media"), "/media/defpic.jpg");
    /// ```
    pub fn url(&self, media_url: &str) -> String {
        format!("{}/{}", media_url.trim_end_matches('/'), self.0)
    }
}

impl Default for ProfilePicture {
    fn default() -> Self {
        Self(DEFAULT_PROFILE_PICTURE.to_owned())
    }
}

impl AsRef<str> for ProfilePicture {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Editable account fields shared by registration and profile updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountDetails {
    pub username: Username,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<EmailAddress>,
}

/// Every stored attribute of a user, used to rehydrate from storage.
#[derive(Debug, Clone)]
pub struct UserParts {
    pub id: UserId,
    pub username: Username,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<EmailAddress>,
    pub password: PasswordHash,
    pub profile_picture: ProfilePicture,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub date_joined: DateTime<Utc>,
    pub session_version: i32,
}

/// Application user.
///
/// ## Invariants
/// - `username` is unique across users (enforced by the repository).
/// - `password` is only ever a salted hash.
/// - A session is valid only while it carries the current `session_version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    username: Username,
    first_name: String,
    last_name: String,
    email: Option<EmailAddress>,
    password: PasswordHash,
    profile_picture: ProfilePicture,
    is_active: bool,
    is_staff: bool,
    is_superuser: bool,
    last_login: Option<DateTime<Utc>>,
    date_joined: DateTime<Utc>,
    session_version: i32,
}

impl User {
    /// Create a freshly registered, active, unprivileged user.
    pub fn register(details: AccountDetails, password: PasswordHash, joined: DateTime<Utc>) -> Self {
        let AccountDetails {
            username,
            first_name,
            last_name,
            email,
        } = details;
        Self {
            id: UserId::random(),
            username,
            first_name,
            last_name,
            email,
            password,
            profile_picture: ProfilePicture::default(),
            is_active: true,
            is_staff: false,
            is_superuser: false,
            last_login: None,
            date_joined: joined,
            session_version: 0,
        }
    }

    /// Rebuild a user from stored attributes.
    pub fn from_parts(parts: UserParts) -> Self {
        let UserParts {
            id,
            username,
            first_name,
            last_name,
            email,
            password,
            profile_picture,
            is_active,
            is_staff,
            is_superuser,
            last_login,
            date_joined,
            session_version,
        } = parts;
        Self {
            id,
            username,
            first_name,
            last_name,
            email,
            password,
            profile_picture,
            is_active,
            is_staff,
            is_superuser,
            last_login,
            date_joined,
            session_version,
        }
    }

    /// Hash and store a new password.
    pub fn set_password(&mut self, plaintext: &str) -> Result<(), PasswordError> {
        self.password = PasswordHash::from_plaintext(plaintext)?;
        Ok(())
    }

    /// Mark the password so that no plaintext verifies.
    pub fn set_unusable_password(&mut self) {
        self.password = PasswordHash::unusable();
    }

    /// Check a plaintext password against the stored hash.
    pub fn check_password(&self, plaintext: &str) -> bool {
        self.password.verify(plaintext)
    }

    /// Overwrite the editable account fields.
    pub fn apply_details(&mut self, details: AccountDetails) {
        let AccountDetails {
            username,
            first_name,
            last_name,
            email,
        } = details;
        self.username = username;
        self.first_name = first_name;
        self.last_name = last_name;
        self.email = email;
    }

    /// Enable or disable logins for this account.
    pub fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }

    /// Grant or revoke staff status.
    pub fn set_staff(&mut self, staff: bool) {
        self.is_staff = staff;
    }

    /// Grant or revoke superuser status.
    pub fn set_superuser(&mut self, superuser: bool) {
        self.is_superuser = superuser;
    }

    /// Invalidate every session issued so far.
    pub fn end_sessions(&mut self) {
        self.session_version = self.session_version.wrapping_add(1);
    }

    /// Record a successful login.
    pub fn record_login(&mut self, at: DateTime<Utc>) {
        self.last_login = Some(at);
    }

    /// Stable user identifier.
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Unique login name.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Given name.
    pub fn first_name(&self) -> &str {
        self.first_name.as_str()
    }

    /// Family name; empty when not provided.
    pub fn last_name(&self) -> &str {
        self.last_name.as_str()
    }

    /// Contact address, if any.
    pub fn email(&self) -> Option<&EmailAddress> {
        self.email.as_ref()
    }

    /// Stored credential hash.
    pub fn password_hash(&self) -> &PasswordHash {
        &self.password
    }

    /// Profile image reference.
    pub fn profile_picture(&self) -> &ProfilePicture {
        &self.profile_picture
    }

    /// Whether the account may log in.
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Whether the account has staff status.
    pub fn is_staff(&self) -> bool {
        self.is_staff
    }

    /// Whether the account has every permission.
    pub fn is_superuser(&self) -> bool {
        self.is_superuser
    }

    /// Time of the last successful login.
    pub fn last_login(&self) -> Option<DateTime<Utc>> {
        self.last_login
    }

    /// Time the account was created.
    pub fn date_joined(&self) -> DateTime<Utc> {
        self.date_joined
    }

    /// Counter that sessions must match to stay authenticated.
    pub fn session_version(&self) -> i32 {
        self.session_version
    }
}
