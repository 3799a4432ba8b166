//! Domain primitives, ports and services.
//!
//! Purpose: Define the user account entity, the validation rules for the
//! registration, login and profile forms, and the service implementing those
//! use-cases. Nothing here depends on HTTP or a particular database.
//!
//! Public surface:
//! - User (alias to `user::User`): account record with a profile picture.
//! - PasswordHash (alias to `password::PasswordHash`): salted credential hash.
//! - LoginCredentials (alias to `auth::LoginCredentials`): validated login input.
//! - AccountService (alias to `accounts::AccountService`): driving port implementation.
//! - Error / ErrorCode: transport-agnostic failure payload.

pub mod accounts;
pub mod auth;
pub mod error;
pub mod forms;
pub mod password;
pub mod ports;
pub mod trace_id;
pub mod user;

pub use self::accounts::AccountService;
pub use self::auth::{LoginCredentials, SessionUser};
pub use self::error::{Error, ErrorCode};
pub use self::forms::{AccountForm, FormErrors, SubmissionError};
pub use self::password::{PasswordError, PasswordHash};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    AccountDetails, DEFAULT_PROFILE_PICTURE, EmailAddress, ProfilePicture, User, UserId,
    UserParts, UserValidationError, Username,
};
