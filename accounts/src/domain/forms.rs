//! Form-level validation shared by the registration and profile flows.
//!
//! Field problems are collected into [`FormErrors`] rather than failing fast,
//! so a re-rendered form can show every message at once.

use std::collections::BTreeMap;
use std::fmt;

use super::Error;
use super::user::{AccountDetails, EmailAddress, NAME_MAX, UserValidationError, Username};

/// Names of the submitted form fields.
pub mod field {
    pub const USERNAME: &str = "username";
    pub const FIRST_NAME: &str = "first_name";
    pub const LAST_NAME: &str = "last_name";
    pub const EMAIL: &str = "email";
    pub const PASSWORD: &str = "password";
}

/// User-facing validation messages.
pub mod messages {
    pub const REQUIRED: &str = "This field is required.";
    pub const INVALID_EMAIL: &str = "Enter a valid email address.";
    pub const INVALID_USERNAME: &str = "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";
    pub const DUPLICATE_USERNAME: &str = "A user with that username already exists.";
    pub const INVALID_LOGIN: &str = "Please enter a correct username and password. Note that both fields may be case-sensitive.";

    /// Message for a value longer than `max` characters.
    ///
    /// # Examples
    /// ```
    /// use accounts::domain::forms::messages::max_length;
    ///
    /// assert_eq!(
    ///     max_length(150, 151),
    ///     "Ensure this value has at most 150 characters (it has 151)."
    /// );
    /// ```
    pub fn max_length(max: usize, actual: usize) -> String {
        format!("Ensure this value has at most {max} characters (it has {actual}).")
    }
}

/// Validation messages keyed by field, plus messages for the form as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    fields: BTreeMap<&'static str, Vec<String>>,
    non_field: Vec<String>,
}

impl FormErrors {
    /// Record a message against `field`.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_default().push(message.into());
    }

    /// Record a message that belongs to no single field.
    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.non_field.push(message.into());
    }

    /// Build an error set holding one non-field message.
    pub fn non_field_only(message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add_non_field(message);
        errors
    }

    /// Messages recorded against `field`.
    pub fn field(&self, field: &str) -> &[String] {
        self.fields.get(field).map_or(&[], Vec::as_slice)
    }

    /// Whether `field` has any messages.
    pub fn contains(&self, field: &str) -> bool {
        !self.field(field).is_empty()
    }

    /// Messages that belong to the form as a whole.
    pub fn non_field(&self) -> &[String] {
        self.non_field.as_slice()
    }

    /// Whether no messages have been recorded.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }

    /// Iterate over fields with messages in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &[String])> {
        self.fields
            .iter()
            .map(|(field, messages)| (*field, messages.as_slice()))
    }
}

impl fmt::Display for FormErrors {
    /// Renders `field: message` pairs followed by non-field messages, joined
    /// with `; `.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        let fielded = self
            .iter()
            .flat_map(|(name, messages)| messages.iter().map(move |m| (Some(name), m)));
        let general = self.non_field.iter().map(|m| (None, m));
        for (name, message) in fielded.chain(general) {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            match name {
                Some(name) => write!(f, "{name}: {message}")?,
                None => f.write_str(message)?,
            }
        }
        Ok(())
    }
}

/// Failure of a form submission.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    /// The submitted values failed validation; nothing was stored.
    #[error("submitted form is invalid")]
    Invalid(FormErrors),
    /// An infrastructure failure prevented the submission from completing.
    #[error(transparent)]
    Failed(#[from] Error),
}

/// Raw account fields as submitted on the registration and profile forms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountForm {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl AccountForm {
    /// Validate every field, recording problems in `errors`.
    ///
    /// Returns the parsed details only when all fields are valid. Username
    /// uniqueness needs storage and is left to the caller.
    pub fn validate(&self, errors: &mut FormErrors) -> Option<AccountDetails> {
        let username = Username::new(&self.username)
            .map_err(|err| errors.add(field::USERNAME, user_error_message(&err)))
            .ok();
        let first_name = required_name(&self.first_name, field::FIRST_NAME, errors);
        let last_name = optional_name(&self.last_name, field::LAST_NAME, errors);
        let email = EmailAddress::parse_optional(&self.email)
            .map_err(|err| errors.add(field::EMAIL, user_error_message(&err)))
            .ok();

        Some(AccountDetails {
            username: username?,
            first_name: first_name?,
            last_name: last_name?,
            email: email?,
        })
    }
}

fn required_name(raw: &str, name: &'static str, errors: &mut FormErrors) -> Option<String> {
    if raw.trim().is_empty() {
        errors.add(name, messages::REQUIRED);
        return None;
    }
    optional_name(raw, name, errors)
}

fn optional_name(raw: &str, name: &'static str, errors: &mut FormErrors) -> Option<String> {
    let trimmed = raw.trim();
    let actual = trimmed.chars().count();
    if actual > NAME_MAX {
        errors.add(name, messages::max_length(NAME_MAX, actual));
        return None;
    }
    Some(trimmed.to_owned())
}

fn user_error_message(err: &UserValidationError) -> String {
    match err {
        UserValidationError::EmptyUsername => messages::REQUIRED.to_owned(),
        UserValidationError::UsernameTooLong { max, actual }
        | UserValidationError::EmailTooLong { max, actual } => messages::max_length(*max, *actual),
        UserValidationError::UsernameInvalidCharacters => messages::INVALID_USERNAME.to_owned(),
        UserValidationError::InvalidEmail => messages::INVALID_EMAIL.to_owned(),
        UserValidationError::InvalidId => err.to_string(),
    }
}
