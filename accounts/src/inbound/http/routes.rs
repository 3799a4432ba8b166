//! Route table for the account pages and the redirect helpers built on it.
//!
//! ```text
//! GET|POST /users/register/
//! GET|POST /users/login/?next=<path>
//! GET|POST /users/logout/
//! GET      /users/profile/
//! GET|POST /users/profile/edit/
//! ```

use actix_web::HttpResponse;
use actix_web::http::header;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Scope under which every account page is mounted.
pub const USERS_SCOPE: &str = "/users";
/// `users:register`.
pub const REGISTER_PATH: &str = "/users/register/";
/// `users:login`.
pub const LOGIN_PATH: &str = "/users/login/";
/// `users:logout`.
pub const LOGOUT_PATH: &str = "/users/logout/";
/// `users:profile`.
pub const PROFILE_PATH: &str = "/users/profile/";
/// `users:profile-edit`.
pub const PROFILE_EDIT_PATH: &str = "/users/profile/edit/";

/// Query parameter carrying the page to return to after login.
pub const NEXT_PARAM: &str = "next";

/// Unreserved characters and `/` stay literal in the `next` value.
const NEXT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// `302 Found` pointing at `location`.
pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location.to_owned()))
        .finish()
}

/// Login page URL that returns to `next` once the user signs in.
///
/// # Examples
/// ```
/// use accounts::inbound::http::routes::{PROFILE_PATH, login_url_with_next};
///
/// assert_eq!(
///     login_url_with_next(PROFILE_PATH),
///     "/users/login/?next=/users/profile/"
/// );
/// ```
pub fn login_url_with_next(next: &str) -> String {
    format!(
        "{LOGIN_PATH}?{NEXT_PARAM}={}",
        utf8_percent_encode(next, NEXT_ENCODE_SET)
    )
}

/// Return `next` when it names a page on this site.
///
/// Accepts absolute paths only: protocol-relative (`//host`), backslash and
/// scheme-qualified targets are rejected so the login redirect cannot leave
/// the site.
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    let next = next?.trim();
    let local = next.starts_with('/')
        && !next.starts_with("//")
        && !next.contains('\\')
        && !next.chars().any(char::is_control);
    local.then_some(next)
}
