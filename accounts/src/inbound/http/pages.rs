//! HTML page models rendered through askama templates.
//!
//! Each page is a plain struct whose fields feed a template under
//! `accounts/templates`; values are auto-escaped on render.

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use actix_web::http::header::ContentType;
use askama::Template;

use crate::domain::forms::field;
use crate::domain::{AccountForm, Error, FormErrors, User};

use super::routes::{
    LOGIN_PATH, LOGOUT_PATH, NEXT_PARAM, PROFILE_EDIT_PATH, PROFILE_PATH, REGISTER_PATH,
};

/// One `<input>` with its label, current value and messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldView {
    pub name: &'static str,
    pub label: &'static str,
    pub input_type: &'static str,
    pub value: String,
    pub errors: Vec<String>,
}

impl FieldView {
    fn new(
        name: &'static str,
        label: &'static str,
        input_type: &'static str,
        value: &str,
        errors: &FormErrors,
    ) -> Self {
        Self {
            name,
            label,
            input_type,
            value: value.to_owned(),
            errors: errors.field(name).to_vec(),
        }
    }
}

/// Hidden input carried through a form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HiddenField {
    pub name: &'static str,
    pub value: String,
}

/// Link rendered below a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub href: &'static str,
    pub text: &'static str,
}

/// Generic form page used by registration, login and profile editing.
#[derive(Debug, Template)]
#[template(path = "form.html")]
pub struct FormPage {
    pub title: &'static str,
    pub action: &'static str,
    pub submit_label: &'static str,
    pub fields: Vec<FieldView>,
    pub hidden_fields: Vec<HiddenField>,
    pub non_field_errors: Vec<String>,
    pub links: Vec<Link>,
}

fn account_fields(form: &AccountForm, errors: &FormErrors) -> Vec<FieldView> {
    vec![
        FieldView::new(field::USERNAME, "Username", "text", &form.username, errors),
        FieldView::new(
            field::FIRST_NAME,
            "First name",
            "text",
            &form.first_name,
            errors,
        ),
        FieldView::new(field::LAST_NAME, "Last name", "text", &form.last_name, errors),
        FieldView::new(field::EMAIL, "Email address", "email", &form.email, errors),
    ]
}

impl FormPage {
    /// Registration form. The password input is always rendered empty.
    pub fn registration(form: &AccountForm, errors: &FormErrors) -> Self {
        let mut fields = account_fields(form, errors);
        fields.push(FieldView::new(
            field::PASSWORD,
            "Password",
            "password",
            "",
            errors,
        ));
        Self {
            title: "Register",
            action: REGISTER_PATH,
            submit_label: "Register",
            fields,
            hidden_fields: Vec::new(),
            non_field_errors: errors.non_field().to_vec(),
            links: vec![Link {
                href: LOGIN_PATH,
                text: "Already registered? Log in",
            }],
        }
    }

    /// Login form, echoing the username and carrying `next` when present.
    pub fn login(username: &str, next: Option<&str>, errors: &FormErrors) -> Self {
        let hidden_fields = next
            .map(|value| HiddenField {
                name: NEXT_PARAM,
                value: value.to_owned(),
            })
            .into_iter()
            .collect();
        Self {
            title: "Log in",
            action: LOGIN_PATH,
            submit_label: "Log in",
            fields: vec![
                FieldView::new(field::USERNAME, "Username", "text", username, errors),
                FieldView::new(field::PASSWORD, "Password", "password", "", errors),
            ],
            hidden_fields,
            non_field_errors: errors.non_field().to_vec(),
            links: vec![Link {
                href: REGISTER_PATH,
                text: "No account yet? Register",
            }],
        }
    }

    /// Profile edit form pre-filled from `form`.
    pub fn profile_edit(form: &AccountForm, errors: &FormErrors) -> Self {
        Self {
            title: "Edit profile",
            action: PROFILE_EDIT_PATH,
            submit_label: "Save",
            fields: account_fields(form, errors),
            hidden_fields: Vec::new(),
            non_field_errors: errors.non_field().to_vec(),
            links: vec![Link {
                href: PROFILE_PATH,
                text: "Back to profile",
            }],
        }
    }

    /// Look up a rendered field by name.
    pub fn field(&self, name: &str) -> Option<&FieldView> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// Read-only profile page.
#[derive(Debug, Template)]
#[template(path = "profile.html")]
pub struct ProfilePage {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub picture_url: String,
    pub edit_href: &'static str,
    pub logout_href: &'static str,
}

impl ProfilePage {
    /// Build the page for `user`, resolving the picture under `media_url`.
    pub fn for_user(user: &User, media_url: &str) -> Self {
        Self {
            username: user.username().to_string(),
            first_name: user.first_name().to_owned(),
            last_name: user.last_name().to_owned(),
            email: user.email().map(ToString::to_string).unwrap_or_default(),
            picture_url: user.profile_picture().url(media_url),
            edit_href: PROFILE_EDIT_PATH,
            logout_href: LOGOUT_PATH,
        }
    }
}

/// Error page shown for infrastructure failures.
#[derive(Debug, Template)]
#[template(path = "error.html")]
pub struct ErrorPage {
    pub status: u16,
    pub reason: &'static str,
    pub message: String,
    pub trace_id: Option<String>,
}

/// Render `page` as an HTML response with `status`.
///
/// # Errors
///
/// Returns an internal [`Error`] when the template fails to render.
pub fn render(page: &impl Template, status: StatusCode) -> Result<HttpResponse, Error> {
    let body = page
        .render()
        .map_err(|err| Error::internal(format!("template rendering failed: {err}")))?;
    Ok(HttpResponse::build(status)
        .content_type(ContentType::html())
        .body(body))
}
