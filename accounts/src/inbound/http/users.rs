//! Account page handlers.
//!
//! ```text
//! GET  /users/register/       empty registration form
//! POST /users/register/       username, first_name, last_name, email, password
//! GET  /users/login/?next=    empty login form
//! POST /users/login/?next=    username, password
//! GET|POST /users/logout/
//! GET  /users/profile/
//! GET  /users/profile/edit/   pre-filled profile form
//! POST /users/profile/edit/   username, first_name, last_name, email
//! ```
//!
//! Validation failures re-render the form with `200 OK`; successful
//! submissions redirect with `302 Found`. Only infrastructure failures reach
//! the error page.

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, get, post, route, web};
use serde::Deserialize;
use tracing::{info, warn};

use crate::domain::forms::messages;
use crate::domain::ports::{ProfileUpdateRequest, RegistrationRequest};
use crate::domain::{
    AccountForm, ErrorCode, FormErrors, LoginCredentials, SubmissionError, User,
};
use crate::inbound::http::PageResult;
use crate::inbound::http::pages::{FormPage, ProfilePage, render};
use crate::inbound::http::routes::{
    LOGIN_PATH, PROFILE_PATH, USERS_SCOPE, login_url_with_next, redirect, safe_next,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Registration form body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegistrationFormData {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// Profile edit form body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProfileFormData {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl From<ProfileFormData> for AccountForm {
    fn from(value: ProfileFormData) -> Self {
        Self {
            username: value.username,
            first_name: value.first_name,
            last_name: value.last_name,
            email: value.email,
        }
    }
}

/// Login form body. `next` arrives here when the form re-posts it as a
/// hidden field.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginFormData {
    pub username: String,
    pub password: String,
    pub next: Option<String>,
}

/// `?next=` query accepted by the login page.
#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

fn form_for(user: &User) -> AccountForm {
    AccountForm {
        username: user.username().to_string(),
        first_name: user.first_name().to_owned(),
        last_name: user.last_name().to_owned(),
        email: user.email().map(ToString::to_string).unwrap_or_default(),
    }
}

/// Path and query of the request, used as the post-login destination.
fn full_path(req: &HttpRequest) -> &str {
    req.uri()
        .path_and_query()
        .map_or_else(|| req.path(), |path_and_query| path_and_query.as_str())
}

/// Resolve the signed-in user, purging sessions that were ended by a logout
/// or point at an account which no longer exists or was deactivated.
async fn current_user(state: &HttpState, session: &SessionContext) -> PageResult<Option<User>> {
    let Some(signed_in) = session.user()? else {
        return Ok(None);
    };
    let user_id = signed_in.user_id;
    match state.profile.fetch_profile(&user_id).await {
        Ok(user) if signed_in.is_current_for(&user) => Ok(Some(user)),
        Ok(_) => {
            warn!(%user_id, "session was ended by a logout; purging session");
            session.purge();
            Ok(None)
        }
        Err(error) if error.code() == ErrorCode::NotFound => {
            warn!(%user_id, "session user no longer available; purging session");
            session.purge();
            Ok(None)
        }
        Err(error) => Err(error),
    }
}

/// Render the empty registration form.
#[get("/register/")]
pub async fn register_form() -> PageResult<HttpResponse> {
    render(
        &FormPage::registration(&AccountForm::default(), &FormErrors::default()),
        StatusCode::OK,
    )
}

/// Create an account and send the visitor to the login page.
#[post("/register/")]
pub async fn register(
    state: web::Data<HttpState>,
    form: web::Form<RegistrationFormData>,
) -> PageResult<HttpResponse> {
    let RegistrationFormData {
        username,
        first_name,
        last_name,
        email,
        password,
    } = form.into_inner();
    let request = RegistrationRequest::new(
        AccountForm {
            username,
            first_name,
            last_name,
            email,
        },
        password,
    );

    match state.registration.register(&request).await {
        Ok(user_id) => {
            info!(%user_id, "account registered");
            Ok(redirect(LOGIN_PATH))
        }
        Err(SubmissionError::Invalid(errors)) => render(
            &FormPage::registration(&request.account, &errors),
            StatusCode::OK,
        ),
        Err(SubmissionError::Failed(error)) => Err(error),
    }
}

/// Render the empty login form, keeping `next` for the submission.
#[get("/login/")]
pub async fn login_form(query: web::Query<NextQuery>) -> PageResult<HttpResponse> {
    let next = query.into_inner().next;
    render(
        &FormPage::login("", next.as_deref(), &FormErrors::default()),
        StatusCode::OK,
    )
}

/// Authenticate and bind the user to a fresh session.
#[post("/login/")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<NextQuery>,
    form: web::Form<LoginFormData>,
) -> PageResult<HttpResponse> {
    let LoginFormData {
        username,
        password,
        next: posted_next,
    } = form.into_inner();
    let next = query.into_inner().next.or(posted_next);

    let credentials = match LoginCredentials::try_from_parts(&username, &password) {
        Ok(credentials) => credentials,
        Err(errors) => {
            return render(
                &FormPage::login(&username, next.as_deref(), &errors),
                StatusCode::OK,
            );
        }
    };

    match state.login.authenticate(&credentials).await {
        Ok(signed_in) => {
            session.renew();
            session.persist_user(&signed_in)?;
            info!(user_id = %signed_in.user_id, "user logged in");
            Ok(redirect(safe_next(next.as_deref()).unwrap_or(PROFILE_PATH)))
        }
        Err(error) if error.code() == ErrorCode::Unauthorized => {
            let errors = FormErrors::non_field_only(messages::INVALID_LOGIN);
            render(
                &FormPage::login(&username, next.as_deref(), &errors),
                StatusCode::OK,
            )
        }
        Err(error) => Err(error),
    }
}

/// End the session, authenticated or not, and return to the login page.
///
/// Ending a live session advances the user's session version, so copies of
/// the cookie stop authenticating too. Stale sessions are only cleared.
#[route("/logout/", method = "GET", method = "POST")]
pub async fn logout(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> PageResult<HttpResponse> {
    if let Some(user) = current_user(&state, &session).await? {
        state.login.end_sessions(user.id()).await?;
        info!(user_id = %user.id(), "user logged out");
    }
    session.purge();
    Ok(redirect(LOGIN_PATH))
}

/// Show the signed-in user's profile.
#[get("/profile/")]
pub async fn profile(
    req: HttpRequest,
    state: web::Data<HttpState>,
    session: SessionContext,
) -> PageResult<HttpResponse> {
    let Some(user) = current_user(&state, &session).await? else {
        return Ok(redirect(&login_url_with_next(full_path(&req))));
    };
    render(
        &ProfilePage::for_user(&user, &state.media_url),
        StatusCode::OK,
    )
}

/// Render the profile form pre-filled with the stored values.
#[get("/profile/edit/")]
pub async fn profile_edit_form(
    req: HttpRequest,
    state: web::Data<HttpState>,
    session: SessionContext,
) -> PageResult<HttpResponse> {
    let Some(user) = current_user(&state, &session).await? else {
        return Ok(redirect(&login_url_with_next(full_path(&req))));
    };
    render(
        &FormPage::profile_edit(&form_for(&user), &FormErrors::default()),
        StatusCode::OK,
    )
}

/// Save profile changes and return to the profile page.
#[post("/profile/edit/")]
pub async fn profile_edit(
    req: HttpRequest,
    state: web::Data<HttpState>,
    session: SessionContext,
    form: web::Form<ProfileFormData>,
) -> PageResult<HttpResponse> {
    let Some(user) = current_user(&state, &session).await? else {
        return Ok(redirect(&login_url_with_next(full_path(&req))));
    };
    let request = ProfileUpdateRequest {
        user_id: *user.id(),
        account: form.into_inner().into(),
    };

    match state.profile_edit.update_profile(&request).await {
        Ok(updated) => {
            info!(user_id = %updated.id(), "profile updated");
            Ok(redirect(PROFILE_PATH))
        }
        Err(SubmissionError::Invalid(errors)) => render(
            &FormPage::profile_edit(&request.account, &errors),
            StatusCode::OK,
        ),
        Err(SubmissionError::Failed(error)) => Err(error),
    }
}

/// Mount every account page under `/users`.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use accounts::inbound::http::users;
///
/// let _app = App::new().configure(users::configure);
/// ```
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope(USERS_SCOPE)
            .service(register_form)
            .service(register)
            .service(login_form)
            .service(login)
            .service(logout)
            .service(profile)
            .service(profile_edit_form)
            .service(profile_edit),
    );
}

#[cfg(test)]
mod tests;
