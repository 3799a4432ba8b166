//! Tests for account page handlers.

use super::*;
use crate::domain::forms::field;
use crate::domain::ports::{
    MockLoginService, MockRegistrationCommand, MockUserProfileCommand, MockUserProfileQuery,
};
use crate::domain::{
    AccountDetails, EmailAddress, Error, PasswordHash, SessionUser, UserId, Username,
};
use crate::inbound::http::routes::{LOGOUT_PATH, PROFILE_EDIT_PATH, REGISTER_PATH};
use crate::inbound::http::state::HttpStatePorts;
use crate::inbound::http::test_utils::{TEST_SESSION_COOKIE, test_session_middleware};
use actix_http::Request;
use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::header;
use actix_web::{App, test as actix_test};
use chrono::Utc;
use rstest::{fixture, rstest};
use std::sync::Arc;

struct Mocks {
    login: MockLoginService,
    registration: MockRegistrationCommand,
    profile: MockUserProfileQuery,
    profile_edit: MockUserProfileCommand,
}

impl Mocks {
    fn into_state(self) -> HttpState {
        HttpState::new(HttpStatePorts {
            login: Arc::new(self.login),
            registration: Arc::new(self.registration),
            profile: Arc::new(self.profile),
            profile_edit: Arc::new(self.profile_edit),
        })
    }
}

#[fixture]
fn mocks() -> Mocks {
    Mocks {
        login: MockLoginService::new(),
        registration: MockRegistrationCommand::new(),
        profile: MockUserProfileQuery::new(),
        profile_edit: MockUserProfileCommand::new(),
    }
}

#[fixture]
fn user() -> User {
    User::register(
        AccountDetails {
            username: Username::new("boburjon").expect("valid username"),
            first_name: "Boburjon".to_owned(),
            last_name: "Nurmatov".to_owned(),
            email: Some(EmailAddress::new("test@test.com").expect("valid email")),
        },
        PasswordHash::unusable(),
        Utc::now(),
    )
}

fn fresh_session() -> SessionUser {
    SessionUser {
        user_id: UserId::random(),
        session_version: 0,
    }
}

fn test_app(
    state: HttpState,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .wrap(test_session_middleware())
        .app_data(web::Data::new(state))
        .configure(configure)
}

fn location(res: &ServiceResponse) -> String {
    res.headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_owned()
}

fn session_cookie(res: &ServiceResponse) -> Option<Cookie<'static>> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == TEST_SESSION_COOKIE)
        .map(Cookie::into_owned)
}

async fn body_text(res: ServiceResponse) -> String {
    let bytes = actix_test::read_body(res).await;
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

async fn post_form<S>(
    app: &S,
    uri: &str,
    form: &[(&str, &str)],
    cookie: Option<Cookie<'static>>,
) -> ServiceResponse
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let mut request = actix_test::TestRequest::post().uri(uri).set_form(form);
    if let Some(cookie) = cookie {
        request = request.cookie(cookie);
    }
    actix_test::call_service(app, request.to_request()).await
}

async fn get<S>(app: &S, uri: &str, cookie: Option<Cookie<'static>>) -> ServiceResponse
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let mut request = actix_test::TestRequest::get().uri(uri);
    if let Some(cookie) = cookie {
        request = request.cookie(cookie);
    }
    actix_test::call_service(app, request.to_request()).await
}

async fn log_in<S>(app: &S) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let res = post_form(
        app,
        LOGIN_PATH,
        &[("username", "boburjon"), ("password", "somepassword")],
        None,
    )
    .await;
    assert_eq!(res.status(), StatusCode::FOUND);
    session_cookie(&res).expect("session cookie issued on login")
}

#[rstest]
#[actix_web::test]
async fn register_success_redirects_to_login(mut mocks: Mocks) {
    mocks
        .registration
        .expect_register()
        .withf(|request| {
            request.account.username == "boburjon"
                && request.account.email == "test@test.com"
                && request.password() == "somepassword"
        })
        .times(1)
        .returning(|_| Ok(fresh_session().user_id));
    let app = actix_test::init_service(test_app(mocks.into_state())).await;

    let res = post_form(
        &app,
        REGISTER_PATH,
        &[
            ("username", "boburjon"),
            ("first_name", "Boburjon"),
            ("last_name", "Nurmatov"),
            ("email", "test@test.com"),
            ("password", "somepassword"),
        ],
        None,
    )
    .await;

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), LOGIN_PATH);
    assert!(session_cookie(&res).is_none(), "registration must not log in");
}

#[rstest]
#[actix_web::test]
async fn register_invalid_rerenders_form_without_password(mut mocks: Mocks) {
    mocks.registration.expect_register().returning(|_| {
        let mut errors = FormErrors::default();
        errors.add(field::USERNAME, messages::DUPLICATE_USERNAME);
        errors.add(field::EMAIL, messages::INVALID_EMAIL);
        Err(SubmissionError::Invalid(errors))
    });
    let app = actix_test::init_service(test_app(mocks.into_state())).await;

    let res = post_form(
        &app,
        REGISTER_PATH,
        &[
            ("username", "boburjon"),
            ("first_name", "Boburjon"),
            ("email", "invalid-email"),
            ("password", "s3cret-pw"),
        ],
        None,
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
    let body = body_text(res).await;
    assert!(body.contains(messages::DUPLICATE_USERNAME));
    assert!(body.contains(messages::INVALID_EMAIL));
    assert!(body.contains("value=\"invalid-email\""));
    assert!(!body.contains("s3cret-pw"));
}

#[rstest]
#[actix_web::test]
async fn register_infrastructure_failure_renders_error_page(mut mocks: Mocks) {
    mocks.registration.expect_register().returning(|_| {
        Err(SubmissionError::Failed(Error::service_unavailable(
            "user store unavailable",
        )))
    });
    let app = actix_test::init_service(test_app(mocks.into_state())).await;

    let res = post_form(
        &app,
        REGISTER_PATH,
        &[("username", "boburjon"), ("password", "pw")],
        None,
    )
    .await;

    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[rstest]
#[actix_web::test]
async fn register_form_renders_empty_fields(mocks: Mocks) {
    let app = actix_test::init_service(test_app(mocks.into_state())).await;

    let res = get(&app, REGISTER_PATH, None).await;

    assert_eq!(res.status(), StatusCode::OK);
    let body = body_text(res).await;
    for name in ["username", "first_name", "last_name", "email", "password"] {
        assert!(body.contains(&format!("name=\"{name}\"")), "missing {name}");
    }
}

#[rstest]
#[actix_web::test]
async fn login_success_sets_session_and_redirects_to_profile(mut mocks: Mocks, user: User) {
    let id = *user.id();
    let signed_in = user.clone();
    mocks
        .login
        .expect_authenticate()
        .withf(|credentials| {
            credentials.username() == "boburjon" && credentials.password() == "somepassword"
        })
        .returning(move |_| Ok(SessionUser::for_user(&signed_in)));
    mocks
        .profile
        .expect_fetch_profile()
        .withf(move |requested| *requested == id)
        .returning(move |_| Ok(user.clone()));
    let app = actix_test::init_service(test_app(mocks.into_state())).await;

    let res = post_form(
        &app,
        LOGIN_PATH,
        &[("username", "boburjon"), ("password", "somepassword")],
        None,
    )
    .await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), PROFILE_PATH);
    let cookie = session_cookie(&res).expect("session cookie");

    let profile_res = get(&app, PROFILE_PATH, Some(cookie)).await;
    assert_eq!(profile_res.status(), StatusCode::OK);
    let body = body_text(profile_res).await;
    for expected in ["boburjon", "Boburjon", "Nurmatov", "test@test.com", "defpic.jpg"] {
        assert!(body.contains(expected), "profile missing {expected}");
    }
}

#[rstest]
#[case("/users/profile/edit/", "/users/profile/edit/")]
#[case("//evil.example/", PROFILE_PATH)]
#[case("https://evil.example/", PROFILE_PATH)]
#[actix_web::test]
async fn login_honours_only_local_next(
    mut mocks: Mocks,
    #[case] next: &str,
    #[case] expected: &str,
) {
    mocks
        .login
        .expect_authenticate()
        .returning(|_| Ok(fresh_session()));
    let app = actix_test::init_service(test_app(mocks.into_state())).await;

    let res = post_form(
        &app,
        LOGIN_PATH,
        &[
            ("username", "boburjon"),
            ("password", "somepassword"),
            ("next", next),
        ],
        None,
    )
    .await;

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), expected);
}

#[rstest]
#[actix_web::test]
async fn login_with_bad_credentials_stays_anonymous(mut mocks: Mocks) {
    mocks
        .login
        .expect_authenticate()
        .returning(|_| Err(Error::unauthorized("invalid credentials")));
    let app = actix_test::init_service(test_app(mocks.into_state())).await;

    let res = post_form(
        &app,
        LOGIN_PATH,
        &[("username", "boburjon"), ("password", "wrongpassword")],
        None,
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
    assert!(session_cookie(&res).is_none());
    let body = body_text(res).await;
    assert!(body.contains(messages::INVALID_LOGIN));
    assert!(!body.contains("wrongpassword"));
}

#[rstest]
#[actix_web::test]
async fn login_with_missing_fields_skips_authentication(mut mocks: Mocks) {
    mocks.login.expect_authenticate().never();
    let app = actix_test::init_service(test_app(mocks.into_state())).await;

    let res = post_form(&app, LOGIN_PATH, &[], None).await;

    assert_eq!(res.status(), StatusCode::OK);
    let body = body_text(res).await;
    assert_eq!(body.matches(messages::REQUIRED).count(), 2);
}

#[rstest]
#[actix_web::test]
async fn login_form_keeps_next(mocks: Mocks) {
    let app = actix_test::init_service(test_app(mocks.into_state())).await;

    let res = get(&app, "/users/login/?next=/users/profile/", None).await;

    assert_eq!(res.status(), StatusCode::OK);
    let body = body_text(res).await;
    assert!(body.contains("name=\"next\""));
}

#[rstest]
#[actix_web::test]
async fn logout_ends_sessions_and_purges_cookie(mut mocks: Mocks, user: User) {
    let id = *user.id();
    let session = SessionUser::for_user(&user);
    mocks
        .login
        .expect_authenticate()
        .returning(move |_| Ok(session));
    mocks
        .profile
        .expect_fetch_profile()
        .times(1)
        .returning(move |_| Ok(user.clone()));
    mocks
        .login
        .expect_end_sessions()
        .withf(move |requested| *requested == id)
        .times(1)
        .returning(|_| Ok(()));
    let app = actix_test::init_service(test_app(mocks.into_state())).await;
    let cookie = log_in(&app).await;

    let res = post_form(&app, LOGOUT_PATH, &[], Some(cookie)).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), LOGIN_PATH);
    let removal = session_cookie(&res).expect("removal cookie");
    assert_eq!(removal.value(), "");

    let profile_res = get(&app, PROFILE_PATH, Some(removal)).await;
    assert_eq!(profile_res.status(), StatusCode::FOUND);
}

#[rstest]
#[actix_web::test]
async fn logout_failure_to_end_sessions_renders_error_page(mut mocks: Mocks, user: User) {
    let session = SessionUser::for_user(&user);
    mocks
        .login
        .expect_authenticate()
        .returning(move |_| Ok(session));
    mocks
        .profile
        .expect_fetch_profile()
        .returning(move |_| Ok(user.clone()));
    mocks
        .login
        .expect_end_sessions()
        .returning(|_| Err(Error::service_unavailable("user store unavailable")));
    let app = actix_test::init_service(test_app(mocks.into_state())).await;
    let cookie = log_in(&app).await;

    let res = get(&app, LOGOUT_PATH, Some(cookie)).await;

    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[rstest]
#[actix_web::test]
async fn session_from_before_a_logout_is_rejected(mut mocks: Mocks, user: User) {
    let session = SessionUser::for_user(&user);
    let mut logged_out = user.clone();
    logged_out.end_sessions();
    mocks
        .login
        .expect_authenticate()
        .returning(move |_| Ok(session));
    mocks
        .profile
        .expect_fetch_profile()
        .returning(move |_| Ok(logged_out.clone()));
    mocks.login.expect_end_sessions().never();
    let app = actix_test::init_service(test_app(mocks.into_state())).await;
    let cookie = log_in(&app).await;

    let res = get(&app, PROFILE_PATH, Some(cookie.clone())).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/users/login/?next=/users/profile/");
    let removal = session_cookie(&res).expect("removal cookie");
    assert_eq!(removal.value(), "");

    let logout_res = get(&app, LOGOUT_PATH, Some(cookie)).await;
    assert_eq!(logout_res.status(), StatusCode::FOUND);
}

#[rstest]
#[actix_web::test]
async fn logout_accepts_get_for_anonymous_visitors(mocks: Mocks) {
    let app = actix_test::init_service(test_app(mocks.into_state())).await;

    let res = get(&app, LOGOUT_PATH, None).await;

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), LOGIN_PATH);
}

#[rstest]
#[case(PROFILE_PATH, "/users/login/?next=/users/profile/")]
#[case(PROFILE_EDIT_PATH, "/users/login/?next=/users/profile/edit/")]
#[case("/users/profile/?tab=1", "/users/login/?next=/users/profile/%3Ftab%3D1")]
#[case(
    "/users/profile/edit/?a=1&b=2",
    "/users/login/?next=/users/profile/edit/%3Fa%3D1%26b%3D2"
)]
#[actix_web::test]
async fn anonymous_profile_access_redirects_to_login(
    mocks: Mocks,
    #[case] path: &str,
    #[case] expected: &str,
) {
    let app = actix_test::init_service(test_app(mocks.into_state())).await;

    let res = get(&app, path, None).await;

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), expected);
}

#[rstest]
#[actix_web::test]
async fn vanished_session_user_is_logged_out(mut mocks: Mocks) {
    mocks
        .login
        .expect_authenticate()
        .returning(|_| Ok(fresh_session()));
    mocks
        .profile
        .expect_fetch_profile()
        .returning(|_| Err(Error::not_found("user not found")));
    let app = actix_test::init_service(test_app(mocks.into_state())).await;
    let cookie = log_in(&app).await;

    let res = get(&app, PROFILE_PATH, Some(cookie)).await;

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/users/login/?next=/users/profile/");
    let removal = session_cookie(&res).expect("removal cookie");
    assert_eq!(removal.value(), "");
}

#[rstest]
#[actix_web::test]
async fn profile_edit_form_is_prefilled(mut mocks: Mocks, user: User) {
    let session = SessionUser::for_user(&user);
    mocks
        .login
        .expect_authenticate()
        .returning(move |_| Ok(session));
    mocks
        .profile
        .expect_fetch_profile()
        .returning(move |_| Ok(user.clone()));
    let app = actix_test::init_service(test_app(mocks.into_state())).await;
    let cookie = log_in(&app).await;

    let res = get(&app, PROFILE_EDIT_PATH, Some(cookie)).await;

    assert_eq!(res.status(), StatusCode::OK);
    let body = body_text(res).await;
    assert!(body.contains("value=\"Nurmatov\""));
    assert!(body.contains("value=\"test@test.com\""));
}

#[rstest]
#[actix_web::test]
async fn profile_edit_saves_and_redirects(mut mocks: Mocks, user: User) {
    let id = *user.id();
    let saved = user.clone();
    let session = SessionUser::for_user(&user);
    mocks
        .login
        .expect_authenticate()
        .returning(move |_| Ok(session));
    mocks
        .profile
        .expect_fetch_profile()
        .returning(move |_| Ok(user.clone()));
    mocks
        .profile_edit
        .expect_update_profile()
        .withf(move |request| {
            request.user_id == id
                && request.account.last_name == "Updated"
                && request.account.email == "updated@test.com"
        })
        .times(1)
        .returning(move |_| Ok(saved.clone()));
    let app = actix_test::init_service(test_app(mocks.into_state())).await;
    let cookie = log_in(&app).await;

    let res = post_form(
        &app,
        PROFILE_EDIT_PATH,
        &[
            ("username", "boburjon"),
            ("first_name", "Boburjon"),
            ("last_name", "Updated"),
            ("email", "updated@test.com"),
        ],
        Some(cookie),
    )
    .await;

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), PROFILE_PATH);
}

#[rstest]
#[actix_web::test]
async fn profile_edit_invalid_rerenders_form(mut mocks: Mocks, user: User) {
    let session = SessionUser::for_user(&user);
    mocks
        .login
        .expect_authenticate()
        .returning(move |_| Ok(session));
    mocks
        .profile
        .expect_fetch_profile()
        .returning(move |_| Ok(user.clone()));
    mocks.profile_edit.expect_update_profile().returning(|_| {
        let mut errors = FormErrors::default();
        errors.add(field::FIRST_NAME, messages::REQUIRED);
        Err(SubmissionError::Invalid(errors))
    });
    let app = actix_test::init_service(test_app(mocks.into_state())).await;
    let cookie = log_in(&app).await;

    let res = post_form(
        &app,
        PROFILE_EDIT_PATH,
        &[("username", "boburjon"), ("last_name", "Kept")],
        Some(cookie),
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
    let body = body_text(res).await;
    assert!(body.contains(messages::REQUIRED));
    assert!(body.contains("value=\"Kept\""));
}
