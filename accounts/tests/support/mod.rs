//! Shared helpers for the account page integration tests.
//!
//! Each test file compiles as its own crate under `tests/`; this module keeps
//! the request plumbing in one place.

use actix_http::Request;
use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{StatusCode, header};
use actix_web::test;

use accounts::inbound::http::routes::LOGIN_PATH;
use accounts::inbound::http::test_utils::TEST_SESSION_COOKIE;

/// Submit an urlencoded form, optionally carrying a session cookie.
pub async fn post_form<S>(
    app: &S,
    uri: &str,
    form: &[(&str, &str)],
    cookie: Option<&Cookie<'static>>,
) -> ServiceResponse
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let mut request = test::TestRequest::post().uri(uri).set_form(form);
    if let Some(cookie) = cookie {
        request = request.cookie(cookie.clone());
    }
    test::call_service(app, request.to_request()).await
}

/// Issue a GET, optionally carrying a session cookie.
pub async fn get<S>(app: &S, uri: &str, cookie: Option<&Cookie<'static>>) -> ServiceResponse
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let mut request = test::TestRequest::get().uri(uri);
    if let Some(cookie) = cookie {
        request = request.cookie(cookie.clone());
    }
    test::call_service(app, request.to_request()).await
}

/// Log in through the form and return the issued session cookie.
pub async fn log_in<S>(app: &S, username: &str, password: &str) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let response = post_form(
        app,
        LOGIN_PATH,
        &[("username", username), ("password", password)],
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FOUND, "login should redirect");
    session_cookie(&response).expect("login should issue a session cookie")
}

/// The `Location` header, or an empty string.
pub fn location(response: &ServiceResponse) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_owned()
}

/// The session cookie set by `response`, if any.
pub fn session_cookie(response: &ServiceResponse) -> Option<Cookie<'static>> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == TEST_SESSION_COOKIE)
        .map(Cookie::into_owned)
}

/// Consume the response and return its body as text.
pub async fn body_text(response: ServiceResponse) -> String {
    let bytes = test::read_body(response).await;
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}
