//! Test utilities for the accounts crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`). Only
//! compiled for tests or with the `test-support` feature.

use std::sync::Arc;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};
use chrono::Utc;
use mockable::DefaultClock;

use crate::Trace;
use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{AccountDetails, AccountService, EmailAddress, PasswordHash, User, Username};
use crate::inbound::http::health::{HealthState, live, ready};
use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::inbound::http::test_utils::test_session_middleware;
use crate::inbound::http::users;
use crate::outbound::memory::InMemoryUserRepository;

/// Full page application over an in-memory store, with the test session
/// middleware and trace ids in place.
pub fn memory_app(
    repo: Arc<InMemoryUserRepository>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let service = Arc::new(AccountService::new(repo, Arc::new(DefaultClock)));
    let health = HealthState::new();
    health.mark_ready();

    App::new()
        .app_data(web::Data::new(HttpState::new(HttpStatePorts::from_service(
            service,
        ))))
        .app_data(web::Data::new(health))
        .wrap(test_session_middleware())
        .wrap(Trace)
        .configure(users::configure)
        .service(ready)
        .service(live)
}

/// Store an active user with a real credential hash.
///
/// # Errors
///
/// Returns the repository error when the insert fails.
pub async fn seed_user(
    repo: &InMemoryUserRepository,
    username: &str,
    password: &str,
) -> Result<User, UserPersistenceError> {
    let details = AccountDetails {
        username: Username::new(username)
            .map_err(|err| UserPersistenceError::query(err.to_string()))?,
        first_name: "Boburjon".to_owned(),
        last_name: "Nurmatov".to_owned(),
        email: Some(
            EmailAddress::new("test@test.com")
                .map_err(|err| UserPersistenceError::query(err.to_string()))?,
        ),
    };
    let hash = PasswordHash::from_plaintext(password)
        .map_err(|err| UserPersistenceError::query(err.to_string()))?;
    let user = User::register(details, hash, Utc::now());
    repo.insert(&user).await?;
    Ok(user)
}
