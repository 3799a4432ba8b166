//! Account domain service.
//!
//! [`AccountService`] implements the registration, login and profile driving
//! ports on top of a [`UserRepository`]. Credential hashing is CPU-bound and
//! runs on the blocking thread pool with the caller's trace id in scope.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::domain::forms::{FormErrors, SubmissionError, field, messages};
use crate::domain::ports::{
    LoginService, ProfileUpdateRequest, RegistrationCommand, RegistrationRequest,
    UserPersistenceError, UserProfileCommand, UserProfileQuery, UserRepository,
};
use crate::domain::{
    Error, LoginCredentials, PasswordHash, SessionUser, TraceId, User, UserId,
};

/// Account service implementing the user-facing driving ports.
#[derive(Clone)]
pub struct AccountService<R> {
    users: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> AccountService<R> {
    /// Create a new service over the given repository.
    ///
    /// # Examples
    /// ```
    /// # use std::sync::Arc;
    /// # use mockable::DefaultClock;
    /// use accounts::domain::AccountService;
    /// use accounts::outbound::memory::InMemoryUserRepository;
    ///
    /// let service = AccountService::new(
    ///     Arc::new(InMemoryUserRepository::default()),
    ///     Arc::new(DefaultClock),
    /// );
    /// # let _ = service;
    /// ```
    pub fn new(users: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { users, clock }
    }
}

impl<R> AccountService<R>
where
    R: UserRepository,
{
    fn map_persistence_error(error: UserPersistenceError) -> Error {
        match error {
            UserPersistenceError::Connection { message } => {
                Error::service_unavailable(format!("user repository unavailable: {message}"))
            }
            UserPersistenceError::Query { message } => {
                Error::internal(format!("user repository error: {message}"))
            }
            UserPersistenceError::DuplicateUsername { username } => {
                Error::conflict(format!("username {username} is already taken"))
            }
            UserPersistenceError::Missing { id } => Error::not_found(format!("user {id} not found")),
        }
    }

    fn invalid_credentials() -> Error {
        Error::unauthorized("invalid credentials")
    }

    fn duplicate_username(mut errors: FormErrors) -> SubmissionError {
        errors.add(field::USERNAME, messages::DUPLICATE_USERNAME);
        SubmissionError::Invalid(errors)
    }

    async fn check_username_available(
        &self,
        username: &str,
        owner: Option<&UserId>,
        errors: &mut FormErrors,
    ) -> Result<(), Error> {
        let existing = self
            .users
            .find_by_username(username)
            .await
            .map_err(Self::map_persistence_error)?;
        if existing.is_some_and(|user| Some(user.id()) != owner) {
            errors.add(field::USERNAME, messages::DUPLICATE_USERNAME);
        }
        Ok(())
    }
}

/// Run CPU-bound credential work on the blocking pool.
async fn run_blocking<F, T>(work: F) -> Result<T, Error>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let trace_id = TraceId::current();
    tokio::task::spawn_blocking(move || TraceId::sync_scope(trace_id, work))
        .await
        .map_err(|err| Error::internal(format!("credential worker failed: {err}")))
}

#[async_trait]
impl<R> RegistrationCommand for AccountService<R>
where
    R: UserRepository,
{
    async fn register(&self, request: &RegistrationRequest) -> Result<UserId, SubmissionError> {
        let mut errors = FormErrors::default();
        let details = request.account.validate(&mut errors);
        if request.password().is_empty() {
            errors.add(field::PASSWORD, messages::REQUIRED);
        }
        if !errors.contains(field::USERNAME) {
            self.check_username_available(request.account.username.trim(), None, &mut errors)
                .await?;
        }
        let Some(details) = details.filter(|_| errors.is_empty()) else {
            debug!("registration rejected by validation");
            return Err(SubmissionError::Invalid(errors));
        };

        let password = Zeroizing::new(request.password().to_owned());
        let hash = run_blocking(move || PasswordHash::from_plaintext(&password))
            .await?
            .map_err(|err| Error::internal(err.to_string()))?;
        let user = User::register(details, hash, self.clock.utc());

        match self.users.insert(&user).await {
            Ok(()) => {
                info!(user_id = %user.id(), username = %user.username(), "registered user");
                Ok(*user.id())
            }
            Err(UserPersistenceError::DuplicateUsername { username }) => {
                warn!(%username, "username claimed concurrently during registration");
                Err(Self::duplicate_username(errors))
            }
            Err(err) => Err(Self::map_persistence_error(err).into()),
        }
    }
}

#[async_trait]
impl<R> LoginService for AccountService<R>
where
    R: UserRepository,
{
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<SessionUser, Error> {
        let found = self
            .users
            .find_by_username(credentials.username())
            .await
            .map_err(Self::map_persistence_error)?;
        let password = Zeroizing::new(credentials.password().to_owned());

        let Some(user) = found else {
            run_blocking(move || PasswordHash::verify_dummy(&password)).await?;
            debug!("login rejected: unknown username");
            return Err(Self::invalid_credentials());
        };

        let hash = user.password_hash().clone();
        let verified = run_blocking(move || hash.verify(&password)).await?;
        if !verified {
            debug!(user_id = %user.id(), "login rejected: password mismatch");
            return Err(Self::invalid_credentials());
        }
        if !user.is_active() {
            debug!(user_id = %user.id(), "login rejected: account inactive");
            return Err(Self::invalid_credentials());
        }

        self.users
            .record_login(user.id(), self.clock.utc())
            .await
            .map_err(Self::map_persistence_error)?;
        info!(user_id = %user.id(), "user logged in");
        Ok(SessionUser::for_user(&user))
    }

    async fn end_sessions(&self, user_id: &UserId) -> Result<(), Error> {
        match self.users.bump_session_version(user_id).await {
            Ok(()) => {
                info!(%user_id, "sessions ended");
                Ok(())
            }
            Err(UserPersistenceError::Missing { .. }) => {
                debug!(%user_id, "no sessions to end for missing user");
                Ok(())
            }
            Err(err) => Err(Self::map_persistence_error(err)),
        }
    }
}

#[async_trait]
impl<R> UserProfileQuery for AccountService<R>
where
    R: UserRepository,
{
    async fn fetch_profile(&self, user_id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(Self::map_persistence_error)?
            .filter(User::is_active)
            .ok_or_else(|| Error::not_found(format!("user {user_id} not found")))
    }
}

#[async_trait]
impl<R> UserProfileCommand for AccountService<R>
where
    R: UserRepository,
{
    async fn update_profile(
        &self,
        request: &ProfileUpdateRequest,
    ) -> Result<User, SubmissionError> {
        let mut user = self.fetch_profile(&request.user_id).await?;

        let mut errors = FormErrors::default();
        let details = request.account.validate(&mut errors);
        if !errors.contains(field::USERNAME) {
            self.check_username_available(
                request.account.username.trim(),
                Some(&request.user_id),
                &mut errors,
            )
            .await?;
        }
        let Some(details) = details.filter(|_| errors.is_empty()) else {
            return Err(SubmissionError::Invalid(errors));
        };

        match self.users.update_details(&request.user_id, &details).await {
            Ok(()) => {
                user.apply_details(details);
                info!(user_id = %user.id(), "updated profile");
                Ok(user)
            }
            Err(UserPersistenceError::DuplicateUsername { username }) => {
                warn!(%username, "username claimed concurrently during profile edit");
                Err(Self::duplicate_username(errors))
            }
            Err(err) => Err(Self::map_persistence_error(err).into()),
        }
    }
}

#[cfg(test)]
#[path = "accounts_tests.rs"]
mod tests;
