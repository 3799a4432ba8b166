//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! Provides a thin wrapper around Actix sessions so handlers only deal with
//! domain-friendly operations such as persisting or retrieving the signed-in
//! [`SessionUser`].

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;

use crate::domain::{Error, SessionUser, UserId};

pub(crate) const USER_ID_KEY: &str = "user_id";
pub(crate) const SESSION_VERSION_KEY: &str = "session_version";

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Persist the authenticated user's id and session version in the
    /// session cookie.
    pub fn persist_user(&self, user: &SessionUser) -> Result<(), Error> {
        let persist_error =
            |error| Error::internal(format!("failed to persist session: {error}"));
        self.0
            .insert(USER_ID_KEY, user.user_id.to_string())
            .map_err(persist_error)?;
        self.0
            .insert(SESSION_VERSION_KEY, user.session_version)
            .map_err(persist_error)
    }

    fn read<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>, Error> {
        self.0
            .get::<T>(key)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))
    }

    /// Fetch the signed-in identity from the session, if present.
    ///
    /// An invalid id or a missing version is logged and treated as anonymous.
    pub fn user(&self) -> Result<Option<SessionUser>, Error> {
        let Some(raw) = self.read::<String>(USER_ID_KEY)? else {
            return Ok(None);
        };
        let user_id = match UserId::new(raw) {
            Ok(id) => id,
            Err(error) => {
                tracing::warn!("invalid user id in session cookie: {error}");
                return Ok(None);
            }
        };
        let Some(session_version) = self.read::<i32>(SESSION_VERSION_KEY)? else {
            tracing::warn!(%user_id, "session cookie carries no session version");
            return Ok(None);
        };
        Ok(Some(SessionUser {
            user_id,
            session_version,
        }))
    }

    /// Issue a fresh session identifier while keeping the stored state.
    ///
    /// Called before binding a user to the session on login.
    pub fn renew(&self) {
        self.0.renew();
    }

    /// Drop every entry and expire the session cookie.
    pub fn purge(&self) {
        self.0.purge();
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
