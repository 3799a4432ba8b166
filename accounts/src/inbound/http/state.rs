//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    LoginService, RegistrationCommand, UserProfileCommand, UserProfileQuery,
};

/// Media root used when none is configured.
pub const DEFAULT_MEDIA_URL: &str = "/media/";

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub login: Arc<dyn LoginService>,
    pub registration: Arc<dyn RegistrationCommand>,
    pub profile: Arc<dyn UserProfileQuery>,
    pub profile_edit: Arc<dyn UserProfileCommand>,
}

impl HttpStatePorts {
    /// Bundle one service that implements every driving port.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use accounts::domain::AccountService;
    /// use accounts::inbound::http::state::{HttpState, HttpStatePorts};
    /// use accounts::outbound::memory::InMemoryUserRepository;
    /// use mockable::DefaultClock;
    ///
    /// let service = Arc::new(AccountService::new(
    ///     Arc::new(InMemoryUserRepository::default()),
    ///     Arc::new(DefaultClock),
    /// ));
    /// let state = HttpState::new(HttpStatePorts::from_service(service));
    /// assert_eq!(state.media_url, "/media/");
    /// ```
    pub fn from_service<S>(service: Arc<S>) -> Self
    where
        S: LoginService + RegistrationCommand + UserProfileQuery + UserProfileCommand + 'static,
    {
        Self {
            login: service.clone(),
            registration: service.clone(),
            profile: service.clone(),
            profile_edit: service,
        }
    }
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub registration: Arc<dyn RegistrationCommand>,
    pub profile: Arc<dyn UserProfileQuery>,
    pub profile_edit: Arc<dyn UserProfileCommand>,
    /// Public prefix under which profile pictures are served.
    pub media_url: String,
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}

impl HttpState {
    /// Construct state from a ports bundle with the default media root.
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            login,
            registration,
            profile,
            profile_edit,
        } = ports;
        Self {
            login,
            registration,
            profile,
            profile_edit,
            media_url: DEFAULT_MEDIA_URL.to_owned(),
        }
    }

    /// Replace the media root used to build picture URLs.
    #[must_use]
    pub fn with_media_url(mut self, media_url: impl Into<String>) -> Self {
        self.media_url = media_url.into();
        self
    }
}
