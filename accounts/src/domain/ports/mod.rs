//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driving ports (`LoginService`, `RegistrationCommand`, `UserProfileQuery`,
//! `UserProfileCommand`) are called by inbound adapters. The driven
//! `UserRepository` port is implemented by outbound persistence adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod login_service;
mod registration_command;
mod user_profile_command;
mod user_profile_query;
mod user_repository;

#[cfg(test)]
pub use login_service::MockLoginService;
pub use login_service::LoginService;
#[cfg(test)]
pub use registration_command::MockRegistrationCommand;
pub use registration_command::{RegistrationCommand, RegistrationRequest};
#[cfg(test)]
pub use user_profile_command::MockUserProfileCommand;
pub use user_profile_command::{ProfileUpdateRequest, UserProfileCommand};
#[cfg(test)]
pub use user_profile_query::MockUserProfileQuery;
pub use user_profile_query::UserProfileQuery;
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserPersistenceError, UserRepository};
