//! Accounts library modules.
//!
//! User registration, login, logout and profile pages served by actix-web,
//! with the domain kept free of HTTP and database concerns.

pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use middleware::Trace;
