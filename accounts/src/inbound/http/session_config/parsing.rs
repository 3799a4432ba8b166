//! Parsing of individual session toggles.

use actix_web::cookie::SameSite;
use mockable::Env;
use tracing::warn;

use super::{BuildMode, SessionConfigError};

const BOOL_EXPECTED: &str = "1|0|true|false|yes|no|y|n";
pub(super) const SAMESITE_EXPECTED: &str = "Strict|Lax|None";

/// Boolean environment toggle with its debug-build default.
pub(super) struct Toggle {
    name: &'static str,
    default: bool,
}

impl Toggle {
    pub(super) const fn new(name: &'static str, default: bool) -> Self {
        Self { name, default }
    }

    fn default_label(&self) -> &'static str {
        if self.default { "enabled" } else { "disabled" }
    }

    /// Read the toggle. Missing or malformed values fall back to the default
    /// in debug builds and are errors in release builds.
    pub(super) fn read<E: Env>(&self, env: &E, mode: BuildMode) -> Result<bool, SessionConfigError> {
        let Some(raw) = env.string(self.name) else {
            return mode.fallback(
                self.default,
                SessionConfigError::MissingEnv { name: self.name },
                || warn!("{} not set; defaulting to {}", self.name, self.default_label()),
            );
        };
        if let Some(flag) = parse_bool(&raw) {
            return Ok(flag);
        }
        mode.fallback(
            self.default,
            SessionConfigError::InvalidEnv {
                name: self.name,
                value: raw.clone(),
                expected: BOOL_EXPECTED,
            },
            || {
                warn!(
                    value = %raw,
                    "invalid {}; defaulting to {}",
                    self.name,
                    self.default_label()
                );
            },
        )
    }
}

/// Case-insensitive `SameSite` policy name.
pub(super) fn parse_same_site(raw: &str) -> Option<SameSite> {
    match raw.to_ascii_lowercase().as_str() {
        "lax" => Some(SameSite::Lax),
        "strict" => Some(SameSite::Strict),
        "none" => Some(SameSite::None),
        _ => None,
    }
}

/// `SameSite=None` is only honoured by browsers on secure cookies.
pub(super) fn check_same_site_none(
    mode: BuildMode,
    cookie_secure: bool,
) -> Result<(), SessionConfigError> {
    if cookie_secure {
        return Ok(());
    }
    mode.fallback((), SessionConfigError::InsecureSameSiteNone, || {
        warn!("SESSION_SAMESITE=None with SESSION_COOKIE_SECURE=0; browsers may reject the cookie");
    })
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}
