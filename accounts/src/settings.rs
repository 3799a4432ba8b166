//! Application settings loaded via OrthoConfig.
//!
//! Values come from `ACCOUNTS_*` environment variables, an optional
//! configuration file and command-line flags, merged in that order of
//! increasing precedence.

use std::net::SocketAddr;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::inbound::http::state::DEFAULT_MEDIA_URL;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

/// Errors raised while interpreting loaded settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The bind address is not a `host:port` socket address.
    #[error("invalid bind address '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
}

/// Runtime configuration for the accounts server and admin tool.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ACCOUNTS")]
pub struct AppSettings {
    /// Socket address the HTTP server listens on.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection string. Without it the server keeps users in
    /// memory.
    pub database_url: Option<String>,
    /// Upper bound on pooled database connections.
    pub db_max_connections: Option<u32>,
    /// Apply embedded migrations at start-up.
    #[ortho_config(default = true)]
    pub run_migrations: bool,
    /// Public prefix for profile pictures.
    pub media_url: Option<String>,
}

impl AppSettings {
    /// Parsed listen address, defaulting to `0.0.0.0:8080`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidBindAddr`] when the configured value
    /// does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse()
            .map_err(|source| SettingsError::InvalidBindAddr {
                value: raw.to_owned(),
                source,
            })
    }

    /// Configured database URL, ignoring blank values.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Pool size, defaulting to 10 connections.
    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
    }

    /// Media prefix, defaulting to `/media/`.
    pub fn media_url(&self) -> &str {
        self.media_url.as_deref().unwrap_or(DEFAULT_MEDIA_URL)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 5] = [
        "ACCOUNTS_BIND_ADDR",
        "ACCOUNTS_DATABASE_URL",
        "ACCOUNTS_DB_MAX_CONNECTIONS",
        "ACCOUNTS_RUN_MIGRATIONS",
        "ACCOUNTS_MEDIA_URL",
    ];

    fn load_from_empty_args() -> AppSettings {
        AppSettings::load_from_iter([OsString::from("accounts")]).expect("config should load")
    }

    #[rstest]
    fn defaults_apply_when_nothing_is_set() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();
        assert_eq!(
            settings.bind_addr().expect("default address"),
            "0.0.0.0:8080".parse::<SocketAddr>().expect("socket address")
        );
        assert_eq!(settings.database_url(), None);
        assert_eq!(settings.db_max_connections(), 10);
        assert!(settings.run_migrations);
        assert_eq!(settings.media_url(), "/media/");
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("ACCOUNTS_BIND_ADDR", Some("127.0.0.1:9000".to_owned())),
            (
                "ACCOUNTS_DATABASE_URL",
                Some("postgres://accounts@localhost/accounts".to_owned()),
            ),
            ("ACCOUNTS_DB_MAX_CONNECTIONS", Some("4".to_owned())),
            ("ACCOUNTS_RUN_MIGRATIONS", Some("false".to_owned())),
            ("ACCOUNTS_MEDIA_URL", Some("https://cdn.example/media/".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(
            settings.bind_addr().expect("address"),
            "127.0.0.1:9000".parse::<SocketAddr>().expect("socket address")
        );
        assert_eq!(
            settings.database_url(),
            Some("postgres://accounts@localhost/accounts")
        );
        assert_eq!(settings.db_max_connections(), 4);
        assert!(!settings.run_migrations);
        assert_eq!(settings.media_url(), "https://cdn.example/media/");
    }

    #[rstest]
    #[case(Some("   "), None)]
    #[case(Some(" postgres://db "), Some("postgres://db"))]
    #[case(None, None)]
    fn blank_database_url_counts_as_unset(
        #[case] raw: Option<&str>,
        #[case] expected: Option<&str>,
    ) {
        let settings = AppSettings {
            bind_addr: None,
            database_url: raw.map(str::to_owned),
            db_max_connections: None,
            run_migrations: true,
            media_url: None,
        };
        assert_eq!(settings.database_url(), expected);
    }

    #[rstest]
    fn malformed_bind_addr_is_reported() {
        let settings = AppSettings {
            bind_addr: Some("localhost".to_owned()),
            database_url: None,
            db_max_connections: None,
            run_migrations: true,
            media_url: None,
        };
        assert!(matches!(
            settings.bind_addr(),
            Err(SettingsError::InvalidBindAddr { .. })
        ));
    }
}
