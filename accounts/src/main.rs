//! Accounts entry-point: loads settings, picks a user store and serves the
//! registration, login and profile pages.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

mod server;

use std::sync::Arc;

use actix_web::web;
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use accounts::domain::AccountService;
use accounts::inbound::http::health::HealthState;
use accounts::inbound::http::session_config::{BuildMode, session_settings_from_env};
use accounts::inbound::http::state::{HttpState, HttpStatePorts};
use accounts::outbound::memory::InMemoryUserRepository;
use accounts::outbound::persistence::{
    DbPool, DieselUserRepository, PoolConfig, migrate_schema_async,
};
use accounts::settings::AppSettings;
use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load()
        .map_err(|e| std::io::Error::other(format!("load settings: {e}")))?;
    let bind_addr = settings.bind_addr().map_err(std::io::Error::other)?;
    let session =
        session_settings_from_env(&mockable::DefaultEnv::new(), BuildMode::from_debug_assertions())
            .map_err(std::io::Error::other)?;

    let ports = build_ports(&settings).await?;
    let http_state =
        web::Data::new(HttpState::new(ports).with_media_url(settings.media_url()));
    let health_state = web::Data::new(HealthState::new());

    let config = ServerConfig::new(session, bind_addr);
    info!(bind_addr = %config.bind_addr(), "starting accounts server");
    let server = create_server(health_state, http_state, config)?;
    server.await
}

/// Wire the account service over PostgreSQL when a database URL is set,
/// otherwise over an in-memory store.
async fn build_ports(settings: &AppSettings) -> std::io::Result<HttpStatePorts> {
    let clock = Arc::new(DefaultClock);
    let Some(database_url) = settings.database_url() else {
        warn!("ACCOUNTS_DATABASE_URL not set; users are kept in memory and lost on restart");
        let repo = Arc::new(InMemoryUserRepository::default());
        return Ok(HttpStatePorts::from_service(Arc::new(AccountService::new(
            repo, clock,
        ))));
    };

    if settings.run_migrations {
        let applied = migrate_schema_async(database_url.to_owned())
            .await
            .map_err(|e| std::io::Error::other(format!("run migrations: {e}")))?;
        info!(applied, "database schema up to date");
    }

    let pool = DbPool::new(
        PoolConfig::new(database_url).with_max_size(settings.db_max_connections()),
    )
    .await
    .map_err(|e| std::io::Error::other(format!("create database pool: {e}")))?;
    let repo = Arc::new(DieselUserRepository::new(pool));
    Ok(HttpStatePorts::from_service(Arc::new(AccountService::new(
        repo, clock,
    ))))
}
