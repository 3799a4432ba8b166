//! Administrative commands operating directly on the user store.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io::{self, BufRead};

use accounts::domain::ports::UserRepository;
use accounts::domain::{AccountDetails, EmailAddress, PasswordHash, User, Username};
use accounts::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
use accounts::settings::AppSettings;
use chrono::Utc;
use clap::{Parser, Subcommand};
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use zeroize::Zeroizing;

/// `accounts-admin` command arguments.
#[derive(Debug, Parser)]
#[command(
    name = "accounts-admin",
    about = "Create users and manage credentials in the accounts database",
    version
)]
struct CliArgs {
    /// Database connection URL. Falls back to `ACCOUNTS_DATABASE_URL` when omitted.
    #[arg(long = "database-url", value_name = "url", global = true)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a user. The password is read from stdin when `--password` is
    /// omitted; an empty line leaves the account without a usable password.
    CreateUser {
        username: String,
        #[arg(long = "first-name", default_value = "")]
        first_name: String,
        #[arg(long = "last-name", default_value = "")]
        last_name: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password: Option<String>,
        /// Grant access to administrative tooling.
        #[arg(long)]
        staff: bool,
        /// Grant every permission.
        #[arg(long)]
        superuser: bool,
    },
    /// Replace a user's password, read from stdin when `--password` is omitted.
    SetPassword {
        username: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// Deactivate a user so they can no longer log in.
    Deactivate { username: String },
}

fn main() -> io::Result<()> {
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let settings = AppSettings::load_from_iter([OsString::from("accounts-admin")])
        .map_err(|error| io::Error::other(format!("load settings: {error}")))?;
    let database_url = resolve_database_url(args.database_url, settings.database_url())?;
    let pool = DbPool::new(PoolConfig::new(database_url).with_max_size(1))
        .await
        .map_err(|error| io::Error::other(format!("create database pool: {error}")))?;
    let repo = DieselUserRepository::new(pool);

    match args.command {
        Command::CreateUser {
            username,
            first_name,
            last_name,
            email,
            password,
            staff,
            superuser,
        } => {
            let details = account_details(&username, first_name, last_name, email.as_deref())?;
            let password = read_password(password, io::stdin().lock())?;
            let user = create_user(&repo, details, password, staff, superuser).await?;
            println!("id={}", user.id());
            println!("username={}", user.username());
            println!("staff={}", user.is_staff());
            println!("superuser={}", user.is_superuser());
        }
        Command::SetPassword { username, password } => {
            let password = read_password(password, io::stdin().lock())?;
            let mut user = load_user(&repo, &username).await?;
            match password {
                Some(password) => user
                    .set_password(&password)
                    .map_err(|error| io::Error::other(error.to_string()))?,
                None => user.set_unusable_password(),
            }
            save_user(&repo, &user).await?;
            println!("password updated for {}", user.username());
        }
        Command::Deactivate { username } => {
            let mut user = load_user(&repo, &username).await?;
            user.set_active(false);
            save_user(&repo, &user).await?;
            println!("deactivated {}", user.username());
        }
    }
    Ok(())
}

fn invalid_input(message: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, message.into())
}

fn resolve_database_url(explicit: Option<String>, configured: Option<&str>) -> io::Result<String> {
    if let Some(value) = explicit {
        if value.trim().is_empty() {
            return Err(invalid_input(
                "--database-url must not be empty when provided",
            ));
        }
        return Ok(value);
    }
    configured
        .map(str::to_owned)
        .ok_or_else(|| invalid_input("database URL missing: set --database-url or ACCOUNTS_DATABASE_URL"))
}

fn account_details(
    username: &str,
    first_name: String,
    last_name: String,
    email: Option<&str>,
) -> io::Result<AccountDetails> {
    let username = Username::new(username).map_err(|error| invalid_input(error.to_string()))?;
    let email = email
        .map(EmailAddress::parse_optional)
        .transpose()
        .map_err(|error| invalid_input(error.to_string()))?
        .flatten();
    Ok(AccountDetails {
        username,
        first_name: first_name.trim().to_owned(),
        last_name: last_name.trim().to_owned(),
        email,
    })
}

/// Take the explicit password, or the first line of `input`. A blank line
/// yields `None`.
fn read_password(
    explicit: Option<String>,
    mut input: impl BufRead,
) -> io::Result<Option<Zeroizing<String>>> {
    let raw = match explicit {
        Some(value) => Zeroizing::new(value),
        None => {
            let mut line = Zeroizing::new(String::new());
            input.read_line(&mut line)?;
            line
        }
    };
    let trimmed = raw.trim_end_matches(['\r', '\n']);
    if trimmed.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Zeroizing::new(trimmed.to_owned())))
    }
}

async fn create_user<R: UserRepository>(
    repo: &R,
    details: AccountDetails,
    password: Option<Zeroizing<String>>,
    staff: bool,
    superuser: bool,
) -> io::Result<User> {
    let username = details.username.to_string();
    if repo.find_by_username(&username).await.map_err(io::Error::other)?.is_some() {
        return Err(invalid_input(format!("user '{username}' already exists")));
    }
    let hash = match password {
        Some(password) => {
            PasswordHash::from_plaintext(&password).map_err(|error| io::Error::other(error.to_string()))?
        }
        None => PasswordHash::unusable(),
    };
    let mut user = User::register(details, hash, Utc::now());
    user.set_staff(staff || superuser);
    user.set_superuser(superuser);
    repo.insert(&user).await.map_err(io::Error::other)?;
    Ok(user)
}

async fn load_user<R: UserRepository>(repo: &R, username: &str) -> io::Result<User> {
    repo.find_by_username(username)
        .await
        .map_err(io::Error::other)?
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no user named '{username}'")))
}

async fn save_user<R: UserRepository>(repo: &R, user: &User) -> io::Result<()> {
    repo.update(user).await.map_err(io::Error::other)
}
