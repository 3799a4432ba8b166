//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! Rows are translated to and from the domain [`User`]; an empty `email`
//! column maps to "no address". Unique violations on insert or update are
//! reported as [`UserPersistenceError::DuplicateUsername`]. Writes that match
//! no row are reported as [`UserPersistenceError::Missing`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{
    AccountDetails, EmailAddress, PasswordHash, ProfilePicture, User, UserId, UserParts,
    Username,
};

use super::models::{NewUserRow, UserDetailsUpdate, UserRow, UserUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserPersistenceError {
    UserPersistenceError::connection(error.into_message())
}

/// Map Diesel errors to user persistence errors.
///
/// `username` names the value being written so unique violations can be
/// reported against it.
fn map_diesel_error(error: diesel::result::Error, username: &str) -> UserPersistenceError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => debug!(
            ?kind,
            message = info.message(),
            constraint = info.constraint_name(),
            "diesel operation failed"
        ),
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            UserPersistenceError::duplicate_username(username)
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            UserPersistenceError::connection("database connection error")
        }
        DieselError::NotFound => UserPersistenceError::query("record not found"),
        DieselError::QueryBuilderError(_) => UserPersistenceError::query("database query error"),
        _ => UserPersistenceError::query("database error"),
    }
}

fn row_to_user(row: UserRow) -> Result<User, UserPersistenceError> {
    let username = Username::new(&row.username).map_err(|err| {
        UserPersistenceError::query(format!("stored username for {} is invalid: {err}", row.id))
    })?;
    let email = EmailAddress::parse_optional(&row.email).map_err(|err| {
        UserPersistenceError::query(format!("stored email for {} is invalid: {err}", row.id))
    })?;

    Ok(User::from_parts(UserParts {
        id: UserId::from_uuid(row.id),
        username,
        first_name: row.first_name,
        last_name: row.last_name,
        email,
        password: PasswordHash::from_stored(row.password),
        profile_picture: ProfilePicture::new(row.profile_picture),
        is_active: row.is_active,
        is_staff: row.is_staff,
        is_superuser: row.is_superuser,
        last_login: row.last_login,
        date_joined: row.date_joined,
        session_version: row.session_version,
    }))
}

fn email_column(user: &User) -> &str {
    user.email().map_or("", AsRef::as_ref)
}

fn new_row(user: &User) -> NewUserRow<'_> {
    NewUserRow {
        id: *user.id().as_uuid(),
        username: user.username().as_ref(),
        first_name: user.first_name(),
        last_name: user.last_name(),
        email: email_column(user),
        password: user.password_hash().as_str(),
        profile_picture: user.profile_picture().as_ref(),
        is_active: user.is_active(),
        is_staff: user.is_staff(),
        is_superuser: user.is_superuser(),
        last_login: user.last_login(),
        date_joined: user.date_joined(),
        session_version: user.session_version(),
    }
}

fn changeset(user: &User) -> UserUpdate<'_> {
    UserUpdate {
        username: user.username().as_ref(),
        first_name: user.first_name(),
        last_name: user.last_name(),
        email: email_column(user),
        password: user.password_hash().as_str(),
        profile_picture: user.profile_picture().as_ref(),
        is_active: user.is_active(),
        is_staff: user.is_staff(),
        is_superuser: user.is_superuser(),
        last_login: user.last_login(),
        session_version: user.session_version(),
    }
}

fn details_changeset(details: &AccountDetails) -> UserDetailsUpdate<'_> {
    UserDetailsUpdate {
        username: details.username.as_ref(),
        first_name: details.first_name.as_str(),
        last_name: details.last_name.as_str(),
        email: details.email.as_ref().map_or("", AsRef::as_ref),
    }
}

fn require_row(updated: usize, id: &UserId) -> Result<(), UserPersistenceError> {
    if updated == 0 {
        return Err(UserPersistenceError::missing(id.to_string()));
    }
    Ok(())
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(users::table)
            .values(&new_row(user))
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, user.username().as_ref()))?;
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(users::table.find(*user.id().as_uuid()))
            .set(&changeset(user))
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, user.username().as_ref()))?;
        require_row(updated, user.id())
    }

    async fn update_details(
        &self,
        id: &UserId,
        details: &AccountDetails,
    ) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(users::table.find(*id.as_uuid()))
            .set(&details_changeset(details))
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, details.username.as_ref()))?;
        require_row(updated, id)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = users::table
            .find(*id.as_uuid())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, ""))?;
        row.map(row_to_user).transpose()
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = users::table
            .filter(users::username.eq(username))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, username))?;
        row.map(row_to_user).transpose()
    }

    async fn record_login(
        &self,
        id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(users::table.find(*id.as_uuid()))
            .set(users::last_login.eq(Some(at)))
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, ""))?;
        require_row(updated, id)
    }

    async fn bump_session_version(&self, id: &UserId) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(users::table.find(*id.as_uuid()))
            .set(users::session_version.eq(users::session_version + 1))
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, ""))?;
        require_row(updated, id)
    }

    async fn count(&self) -> Result<u64, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = users::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, ""))?;
        u64::try_from(total)
            .map_err(|_| UserPersistenceError::query(format!("negative user count {total}")))
    }
}
