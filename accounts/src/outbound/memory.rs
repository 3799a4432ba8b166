//! Process-local `UserRepository` used when no database is configured.
//!
//! Records live behind a `std::sync::Mutex` and vanish with the process.
//! Username uniqueness is enforced on insert and update, mirroring the
//! database's unique index.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{AccountDetails, User, UserId, Username};

/// In-memory implementation of the `UserRepository` port.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Uuid, User>>, UserPersistenceError> {
        self.users
            .lock()
            .map_err(|_| UserPersistenceError::query("user store lock poisoned"))
    }

    fn ensure_username_free(
        users: &HashMap<Uuid, User>,
        id: &UserId,
        username: &Username,
    ) -> Result<(), UserPersistenceError> {
        let clash = users
            .values()
            .any(|stored| stored.username() == username && stored.id() != id);
        if clash {
            return Err(UserPersistenceError::duplicate_username(username.as_ref()));
        }
        Ok(())
    }

    fn modify(
        &self,
        id: &UserId,
        change: impl FnOnce(&mut User),
    ) -> Result<(), UserPersistenceError> {
        let mut users = self.lock()?;
        let user = users
            .get_mut(id.as_uuid())
            .ok_or_else(|| UserPersistenceError::missing(id.to_string()))?;
        change(user);
        Ok(())
    }

    /// Snapshot of every stored user, for assertions and tooling.
    pub fn all(&self) -> Result<Vec<User>, UserPersistenceError> {
        Ok(self.lock()?.values().cloned().collect())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut users = self.lock()?;
        Self::ensure_username_free(&users, user.id(), user.username())?;
        if users.contains_key(user.id().as_uuid()) {
            return Err(UserPersistenceError::query(format!(
                "user {} already exists",
                user.id()
            )));
        }
        users.insert(*user.id().as_uuid(), user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut users = self.lock()?;
        Self::ensure_username_free(&users, user.id(), user.username())?;
        let slot = users
            .get_mut(user.id().as_uuid())
            .ok_or_else(|| UserPersistenceError::missing(user.id().to_string()))?;
        *slot = user.clone();
        Ok(())
    }

    async fn update_details(
        &self,
        id: &UserId,
        details: &AccountDetails,
    ) -> Result<(), UserPersistenceError> {
        let mut users = self.lock()?;
        Self::ensure_username_free(&users, id, &details.username)?;
        let user = users
            .get_mut(id.as_uuid())
            .ok_or_else(|| UserPersistenceError::missing(id.to_string()))?;
        user.apply_details(details.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(self.lock()?.get(id.as_uuid()).cloned())
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, UserPersistenceError> {
        Ok(self
            .lock()?
            .values()
            .find(|user| user.username().as_ref() == username)
            .cloned())
    }

    async fn record_login(
        &self,
        id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<(), UserPersistenceError> {
        self.modify(id, |user| user.record_login(at))
    }

    async fn bump_session_version(&self, id: &UserId) -> Result<(), UserPersistenceError> {
        self.modify(id, User::end_sessions)
    }

    async fn count(&self) -> Result<u64, UserPersistenceError> {
        Ok(self.lock()?.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::PasswordHash;
    use rstest::{fixture, rstest};

    fn details(username: &str) -> AccountDetails {
        let mut first_name = username.to_owned();
        if let Some(initial) = first_name.get_mut(0..1) {
            initial.make_ascii_uppercase();
        }
        AccountDetails {
            username: Username::new(username).expect("valid username"),
            first_name,
            last_name: String::new(),
            email: None,
        }
    }

    fn user(username: &str) -> User {
        User::register(details(username), PasswordHash::unusable(), Utc::now())
    }

    #[fixture]
    fn repo() -> InMemoryUserRepository {
        InMemoryUserRepository::default()
    }

    #[rstest]
    #[tokio::test]
    async fn insert_then_find(repo: InMemoryUserRepository) {
        let stored = user("boburjon");
        repo.insert(&stored).await.expect("insert");

        assert_eq!(
            repo.find_by_id(stored.id()).await.expect("find"),
            Some(stored.clone())
        );
        assert_eq!(
            repo.find_by_username("boburjon").await.expect("find"),
            Some(stored)
        );
        assert_eq!(repo.find_by_username("Boburjon").await.expect("find"), None);
        assert_eq!(repo.count().await.expect("count"), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn insert_rejects_duplicate_username(repo: InMemoryUserRepository) {
        repo.insert(&user("boburjon")).await.expect("insert");
        let err = repo
            .insert(&user("boburjon"))
            .await
            .expect_err("duplicate");

        assert_eq!(err, UserPersistenceError::duplicate_username("boburjon"));
        assert_eq!(repo.count().await.expect("count"), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn update_rejects_taking_another_username(repo: InMemoryUserRepository) {
        let first = user("first");
        let mut second = user("second");
        repo.insert(&first).await.expect("insert");
        repo.insert(&second).await.expect("insert");

        second.apply_details(AccountDetails {
            username: Username::new("first").expect("valid username"),
            first_name: "Test".to_owned(),
            last_name: String::new(),
            email: None,
        });
        let err = repo.update(&second).await.expect_err("duplicate");
        assert!(matches!(err, UserPersistenceError::DuplicateUsername { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn writes_require_existing_user(repo: InMemoryUserRepository) {
        let missing = user("ghost");
        let details = details("ghost");
        assert!(matches!(
            repo.update(&missing).await,
            Err(UserPersistenceError::Missing { .. })
        ));
        assert!(matches!(
            repo.update_details(missing.id(), &details).await,
            Err(UserPersistenceError::Missing { .. })
        ));
        assert!(matches!(
            repo.record_login(missing.id(), Utc::now()).await,
            Err(UserPersistenceError::Missing { .. })
        ));
        assert!(matches!(
            repo.bump_session_version(missing.id()).await,
            Err(UserPersistenceError::Missing { .. })
        ));
    }

    #[rstest]
    #[tokio::test]
    async fn update_details_leaves_credentials_and_flags(repo: InMemoryUserRepository) {
        let mut stored = user("boburjon");
        stored.set_active(false);
        stored.set_staff(true);
        repo.insert(&stored).await.expect("insert");

        repo.update_details(stored.id(), &details("renamed"))
            .await
            .expect("update details");

        let found = repo
            .find_by_id(stored.id())
            .await
            .expect("find")
            .expect("present");
        assert_eq!(found.username().as_ref(), "renamed");
        assert_eq!(found.first_name(), "Renamed");
        assert!(!found.is_active());
        assert!(found.is_staff());
        assert_eq!(found.password_hash(), stored.password_hash());
    }

    #[rstest]
    #[tokio::test]
    async fn update_details_rejects_taking_another_username(repo: InMemoryUserRepository) {
        let first = user("first");
        let second = user("second");
        repo.insert(&first).await.expect("insert");
        repo.insert(&second).await.expect("insert");

        let err = repo
            .update_details(second.id(), &details("first"))
            .await
            .expect_err("duplicate");
        assert_eq!(err, UserPersistenceError::duplicate_username("first"));
        repo.update_details(second.id(), &details("second"))
            .await
            .expect("keeping own username");
    }

    #[rstest]
    #[tokio::test]
    async fn bump_session_version_increments(repo: InMemoryUserRepository) {
        let stored = user("boburjon");
        repo.insert(&stored).await.expect("insert");

        repo.bump_session_version(stored.id()).await.expect("bump");
        let found = repo
            .find_by_id(stored.id())
            .await
            .expect("find")
            .expect("present");
        assert_eq!(found.session_version(), stored.session_version() + 1);
    }

    #[rstest]
    #[tokio::test]
    async fn record_login_sets_timestamp(repo: InMemoryUserRepository) {
        let stored = user("boburjon");
        repo.insert(&stored).await.expect("insert");
        let at = Utc::now();

        repo.record_login(stored.id(), at).await.expect("record");
        let found = repo
            .find_by_id(stored.id())
            .await
            .expect("find")
            .expect("present");
        assert_eq!(found.last_login(), Some(at));
    }
}
