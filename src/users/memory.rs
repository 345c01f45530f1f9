use std::collections::BTreeMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::users::repo::{RepoError, UserRepository};
use crate::users::repo_types::{NewUser, User, UserChanges, UserStatus};

/// Process-local store used when no database is configured, and by tests.
///
/// Every write takes the lock once, so the active-email check and the write
/// it guards cannot interleave with another writer.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    inner: RwLock<Store>,
}

#[derive(Debug, Default)]
struct Store {
    last_id: i64,
    rows: BTreeMap<i64, User>,
}

impl Store {
    fn active_email_holder(&self, email: &str, except: Option<i64>) -> Option<i64> {
        self.rows
            .values()
            .find(|u| u.is_active() && u.email == email && Some(u.id) != except)
            .map(|u| u.id)
    }
}

/// Case- and accent-insensitive sort key, the counterpart of
/// `lower(unaccent(..))` on the Postgres side.
fn fold(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn list_active(&self) -> Result<Vec<User>, RepoError> {
        let store = self.inner.read().await;
        let mut users: Vec<User> = store
            .rows
            .values()
            .filter(|u| u.is_active())
            .cloned()
            .collect();
        users.sort_by_cached_key(|u| (fold(&u.first_name), fold(&u.last_name), u.id));
        Ok(users)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError> {
        Ok(self.inner.read().await.rows.get(&id).cloned())
    }

    async fn insert(&self, new: NewUser) -> Result<User, RepoError> {
        let mut store = self.inner.write().await;
        if store.active_email_holder(&new.email, None).is_some() {
            return Err(RepoError::EmailTaken);
        }

        store.last_id += 1;
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: store.last_id,
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            phone: new.phone,
            status: UserStatus::Active,
            created_at: Some(now),
            updated_at: Some(now),
        };
        store.rows.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> Result<Option<User>, RepoError> {
        let mut store = self.inner.write().await;
        let Some(current) = store.rows.get(&id) else {
            return Ok(None);
        };

        let status = changes.resulting_status(current.status);
        let email = changes.email.as_deref().unwrap_or(&current.email);
        if status == UserStatus::Active && store.active_email_holder(email, Some(id)).is_some() {
            return Err(RepoError::EmailTaken);
        }

        let Some(user) = store.rows.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply_to(user);
        user.updated_at = Some(OffsetDateTime::now_utc());
        Ok(Some(user.clone()))
    }

    async fn email_in_use(&self, email: &str, except: Option<i64>) -> Result<bool, RepoError> {
        Ok(self.inner.read().await.active_email_holder(email, except).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(first: &str, last: &str, email: &str) -> NewUser {
        NewUser {
            first_name: first.into(),
            last_name: last.into(),
            email: email.into(),
            phone: "+57 300 1234567".into(),
        }
    }

    #[tokio::test]
    async fn ids_are_never_reused() {
        let repo = InMemoryUserRepository::new();
        let a = repo.insert(new_user("Ana", "Gomez", "ana@x.com")).await.unwrap();
        repo.update(a.id, UserChanges::deactivate()).await.unwrap();
        let b = repo.insert(new_user("Ana", "Gomez", "ana@x.com")).await.unwrap();
        assert!(b.id > a.id);
    }

    #[tokio::test]
    async fn insert_rejects_email_held_by_active_user() {
        let repo = InMemoryUserRepository::new();
        repo.insert(new_user("Ana", "Gomez", "ana@x.com")).await.unwrap();
        let err = repo.insert(new_user("Eva", "Diaz", "ana@x.com")).await.unwrap_err();
        assert!(matches!(err, RepoError::EmailTaken));
    }

    #[tokio::test]
    async fn list_active_is_sorted_and_skips_inactive() {
        let repo = InMemoryUserRepository::new();
        let zoe = repo.insert(new_user("Zoe", "Alba", "z@x.com")).await.unwrap();
        repo.insert(new_user("Ana", "Ruiz", "r@x.com")).await.unwrap();
        repo.insert(new_user("Ana", "Gomez", "g@x.com")).await.unwrap();
        repo.update(zoe.id, UserChanges::deactivate()).await.unwrap();

        let names: Vec<String> = repo
            .list_active()
            .await
            .unwrap()
            .into_iter()
            .map(|u| format!("{} {}", u.first_name, u.last_name))
            .collect();
        assert_eq!(names, vec!["Ana Gomez", "Ana Ruiz"]);
    }

    #[tokio::test]
    async fn list_ignores_case_and_accents() {
        let repo = InMemoryUserRepository::new();
        for (first, email) in [
            ("Zoe", "z@x.com"),
            ("Álvaro", "al@x.com"),
            ("ana", "an@x.com"),
            ("Bruno", "b@x.com"),
        ] {
            repo.insert(new_user(first, "Gomez", email)).await.unwrap();
        }

        let firsts: Vec<String> = repo
            .list_active()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.first_name)
            .collect();
        assert_eq!(firsts, vec!["Álvaro", "ana", "Bruno", "Zoe"]);
    }

    #[test]
    fn fold_strips_case_and_marks() {
        assert_eq!(fold("Álvaro"), "alvaro");
        assert_eq!(fold("MUÑOZ"), "munoz");
    }

    #[tokio::test]
    async fn reactivation_conflicts_with_active_duplicate() {
        let repo = InMemoryUserRepository::new();
        let old = repo.insert(new_user("Ana", "Gomez", "ana@x.com")).await.unwrap();
        repo.update(old.id, UserChanges::deactivate()).await.unwrap();
        repo.insert(new_user("Ana", "Gomez", "ana@x.com")).await.unwrap();

        let changes = UserChanges {
            status: Some(UserStatus::Active),
            ..UserChanges::default()
        };
        let err = repo.update(old.id, changes).await.unwrap_err();
        assert!(matches!(err, RepoError::EmailTaken));
    }

    #[tokio::test]
    async fn update_missing_row_is_none() {
        let repo = InMemoryUserRepository::new();
        let res = repo.update(42, UserChanges::default()).await.unwrap();
        assert!(res.is_none());
    }

    #[tokio::test]
    async fn email_in_use_excludes_self() {
        let repo = InMemoryUserRepository::new();
        let ana = repo.insert(new_user("Ana", "Gomez", "ana@x.com")).await.unwrap();
        assert!(repo.email_in_use("ana@x.com", None).await.unwrap());
        assert!(!repo.email_in_use("ana@x.com", Some(ana.id)).await.unwrap());
    }
}
