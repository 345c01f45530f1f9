use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use crate::users::repo_types::{NewUser, User, UserChanges};

#[derive(Debug, Error)]
pub enum RepoError {
    /// Another active user already holds the email.
    #[error("email is already used by an active user")]
    EmailTaken,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Owns the lifecycle of user rows. Nothing else writes to `users`.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Active users ordered by first name, then last name, ignoring case and
    /// accents; id breaks ties.
    async fn list_active(&self) -> Result<Vec<User>, RepoError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError>;

    /// Inserts an active user. Fails with [`RepoError::EmailTaken`] when an
    /// active row already has the email.
    async fn insert(&self, new: NewUser) -> Result<User, RepoError>;

    /// Applies the supplied columns and refreshes `updated_at`.
    /// Returns `Ok(None)` when no row has `id`.
    async fn update(&self, id: i64, changes: UserChanges) -> Result<Option<User>, RepoError>;

    /// Whether an active user, other than `except`, uses `email`.
    async fn email_in_use(&self, email: &str, except: Option<i64>) -> Result<bool, RepoError>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

// The partial unique index on (email) WHERE status = 'active' is what makes
// concurrent inserts safe; the loser surfaces here as a unique violation.
fn map_write_err(e: sqlx::Error) -> RepoError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return RepoError::EmailTaken;
        }
    }
    RepoError::Database(e)
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn list_active(&self) -> Result<Vec<User>, RepoError> {
        let rows = sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email, phone, status, created_at, updated_at
            FROM users
            WHERE status = 'active'
            ORDER BY lower(unaccent(first_name)), lower(unaccent(last_name)), id
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email, phone, status, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn insert(&self, new: NewUser) -> Result<User, RepoError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (first_name, last_name, email, phone)
            VALUES ($1, $2, $3, $4)
            RETURNING id, first_name, last_name, email, phone, status, created_at, updated_at
            "#,
        )
        .bind(new.first_name)
        .bind(new.last_name)
        .bind(new.email)
        .bind(new.phone)
        .fetch_one(&self.db)
        .await
        .map_err(map_write_err)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> Result<Option<User>, RepoError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                first_name = COALESCE($2, first_name),
                last_name  = COALESCE($3, last_name),
                email      = COALESCE($4, email),
                phone      = COALESCE($5, phone),
                status     = COALESCE($6, status),
                updated_at = now()
            WHERE id = $1
            RETURNING id, first_name, last_name, email, phone, status, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(changes.first_name)
        .bind(changes.last_name)
        .bind(changes.email)
        .bind(changes.phone)
        .bind(changes.status)
        .fetch_optional(&self.db)
        .await
        .map_err(map_write_err)
    }

    async fn email_in_use(&self, email: &str, except: Option<i64>) -> Result<bool, RepoError> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM users
                WHERE email = $1
                  AND status = 'active'
                  AND ($2::BIGINT IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(email)
        .bind(except)
        .fetch_one(&self.db)
        .await?;
        Ok(taken)
    }
}
