//! User repository implementation
//!
//! Registration and login live in the auth layer; this store only persists
//! the records they produce.

use crate::db::parse_id;
use crate::error::{Error, Result};
use crate::models::{User, UserId};
use libsql::{params, Connection, Row};

/// Trait for user storage operations
#[allow(async_fn_in_trait)]
pub trait UserRepository {
    /// Persist a new user; the email must be unused
    async fn create(&self, email: &str, password_hash: &str) -> Result<User>;

    /// Get a user by ID
    async fn get(&self, id: &UserId) -> Result<Option<User>>;

    /// Look up a user by email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
}

/// libSQL implementation of `UserRepository`
pub struct LibSqlUserRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlUserRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

fn parse_user(row: &Row) -> Result<User> {
    Ok(User {
        id: parse_id(&row.get::<String>(0)?)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        created_at: row.get(3)?,
    })
}

impl UserRepository for LibSqlUserRepository<'_> {
    async fn create(&self, email: &str, password_hash: &str) -> Result<User> {
        let email = email.trim();
        if email.is_empty() {
            return Err(Error::InvalidArgument("email must not be empty".into()));
        }

        let user = User::new(email, password_hash);
        let result = self
            .conn
            .execute(
                "INSERT INTO users (id, email, password_hash, created_at) VALUES (?, ?, ?, ?)",
                params![
                    user.id.as_str(),
                    user.email.clone(),
                    user.password_hash.clone(),
                    user.created_at
                ],
            )
            .await
            .map_err(Error::from);

        match result {
            Ok(_) => Ok(user),
            Err(err) if err.is_unique_violation() => Err(Error::Conflict(format!(
                "user with email '{email}' already exists"
            ))),
            Err(err) => Err(err),
        }
    }

    async fn get(&self, id: &UserId) -> Result<Option<User>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, email, password_hash, created_at FROM users WHERE id = ?",
                params![id.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(parse_user(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, email, password_hash, created_at FROM users WHERE email = ?",
                params![email.trim()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(parse_user(&row)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_create_and_get() {
        let db = setup().await;
        let repo = LibSqlUserRepository::new(db.connection());

        let user = repo.create("a@example.com", "hash").await.unwrap();
        let fetched = repo.get(&user.id).await.unwrap().unwrap();
        assert_eq!(fetched, user);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_duplicate_email_conflicts() {
        let db = setup().await;
        let repo = LibSqlUserRepository::new(db.connection());

        repo.create("a@example.com", "hash").await.unwrap();
        let err = repo.create("a@example.com", "other").await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_find_by_email() {
        let db = setup().await;
        let repo = LibSqlUserRepository::new(db.connection());

        repo.create("a@example.com", "hash").await.unwrap();
        let found = repo.find_by_email("a@example.com").await.unwrap();
        assert!(found.is_some());
        assert!(repo.find_by_email("b@example.com").await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_blank_email_rejected() {
        let db = setup().await;
        let repo = LibSqlUserRepository::new(db.connection());

        let err = repo.create("   ", "hash").await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
