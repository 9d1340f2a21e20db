//! Credential records for basic-auth users.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use sqlx::SqlitePool;

use catalog_auth::{AuthError, UserDirectory, UserRecord};
use catalog_core::UserId;

use crate::error::{StoreError, StoreResult, map_sqlx_error};

#[async_trait]
pub trait UserStore: UserDirectory {
    /// Store a new user. Usernames are unique.
    async fn create_user(&self, username: &str, password_hash: &str) -> StoreResult<UserRecord>;

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<UserRecord>>;
}

fn backend(err: StoreError) -> AuthError {
    AuthError::Backend(err.to_string())
}

fn validate_username(username: &str) -> StoreResult<()> {
    if username.trim().is_empty() {
        return Err(StoreError::Validation("username cannot be empty".to_string()));
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<BTreeMap<String, UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create_user(&self, username: &str, password_hash: &str) -> StoreResult<UserRecord> {
        validate_username(username)?;
        let mut users = self
            .users
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))?;
        if users.contains_key(username) {
            return Err(StoreError::Conflict(format!("user '{username}' already exists")));
        }
        let record = UserRecord {
            id: UserId::new(users.len() as i64 + 1),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        };
        users.insert(username.to_string(), record.clone());
        Ok(record)
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<UserRecord>> {
        let users = self
            .users
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))?;
        Ok(users.get(username).cloned())
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserStore {
    async fn find_user(&self, username: &str) -> Result<Option<UserRecord>, AuthError> {
        self.find_by_username(username).await.map_err(backend)
    }
}

#[derive(Debug, Clone)]
pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        UserRecord {
            id: UserId::new(row.id),
            username: row.username,
            password_hash: row.password_hash,
        }
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn create_user(&self, username: &str, password_hash: &str) -> StoreResult<UserRecord> {
        validate_username(username)?;
        let row: UserRow = sqlx::query_as(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES (?1, ?2)
            RETURNING id, username, password_hash
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_user", e))?;
        Ok(row.into())
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<UserRecord>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, password_hash FROM users WHERE username = ?1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_user", e))?;
        Ok(row.map(UserRecord::from))
    }
}

#[async_trait]
impl UserDirectory for SqliteUserStore {
    async fn find_user(&self, username: &str) -> Result<Option<UserRecord>, AuthError> {
        self.find_by_username(username).await.map_err(backend)
    }
}
